use std::f64::consts::TAU;

use nalgebra::{Point2, Rotation2, Vector2};

pub type Point = Point2<f64>;
pub type Vector = Vector2<f64>;

/// Relative tolerance for boundary membership; shapes scale it by their size.
pub const GEOMETRY_EPS: f64 = 1e-9;

/// Ray in 2D used for collision queries. The direction is stored normalised so that the ray
/// parameter is a distance.
#[derive(Debug, Clone)]
pub struct Ray2D {
    pub origin: Point,
    pub direction: Vector,
}

impl Ray2D {
    /// Returns `None` for a zero (or non-finite) direction.
    pub fn new(origin: Point, direction: Vector) -> Option<Self> {
        let norm_sq = direction.norm_squared();
        if !norm_sq.is_finite() || norm_sq <= f64::MIN_POSITIVE {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / norm_sq.sqrt(),
        })
    }

    #[inline]
    pub fn point_at(&self, distance: f64) -> Point {
        self.origin + self.direction * distance
    }
}

/// Angle and comparison helpers the billiard code needs on top of nalgebra's vector.
pub trait VectorExt {
    /// Argument in (-π, π], `atan2(y, x)`.
    fn arg(&self) -> f64;
    fn rotated(&self, theta: f64) -> Vector;
    fn approx_eq(&self, other: &Vector, epsilon: f64) -> bool;
}

impl VectorExt for Vector {
    #[inline]
    fn arg(&self) -> f64 {
        self.y.atan2(self.x)
    }

    fn rotated(&self, theta: f64) -> Vector {
        Rotation2::new(theta) * *self
    }

    fn approx_eq(&self, other: &Vector, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

#[inline]
pub fn cross(a: &Vector, b: &Vector) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Signed angle that rotates `from` onto `to`, counter-clockwise positive, in (-π, π].
#[inline]
pub fn signed_angle(from: &Vector, to: &Vector) -> f64 {
    cross(from, to).atan2(from.dot(to))
}

/// Reduce an angle into [0, 2π).
#[inline]
pub fn wrap_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Specular reflection of `velocity` off a surface with unit normal `normal`.
#[inline]
pub fn reflect_across(velocity: &Vector, normal: &Vector) -> Vector {
    *velocity - *normal * (2.0 * velocity.dot(normal))
}

/// Relative width of a double root: the discriminant counts as zero against this fraction of
/// the larger of `b²` and `|4ac|`.
const POLY_EPS: f64 = 1e-12;

fn solve_linear(a: f64, b: f64) -> Vec<f64> {
    if a == 0.0 { Vec::new() } else { vec![-b / a] }
}

/// Real roots of `a t² + b t + c`, ascending. Uses the cancellation-free form of the
/// quadratic formula so that a root near zero keeps its precision. Both cutoffs are relative
/// to the coefficients, so the roots scale with the problem.
pub fn solve_quadratic_real(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a == 0.0 {
        return solve_linear(b, c);
    }
    let b_squared = b * b;
    let four_ac = 4.0 * a * c;
    let discriminant = b_squared - four_ac;
    if discriminant.abs() <= POLY_EPS * b_squared.max(four_ac.abs()) {
        vec![-b / (2.0 * a)]
    } else if discriminant < 0.0 {
        Vec::new()
    } else {
        let sqrt_disc = discriminant.sqrt();
        let q = -0.5 * (b + b.signum() * sqrt_disc);
        let r1 = q / a;
        let r2 = c / q;
        if r1 <= r2 { vec![r1, r2] } else { vec![r2, r1] }
    }
}

/// Smallest root strictly greater than `min`, if any.
pub fn first_root_after(roots: &[f64], min: f64) -> Option<f64> {
    roots.iter().copied().filter(|t| *t > min).reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_normalizes_direction() {
        let ray = Ray2D::new(Point::new(0.0, 0.0), Vector::new(2.0, 0.0)).unwrap();
        assert!((ray.direction.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ray_rejects_zero_direction() {
        assert!(Ray2D::new(Point::new(0.0, 0.0), Vector::zeros()).is_none());
    }

    #[test]
    fn cross_product_sign() {
        let a = Vector::new(1.0, 0.0);
        let b = Vector::new(0.0, 1.0);
        assert!(cross(&a, &b) > 0.0);
        assert!(cross(&b, &a) < 0.0);
    }

    #[test]
    fn arg_covers_all_quadrants() {
        assert_relative_eq!(Vector::new(-1.0, 0.0).arg(), PI);
        assert_relative_eq!(Vector::new(0.0, -1.0).arg(), -FRAC_PI_2);
        // atan(y/x) would put this one in the fourth quadrant
        assert_relative_eq!(Vector::new(-1.0, -1.0).arg(), -3.0 * PI / 4.0);
    }

    #[test]
    fn rotation_is_counter_clockwise() {
        let v = Vector::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert!(v.approx_eq(&Vector::new(0.0, 1.0), 1e-12));
    }

    #[test]
    fn signed_angle_and_wrap() {
        let n = Vector::new(1.0, 0.0);
        assert_relative_eq!(signed_angle(&n, &Vector::new(1.0, 1.0)), PI / 4.0);
        assert_relative_eq!(signed_angle(&n, &Vector::new(1.0, -1.0)), -PI / 4.0);
        assert_relative_eq!(wrap_angle(-PI / 4.0), 7.0 * PI / 4.0);
        assert_eq!(wrap_angle(TAU), 0.0);
    }

    #[test]
    fn quadratic_roots_are_sorted_and_precise() {
        let roots = solve_quadratic_real(1.0, -3.0, 2.0);
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0], 1.0);
        assert_relative_eq!(roots[1], 2.0);

        // tiny root next to a large one
        let roots = solve_quadratic_real(1.0, -1e8, 1.0);
        assert_relative_eq!(roots[0], 1e-8, max_relative = 1e-9);

        assert!(solve_quadratic_real(1.0, 0.0, 1.0).is_empty());
        assert_eq!(first_root_after(&[-1.0, 0.5, 2.0], 0.0), Some(0.5));
    }

    #[test]
    fn quadratic_cutoffs_follow_coefficient_scale() {
        let roots = solve_quadratic_real(1.0, 0.0, -2.5e-13);
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[1], 5e-7, max_relative = 1e-12);

        let roots = solve_quadratic_real(1e-12, 0.0, -1.0);
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0], -1e6, max_relative = 1e-12);
        assert_relative_eq!(roots[1], 1e6, max_relative = 1e-12);

        // tangent at any scale collapses to one root
        assert_eq!(solve_quadratic_real(1.0, -2e-7, 1e-14).len(), 1);
        assert_eq!(solve_quadratic_real(0.0, 2.0, -4.0), vec![2.0]);
    }

    #[test]
    fn reflection_preserves_length() {
        let v = Vector::new(3.0, -4.0);
        let n = Vector::new(1.0, 2.0).normalize();
        assert_relative_eq!(reflect_across(&v, &n).norm(), 5.0, epsilon = 1e-12);
    }
}
