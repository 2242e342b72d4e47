use std::f64::consts::{FRAC_PI_2, PI};

use anyhow::Result;
use nalgebra::point;

use super::{BoundaryFeature, Side, TableShape, require_positive, snap_to_circle};
use crate::math::{Point, Ray2D, Vector, solve_quadratic_real};

/// Rectangle `|x| <= half_length`, `|y| <= half_width` capped at both x ends by semicircles of
/// radius `half_width` centred on `(±half_length, 0)`.
///
/// Pieces: top and bottom segments `y = ±half_width`, and the two caps covering
/// `|x| >= half_length`. A point at a junction belongs to the segment; segment and cap normals
/// coincide there.
#[derive(Debug, Clone)]
pub struct StadiumBoundary {
    half_length: f64,
    half_width: f64,
}

impl StadiumBoundary {
    pub fn new(half_length: f64, half_width: f64) -> Result<Self> {
        require_positive("stadium half length", half_length)?;
        require_positive("stadium half width", half_width)?;
        Ok(Self {
            half_length,
            half_width,
        })
    }

    fn cap_center(&self, side: Side) -> Point {
        match side {
            Side::Left => point![-self.half_length, 0.0],
            _ => point![self.half_length, 0.0],
        }
    }

    fn segment_hit(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let (o, d) = (ray.origin, ray.direction);
        if d.y == 0.0 {
            return None;
        }
        let y = self.half_width.copysign(d.y);
        let distance = (y - o.y) / d.y;
        let x = o.x + distance * d.x;
        if distance > min_distance && x.abs() <= self.half_length {
            Some((distance, point![x, y]))
        } else {
            None
        }
    }

    fn cap_hit(&self, side: Side, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let center = self.cap_center(side);
        let local = ray.origin - center;
        let roots = solve_quadratic_real(
            ray.direction.norm_squared(),
            2.0 * local.dot(&ray.direction),
            local.norm_squared() - self.half_width * self.half_width,
        );
        // the full circle also passes through the table interior; keep the outer half only
        roots
            .into_iter()
            .filter(|distance| *distance > min_distance)
            .map(|distance| {
                let hit = snap_to_circle(ray.point_at(distance), center, self.half_width);
                (distance, hit)
            })
            .find(|(_, hit)| self.on_cap_side(side, hit, min_distance))
    }

    fn on_cap_side(&self, side: Side, point: &Point, epsilon: f64) -> bool {
        match side {
            Side::Left => point.x <= -self.half_length + epsilon,
            _ => point.x >= self.half_length - epsilon,
        }
    }
}

impl TableShape for StadiumBoundary {
    fn shape_label(&self) -> &'static str {
        "stadium"
    }

    fn extent(&self) -> (f64, f64) {
        (self.half_length + self.half_width, self.half_width)
    }

    fn contains(&self, point: &Point, epsilon: f64) -> bool {
        if point.x.abs() <= self.half_length {
            return point.y.abs() <= self.half_width + epsilon;
        }
        let side = if point.x > 0.0 { Side::Right } else { Side::Left };
        (point - self.cap_center(side)).norm() <= self.half_width + epsilon
    }

    fn intersect_ray(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        [
            self.segment_hit(ray, min_distance),
            self.cap_hit(Side::Left, ray, min_distance),
            self.cap_hit(Side::Right, ray, min_distance),
        ]
        .into_iter()
        .flatten()
        .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    fn surface_at(&self, point: &Point, epsilon: f64) -> Option<(Vector, BoundaryFeature)> {
        if (point.y.abs() - self.half_width).abs() <= epsilon
            && point.x.abs() <= self.half_length + epsilon
        {
            let side = if point.y > 0.0 { Side::Top } else { Side::Bottom };
            return Some((side.outward(), BoundaryFeature::Edge(side)));
        }

        let side = if point.x > 0.0 { Side::Right } else { Side::Left };
        let offset = point - self.cap_center(side);
        if self.on_cap_side(side, point, epsilon)
            && (offset.norm() - self.half_width).abs() <= epsilon
        {
            return Some((offset.normalize(), BoundaryFeature::Cap(side)));
        }
        None
    }

    fn residual(&self, point: &Point) -> f64 {
        if point.x.abs() <= self.half_length {
            return (point.y.abs() - self.half_width).abs();
        }
        let side = if point.x > 0.0 { Side::Right } else { Side::Left };
        ((point - self.cap_center(side)).norm() - self.half_width).abs()
    }

    fn outline(&self, samples: usize) -> Vec<Vec<Point>> {
        let (l, r) = (self.half_length, self.half_width);
        let half = (samples / 2).max(4);
        let mut points = Vec::with_capacity(2 * half + 3);
        // right cap from bottom to top, then left cap from top to bottom
        for i in 0..=half {
            let angle = -FRAC_PI_2 + PI * i as f64 / half as f64;
            points.push(point![l + r * angle.cos(), r * angle.sin()]);
        }
        for i in 0..=half {
            let angle = FRAC_PI_2 + PI * i as f64 / half as f64;
            points.push(point![-l + r * angle.cos(), r * angle.sin()]);
        }
        points.push(point![l, -r]);
        vec![points]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;
    use approx::assert_relative_eq;

    fn stadium() -> StadiumBoundary {
        StadiumBoundary::new(2.0, 1.0).unwrap()
    }

    #[test]
    fn steep_ray_hits_segment() {
        let boundary = Boundary::Stadium(stadium());
        let hit = boundary
            .next_collision(&point![0.5, 0.0], &Vector::new(0.5, 1.0))
            .unwrap();
        assert_relative_eq!(hit.point.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point.y, 1.0, epsilon = 1e-12);
        assert_eq!(hit.feature, BoundaryFeature::Edge(Side::Top));
    }

    #[test]
    fn shallow_ray_exits_through_cap() {
        let boundary = Boundary::Stadium(stadium());
        let hit = boundary
            .next_collision(&point![0.0, 0.0], &Vector::new(1.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit.point.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-12);
        assert_eq!(hit.feature, BoundaryFeature::Cap(Side::Right));

        let hit = boundary
            .next_collision(&point![-1.0, 0.5], &Vector::new(-1.0, -0.1))
            .unwrap();
        assert_eq!(hit.feature, BoundaryFeature::Cap(Side::Left));
        let residual = (hit.point - point![-2.0, 0.0]).norm_squared() - 1.0;
        assert!(residual.abs() < 1e-9);
    }

    #[test]
    fn ray_starting_in_cap_region_crosses_to_segment() {
        let boundary = Boundary::Stadium(stadium());
        let hit = boundary
            .next_collision(&point![2.5, 0.0], &Vector::new(-1.0, -0.5))
            .unwrap();
        assert_eq!(hit.feature, BoundaryFeature::Edge(Side::Bottom));
        assert_relative_eq!(hit.point.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.point.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn ray_from_cap_through_interior_chord_is_ignored() {
        // from the right cap heading left: the right circle's second root lies at x < 2
        let boundary = Boundary::Stadium(stadium());
        let start = point![2.0 + 0.6, 0.8];
        let hit = boundary
            .next_collision(&start, &Vector::new(-1.0, 0.0))
            .unwrap();
        assert_eq!(hit.feature, BoundaryFeature::Cap(Side::Left));
        assert_relative_eq!(hit.point.x, -2.6, epsilon = 1e-12);
        assert_relative_eq!(hit.point.y, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn junction_normals_agree() {
        let shape = stadium();
        let junction = point![2.0, 1.0];
        let (segment_normal, feature) = shape.surface_at(&junction, 1e-9).unwrap();
        assert_eq!(feature, BoundaryFeature::Edge(Side::Top));
        let cap_normal = (junction - shape.cap_center(Side::Right)).normalize();
        assert_relative_eq!(segment_normal.x, cap_normal.x, epsilon = 1e-12);
        assert_relative_eq!(segment_normal.y, cap_normal.y, epsilon = 1e-12);

        // just past the junction the cap takes over with a continuous normal
        let angle = FRAC_PI_2 - 1e-6;
        let past = point![2.0 + angle.cos(), angle.sin()];
        let (normal, feature) = shape.surface_at(&past, 1e-9).unwrap();
        assert_eq!(feature, BoundaryFeature::Cap(Side::Right));
        assert!((normal - segment_normal).norm() < 1e-5);
    }

    #[test]
    fn segment_reflection_flips_vertical_component() {
        let boundary = Boundary::Stadium(stadium());
        let bounce = boundary
            .reflect(&point![-1.5, -1.0], &Vector::new(0.3, -0.7))
            .unwrap();
        assert_relative_eq!(bounce.velocity.x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(bounce.velocity.y, 0.7, epsilon = 1e-12);
        assert_eq!(bounce.normal, Vector::new(0.0, -1.0));
    }

    #[test]
    fn contains_cap_and_body() {
        let shape = stadium();
        assert!(shape.contains(&point![2.9, 0.0], 0.0));
        assert!(shape.contains(&point![-1.9, 0.99], 0.0));
        assert!(!shape.contains(&point![2.9, 0.9], 0.0));
        assert!(!shape.contains(&point![0.0, 1.1], 0.0));
    }
}
