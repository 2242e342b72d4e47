use anyhow::Result;
use nalgebra::point;

use super::{BoundaryFeature, TableShape, circle_outline, require_positive, snap_to_circle};
use crate::math::{Point, Ray2D, Vector, first_root_after, solve_quadratic_real};

/// Circle `x² + y² = radius²`.
#[derive(Debug, Clone)]
pub struct CircleBoundary {
    radius: f64,
}

impl CircleBoundary {
    pub fn new(radius: f64) -> Result<Self> {
        require_positive("circle radius", radius)?;
        Ok(Self { radius })
    }
}

impl TableShape for CircleBoundary {
    fn shape_label(&self) -> &'static str {
        "circle"
    }

    fn extent(&self) -> (f64, f64) {
        (self.radius, self.radius)
    }

    fn contains(&self, point: &Point, epsilon: f64) -> bool {
        point.coords.norm() <= self.radius + epsilon
    }

    fn intersect_ray(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let origin = ray.origin.coords;
        let a = ray.direction.norm_squared();
        let b = 2.0 * origin.dot(&ray.direction);
        let c = origin.norm_squared() - self.radius * self.radius;
        let roots = solve_quadratic_real(a, b, c);
        let distance = first_root_after(&roots, min_distance)?;
        let hit = snap_to_circle(ray.point_at(distance), Point::origin(), self.radius);
        Some((distance, hit))
    }

    fn surface_at(&self, point: &Point, epsilon: f64) -> Option<(Vector, BoundaryFeature)> {
        let norm = point.coords.norm();
        if (norm - self.radius).abs() > epsilon {
            return None;
        }
        Some((point.coords / norm, BoundaryFeature::Curve))
    }

    fn residual(&self, point: &Point) -> f64 {
        (point.coords.norm() - self.radius).abs()
    }

    fn outline(&self, samples: usize) -> Vec<Vec<Point>> {
        vec![circle_outline(point![0.0, 0.0], self.radius, samples)]
    }
}
