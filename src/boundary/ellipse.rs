use std::f64::consts::TAU;

use anyhow::Result;

use super::{BoundaryFeature, TableShape, require_positive};
use crate::math::{Point, Ray2D, Vector, first_root_after, solve_quadratic_real};

/// Axis-aligned ellipse `(x / x_coef)² + (y / y_coef)² = radius²`.
#[derive(Debug, Clone)]
pub struct EllipseBoundary {
    radius: f64,
    x_coef: f64,
    y_coef: f64,
}

impl EllipseBoundary {
    pub fn new(radius: f64, x_coef: f64, y_coef: f64) -> Result<Self> {
        require_positive("ellipse radius", radius)?;
        require_positive("ellipse x coefficient", x_coef)?;
        require_positive("ellipse y coefficient", y_coef)?;
        Ok(Self {
            radius,
            x_coef,
            y_coef,
        })
    }

    /// `sqrt((x / x_coef)² + (y / y_coef)²)`; equals `radius` on the boundary.
    fn level(&self, point: &Point) -> f64 {
        (point.x / self.x_coef).hypot(point.y / self.y_coef)
    }

    /// Converts a level difference into a distance that never overstates the true gap.
    fn level_to_distance(&self, delta: f64) -> f64 {
        delta * self.x_coef.min(self.y_coef)
    }
}

impl TableShape for EllipseBoundary {
    fn shape_label(&self) -> &'static str {
        "ellipse"
    }

    fn extent(&self) -> (f64, f64) {
        (self.radius * self.x_coef, self.radius * self.y_coef)
    }

    fn contains(&self, point: &Point, epsilon: f64) -> bool {
        self.level_to_distance(self.level(point) - self.radius) <= epsilon
    }

    fn intersect_ray(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let (ax, ay) = (self.x_coef * self.x_coef, self.y_coef * self.y_coef);
        let (o, d) = (ray.origin, ray.direction);
        let a = d.x * d.x / ax + d.y * d.y / ay;
        let b = 2.0 * (o.x * d.x / ax + o.y * d.y / ay);
        let c = o.x * o.x / ax + o.y * o.y / ay - self.radius * self.radius;
        let roots = solve_quadratic_real(a, b, c);
        let distance = first_root_after(&roots, min_distance)?;

        // radial scaling keeps the quadratic form exact
        let hit = ray.point_at(distance);
        let level = self.level(&hit);
        let hit = if level > f64::MIN_POSITIVE {
            Point::from(hit.coords * (self.radius / level))
        } else {
            hit
        };
        Some((distance, hit))
    }

    fn surface_at(&self, point: &Point, epsilon: f64) -> Option<(Vector, BoundaryFeature)> {
        if self.level_to_distance(self.level(point) - self.radius).abs() > epsilon {
            return None;
        }
        let gradient = Vector::new(
            point.x / (self.x_coef * self.x_coef),
            point.y / (self.y_coef * self.y_coef),
        );
        Some((gradient.normalize(), BoundaryFeature::Curve))
    }

    fn residual(&self, point: &Point) -> f64 {
        self.level_to_distance(self.level(point) - self.radius).abs()
    }

    fn outline(&self, samples: usize) -> Vec<Vec<Point>> {
        let (rx, ry) = self.extent();
        let points = (0..=samples)
            .map(|i| {
                let angle = TAU * i as f64 / samples as f64;
                Point::new(rx * angle.cos(), ry * angle.sin())
            })
            .collect();
        vec![points]
    }
}
