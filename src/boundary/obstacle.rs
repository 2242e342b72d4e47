use anyhow::{Result, bail};
use nalgebra::point;

use super::{
    BoundaryFeature, RectangleBoundary, TableShape, circle_outline, require_positive,
    snap_to_circle,
};
use crate::math::{Point, Ray2D, Vector, first_root_after, solve_quadratic_real};

/// Rectangle table with a circular obstacle the ball bounces off from the outside.
///
/// The obstacle normal points from its centre toward the contact point, i.e. back into the
/// playing area.
#[derive(Debug, Clone)]
pub struct ObstacleRectangleBoundary {
    outer: RectangleBoundary,
    hole_center: Point,
    hole_radius: f64,
}

impl ObstacleRectangleBoundary {
    pub fn new(
        half_width: f64,
        half_height: f64,
        hole_radius: f64,
        hole_x: f64,
        hole_y: f64,
    ) -> Result<Self> {
        let outer = RectangleBoundary::new(half_width, half_height)?;
        require_positive("obstacle radius", hole_radius)?;
        if !hole_x.is_finite() || !hole_y.is_finite() {
            bail!("obstacle centre ({hole_x}, {hole_y}) is not finite");
        }
        if hole_x.abs() + hole_radius >= half_width || hole_y.abs() + hole_radius >= half_height {
            bail!(
                "obstacle of radius {hole_radius} at ({hole_x}, {hole_y}) does not fit strictly \
                 inside the {}x{} rectangle",
                2.0 * half_width,
                2.0 * half_height
            );
        }
        Ok(Self {
            outer,
            hole_center: point![hole_x, hole_y],
            hole_radius,
        })
    }

    pub fn hole_center(&self) -> Point {
        self.hole_center
    }

    fn obstacle_hit(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let local = ray.origin - self.hole_center;
        let roots = solve_quadratic_real(
            ray.direction.norm_squared(),
            2.0 * local.dot(&ray.direction),
            local.norm_squared() - self.hole_radius * self.hole_radius,
        );
        let distance = first_root_after(&roots, min_distance)?;
        let hit = snap_to_circle(ray.point_at(distance), self.hole_center, self.hole_radius);
        Some((distance, hit))
    }
}

impl TableShape for ObstacleRectangleBoundary {
    fn shape_label(&self) -> &'static str {
        "obstacle-rectangle"
    }

    fn extent(&self) -> (f64, f64) {
        self.outer.extent()
    }

    fn contains(&self, point: &Point, epsilon: f64) -> bool {
        self.outer.contains(point, epsilon)
            && (point - self.hole_center).norm() >= self.hole_radius - epsilon
    }

    fn intersect_ray(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let wall = self.outer.intersect_ray(ray, min_distance);
        match (self.obstacle_hit(ray, min_distance), wall) {
            (Some(obstacle), Some(wall)) if obstacle.0 < wall.0 => Some(obstacle),
            (Some(obstacle), None) => Some(obstacle),
            (_, wall) => wall,
        }
    }

    fn surface_at(&self, point: &Point, epsilon: f64) -> Option<(Vector, BoundaryFeature)> {
        let offset = point - self.hole_center;
        let norm = offset.norm();
        if (norm - self.hole_radius).abs() <= epsilon {
            return Some((offset / norm, BoundaryFeature::Obstacle));
        }
        self.outer.surface_at(point, epsilon)
    }

    fn residual(&self, point: &Point) -> f64 {
        let obstacle = ((point - self.hole_center).norm() - self.hole_radius).abs();
        obstacle.min(self.outer.residual(point))
    }

    fn outline(&self, samples: usize) -> Vec<Vec<Point>> {
        let mut loops = self.outer.outline(samples);
        loops.push(circle_outline(self.hole_center, self.hole_radius, samples));
        loops
    }
}
