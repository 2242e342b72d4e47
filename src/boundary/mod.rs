//! Billiard table geometry.
//!
//! Every table is centred on the origin. A [`Boundary`] answers two questions: where does a
//! ray starting inside the table first leave it ([`Boundary::next_collision`]) and what does
//! a velocity look like after an elastic bounce at a boundary point ([`Boundary::reflect`]).

mod circle;
mod ellipse;
mod obstacle;
mod rectangle;
mod stadium;

use std::fmt;

use anyhow::Result;

pub use circle::CircleBoundary;
pub use ellipse::EllipseBoundary;
pub use obstacle::ObstacleRectangleBoundary;
pub use rectangle::RectangleBoundary;
pub use stadium::StadiumBoundary;

use crate::config::BoundaryConfig;
use crate::math::{GEOMETRY_EPS, Point, Ray2D, Vector, reflect_across, signed_angle, wrap_angle};

/// Geometric faults raised by boundary queries. None of them is recoverable by retrying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryError {
    /// The ray origin lies strictly outside the table.
    OutOfBounds { point: Point },
    /// Zero direction, or no forward intersection with any piece of the boundary.
    DegenerateRay { origin: Point, direction: Vector },
    /// A point handed to `reflect` is not on any piece of the boundary.
    NotOnBoundary { point: Point },
}

impl fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { point } => {
                write!(f, "position ({}, {}) is outside the table", point.x, point.y)
            }
            Self::DegenerateRay { origin, direction } => write!(
                f,
                "ray from ({}, {}) along ({}, {}) has no forward intersection with the table",
                origin.x, origin.y, direction.x, direction.y
            ),
            Self::NotOnBoundary { point } => write!(
                f,
                "point ({}, {}) does not lie on the table boundary",
                point.x, point.y
            ),
        }
    }
}

impl std::error::Error for BoundaryError {}

/// Side of an axis-aligned piece, named by its outward direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

impl Side {
    fn outward(self) -> Vector {
        match self {
            Side::Left => Vector::new(-1.0, 0.0),
            Side::Right => Vector::new(1.0, 0.0),
            Side::Bottom => Vector::new(0.0, -1.0),
            Side::Top => Vector::new(0.0, 1.0),
        }
    }
}

/// Boundary piece a point was recognised on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryFeature {
    /// Smooth closed curve (circle, ellipse).
    Curve,
    /// Flat edge or stadium segment.
    Edge(Side),
    /// Rectangle corner, left/right side first.
    Corner(Side, Side),
    /// Stadium semicircle.
    Cap(Side),
    /// Circular obstacle inside the obstacle rectangle.
    Obstacle,
}

/// Result of [`Boundary::next_collision`].
#[derive(Debug, Clone)]
pub struct Collision {
    /// Euclidean distance from the ray origin.
    pub distance: f64,
    pub point: Point,
    pub feature: BoundaryFeature,
}

/// Result of [`Boundary::reflect`].
#[derive(Debug, Clone)]
pub struct Reflection {
    /// Signed angle from the piece normal to the incoming velocity, in (-π, π].
    pub incidence_angle: f64,
    pub normal: Vector,
    pub feature: BoundaryFeature,
    pub velocity: Vector,
}

impl Reflection {
    /// Incidence angle reduced into [0, 2π) for reporting.
    pub fn wrapped_incidence(&self) -> f64 {
        wrap_angle(self.incidence_angle)
    }
}

/// Per-shape geometry. `epsilon` is an absolute distance tolerance; `contains` also accepts a
/// negative value to ask for a point strictly inside by that margin.
pub(crate) trait TableShape {
    fn shape_label(&self) -> &'static str;
    /// Half extents of the axis-aligned bounding box.
    fn extent(&self) -> (f64, f64);
    fn contains(&self, point: &Point, epsilon: f64) -> bool;
    /// Nearest hit further than `min_distance` along the (unit-direction) ray.
    fn intersect_ray(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)>;
    /// Unit normal and piece for a point on the boundary.
    fn surface_at(&self, point: &Point, epsilon: f64) -> Option<(Vector, BoundaryFeature)>;
    /// Distance-like gap between `point` and the nearest boundary piece; zero on the boundary.
    fn residual(&self, point: &Point) -> f64;
    /// Closed polylines tracing the boundary.
    fn outline(&self, samples: usize) -> Vec<Vec<Point>>;
}

/// One of the five supported tables.
#[derive(Debug, Clone)]
pub enum Boundary {
    Circle(CircleBoundary),
    Ellipse(EllipseBoundary),
    Rectangle(RectangleBoundary),
    Stadium(StadiumBoundary),
    ObstacleRectangle(ObstacleRectangleBoundary),
}

macro_rules! with_shape {
    ($boundary:expr, $shape:ident => $body:expr) => {
        match $boundary {
            Boundary::Circle($shape) => $body,
            Boundary::Ellipse($shape) => $body,
            Boundary::Rectangle($shape) => $body,
            Boundary::Stadium($shape) => $body,
            Boundary::ObstacleRectangle($shape) => $body,
        }
    };
}

pub fn build_boundary(config: &BoundaryConfig) -> Result<Boundary> {
    let boundary = match config {
        BoundaryConfig::Circle { radius } => Boundary::Circle(CircleBoundary::new(*radius)?),
        BoundaryConfig::Ellipse {
            radius,
            x_coef,
            y_coef,
        } => Boundary::Ellipse(EllipseBoundary::new(*radius, *x_coef, *y_coef)?),
        BoundaryConfig::Rectangle {
            half_width,
            half_height,
        } => Boundary::Rectangle(RectangleBoundary::new(*half_width, *half_height)?),
        BoundaryConfig::Stadium {
            half_length,
            half_width,
        } => Boundary::Stadium(StadiumBoundary::new(*half_length, *half_width)?),
        BoundaryConfig::ObstacleRectangle {
            half_width,
            half_height,
            hole_radius,
            hole_x,
            hole_y,
        } => Boundary::ObstacleRectangle(ObstacleRectangleBoundary::new(
            *half_width,
            *half_height,
            *hole_radius,
            *hole_x,
            *hole_y,
        )?),
    };
    Ok(boundary)
}

impl Boundary {
    pub fn shape_label(&self) -> &'static str {
        with_shape!(self, shape => shape.shape_label())
    }

    pub fn extent(&self) -> (f64, f64) {
        with_shape!(self, shape => shape.extent())
    }

    pub fn bounding_radius(&self) -> f64 {
        let (x, y) = self.extent();
        x.hypot(y)
    }

    /// Absolute membership tolerance, scaled to the table size.
    pub fn tolerance(&self) -> f64 {
        let (x, y) = self.extent();
        GEOMETRY_EPS * x.max(y)
    }

    /// How far `point` sits off the boundary, in table units.
    pub fn residual(&self, point: &Point) -> f64 {
        with_shape!(self, shape => shape.residual(point))
    }

    /// Inside or on the boundary, within tolerance.
    pub fn contains(&self, point: &Point) -> bool {
        let epsilon = self.tolerance();
        with_shape!(self, shape => shape.contains(point, epsilon))
    }

    /// Inside and at least `margin` away from every piece of the boundary.
    pub fn contains_with_margin(&self, point: &Point, margin: f64) -> bool {
        with_shape!(self, shape => shape.contains(point, -margin.abs()))
    }

    pub fn outline(&self, samples: usize) -> Vec<Vec<Point>> {
        with_shape!(self, shape => shape.outline(samples.max(8)))
    }

    /// First point where the ray `origin + t * direction`, `t > 0`, meets the boundary.
    pub fn next_collision(
        &self,
        origin: &Point,
        direction: &Vector,
    ) -> Result<Collision, BoundaryError> {
        let epsilon = self.tolerance();
        if !with_shape!(self, shape => shape.contains(origin, epsilon)) {
            return Err(BoundaryError::OutOfBounds { point: *origin });
        }
        let degenerate = BoundaryError::DegenerateRay {
            origin: *origin,
            direction: *direction,
        };
        let ray = Ray2D::new(*origin, *direction).ok_or(degenerate)?;
        let (distance, point) =
            with_shape!(self, shape => shape.intersect_ray(&ray, epsilon)).ok_or(degenerate)?;
        let (_, feature) = with_shape!(self, shape => shape.surface_at(&point, epsilon))
            .ok_or(BoundaryError::NotOnBoundary { point })?;
        Ok(Collision {
            distance,
            point,
            feature,
        })
    }

    /// Elastic bounce of `incoming` at a boundary point.
    pub fn reflect(&self, point: &Point, incoming: &Vector) -> Result<Reflection, BoundaryError> {
        if incoming.norm_squared() <= f64::MIN_POSITIVE {
            return Err(BoundaryError::DegenerateRay {
                origin: *point,
                direction: *incoming,
            });
        }
        let epsilon = self.tolerance();
        let (normal, feature) = with_shape!(self, shape => shape.surface_at(point, epsilon))
            .ok_or(BoundaryError::NotOnBoundary { point: *point })?;
        Ok(Reflection {
            incidence_angle: signed_angle(&normal, incoming),
            normal,
            feature,
            velocity: reflect_across(incoming, &normal),
        })
    }
}

/// Points on a circle, first point repeated at the end.
pub(crate) fn circle_outline(center: Point, radius: f64, samples: usize) -> Vec<Point> {
    (0..=samples)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / samples as f64;
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Scale `point` about `center` so that it sits exactly at `radius`.
pub(crate) fn snap_to_circle(point: Point, center: Point, radius: f64) -> Point {
    let offset = point - center;
    let norm = offset.norm();
    if norm <= f64::MIN_POSITIVE {
        return point;
    }
    center + offset * (radius / norm)
}

pub(crate) fn require_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(anyhow::anyhow!("{name} must be positive, got {value}"));
    }
    Ok(())
}
