use anyhow::Result;
use nalgebra::point;

use super::{BoundaryFeature, Side, TableShape, require_positive};
use crate::math::{Point, Ray2D, Vector};

/// Axis-aligned box `|x| <= half_width`, `|y| <= half_height`.
///
/// A point within tolerance of two edges is a corner. Corners reflect off the normalised
/// bisector of the two edge normals, which sends a head-on hit straight back and otherwise
/// maps `(vx, vy)` to `(-vy, -vx)` in the corner's frame, so the ball always leaves both
/// walls.
#[derive(Debug, Clone)]
pub struct RectangleBoundary {
    half_width: f64,
    half_height: f64,
}

impl RectangleBoundary {
    pub fn new(half_width: f64, half_height: f64) -> Result<Self> {
        require_positive("rectangle half width", half_width)?;
        require_positive("rectangle half height", half_height)?;
        Ok(Self {
            half_width,
            half_height,
        })
    }
}

impl TableShape for RectangleBoundary {
    fn shape_label(&self) -> &'static str {
        "rectangle"
    }

    fn extent(&self) -> (f64, f64) {
        (self.half_width, self.half_height)
    }

    fn contains(&self, point: &Point, epsilon: f64) -> bool {
        point.x.abs() <= self.half_width + epsilon && point.y.abs() <= self.half_height + epsilon
    }

    fn intersect_ray(&self, ray: &Ray2D, min_distance: f64) -> Option<(f64, Point)> {
        let (o, d) = (ray.origin, ray.direction);
        let (hw, hh) = (self.half_width, self.half_height);
        let mut best: Option<(f64, Point)> = None;

        // only the edge the velocity points at on each axis can be reached
        if d.x != 0.0 {
            let x = hw.copysign(d.x);
            let distance = (x - o.x) / d.x;
            let y = o.y + distance * d.y;
            if distance > min_distance && y.abs() <= hh + min_distance {
                best = Some((distance, point![x, snap_to_edge(y, hh, min_distance)]));
            }
        }
        if d.y != 0.0 {
            let y = hh.copysign(d.y);
            let distance = (y - o.y) / d.y;
            let x = o.x + distance * d.x;
            if distance > min_distance
                && x.abs() <= hw + min_distance
                && best.as_ref().map(|hit| distance < hit.0).unwrap_or(true)
            {
                best = Some((distance, point![snap_to_edge(x, hw, min_distance), y]));
            }
        }
        best
    }

    fn surface_at(&self, point: &Point, epsilon: f64) -> Option<(Vector, BoundaryFeature)> {
        let (hw, hh) = (self.half_width, self.half_height);
        let on_vertical = (point.x.abs() - hw).abs() <= epsilon && point.y.abs() <= hh + epsilon;
        let on_horizontal = (point.y.abs() - hh).abs() <= epsilon && point.x.abs() <= hw + epsilon;
        let x_side = if point.x > 0.0 { Side::Right } else { Side::Left };
        let y_side = if point.y > 0.0 { Side::Top } else { Side::Bottom };

        match (on_vertical, on_horizontal) {
            (true, true) => {
                let bisector = (x_side.outward() + y_side.outward()).normalize();
                Some((bisector, BoundaryFeature::Corner(x_side, y_side)))
            }
            (true, false) => Some((x_side.outward(), BoundaryFeature::Edge(x_side))),
            (false, true) => Some((y_side.outward(), BoundaryFeature::Edge(y_side))),
            (false, false) => None,
        }
    }

    fn residual(&self, point: &Point) -> f64 {
        let gap_x = (point.x.abs() - self.half_width).abs();
        let gap_y = (point.y.abs() - self.half_height).abs();
        gap_x.min(gap_y)
    }

    fn outline(&self, _samples: usize) -> Vec<Vec<Point>> {
        let (hw, hh) = (self.half_width, self.half_height);
        vec![vec![
            point![-hw, -hh],
            point![hw, -hh],
            point![hw, hh],
            point![-hw, hh],
            point![-hw, -hh],
        ]]
    }
}

/// Clamp a coordinate into `[-half, half]`, pulling values within `epsilon` of an end onto it
/// so that corner hits land exactly on the corner.
fn snap_to_edge(value: f64, half: f64, epsilon: f64) -> f64 {
    if (value.abs() - half).abs() <= epsilon {
        half.copysign(value)
    } else {
        value.clamp(-half, half)
    }
}
