use crate::boundary::{Boundary, BoundaryError, Collision, Reflection};
use crate::math::{Point, Vector, VectorExt};

/// Dynamical state of the billiard ball.
#[derive(Debug, Clone, PartialEq)]
pub struct BallState {
    pub position: Point,
    pub velocity: Vector,
    pub bounce_id: u64,
}

/// One collide/reflect step: where the ball hit and how it left.
#[derive(Debug, Clone)]
pub struct Bounce {
    pub start: Point,
    pub collision: Collision,
    pub reflection: Reflection,
}

impl Bounce {
    pub fn displacement(&self) -> Vector {
        self.collision.point - self.start
    }
}

impl BallState {
    pub fn new(position: Point, velocity: Vector) -> Self {
        Self {
            position,
            velocity,
            bounce_id: 0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    pub fn heading(&self) -> f64 {
        self.velocity.arg()
    }

    /// Angle of the position vector about the table centre.
    pub fn polar_angle(&self) -> f64 {
        self.position.coords.arg()
    }

    /// Move to the next collision and take the reflected velocity. The state is untouched
    /// when the boundary rejects the step.
    pub fn bounce(&mut self, boundary: &Boundary) -> Result<Bounce, BoundaryError> {
        let collision = boundary.next_collision(&self.position, &self.velocity)?;
        let reflection = boundary.reflect(&collision.point, &self.velocity)?;
        let start = self.position;
        self.position = collision.point;
        self.velocity = reflection.velocity;
        self.bounce_id += 1;
        Ok(Bounce {
            start,
            collision,
            reflection,
        })
    }
}
