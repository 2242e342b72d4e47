//! Seeded random starting states.

use std::f64::consts::PI;

use anyhow::{Result, bail};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::boundary::Boundary;
use crate::config::{InitialStateConfig, to_point, to_vector};
use crate::math::{Vector, VectorExt};
use crate::physics::BallState;

const MAX_ATTEMPTS: usize = 10_000;

/// Sampled positions keep this many table tolerances clear of the boundary.
const INTERIOR_MARGIN: f64 = 1e3;

pub fn rng_from_seed(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Position uniform over the table interior (rejection sampling in the bounding box) and
/// heading uniform in [-π, π), with the given speed.
pub fn sample_interior<R: Rng>(
    boundary: &Boundary,
    speed: f64,
    rng: &mut R,
) -> Result<BallState> {
    if !speed.is_finite() || speed <= 0.0 {
        bail!("initial speed must be positive, got {speed}");
    }
    let (ex, ey) = boundary.extent();
    let margin = boundary.tolerance() * INTERIOR_MARGIN;
    for attempt in 1..=MAX_ATTEMPTS {
        let position = nalgebra::point![rng.random_range(-ex..ex), rng.random_range(-ey..ey)];
        if !boundary.contains_with_margin(&position, margin) {
            continue;
        }
        let heading = rng.random_range(-PI..PI);
        debug!(
            "sampled interior point ({:.6}, {:.6}) after {attempt} attempt(s)",
            position.x, position.y
        );
        return Ok(BallState::new(
            position,
            Vector::new(speed, 0.0).rotated(heading),
        ));
    }
    bail!(
        "no interior point of the {} table found in {MAX_ATTEMPTS} attempts",
        boundary.shape_label()
    )
}

/// Resolve a configured initial state against the table.
pub fn initial_state(config: &InitialStateConfig, boundary: &Boundary) -> Result<BallState> {
    match config {
        InitialStateConfig::Explicit { position, velocity } => {
            Ok(BallState::new(to_point(*position), to_vector(*velocity)))
        }
        InitialStateConfig::Random { seed, speed } => {
            sample_interior(boundary, *speed, &mut rng_from_seed(*seed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{CircleBoundary, ObstacleRectangleBoundary};
    use approx::assert_relative_eq;

    #[test]
    fn same_seed_gives_same_state() {
        let boundary = Boundary::Circle(CircleBoundary::new(1.0).unwrap());
        let a = sample_interior(&boundary, 2.0, &mut rng_from_seed(42)).unwrap();
        let b = sample_interior(&boundary, 2.0, &mut rng_from_seed(42)).unwrap();
        assert_eq!(a, b);
        assert_relative_eq!(a.speed(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn samples_avoid_the_obstacle() {
        let shape = ObstacleRectangleBoundary::new(1.0, 1.0, 0.6, 0.0, 0.0).unwrap();
        let center = shape.hole_center();
        let boundary = Boundary::ObstacleRectangle(shape);
        let mut rng = rng_from_seed(3);
        for _ in 0..200 {
            let state = sample_interior(&boundary, 1.0, &mut rng).unwrap();
            assert!((state.position - center).norm() > 0.6);
            assert!(state.position.x.abs() < 1.0 && state.position.y.abs() < 1.0);
        }
    }

    #[test]
    fn rejects_non_positive_speed() {
        let boundary = Boundary::Circle(CircleBoundary::new(1.0).unwrap());
        assert!(sample_interior(&boundary, 0.0, &mut rng_from_seed(1)).is_err());
    }

    #[test]
    fn explicit_state_is_taken_verbatim() {
        let boundary = Boundary::Circle(CircleBoundary::new(1.0).unwrap());
        let state = initial_state(
            &InitialStateConfig::Explicit {
                position: [0.0, 0.5],
                velocity: [1.0, 1.0],
            },
            &boundary,
        )
        .unwrap();
        assert_eq!(state.position, nalgebra::point![0.0, 0.5]);
        assert_eq!(state.velocity, Vector::new(1.0, 1.0));
    }
}
