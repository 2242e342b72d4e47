use std::f64::consts::{PI, TAU};

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;

use crate::analysis::{BoxCountingResult, box_counting};
use crate::boundary::{self, Boundary};
use crate::config::{RunConfig, SimulationConfig, to_point};
use crate::initial::initial_state;
use crate::math::{Point, Vector, VectorExt};
use crate::physics::BallState;
use crate::sampling::{DivergenceSample, SampleSet, SweepSample, TrajectorySample};

/// Samples of a finished run plus the derived box-counting estimate for sweeps.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub samples: SampleSet,
    pub dimension: Option<BoxCountingResult>,
}

/// Drives collide/reflect steps over one immutable table.
#[derive(Debug, Clone)]
pub struct TrajectorySimulator {
    boundary: Boundary,
}

impl TrajectorySimulator {
    pub fn new(boundary: Boundary) -> Self {
        Self { boundary }
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let boundary = boundary::build_boundary(&config.boundary)?;
        Ok(Self::new(boundary))
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Run whichever mode `run` describes.
    pub fn run(&self, run: &RunConfig) -> Result<RunOutput> {
        let output = match run {
            RunConfig::Single { steps, initial } => {
                let ball = initial_state(initial, &self.boundary)
                    .context("failed to build the initial state")?;
                RunOutput {
                    samples: SampleSet::Trajectory(self.run_single(ball, *steps)?),
                    dimension: None,
                }
            }
            RunConfig::Sweep {
                position,
                speed,
                direction_count,
                bounces_per_direction,
                dimension,
            } => {
                let samples = self.run_sweep(
                    to_point(*position),
                    *speed,
                    *direction_count,
                    *bounces_per_direction,
                )?;
                let dimension = dimension.as_ref().map(|config| {
                    let points: Vec<Point> =
                        samples.iter().map(|s| Point::from(s.rotated)).collect();
                    box_counting(&points, config)
                });
                RunOutput {
                    samples: SampleSet::Sweep(samples),
                    dimension,
                }
            }
            RunConfig::Divergence {
                steps,
                first,
                second,
            } => {
                let first = initial_state(first, &self.boundary)
                    .context("failed to build the first initial state")?;
                let second = initial_state(second, &self.boundary)
                    .context("failed to build the second initial state")?;
                RunOutput {
                    samples: SampleSet::Divergence(self.run_divergence(first, second, *steps)?),
                    dimension: None,
                }
            }
        };
        Ok(output)
    }

    /// One sample per step describing the state entering that step.
    pub fn run_single(&self, mut ball: BallState, steps: usize) -> Result<Vec<TrajectorySample>> {
        info!(
            "single run on {} table: {steps} steps from ({:.6}, {:.6})",
            self.boundary.shape_label(),
            ball.position.x,
            ball.position.y
        );
        let mut samples = Vec::with_capacity(steps);
        let mut incidence = 0.0;
        for step in 0..steps {
            samples.push(TrajectorySample {
                step,
                position: ball.position,
                radius: ball.position.coords.norm(),
                position_angle: ball.polar_angle(),
                incidence_angle: incidence,
                velocity: ball.velocity,
                speed: ball.speed(),
                heading: ball.heading(),
            });
            let bounce = ball
                .bounce(&self.boundary)
                .with_context(|| format!("single run failed at step {step}"))?;
            incidence = bounce.reflection.incidence_angle;
        }
        debug!("single run finished after {} bounces", ball.bounce_id);
        Ok(samples)
    }

    /// Restart from `position` in `direction_count` evenly spaced directions and accumulate
    /// path statistics over `bounces_per_direction` bounces each. Directions are evaluated in
    /// parallel; samples come back direction-major.
    pub fn run_sweep(
        &self,
        position: Point,
        speed: f64,
        direction_count: usize,
        bounces_per_direction: usize,
    ) -> Result<Vec<SweepSample>> {
        info!(
            "sweep on {} table from ({:.6}, {:.6}): {direction_count} directions x {bounces_per_direction} bounces",
            self.boundary.shape_label(),
            position.x,
            position.y
        );
        let per_direction = (0..direction_count)
            .into_par_iter()
            .map(|index| {
                let angle = sweep_angle(index, direction_count);
                self.sweep_direction(position, speed, index, angle, bounces_per_direction)
                    .with_context(|| {
                        format!("sweep failed for direction {index} (angle {angle:.6})")
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(per_direction.into_iter().flatten().collect())
    }

    fn sweep_direction(
        &self,
        position: Point,
        speed: f64,
        direction_index: usize,
        angle: f64,
        bounces: usize,
    ) -> Result<Vec<SweepSample>> {
        let mut ball = BallState::new(position, Vector::new(speed, 0.0).rotated(angle));
        let (mut path_length, mut abs_dx, mut abs_dy) = (0.0, 0.0, 0.0);
        let mut samples = Vec::with_capacity(bounces);
        for step in 0..bounces {
            let bounce = ball
                .bounce(&self.boundary)
                .with_context(|| format!("bounce {step}"))?;
            let displacement = bounce.displacement();
            path_length += bounce.collision.distance;
            abs_dx += displacement.x.abs();
            abs_dy += displacement.y.abs();
            samples.push(SweepSample {
                direction_index,
                step,
                sweep_angle: angle,
                path_length,
                abs_dx,
                abs_dy,
                rotated: Vector::new(path_length, 0.0).rotated(angle),
            });
        }
        Ok(samples)
    }

    /// Advance two balls in lockstep, recording both positions entering each step.
    pub fn run_divergence(
        &self,
        mut first: BallState,
        mut second: BallState,
        steps: usize,
    ) -> Result<Vec<DivergenceSample>> {
        info!(
            "divergence run on {} table: {steps} steps, initial separation {:.3e}",
            self.boundary.shape_label(),
            (first.position - second.position).norm()
        );
        let mut samples = Vec::with_capacity(steps);
        for step in 0..steps {
            let (first_angle, second_angle) = (first.polar_angle(), second.polar_angle());
            samples.push(DivergenceSample {
                step,
                first: first.position,
                second: second.position,
                first_angle,
                second_angle,
                divergence: (first_angle - second_angle).abs(),
            });
            first.bounce(&self.boundary).with_context(|| {
                format!("divergence run failed for the first ball at step {step}")
            })?;
            second.bounce(&self.boundary).with_context(|| {
                format!("divergence run failed for the second ball at step {step}")
            })?;
        }
        Ok(samples)
    }
}

/// `-π + 2πk / count`.
pub fn sweep_angle(index: usize, count: usize) -> f64 {
    -PI + TAU * index as f64 / count as f64
}
