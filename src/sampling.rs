use crate::math::{Point, Vector, wrap_angle};

/// State entering one step of a single-trajectory run.
#[derive(Debug, Clone)]
pub struct TrajectorySample {
    pub step: usize,
    pub position: Point,
    /// `|position|`.
    pub radius: f64,
    /// `arg(position)`.
    pub position_angle: f64,
    /// Signed incidence of the collision that ended the previous step; zero for step 0.
    pub incidence_angle: f64,
    pub velocity: Vector,
    pub speed: f64,
    pub heading: f64,
}

impl TrajectorySample {
    pub fn wrapped_incidence(&self) -> f64 {
        wrap_angle(self.incidence_angle)
    }
}

/// Accumulated path statistics after one bounce of a sweep direction.
#[derive(Debug, Clone)]
pub struct SweepSample {
    pub direction_index: usize,
    /// Bounce index within the direction, starting at 0.
    pub step: usize,
    pub sweep_angle: f64,
    pub path_length: f64,
    pub abs_dx: f64,
    pub abs_dy: f64,
    /// Path length laid out along the sweep angle.
    pub rotated: Vector,
}

/// Positions of two balls entering one step of a divergence run.
#[derive(Debug, Clone)]
pub struct DivergenceSample {
    pub step: usize,
    pub first: Point,
    pub second: Point,
    pub first_angle: f64,
    pub second_angle: f64,
    /// `|first_angle - second_angle|`.
    pub divergence: f64,
}

/// Samples produced by one run.
#[derive(Debug, Clone)]
pub enum SampleSet {
    Trajectory(Vec<TrajectorySample>),
    Sweep(Vec<SweepSample>),
    Divergence(Vec<DivergenceSample>),
}

impl SampleSet {
    pub fn len(&self) -> usize {
        match self {
            Self::Trajectory(samples) => samples.len(),
            Self::Sweep(samples) => samples.len(),
            Self::Divergence(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode_label(&self) -> &'static str {
        match self {
            Self::Trajectory(_) => "single",
            Self::Sweep(_) => "sweep",
            Self::Divergence(_) => "divergence",
        }
    }
}

/// Utility for dynamic range tracking.
#[derive(Debug, Clone, Copy)]
pub struct RangeExt {
    pub min: f64,
    pub max: f64,
}

impl Default for RangeExt {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl RangeExt {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut range = Self::default();
        for value in values {
            range.record(value);
        }
        range
    }

    pub fn record(&mut self, value: f64) {
        if value.is_finite() {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Range padded by 10% of its span, falling back to `±fallback` when nothing was recorded.
    pub fn padded(&self, fallback: f64) -> (f64, f64) {
        if self.is_empty() {
            return (-fallback, fallback);
        }
        let span = (self.max - self.min).max(fallback * 0.1);
        let center = (self.max + self.min) / 2.0;
        let half_span = span * 0.6;
        (center - half_span, center + half_span)
    }
}
