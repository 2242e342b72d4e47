use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use nalgebra::point;
use serde::Deserialize;

use crate::boundary::build_boundary;
use crate::math::{Point, Vector};

/// Load and validate run configuration from a TOML file.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        let sim = SimulationConfig::from_toml_str(&raw)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        let output_dir = sim
            .output
            .resolve_output_dir()
            .context("output directory validation failed")?;

        Ok(AppConfig {
            source_path: path.to_path_buf(),
            simulation: sim,
            resolved_output_dir: output_dir,
        })
    }
}

/// Parsed configuration together with derived paths.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source_path: PathBuf,
    pub simulation: SimulationConfig,
    pub resolved_output_dir: PathBuf,
}

impl AppConfig {
    /// Human friendly description of key configuration choices.
    pub fn summary_lines(&self) -> Vec<String> {
        let boundary = format!("boundary: {}", self.simulation.boundary.describe());
        let run = match &self.simulation.run {
            RunConfig::Single { steps, initial } => {
                format!("mode: single, {steps} steps from {}", initial.describe())
            }
            RunConfig::Sweep {
                position,
                speed,
                direction_count,
                bounces_per_direction,
                dimension,
            } => format!(
                "mode: sweep from ({}, {}) at speed {speed}, {direction_count} directions x {bounces_per_direction} bounces{}",
                position[0],
                position[1],
                if dimension.is_some() {
                    ", box-counting enabled"
                } else {
                    ""
                }
            ),
            RunConfig::Divergence {
                steps,
                first,
                second,
            } => format!(
                "mode: divergence, {steps} steps; first {}; second {}",
                first.describe(),
                second.describe()
            ),
        };
        let outputs = format!(
            "output dir: {} (csv={}, json={}, png={}, svg={})",
            self.resolved_output_dir.display(),
            self.simulation.output.export_csv,
            self.simulation.output.export_json,
            self.simulation.output.export_png,
            self.simulation.output.export_svg
        );

        vec![boundary, run, outputs]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BoundaryConfig {
    Circle {
        radius: f64,
    },
    Ellipse {
        radius: f64,
        x_coef: f64,
        y_coef: f64,
    },
    Rectangle {
        half_width: f64,
        half_height: f64,
    },
    Stadium {
        half_length: f64,
        half_width: f64,
    },
    ObstacleRectangle {
        half_width: f64,
        half_height: f64,
        hole_radius: f64,
        hole_x: f64,
        hole_y: f64,
    },
}

impl BoundaryConfig {
    fn describe(&self) -> String {
        match self {
            Self::Circle { radius } => format!("circle r={radius}"),
            Self::Ellipse {
                radius,
                x_coef,
                y_coef,
            } => format!("ellipse r={radius}, x_coef={x_coef}, y_coef={y_coef}"),
            Self::Rectangle {
                half_width,
                half_height,
            } => format!("rectangle {half_width} x {half_height} (half extents)"),
            Self::Stadium {
                half_length,
                half_width,
            } => format!("stadium half_length={half_length}, half_width={half_width}"),
            Self::ObstacleRectangle {
                half_width,
                half_height,
                hole_radius,
                hole_x,
                hole_y,
            } => format!(
                "rectangle {half_width} x {half_height} with obstacle r={hole_radius} at ({hole_x}, {hole_y})"
            ),
        }
    }
}

/// Starting state of one ball.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InitialStateConfig {
    Explicit {
        position: [f64; 2],
        velocity: [f64; 2],
    },
    /// Uniform interior position and heading drawn from a seeded generator.
    Random {
        seed: u64,
        #[serde(default = "default_speed")]
        speed: f64,
    },
}

impl InitialStateConfig {
    fn describe(&self) -> String {
        match self {
            Self::Explicit { position, velocity } => format!(
                "pos=({}, {}), vel=({}, {})",
                position[0], position[1], velocity[0], velocity[1]
            ),
            Self::Random { seed, speed } => format!("random state (seed={seed}, speed={speed})"),
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        match self {
            Self::Explicit { position, velocity } => {
                if !position.iter().chain(velocity).all(|v| v.is_finite()) {
                    bail!("{label} initial state must be finite");
                }
                let [vx, vy] = *velocity;
                if vx.hypot(vy) <= f64::MIN_POSITIVE {
                    bail!(
                        "{label} initial velocity magnitude must be positive; received ({vx}, {vy})"
                    );
                }
            }
            Self::Random { speed, .. } => {
                if !speed.is_finite() || *speed <= 0.0 {
                    bail!("{label} random initial speed must be positive, got {speed}");
                }
            }
        }
        Ok(())
    }
}

/// Box-counting settings for sweep runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DimensionConfig {
    /// Half side of the counted square `[-max_extent, max_extent]²`.
    pub max_extent: f64,
    pub max_divisions: usize,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            max_extent: 60.0,
            max_divisions: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum RunConfig {
    Single {
        steps: usize,
        initial: InitialStateConfig,
    },
    Sweep {
        position: [f64; 2],
        #[serde(default = "default_speed")]
        speed: f64,
        direction_count: usize,
        #[serde(default = "default_bounces_per_direction")]
        bounces_per_direction: usize,
        #[serde(default)]
        dimension: Option<DimensionConfig>,
    },
    Divergence {
        steps: usize,
        first: InitialStateConfig,
        second: InitialStateConfig,
    },
}

impl RunConfig {
    pub fn mode_label(&self) -> &'static str {
        match self {
            Self::Single { .. } => "single",
            Self::Sweep { .. } => "sweep",
            Self::Divergence { .. } => "divergence",
        }
    }
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_bounces_per_direction() -> usize {
    30
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width_px: u32,
    pub height_px: u32,
    pub line_width: f64,
    /// Points per closed curve when tracing the table outline.
    pub outline_samples: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width_px: 1200,
            height_px: 900,
            line_width: 2.0,
            outline_samples: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub base_name: String,
    pub export_csv: bool,
    pub export_json: bool,
    pub export_png: bool,
    pub export_svg: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            base_name: "billiard".to_string(),
            export_csv: true,
            export_json: true,
            export_png: true,
            export_svg: true,
        }
    }
}

impl OutputConfig {
    /// Relative directories are placed under the project `output/` folder; anything that
    /// would escape it is rejected.
    fn resolve_output_dir(&self) -> Result<PathBuf> {
        if self.base_name.trim().is_empty() {
            bail!("output base name must not be empty");
        }
        if self.directory.is_absolute() {
            bail!(
                "output directory must be relative to the project 'output' folder; got {}",
                self.directory.display()
            );
        }

        let mut sanitized = PathBuf::new();
        for component in self.directory.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => sanitized.push(part),
                Component::ParentDir => {
                    return Err(anyhow!(
                        "output directory cannot contain parent references ('..'): {}",
                        self.directory.display()
                    ));
                }
                Component::Prefix(_) | Component::RootDir => {
                    return Err(anyhow!(
                        "unexpected path prefix in output directory: {}",
                        self.directory.display()
                    ));
                }
            }
        }

        let under_output = sanitized
            .components()
            .next()
            .is_some_and(|first| first.as_os_str() == OsStr::new("output"));
        Ok(if under_output {
            sanitized
        } else if sanitized.as_os_str().is_empty() {
            PathBuf::from("output")
        } else {
            PathBuf::from("output").join(sanitized)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub boundary: BoundaryConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let sim: SimulationConfig =
            toml::from_str(raw).context("failed to parse configuration")?;
        sim.validate()?;
        Ok(sim)
    }

    pub fn validate(&self) -> Result<()> {
        build_boundary(&self.boundary).context("invalid boundary")?;
        self.validate_run()?;
        self.validate_plot()?;
        Ok(())
    }

    fn validate_run(&self) -> Result<()> {
        match &self.run {
            RunConfig::Single { steps, initial } => {
                require_count("single run steps", *steps)?;
                initial.validate("single run")?;
            }
            RunConfig::Sweep {
                position,
                speed,
                direction_count,
                bounces_per_direction,
                dimension,
            } => {
                if !position.iter().all(|v| v.is_finite()) {
                    bail!("sweep position must be finite");
                }
                if !speed.is_finite() || *speed <= 0.0 {
                    bail!("sweep speed must be positive, got {speed}");
                }
                require_count("sweep direction count", *direction_count)?;
                require_count("sweep bounces per direction", *bounces_per_direction)?;
                if let Some(dimension) = dimension {
                    if !dimension.max_extent.is_finite() || dimension.max_extent <= 0.0 {
                        bail!(
                            "box-counting extent must be positive, got {}",
                            dimension.max_extent
                        );
                    }
                    if dimension.max_divisions < 2 {
                        bail!(
                            "box-counting needs at least 2 grid levels, got {}",
                            dimension.max_divisions
                        );
                    }
                }
            }
            RunConfig::Divergence {
                steps,
                first,
                second,
            } => {
                require_count("divergence run steps", *steps)?;
                first.validate("first divergence")?;
                second.validate("second divergence")?;
            }
        }
        Ok(())
    }

    fn validate_plot(&self) -> Result<()> {
        if self.plot.width_px == 0 || self.plot.height_px == 0 {
            bail!(
                "plot dimensions must be positive, got {}x{}",
                self.plot.width_px,
                self.plot.height_px
            );
        }
        if !self.plot.line_width.is_finite() || self.plot.line_width <= 0.0 {
            bail!("plot line width must be positive, got {}", self.plot.line_width);
        }
        Ok(())
    }
}

fn require_count(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        bail!("{name} must be at least 1");
    }
    Ok(())
}

pub fn to_point(raw: [f64; 2]) -> Point {
    point![raw[0], raw[1]]
}

pub fn to_vector(raw: [f64; 2]) -> Vector {
    Vector::new(raw[0], raw[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"
        [boundary]
        type = "circle"
        radius = 1.0

        [run]
        mode = "single"
        steps = 50

        [run.initial]
        kind = "explicit"
        position = [0.0, 0.5]
        velocity = [1.0, 1.0]
    "#;

    #[test]
    fn parses_single_run_with_defaults() {
        let sim = SimulationConfig::from_toml_str(SINGLE).unwrap();
        assert_eq!(sim.boundary, BoundaryConfig::Circle { radius: 1.0 });
        assert_eq!(sim.run.mode_label(), "single");
        assert_eq!(sim.plot, PlotConfig::default());
        assert_eq!(sim.output.base_name, "billiard");
        assert!(sim.output.export_json);
    }

    #[test]
    fn parses_sweep_defaults_and_dimension() {
        let raw = r#"
            [boundary]
            type = "obstacle-rectangle"
            half_width = 2.0
            half_height = 1.0
            hole_radius = 0.25
            hole_x = 0.5
            hole_y = 0.0

            [run]
            mode = "sweep"
            position = [-1.0, 0.0]
            direction_count = 360

            [run.dimension]
            max_divisions = 8
        "#;
        let sim = SimulationConfig::from_toml_str(raw).unwrap();
        match sim.run {
            RunConfig::Sweep {
                speed,
                bounces_per_direction,
                dimension,
                ..
            } => {
                assert_eq!(speed, 1.0);
                assert_eq!(bounces_per_direction, 30);
                let dimension = dimension.unwrap();
                assert_eq!(dimension.max_extent, 60.0);
                assert_eq!(dimension.max_divisions, 8);
            }
            other => panic!("unexpected run config {other:?}"),
        }
    }

    #[test]
    fn parses_random_initial_states() {
        let raw = r#"
            [boundary]
            type = "stadium"
            half_length = 1.0
            half_width = 0.5

            [run]
            mode = "divergence"
            steps = 10
            first = { kind = "random", seed = 7 }
            second = { kind = "explicit", position = [0.1, 0.0], velocity = [0.0, 1.0] }
        "#;
        let sim = SimulationConfig::from_toml_str(raw).unwrap();
        let RunConfig::Divergence { first, .. } = sim.run else {
            panic!("expected divergence run");
        };
        assert_eq!(
            first,
            InitialStateConfig::Random {
                seed: 7,
                speed: 1.0
            }
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let zero_radius = SINGLE.replace("radius = 1.0", "radius = 0.0");
        assert!(SimulationConfig::from_toml_str(&zero_radius).is_err());

        let zero_steps = SINGLE.replace("steps = 50", "steps = 0");
        assert!(SimulationConfig::from_toml_str(&zero_steps).is_err());

        let zero_velocity = SINGLE.replace("velocity = [1.0, 1.0]", "velocity = [0.0, 0.0]");
        assert!(SimulationConfig::from_toml_str(&zero_velocity).is_err());

        let unknown_shape = SINGLE.replace("\"circle\"", "\"polygon\"");
        assert!(SimulationConfig::from_toml_str(&unknown_shape).is_err());
    }

    #[test]
    fn rejects_obstacle_outside_rectangle() {
        let raw = r#"
            [boundary]
            type = "obstacle-rectangle"
            half_width = 1.0
            half_height = 1.0
            hole_radius = 0.5
            hole_x = 0.8
            hole_y = 0.0

            [run]
            mode = "sweep"
            position = [-0.5, 0.0]
            direction_count = 4
        "#;
        assert!(SimulationConfig::from_toml_str(raw).is_err());
    }

    #[test]
    fn output_dir_stays_under_output() {
        let mut output = OutputConfig::default();
        assert_eq!(output.resolve_output_dir().unwrap(), PathBuf::from("output"));

        output.directory = PathBuf::from("runs/circle");
        assert_eq!(
            output.resolve_output_dir().unwrap(),
            PathBuf::from("output/runs/circle")
        );

        output.directory = PathBuf::from("./output/stadium");
        assert_eq!(
            output.resolve_output_dir().unwrap(),
            PathBuf::from("output/stadium")
        );

        output.directory = PathBuf::from("../elsewhere");
        assert!(output.resolve_output_dir().is_err());

        output.directory = PathBuf::from("/tmp/billiard");
        assert!(output.resolve_output_dir().is_err());
    }
}
