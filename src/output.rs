use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::analysis::BoxCountingResult;
use crate::boundary::Boundary;
use crate::config::{OutputConfig, PlotConfig};
use crate::render;
use crate::sampling::{DivergenceSample, SampleSet, SweepSample, TrajectorySample};
use crate::simulation::RunOutput;

pub struct OutputBundle<'a> {
    pub run: &'a RunOutput,
    pub boundary: &'a Boundary,
    pub plot: &'a PlotConfig,
    pub output: &'a OutputConfig,
    pub output_dir: &'a Path,
}

impl<'a> OutputBundle<'a> {
    pub fn write_csv(&self) -> Result<Vec<PathBuf>> {
        if !self.output.export_csv {
            return Ok(Vec::new());
        }
        self.ensure_output_dir()?;

        let stem = self.stem();
        let path = self.path_for(stem, "csv");
        let file = File::create(&path)
            .with_context(|| format!("failed to create {stem} CSV {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let written = match &self.run.samples {
            SampleSet::Trajectory(samples) => write_trajectory_csv(&mut writer, samples),
            SampleSet::Sweep(samples) => write_sweep_csv(&mut writer, samples),
            SampleSet::Divergence(samples) => write_divergence_csv(&mut writer, samples),
        };
        written.with_context(|| format!("failed to write {}", path.display()))?;
        writer.flush().context("failed to flush CSV writer")?;

        Ok(vec![path])
    }

    pub fn write_summary(&self, elapsed: Duration) -> Result<Option<PathBuf>> {
        if !self.output.export_json {
            return Ok(None);
        }
        self.ensure_output_dir()?;
        let path = self.path_for("summary", "json");
        let summary = run_summary(self.boundary, self.run, elapsed);
        let file = File::create(&path)
            .with_context(|| format!("failed to create summary {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &summary)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        writer.flush().context("failed to flush summary writer")?;
        Ok(Some(path))
    }

    pub fn write_plots(&self) -> Result<Vec<PathBuf>> {
        if !self.output.export_png && !self.output.export_svg {
            return Ok(Vec::new());
        }
        self.ensure_output_dir()?;
        let stem = self.stem();
        let mut files = Vec::new();
        for (enabled, extension) in [
            (self.output.export_png, "png"),
            (self.output.export_svg, "svg"),
        ] {
            if !enabled {
                continue;
            }
            let path = self.path_for(stem, extension);
            match &self.run.samples {
                SampleSet::Trajectory(samples) => {
                    render::draw_trajectory_plot(&path, self.boundary, samples, self.plot)?
                }
                SampleSet::Sweep(samples) => render::draw_sweep_plot(&path, samples, self.plot)?,
                SampleSet::Divergence(samples) => {
                    render::draw_divergence_plot(&path, samples, self.plot)?
                }
            }
            files.push(path);
        }
        Ok(files)
    }

    fn stem(&self) -> &'static str {
        match &self.run.samples {
            SampleSet::Trajectory(_) => "trajectory",
            SampleSet::Sweep(_) => "sweep",
            SampleSet::Divergence(_) => "divergence",
        }
    }

    fn path_for(&self, suffix: &str, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}.{extension}", self.output.base_name))
    }

    fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(self.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                self.output_dir.display()
            )
        })
    }
}

pub fn write_trajectory_csv<W: Write>(writer: &mut W, samples: &[TrajectorySample]) -> Result<()> {
    writeln!(
        writer,
        "step,x,y,r,position_angle,incidence,incidence_wrapped,vx,vy,speed,heading"
    )
    .context("failed to write CSV header")?;
    for s in samples {
        writeln!(
            writer,
            "{},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12}",
            s.step,
            s.position.x,
            s.position.y,
            s.radius,
            s.position_angle,
            s.incidence_angle,
            s.wrapped_incidence(),
            s.velocity.x,
            s.velocity.y,
            s.speed,
            s.heading
        )
        .context("failed to write CSV row")?;
    }
    Ok(())
}

pub fn write_sweep_csv<W: Write>(writer: &mut W, samples: &[SweepSample]) -> Result<()> {
    writeln!(
        writer,
        "direction,step,sweep_angle,path_length,abs_dx,abs_dy,rotated_x,rotated_y"
    )
    .context("failed to write CSV header")?;
    for s in samples {
        writeln!(
            writer,
            "{},{},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12}",
            s.direction_index,
            s.step,
            s.sweep_angle,
            s.path_length,
            s.abs_dx,
            s.abs_dy,
            s.rotated.x,
            s.rotated.y
        )
        .context("failed to write CSV row")?;
    }
    Ok(())
}

pub fn write_divergence_csv<W: Write>(writer: &mut W, samples: &[DivergenceSample]) -> Result<()> {
    writeln!(writer, "step,x1,y1,angle1,x2,y2,angle2,divergence")
        .context("failed to write CSV header")?;
    for s in samples {
        writeln!(
            writer,
            "{},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12},{:.12}",
            s.step,
            s.first.x,
            s.first.y,
            s.first_angle,
            s.second.x,
            s.second.y,
            s.second_angle,
            s.divergence
        )
        .context("failed to write CSV row")?;
    }
    Ok(())
}

/// JSON run summary: table, mode, sample count, timing and per-mode statistics.
pub fn run_summary(boundary: &Boundary, run: &RunOutput, elapsed: Duration) -> Value {
    let (half_x, half_y) = boundary.extent();
    let statistics = match &run.samples {
        SampleSet::Trajectory(samples) => json!({
            "max_radius": samples.iter().map(|s| s.radius).fold(0.0, f64::max),
            "mean_abs_incidence": mean(samples.iter().skip(1).map(|s| s.incidence_angle.abs())),
        }),
        SampleSet::Sweep(samples) => json!({
            "direction_count": samples.iter().map(|s| s.direction_index + 1).max().unwrap_or(0),
            "max_path_length": samples.iter().map(|s| s.path_length).fold(0.0, f64::max),
        }),
        SampleSet::Divergence(samples) => json!({
            "final_divergence": samples.last().map(|s| s.divergence),
            "max_divergence": samples.iter().map(|s| s.divergence).fold(0.0, f64::max),
        }),
    };

    json!({
        "boundary": {
            "shape": boundary.shape_label(),
            "half_extent": [half_x, half_y],
            "tolerance": boundary.tolerance(),
        },
        "mode": run.samples.mode_label(),
        "sample_count": run.samples.len(),
        "elapsed_seconds": elapsed.as_secs_f64(),
        "statistics": statistics,
        "box_counting": run.dimension.as_ref().map(dimension_json),
    })
}

fn dimension_json(result: &BoxCountingResult) -> Value {
    json!({
        "dimension": result.dimension,
        "intercept": result.intercept,
        "levels": result
            .levels
            .iter()
            .map(|level| json!({
                "divisions": level.divisions,
                "box_size": level.box_size,
                "occupied": level.occupied,
            }))
            .collect::<Vec<_>>(),
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
