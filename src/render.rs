use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::boundary::Boundary;
use crate::config::PlotConfig;
use crate::sampling::{DivergenceSample, RangeExt, SweepSample, TrajectorySample};

const TITLE_HEIGHT: u32 = 40;
const TITLE_FONT: u32 = 28;
const LABEL_FONT: u32 = 18;
const AXIS_FONT: u32 = 20;

/// Table outline with the recorded path on top. The file extension picks the backend.
pub fn draw_trajectory_plot(
    path: &Path,
    boundary: &Boundary,
    samples: &[TrajectorySample],
    plot: &PlotConfig,
) -> Result<()> {
    ensure_parent(path)?;
    let size = (plot.width_px, plot.height_px);
    let drawn = if is_svg(path) {
        draw_trajectory(SVGBackend::new(path, size).into_drawing_area(), boundary, samples, plot)
    } else {
        draw_trajectory(BitMapBackend::new(path, size).into_drawing_area(), boundary, samples, plot)
    };
    drawn.with_context(|| format!("failed to draw {}", path.display()))
}

/// Scatter of every rotated path-length vector of a sweep.
pub fn draw_sweep_plot(path: &Path, samples: &[SweepSample], plot: &PlotConfig) -> Result<()> {
    ensure_parent(path)?;
    let size = (plot.width_px, plot.height_px);
    let drawn = if is_svg(path) {
        draw_sweep(SVGBackend::new(path, size).into_drawing_area(), samples)
    } else {
        draw_sweep(BitMapBackend::new(path, size).into_drawing_area(), samples)
    };
    drawn.with_context(|| format!("failed to draw {}", path.display()))
}

/// Angular divergence against step on a logarithmic axis.
pub fn draw_divergence_plot(
    path: &Path,
    samples: &[DivergenceSample],
    plot: &PlotConfig,
) -> Result<()> {
    ensure_parent(path)?;
    let size = (plot.width_px, plot.height_px);
    let drawn = if is_svg(path) {
        draw_divergence(SVGBackend::new(path, size).into_drawing_area(), samples, plot)
    } else {
        draw_divergence(BitMapBackend::new(path, size).into_drawing_area(), samples, plot)
    };
    drawn.with_context(|| format!("failed to draw {}", path.display()))
}

fn draw_trajectory<DB: DrawingBackend>(
    drawing_area: DrawingArea<DB, Shift>,
    boundary: &Boundary,
    samples: &[TrajectorySample],
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let root = drawing_area;
    root.fill(&WHITE)?;
    let title = format!("{} table trajectory", boundary.shape_label());
    let chart_area = draw_title(&root, &title)?;

    let outline = boundary.outline(plot.outline_samples);
    let (half_x, half_y) = boundary.extent();
    let x_range = RangeExt::from_values([-half_x, half_x]).padded(1.0);
    let y_range = RangeExt::from_values([-half_y, half_y]).padded(1.0);

    let mut chart = ChartBuilder::on(&chart_area)
        .margin(18)
        .set_label_area_size(LabelAreaPosition::Left, 58)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x")
        .y_desc("y")
        .label_style(("sans-serif", LABEL_FONT))
        .axis_desc_style(("sans-serif", AXIS_FONT))
        .draw()?;

    let stroke = stroke_width(plot);
    for curve in outline {
        chart.draw_series(LineSeries::new(
            curve.into_iter().map(|p| (p.x, p.y)),
            BLACK.stroke_width(stroke),
        ))?;
    }

    chart.draw_series(LineSeries::new(
        samples.iter().map(|s| (s.position.x, s.position.y)),
        BLUE.mix(0.7).stroke_width((stroke / 2).max(1)),
    ))?;

    if let Some(first) = samples.first() {
        chart.draw_series(PointSeries::of_element(
            vec![(first.position.x, first.position.y)],
            5,
            ShapeStyle::from(&RED).filled(),
            &|coord, size, style| {
                EmptyElement::at(coord)
                    + Circle::new((0, 0), size, style)
                    + Text::new("start", (10, -10), ("sans-serif", LABEL_FONT).into_font())
            },
        ))?;
    }

    chart_area
        .present()
        .map_err(|e| anyhow!("Failed to render trajectory chart: {:?}", e))?;
    Ok(())
}

fn draw_sweep<DB: DrawingBackend>(
    drawing_area: DrawingArea<DB, Shift>,
    samples: &[SweepSample],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let root = drawing_area;
    root.fill(&WHITE)?;
    let chart_area = draw_title(&root, "Rotated path lengths")?;

    let reach = samples
        .iter()
        .map(|s| s.rotated.x.abs().max(s.rotated.y.abs()))
        .fold(0.0, f64::max);
    let (lo, hi) = RangeExt::from_values([-reach, reach]).padded(1.0);

    let mut chart = ChartBuilder::on(&chart_area)
        .margin(18)
        .set_label_area_size(LabelAreaPosition::Left, 58)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(lo..hi, lo..hi)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("L cos(theta)")
        .y_desc("L sin(theta)")
        .label_style(("sans-serif", LABEL_FONT))
        .axis_desc_style(("sans-serif", AXIS_FONT))
        .draw()?;

    chart.draw_series(
        samples
            .iter()
            .map(|s| Circle::new((s.rotated.x, s.rotated.y), 1, BLACK.filled())),
    )?;

    chart_area
        .present()
        .map_err(|e| anyhow!("Failed to render sweep chart: {:?}", e))?;
    Ok(())
}

fn draw_divergence<DB: DrawingBackend>(
    drawing_area: DrawingArea<DB, Shift>,
    samples: &[DivergenceSample],
    plot: &PlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let root = drawing_area;
    root.fill(&WHITE)?;
    let chart_area = draw_title(&root, "Angular divergence")?;

    let min_positive = samples
        .iter()
        .map(|s| s.divergence)
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);
    let min_positive = if min_positive.is_finite() {
        min_positive
    } else {
        1e-12
    };
    let max_value = samples
        .iter()
        .map(|s| s.divergence)
        .fold(min_positive * 10.0, f64::max);
    let last_step = samples.last().map(|s| s.step).unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(&chart_area)
        .margin(18)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..last_step, (min_positive..max_value * 1.5).log_scale())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("step")
        .y_desc("|angle(a) - angle(b)|")
        .y_label_formatter(&|value| format_log_tick(*value))
        .label_style(("sans-serif", LABEL_FONT))
        .axis_desc_style(("sans-serif", AXIS_FONT))
        .draw()?;

    chart.draw_series(LineSeries::new(
        samples
            .iter()
            .map(|s| (s.step as f64, s.divergence.max(min_positive))),
        BLACK.stroke_width(stroke_width(plot)),
    ))?;

    chart_area
        .present()
        .map_err(|e| anyhow!("Failed to render divergence chart: {:?}", e))?;
    Ok(())
}

fn draw_title<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
) -> Result<DrawingArea<DB, Shift>>
where
    DB::ErrorType: 'static,
{
    let (title_area, chart_area) = root.split_vertically(TITLE_HEIGHT);
    let style = ("sans-serif", TITLE_FONT)
        .into_text_style(&title_area)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let (width, height) = title_area.dim_in_pixel();
    title_area.draw_text(title, &style, (width as i32 / 2, height as i32 / 2))?;
    Ok(chart_area)
}

fn stroke_width(plot: &PlotConfig) -> u32 {
    plot.line_width.round().max(1.0) as u32
}

fn format_log_tick(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".into();
    }
    let log10 = value.log10();
    let exponent = log10.round();
    if (log10 - exponent).abs() < 5e-4 {
        format!("1e{}", exponent as i32)
    } else {
        format!("{:.1e}", value)
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create plot directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_ticks_show_powers_of_ten() {
        assert_eq!(format_log_tick(1e-3), "1e-3");
        assert_eq!(format_log_tick(0.0), "0");
        assert_eq!(format_log_tick(2.5e-2), "2.5e-2");
    }

    #[test]
    fn backend_follows_extension() {
        assert!(is_svg(Path::new("output/run_sweep.svg")));
        assert!(is_svg(Path::new("output/run_sweep.SVG")));
        assert!(!is_svg(Path::new("output/run_sweep.png")));
    }

    #[test]
    fn stroke_width_is_at_least_one_pixel() {
        let mut plot = PlotConfig::default();
        plot.line_width = 0.2;
        assert_eq!(stroke_width(&plot), 1);
        plot.line_width = 2.6;
        assert_eq!(stroke_width(&plot), 3);
    }
}
