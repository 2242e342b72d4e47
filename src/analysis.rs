//! Box-counting estimate of the fractal dimension of a sweep's rotated path-length cloud.

use log::debug;

use crate::config::DimensionConfig;
use crate::math::Point;

/// Occupancy of one `divisions × divisions` grid.
#[derive(Debug, Clone)]
pub struct BoxCountLevel {
    pub divisions: usize,
    pub box_size: f64,
    /// Points per box, row-major from the bottom-left box.
    pub counts: Vec<usize>,
    pub occupied: usize,
}

#[derive(Debug, Clone)]
pub struct BoxCountingResult {
    pub levels: Vec<BoxCountLevel>,
    /// Slope of `ln(occupied)` against `ln(divisions)`.
    pub dimension: Option<f64>,
    pub intercept: Option<f64>,
}

/// Count points strictly inside each box of grids `1..=max_divisions` over
/// `[-max_extent, max_extent]²`; points on a grid line or outside the square are not counted.
pub fn box_counting(points: &[Point], config: &DimensionConfig) -> BoxCountingResult {
    let extent = config.max_extent;
    let levels: Vec<BoxCountLevel> = (1..=config.max_divisions)
        .map(|divisions| {
            let box_size = 2.0 * extent / divisions as f64;
            let mut counts = vec![0usize; divisions * divisions];
            for point in points {
                let (Some(col), Some(row)) = (
                    box_index(point.x, extent, box_size, divisions),
                    box_index(point.y, extent, box_size, divisions),
                ) else {
                    continue;
                };
                counts[row * divisions + col] += 1;
            }
            let occupied = counts.iter().filter(|count| **count > 0).count();
            debug!("box counting: {divisions}x{divisions} grid, {occupied} boxes occupied");
            BoxCountLevel {
                divisions,
                box_size,
                counts,
                occupied,
            }
        })
        .collect();

    let (log_n, log_occupied): (Vec<f64>, Vec<f64>) = levels
        .iter()
        .filter(|level| level.occupied > 0)
        .map(|level| ((level.divisions as f64).ln(), (level.occupied as f64).ln()))
        .unzip();
    let fit = linear_regression(&log_n, &log_occupied);

    BoxCountingResult {
        levels,
        dimension: fit.map(|(slope, _)| slope),
        intercept: fit.map(|(_, intercept)| intercept),
    }
}

fn box_index(value: f64, extent: f64, box_size: f64, divisions: usize) -> Option<usize> {
    if !(value > -extent && value < extent) {
        return None;
    }
    let index = (((value + extent) / box_size).floor() as usize).min(divisions - 1);
    let lower = -extent + index as f64 * box_size;
    (value > lower && value < lower + box_size).then_some(index)
}

/// Least-squares line `y = slope * x + intercept`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_x2: f64 = x.iter().map(|v| v * v).sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() < 1e-12 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial::rng_from_seed;
    use approx::assert_relative_eq;
    use nalgebra::point;
    use rand::Rng;

    #[test]
    fn regression_recovers_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = linear_regression(&x, &y).unwrap();
        assert_relative_eq!(slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(intercept, 1.0, epsilon = 1e-12);
        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[1.0, 1.0], &[0.0, 2.0]).is_none());
    }

    #[test]
    fn filled_square_has_dimension_two() {
        let mut rng = rng_from_seed(11);
        let points: Vec<Point> = (0..20_000)
            .map(|_| point![rng.random_range(-59.0..59.0), rng.random_range(-59.0..59.0)])
            .collect();
        let result = box_counting(&points, &DimensionConfig::default());
        assert_eq!(result.levels.len(), 10);
        assert!(result.levels.iter().all(|l| l.occupied == l.divisions * l.divisions));
        assert_relative_eq!(result.dimension.unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn horizontal_line_has_dimension_one() {
        let points: Vec<Point> = (0..1200)
            .map(|i| point![-59.95 + 0.1 * i as f64, 0.5])
            .collect();
        let result = box_counting(&points, &DimensionConfig::default());
        assert!(result.levels.iter().all(|l| l.occupied == l.divisions));
        assert_relative_eq!(result.dimension.unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn boundary_and_outside_points_are_ignored() {
        let points = [point![0.0, 5.0], point![60.0, 1.0], point![-70.0, 0.0], point![1.0, 1.0]];
        let config = DimensionConfig {
            max_extent: 60.0,
            max_divisions: 2,
        };
        let result = box_counting(&points, &config);
        // x = 0 is a grid line at two divisions but inside the single box
        assert_eq!(result.levels[0].counts, vec![2]);
        assert_eq!(result.levels[1].counts, vec![0, 0, 0, 1]);
    }

    #[test]
    fn empty_cloud_has_no_dimension() {
        let result = box_counting(&[], &DimensionConfig::default());
        assert!(result.dimension.is_none());
        assert!(result.levels.iter().all(|l| l.occupied == 0));
    }
}
