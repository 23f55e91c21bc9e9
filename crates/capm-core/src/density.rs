use serde::{Deserialize, Serialize};

use crate::error::CapmError;
use crate::regression::CapmFit;
use crate::statistics::sample_std_dev;
use crate::types::{defined_values, Obs};
use crate::CapmResult;

/// Bandwidths added beyond the data range on each side of the grid.
const GRID_CUT: f64 = 3.0;

pub const DEFAULT_DENSITY_POINTS: usize = 200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

/// Gaussian kernel density estimate evaluated on a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub points: Vec<DensityPoint>,
}

/// Observed vs. simulated densities on a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityComparison {
    pub observed: DensityCurve,
    pub simulated: DensityCurve,
}

/// Data behind the scatter plot with fitted regression line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLine {
    /// (independent, dependent) pairs that entered the fit
    pub scatter: Vec<(f64, f64)>,
    /// Line endpoints at the min and max of the independent values
    pub line: [(f64, f64); 2],
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scott's rule bandwidth `sigma * n^(-1/5)`.
pub fn scott_bandwidth(values: &[f64]) -> CapmResult<f64> {
    if values.len() < 2 {
        return Err(CapmError::InsufficientData(format!(
            "At least 2 values are required for a density estimate, got {}",
            values.len()
        )));
    }
    let sd = sample_std_dev(values);
    if sd <= 0.0 {
        return Err(CapmError::DegenerateInput(
            "Cannot estimate a density for a series with zero variance".into(),
        ));
    }
    Ok(sd * (values.len() as f64).powf(-0.2))
}

/// Evaluate a Gaussian KDE of the defined values of `series` at `grid`.
pub fn kernel_density(series: &[Obs], grid: &[f64]) -> CapmResult<DensityCurve> {
    let values = defined_values(series);
    let bandwidth = scott_bandwidth(&values)?;
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let points = grid
        .iter()
        .map(|&x| {
            let sum: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            DensityPoint {
                x,
                density: norm * sum,
            }
        })
        .collect();
    Ok(DensityCurve { bandwidth, points })
}

/// Evenly spaced grid covering both series, extended by three bandwidths of
/// the wider series on each side.
pub fn density_grid(a: &[Obs], b: &[Obs], points: usize) -> CapmResult<Vec<f64>> {
    if points < 2 {
        return Err(CapmError::invalid(
            "points",
            format!("Density grid needs at least 2 points, got {}", points),
        ));
    }
    let va = defined_values(a);
    let vb = defined_values(b);
    let bw = scott_bandwidth(&va)?.max(scott_bandwidth(&vb)?);

    let (lo, hi) = va
        .iter()
        .chain(&vb)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let lo = lo - GRID_CUT * bw;
    let hi = hi + GRID_CUT * bw;
    let step = (hi - lo) / (points - 1) as f64;
    Ok((0..points).map(|i| lo + step * i as f64).collect())
}

/// KDE of the observed and simulated series on a shared grid.
pub fn compare_densities(
    observed: &[Obs],
    simulated: &[Obs],
    points: usize,
) -> CapmResult<DensityComparison> {
    let grid = density_grid(observed, simulated, points)?;
    Ok(DensityComparison {
        observed: kernel_density(observed, &grid)?,
        simulated: kernel_density(simulated, &grid)?,
    })
}

/// Scatter points and regression line endpoints for a fitted model.
pub fn fitted_line(fit: &CapmFit, dependent: &[Obs], independent: &[Obs]) -> FittedLine {
    let scatter: Vec<(f64, f64)> = fit
        .observations
        .iter()
        .filter_map(|&i| match (independent.get(i)?.get(), dependent.get(i)?.get()) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();
    let (lo, hi) = scatter
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| {
            (lo.min(*x), hi.max(*x))
        });
    FittedLine {
        scatter,
        line: [(lo, fit.predict(lo)), (hi, fit.predict(hi))],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::fit_capm;

    fn obs(values: &[f64]) -> Vec<Obs> {
        values.iter().copied().map(Obs::value).collect()
    }

    #[test]
    fn test_density_integrates_to_one() {
        let series = obs(&[-1.5, -0.3, 0.0, 0.4, 0.9, 1.2, 2.8]);
        let grid = density_grid(&series, &series, 2001).unwrap();
        let curve = kernel_density(&series, &grid).unwrap();
        let step = grid[1] - grid[0];
        let area: f64 = curve.points.iter().map(|p| p.density * step).sum();
        assert!((area - 1.0).abs() < 0.01, "area {}", area);
    }

    #[test]
    fn test_bandwidth_scott() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let bw = scott_bandwidth(&values).unwrap();
        let expected = 2.5_f64.sqrt() * 5.0_f64.powf(-0.2);
        assert!((bw - expected).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_is_degenerate() {
        assert!(matches!(
            scott_bandwidth(&[2.0, 2.0, 2.0]),
            Err(CapmError::DegenerateInput(_))
        ));
        assert!(matches!(
            scott_bandwidth(&[0.1, 0.1, 0.1]),
            Err(CapmError::DegenerateInput(_))
        ));
        let series = vec![Obs::value(0.7); 6];
        assert!(matches!(
            kernel_density(&series, &[0.0, 0.7, 1.4]),
            Err(CapmError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_comparison_shares_grid() {
        let a = vec![Obs::MISSING, Obs::value(0.0), Obs::value(1.0), Obs::value(3.0)];
        let b = obs(&[-2.0, 0.5, 4.0]);
        let cmp = compare_densities(&a, &b, 50).unwrap();
        assert_eq!(cmp.observed.points.len(), 50);
        for (o, s) in cmp.observed.points.iter().zip(&cmp.simulated.points) {
            assert_eq!(o.x, s.x);
        }
        assert!(cmp.observed.points[0].x < -2.0);
        assert!(cmp.observed.points[49].x > 4.0);
    }

    #[test]
    fn test_grid_needs_two_points() {
        let a = obs(&[0.0, 1.0]);
        assert!(density_grid(&a, &a, 1).is_err());
    }

    #[test]
    fn test_fitted_line_endpoints() {
        let x = vec![Obs::MISSING, Obs::value(-1.0), Obs::value(0.0), Obs::value(2.0)];
        let y = vec![Obs::value(9.0), Obs::value(-1.0), Obs::value(1.0), Obs::value(5.0)];
        let fit = fit_capm(&y, &x).unwrap();
        let line = fitted_line(&fit, &y, &x);
        assert_eq!(line.scatter.len(), 3);
        assert!((line.line[0].0 + 1.0).abs() < 1e-12);
        assert!((line.line[1].0 - 2.0).abs() < 1e-12);
        assert!((line.line[1].1 - fit.predict(2.0)).abs() < 1e-12);
    }
}
