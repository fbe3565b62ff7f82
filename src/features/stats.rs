//! Small descriptive statistics over lap-time series

/// Mean and population standard deviation; `None` for an empty slice.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Ordinary least-squares line through `(x, y)` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope; infinite with only two points
    pub slope_stderr: f64,
}

/// Fit `y = slope * x + intercept`. Needs two distinct x values.
pub fn line_fit(points: &[(f64, f64)]) -> Option<LineFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if sxx <= f64::EPSILON {
        return None;
    }
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let slope_stderr = if points.len() > 2 {
        let sse: f64 =
            points.iter().map(|(x, y)| (y - (slope * x + intercept)).powi(2)).sum();
        (sse / (n - 2.0) / sxx).sqrt()
    } else {
        f64::INFINITY
    };

    Some(LineFit { slope, intercept, slope_stderr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_std_basic() {
        assert_eq!(mean_std(&[]), None);
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
    }

    #[test]
    fn exact_line_has_zero_stderr() {
        let points: Vec<_> = (1..=5).map(|x| (x as f64, 100.0 + 3.0 * x as f64)).collect();
        let fit = line_fit(&points).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-9);
        assert!((fit.intercept - 100.0).abs() < 1e-9);
        assert!(fit.slope_stderr < 1e-9);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(line_fit(&[(1.0, 2.0)]).is_none());
        assert!(line_fit(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
        let two = line_fit(&[(1.0, 2.0), (2.0, 3.0)]).unwrap();
        assert!(two.slope_stderr.is_infinite());
    }
}
