//! Ordinary least squares over `linfa-linear`, plus the sample-density
//! bookkeeping the models need to report confidence.

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::types::ModelKind;
use crate::{Result, StrategyError};

/// Neighbours within one standard deviation needed for full density credit.
const DENSITY_TARGET: f64 = 10.0;
const NEIGHBOUR_RADIUS: f64 = 1.0;

/// A fitted linear model and a normalised copy of its training inputs.
#[derive(Debug, Clone)]
pub(crate) struct LinearFit {
    params: Vec<f64>,
    intercept: f64,
    pub r_squared: f64,
    pub rmse: f64,
    means: Vec<f64>,
    scales: Vec<f64>,
    normalised: Vec<Vec<f64>>,
}

impl LinearFit {
    pub fn train(
        kind: ModelKind,
        rows: &[Vec<f64>],
        targets: &[f64],
        min_samples: usize,
    ) -> Result<Self> {
        if rows.len() < min_samples.max(2) {
            return Err(StrategyError::insufficient_data(
                kind.as_str(),
                format!("{} training samples, need at least {}", rows.len(), min_samples),
            ));
        }
        let n_features = rows[0].len();
        if rows.iter().any(|row| row.len() != n_features || row.iter().any(|v| !v.is_finite()))
            || targets.iter().any(|t| !t.is_finite())
            || targets.len() != rows.len()
        {
            return Err(StrategyError::training_failed(
                kind.as_str(),
                "training rows must be finite, equally sized and match the targets",
                None,
            ));
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let x = Array2::from_shape_vec((rows.len(), n_features), flat).map_err(|e| {
            StrategyError::training_failed(kind.as_str(), "bad feature matrix shape", Some(Box::new(e)))
        })?;
        let y = Array1::from_vec(targets.to_vec());
        let dataset = Dataset::new(x.clone(), y.clone());

        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| StrategyError::training_failed(kind.as_str(), e.to_string(), None))?;

        let predicted = fitted.predict(&x);
        let mean_y = y.mean().unwrap_or(0.0);
        let sse: f64 = y.iter().zip(predicted.iter()).map(|(t, p)| (t - p).powi(2)).sum();
        let sst: f64 = y.iter().map(|t| (t - mean_y).powi(2)).sum();
        let r_squared = if sst > f64::EPSILON { 1.0 - sse / sst } else { 0.0 };
        let rmse = (sse / rows.len() as f64).sqrt();

        let mut means = Vec::with_capacity(n_features);
        let mut scales = Vec::with_capacity(n_features);
        for col in 0..n_features {
            let column: Vec<f64> = rows.iter().map(|row| row[col]).collect();
            let (mean, std) = crate::features::mean_std(&column).unwrap_or((0.0, 1.0));
            means.push(mean);
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }
        let normalised = rows.iter().map(|row| normalise(row, &means, &scales)).collect();

        debug!(
            model = %kind,
            samples = rows.len(),
            r_squared,
            rmse,
            "Trained linear model"
        );

        Ok(Self {
            params: fitted.params().to_vec(),
            intercept: fitted.intercept(),
            r_squared,
            rmse,
            means,
            scales,
            normalised,
        })
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept + self.params.iter().zip(x).map(|(w, v)| w * v).sum::<f64>()
    }

    /// Fraction of the density target met by training rows near `x`.
    pub fn density(&self, x: &[f64]) -> f64 {
        let query = normalise(x, &self.means, &self.scales);
        let neighbours = self
            .normalised
            .iter()
            .filter(|row| {
                row.iter().zip(&query).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt()
                    <= NEIGHBOUR_RADIUS
            })
            .count();
        (neighbours as f64 / DENSITY_TARGET).min(1.0)
    }

    /// Density-weighted goodness of fit at `x`.
    pub fn confidence(&self, x: &[f64]) -> f64 {
        self.density(x) * self.r_squared.clamp(0.0, 1.0)
    }

    pub fn sample_count(&self) -> usize {
        self.normalised.len()
    }
}

fn normalise(row: &[f64], means: &[f64], scales: &[f64]) -> Vec<f64> {
    row.iter().zip(means).zip(scales).map(|((v, m), s)| (v - m) / s).collect()
}
