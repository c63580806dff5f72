//! Ordinary least squares model predicting popularity from audio features.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use log::debug;
use serde::Serialize;

pub const POPULARITY: &str = "popularity";

/// Pivots smaller than this are treated as a singular system.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Fitted linear model `target = intercept + Σ coefficient_i * feature_i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    pub target: String,
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Coefficient of determination on the training rows.
    pub r_squared: f64,
}

impl LinearModel {
    /// Fits `target` against `features` over every song in the catalog.
    ///
    /// # Errors
    ///
    /// - [`Error::SchemaMismatch`] if the target or a feature is missing
    /// - [`Error::InsufficientData`] with fewer rows than parameters, or
    ///   when the features are collinear
    pub fn fit<S: AsRef<str>>(catalog: &Catalog, features: &[S], target: &str) -> Result<Self> {
        let feature_idx = catalog.schema().resolve(features)?;
        let target_values = catalog.column(target)?;

        let params = feature_idx.len() + 1;
        if catalog.len() < params {
            return Err(Error::InsufficientData(format!(
                "{} rows cannot fit {params} parameters",
                catalog.len()
            )));
        }

        // Normal equations: (XᵀX) β = Xᵀy, with a leading column of ones.
        let mut xtx = vec![vec![0.0; params]; params];
        let mut xty = vec![0.0; params];
        for (song, &y) in catalog.songs().iter().zip(&target_values) {
            let row: Vec<f64> = std::iter::once(1.0)
                .chain(feature_idx.iter().map(|&idx| song.features[idx]))
                .collect();
            for i in 0..params {
                xty[i] += row[i] * y;
                for j in 0..params {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }

        let beta = solve(xtx, xty).ok_or_else(|| {
            Error::InsufficientData("features are collinear; system is singular".to_string())
        })?;

        let mut model = Self {
            target: target.to_string(),
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
            r_squared: f64::NAN,
        };
        model.r_squared = model.score(catalog, &feature_idx, &target_values);
        debug!("Fitted {model:?}");
        Ok(model)
    }

    /// Predicts the target for values given in `self.features` order.
    #[must_use]
    pub fn predict(&self, values: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(values)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    fn score(&self, catalog: &Catalog, feature_idx: &[usize], target: &[f64]) -> f64 {
        let mean = crate::stats::mean(target);
        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (song, &y) in catalog.songs().iter().zip(target) {
            let predicted = self.predict(&song.project(feature_idx));
            ss_res += (y - predicted).powi(2);
            ss_tot += (y - mean).powi(2);
        }
        if ss_tot == 0.0 {
            return f64::NAN;
        }
        1.0 - ss_res / ss_tot
    }
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < SINGULAR_EPSILON {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
