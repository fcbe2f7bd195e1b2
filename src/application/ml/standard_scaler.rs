use crate::domain::errors::ForecastError;
use statrs::statistics::Statistics;

/// Per-column mean/variance normalization.
///
/// Columns with zero variance keep a unit scale, so they are centered but
/// never divided by zero; constant features transform to exactly 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learns column means and population standard deviations.
    pub fn fit(x: &[Vec<f64>]) -> Result<Self, ForecastError> {
        let width = match x.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(ForecastError::estimator("cannot fit scaler on empty matrix")),
        };
        if x.iter().any(|row| row.len() != width) {
            return Err(ForecastError::estimator("ragged feature matrix"));
        }

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for col in 0..width {
            let column: Vec<f64> = x.iter().map(|row| row[col]).collect();
            means.push(column.iter().mean());

            let std_dev = column.iter().population_std_dev();
            scales.push(if std_dev > 0.0 && std_dev.is_finite() {
                std_dev
            } else {
                1.0
            });
        }

        Ok(Self { means, scales })
    }

    pub fn fit_transform(x: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), ForecastError> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    /// Applies the learned parameters; never refits.
    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForecastError> {
        x.iter()
            .map(|row| {
                if row.len() != self.means.len() {
                    return Err(ForecastError::estimator(format!(
                        "scaler fitted on {} features, got {}",
                        self.means.len(),
                        row.len()
                    )));
                }
                Ok(row
                    .iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(v, (mean, scale))| (v - mean) / scale)
                    .collect())
            })
            .collect()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}
