use crate::domain::errors::ForecastError;

/// Regression capability that produces a fitted model from a feature matrix.
///
/// Implementations hold hyper-parameters only; every call to `fit` yields an
/// independent fitted model, so refits replace rather than update.
pub trait Estimator: Send + Sync {
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn FittedEstimator>, ForecastError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// A fitted regression model.
pub trait FittedEstimator: Send + Sync {
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError>;
}
