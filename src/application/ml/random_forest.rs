use crate::domain::errors::ForecastError;
use crate::domain::ports::{Estimator, FittedEstimator};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// Hyper-parameters for the random forest regressor.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestParams {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure.
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// smartcore random forest behind the `Estimator` port.
#[derive(Debug, Clone, Default)]
pub struct RandomForestEstimator {
    params: RandomForestParams,
}

impl RandomForestEstimator {
    pub fn new(params: RandomForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    fn regressor_params(&self) -> RandomForestRegressorParameters {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_min_samples_split(self.params.min_samples_split)
            .with_seed(self.params.seed);

        match self.params.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

impl Estimator for RandomForestEstimator {
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn FittedEstimator>, ForecastError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ForecastError::estimator(format!(
                "cannot fit on {} rows with {} targets",
                x.len(),
                y.len()
            )));
        }

        let matrix = DenseMatrix::from_2d_vec(&x.to_vec())
            .map_err(|e| ForecastError::estimator(format!("Matrix creation failed: {}", e)))?;

        let model = RandomForestRegressor::fit(&matrix, &y.to_vec(), self.regressor_params())
            .map_err(|e| ForecastError::estimator(format!("Training failed: {}", e)))?;

        Ok(Box::new(RandomForestModel { model }))
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}

struct RandomForestModel {
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl FittedEstimator for RandomForestModel {
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        let matrix = DenseMatrix::from_2d_vec(&x.to_vec())
            .map_err(|e| ForecastError::estimator(format!("Matrix creation failed: {}", e)))?;

        self.model
            .predict(&matrix)
            .map_err(|e| ForecastError::estimator(format!("Prediction failed: {}", e)))
    }
}
