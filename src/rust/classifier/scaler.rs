use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Normalises a batch of feature rows before classification.
pub trait FeatureScaler: Send + Sync + std::fmt::Debug {
    /// Number of columns the scaler was fitted on.
    fn n_features(&self) -> usize;

    fn transform(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError>;
}

/// Per-column standardisation: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f32>,
    scale: Array1<f32>,
}

impl StandardScaler {
    pub fn new(mean: Array1<f32>, scale: Array1<f32>) -> Result<Self, ClassifierError> {
        if mean.len() != scale.len() {
            return Err(ClassifierError::Validation(format!(
                "Scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(ClassifierError::Validation(
                "Scaler scale entries must be finite and non-zero".into(),
            ));
        }
        Ok(Self { mean, scale })
    }

    /// Fits mean and population standard deviation per column. Constant
    /// columns get a scale of 1 so they pass through centred.
    pub fn fit(x: ArrayView2<f32>) -> Result<Self, ClassifierError> {
        if x.nrows() == 0 {
            return Err(ClassifierError::Validation(
                "Cannot fit a scaler on zero rows".into(),
            ));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ClassifierError::Validation("Cannot fit a scaler on zero rows".into()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f32::EPSILON { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    /// Scaler that leaves every value unchanged.
    pub fn identity(n_features: usize) -> Self {
        Self {
            mean: Array1::zeros(n_features),
            scale: Array1::ones(n_features),
        }
    }

    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f32> {
        &self.scale
    }
}

impl FeatureScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError> {
        if batch.ncols() != self.mean.len() {
            return Err(ClassifierError::Inference(format!(
                "Scaler expects {} columns, got {}",
                self.mean.len(),
                batch.ncols()
            )));
        }
        Ok((&batch - &self.mean) / &self.scale)
    }
}
