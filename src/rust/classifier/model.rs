use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{average_vectors, softmax, squared_distance};

/// A fitted classifier that reports one probability per class.
pub trait ProbabilityModel: Send + Sync + std::fmt::Debug {
    /// Number of feature columns the model was fitted on.
    fn n_features(&self) -> usize;

    /// Number of classes, i.e. the width of each probability row.
    fn n_classes(&self) -> usize;

    /// Returns a `rows × n_classes` matrix; each row sums to one.
    fn predict_proba(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError>;
}

/// Nearest-prototype classifier.
///
/// Each class is represented by the mean of its training rows. Class
/// probabilities are a softmax over the negative squared distance to every
/// prototype, divided by `temperature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrototypeModel {
    /// One row per class, in class-index order.
    prototypes: Array2<f32>,
    temperature: f32,
}

impl PrototypeModel {
    pub const DEFAULT_TEMPERATURE: f32 = 1.0;

    pub fn new(prototypes: Array2<f32>, temperature: f32) -> Result<Self, ClassifierError> {
        if prototypes.nrows() == 0 || prototypes.ncols() == 0 {
            return Err(ClassifierError::Validation(
                "A prototype model needs at least one class and one feature".into(),
            ));
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(ClassifierError::Validation(format!(
                "Temperature must be a positive number, got {}",
                temperature
            )));
        }
        Ok(Self {
            prototypes,
            temperature,
        })
    }

    /// Fits one prototype per class from labelled rows.
    ///
    /// Every class in `0..n_classes` must have at least one row; otherwise the
    /// model would report a class it cannot score.
    pub fn fit(
        x: ArrayView2<f32>,
        y: &[usize],
        n_classes: usize,
        temperature: f32,
    ) -> Result<Self, ClassifierError> {
        if x.nrows() != y.len() {
            return Err(ClassifierError::Validation(format!(
                "Got {} rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(ClassifierError::Validation(format!(
                "Label {} is outside 0..{}",
                bad, n_classes
            )));
        }

        let n_features = x.ncols();
        let mut prototypes = Array2::zeros((n_classes, n_features));
        for class in 0..n_classes {
            let rows: Vec<_> = x
                .axis_iter(Axis(0))
                .zip(y)
                .filter(|(_, label)| **label == class)
                .map(|(row, _)| row)
                .collect();
            if rows.is_empty() {
                return Err(ClassifierError::Validation(format!(
                    "Class {} has no training rows",
                    class
                )));
            }
            prototypes
                .row_mut(class)
                .assign(&average_vectors(&rows, n_features));
        }

        Self::new(prototypes, temperature)
    }

    pub fn prototypes(&self) -> &Array2<f32> {
        &self.prototypes
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl ProbabilityModel for PrototypeModel {
    fn n_features(&self) -> usize {
        self.prototypes.ncols()
    }

    fn n_classes(&self) -> usize {
        self.prototypes.nrows()
    }

    fn predict_proba(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError> {
        if batch.ncols() != self.n_features() {
            return Err(ClassifierError::Inference(format!(
                "Model expects {} columns, got {}",
                self.n_features(),
                batch.ncols()
            )));
        }

        let mut probabilities = Array2::zeros((batch.nrows(), self.n_classes()));
        for (row, mut out) in batch.axis_iter(Axis(0)).zip(probabilities.axis_iter_mut(Axis(0))) {
            let logits: Vec<f32> = self
                .prototypes
                .axis_iter(Axis(0))
                .map(|prototype| -squared_distance(&row, &prototype) / self.temperature)
                .collect();
            for (slot, p) in out.iter_mut().zip(softmax(&logits)) {
                *slot = p;
            }
        }
        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_class_model() -> PrototypeModel {
        let x = array![[0.0f32, 0.0], [1.0, 0.0], [5.0, 5.0], [6.0, 5.0]];
        PrototypeModel::fit(x.view(), &[0, 0, 1, 1], 2, 1.0).unwrap()
    }

    #[test]
    fn test_fit_averages_each_class() {
        let model = two_class_model();
        assert_eq!(model.prototypes(), &array![[0.5, 0.0], [5.5, 5.0]]);
        assert_eq!(model.n_classes(), 2);
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_nearest_prototype_wins() {
        let model = two_class_model();
        let probs = model.predict_proba(array![[0.0f32, 0.1], [5.0, 5.1]].view()).unwrap();
        assert!(probs[[0, 0]] > probs[[0, 1]]);
        assert!(probs[[1, 1]] > probs[[1, 0]]);
        for row in probs.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_fit_requires_every_class() {
        let x = array![[0.0f32], [1.0]];
        let err = PrototypeModel::fit(x.view(), &[0, 0], 2, 1.0).unwrap_err();
        assert!(err.to_string().contains("Class 1"));
        assert!(PrototypeModel::fit(x.view(), &[0, 5], 2, 1.0).is_err());
        assert!(PrototypeModel::fit(x.view(), &[0], 1, 1.0).is_err());
    }

    #[test]
    fn test_rejects_bad_temperature() {
        assert!(PrototypeModel::new(array![[1.0f32]], 0.0).is_err());
        assert!(PrototypeModel::new(array![[1.0f32]], f32::NAN).is_err());
    }

    #[test]
    fn test_width_mismatch() {
        let model = two_class_model();
        let err = model.predict_proba(array![[1.0f32, 2.0, 3.0]].view()).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }
}
