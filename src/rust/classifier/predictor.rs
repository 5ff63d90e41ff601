use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::model::ProbabilityModel;
use super::scaler::FeatureScaler;
use crate::features::{assemble_features, FeatureVector};
use crate::profile::Profile;

/// Most recommendations ever returned for one profile.
pub const MAX_TOP_K: usize = 5;

/// One ranked career recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 1-based position in the ranking
    pub rank: usize,
    pub label: String,
    pub probability: f32,
}

/// Scaler, classifier and label table, loaded once and shared read-only.
///
/// # Thread Safety
///
/// `Predictor` is `Send + Sync`: both artifacts sit behind `Arc` and nothing
/// is mutated after [`PredictorBuilder::build`](super::PredictorBuilder::build)
/// returns, so it can be shared across threads with `Arc<Predictor>`.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use aspire::{Predictor, Profile};
///
/// let predictor = Predictor::builder()
///     .with_scaler_path("scaler.bin")
///     .with_model_path("model_compressed.bin")
///     .build()?;
///
/// for prediction in predictor.predict_profile(&Profile::default())? {
///     println!("{}. {} {:.1}%", prediction.rank, prediction.label, prediction.probability * 100.0);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Predictor {
    pub(crate) scaler: Arc<dyn FeatureScaler>,
    pub(crate) model: Arc<dyn ProbabilityModel>,
    pub(crate) labels: Arc<Vec<String>>,
    pub(crate) top_k: usize,
    pub(crate) scaler_source: String,
    pub(crate) model_source: String,
    pub(crate) placeholder: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

impl Predictor {
    /// Creates a new PredictorBuilder for fluent construction
    pub fn builder() -> super::builder::PredictorBuilder {
        super::builder::PredictorBuilder::new()
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> super::PredictorInfo {
        super::PredictorInfo {
            scaler_source: self.scaler_source.clone(),
            model_source: self.model_source.clone(),
            num_features: self.model.n_features(),
            num_classes: self.model.n_classes(),
            class_labels: self.labels.as_ref().clone(),
            top_k: self.top_k,
            placeholder: self.placeholder,
        }
    }

    /// Validates the profile, assembles its features and ranks careers.
    pub fn predict_profile(&self, profile: &Profile) -> Result<Vec<Prediction>, ClassifierError> {
        profile.validate()?;
        self.predict(&assemble_features(profile))
    }

    /// Scales the feature vector, runs the classifier and returns up to
    /// `top_k` careers by descending probability.
    pub fn predict(&self, features: &FeatureVector) -> Result<Vec<Prediction>, ClassifierError> {
        let batch = features.to_batch();
        let scaled = self.scaler.transform(batch.view())?;
        let probabilities = self.model.predict_proba(scaled.view())?;

        if probabilities.nrows() != 1 {
            return Err(ClassifierError::Inference(format!(
                "Classifier returned {} probability rows for one input",
                probabilities.nrows()
            )));
        }
        let row: Vec<f32> = probabilities.row(0).to_vec();
        if row.len() != self.labels.len() {
            return Err(ClassifierError::Inference(format!(
                "Classifier returned {} probabilities for {} labels",
                row.len(),
                self.labels.len()
            )));
        }

        let ranked = rank_top_k(&row, self.top_k)?;
        Ok(ranked
            .into_iter()
            .enumerate()
            .map(|(i, (class, probability))| Prediction {
                rank: i + 1,
                label: self.labels[class].clone(),
                probability,
            })
            .collect())
    }
}

/// Class indices of the `k` highest probabilities, highest first. Equal
/// probabilities keep the lower class index first.
pub fn rank_top_k(probabilities: &[f32], k: usize) -> Result<Vec<(usize, f32)>, ClassifierError> {
    if let Some(pos) = probabilities.iter().position(|p| !p.is_finite()) {
        return Err(ClassifierError::Inference(format!(
            "Probability for class {} is not a finite number",
            pos
        )));
    }
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    indexed.truncate(k);
    Ok(indexed)
}
