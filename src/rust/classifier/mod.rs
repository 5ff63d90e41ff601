mod builder;
mod error;
mod model;
mod onnx;
mod predictor;
mod scaler;
mod utils;

pub use builder::PredictorBuilder;
pub use error::ClassifierError;
pub use model::{ProbabilityModel, PrototypeModel};
pub use onnx::{OnnxClassifier, OnnxScaler};
pub use predictor::{rank_top_k, Prediction, Predictor, MAX_TOP_K};
pub use scaler::{FeatureScaler, StandardScaler};

/// Information about the artifacts behind a predictor
#[derive(Debug, Clone)]
pub struct PredictorInfo {
    /// Path of the scaler file, or `<memory>`
    pub scaler_source: String,
    /// Path of the classifier file, or `<memory>`
    pub model_source: String,
    /// Width of the feature vector
    pub num_features: usize,
    /// Number of classes the classifier scores
    pub num_classes: usize,
    /// Labels of the classes, in class-index order
    pub class_labels: Vec<String>,
    /// Maximum number of recommendations per prediction
    pub top_k: usize,
    /// Whether the classifier was synthesised instead of trained
    pub placeholder: bool,
}
