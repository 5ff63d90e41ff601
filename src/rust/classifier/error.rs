use ort::Error as OrtError;
use std::fmt;

use crate::artifact::ArtifactError;

/// Represents the different types of errors that can occur in the prediction pipeline.
#[derive(Debug)]
pub enum ClassifierError {
    /// A required scaler or classifier file does not exist
    MissingArtifact(String),
    /// An artifact exists but could not be decoded or initialised
    ArtifactLoad(String),
    /// The label table does not match the classifier's class count
    LabelMismatch { labels: usize, classes: usize },
    /// An artifact was fitted on a different number of features
    FeatureMismatch { expected: usize, actual: usize },
    /// Error occurred while scaling or computing probabilities
    Inference(String),
    /// Error occurred due to invalid input parameters
    Validation(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArtifact(msg) => write!(f, "Missing artifact: {}", msg),
            Self::ArtifactLoad(msg) => write!(f, "Artifact load error: {}", msg),
            Self::LabelMismatch { labels, classes } => write!(
                f,
                "Label table has {} entries but the classifier reports {} classes",
                labels, classes
            ),
            Self::FeatureMismatch { expected, actual } => write!(
                f,
                "Feature width mismatch: expected {}, artifact uses {}",
                expected, actual
            ),
            Self::Inference(msg) => write!(f, "Prediction error: {}", msg),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl ClassifierError {
    /// True for the errors that must stop the process before any interaction.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingArtifact(_)
                | Self::ArtifactLoad(_)
                | Self::LabelMismatch { .. }
                | Self::FeatureMismatch { .. }
        )
    }
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ArtifactLoad(err.to_string())
    }
}

impl From<ArtifactError> for ClassifierError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::NotFound(path) => {
                ClassifierError::MissingArtifact(format!("{} not found", path.display()))
            }
            other => ClassifierError::ArtifactLoad(other.to_string()),
        }
    }
}
