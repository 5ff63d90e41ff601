use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::error::ClassifierError;
use super::model::{ProbabilityModel, PrototypeModel};
use super::onnx::{OnnxClassifier, OnnxScaler};
use super::predictor::{Predictor, MAX_TOP_K};
use super::scaler::{FeatureScaler, StandardScaler};
use crate::artifact::{read_artifact, verify_file, ArtifactKind};
use crate::features::FEATURE_COUNT;
use crate::labels::default_labels;
use crate::runtime::RuntimeConfig;

const IN_MEMORY: &str = "<memory>";

enum Source<T: ?Sized> {
    Path(PathBuf),
    Loaded(Arc<T>),
}

/// A builder for constructing a [`Predictor`] with a fluent interface.
///
/// `build` is the startup gate: it fails unless both artifacts exist, decode,
/// agree on the feature width and match the label table.
pub struct PredictorBuilder {
    scaler: Option<Source<dyn FeatureScaler>>,
    model: Option<Source<dyn ProbabilityModel>>,
    labels: Vec<String>,
    top_k: usize,
    runtime_config: RuntimeConfig,
    expected_scaler_sha256: Option<String>,
    expected_model_sha256: Option<String>,
}

impl Default for PredictorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorBuilder {
    /// Creates a builder with the default label table and top-k of 5
    pub fn new() -> Self {
        Self {
            scaler: None,
            model: None,
            labels: default_labels(),
            top_k: MAX_TOP_K,
            runtime_config: RuntimeConfig::default(),
            expected_scaler_sha256: None,
            expected_model_sha256: None,
        }
    }

    /// Sets the runtime configuration used for `.onnx` artifacts
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Reads the scaler from a native artifact, or from ONNX when the path
    /// ends in `.onnx`
    pub fn with_scaler_path(mut self, path: impl AsRef<Path>) -> Self {
        self.scaler = Some(Source::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Reads the classifier from a native artifact, or from ONNX when the
    /// path ends in `.onnx`
    pub fn with_model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model = Some(Source::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Uses an already constructed scaler
    pub fn with_scaler(mut self, scaler: impl FeatureScaler + 'static) -> Self {
        self.scaler = Some(Source::Loaded(Arc::new(scaler)));
        self
    }

    /// Uses an already constructed classifier
    pub fn with_model(mut self, model: impl ProbabilityModel + 'static) -> Self {
        self.model = Some(Source::Loaded(Arc::new(model)));
        self
    }

    /// Replaces the label table. Entry `i` names class index `i`.
    pub fn with_labels(mut self, labels: Vec<impl Into<String>>) -> Self {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Number of recommendations to return, between 1 and 5
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Requires the scaler file to have this SHA-256 digest
    pub fn with_expected_scaler_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_scaler_sha256 = Some(digest.into());
        self
    }

    /// Requires the classifier file to have this SHA-256 digest
    pub fn with_expected_model_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_model_sha256 = Some(digest.into());
        self
    }

    /// Loads and cross-checks both artifacts.
    pub fn build(mut self) -> Result<Predictor, ClassifierError> {
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(ClassifierError::Validation(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, self.top_k
            )));
        }
        if self.labels.is_empty() {
            return Err(ClassifierError::Validation("Label table cannot be empty".into()));
        }
        if let Some(pos) = self.labels.iter().position(|l| l.trim().is_empty()) {
            return Err(ClassifierError::Validation(format!(
                "Label {} cannot be empty",
                pos
            )));
        }

        // Both files are checked for existence before either is decoded, so
        // a missing artifact is always reported as such.
        for (source, kind) in [
            (self.scaler.as_ref().and_then(source_path), ArtifactKind::Scaler),
            (self.model.as_ref().and_then(source_path), ArtifactKind::Classifier),
        ] {
            if let Some(path) = source {
                if !path.exists() {
                    log::error!("{} file {:?} not found", kind, path);
                    return Err(ClassifierError::MissingArtifact(format!(
                        "{} file '{}' not found",
                        kind,
                        path.display()
                    )));
                }
            }
        }

        let (scaler, scaler_source) = match self.scaler.take() {
            Some(Source::Path(path)) => {
                if let Some(expected) = &self.expected_scaler_sha256 {
                    verify_file(&path, expected)?;
                }
                (self.load_scaler(&path)?, path.display().to_string())
            }
            Some(Source::Loaded(scaler)) => (scaler, IN_MEMORY.to_string()),
            None => {
                return Err(ClassifierError::MissingArtifact(
                    "No scaler configured".to_string(),
                ))
            }
        };

        let (model, model_source, placeholder) = match self.model.take() {
            Some(Source::Path(path)) => {
                if let Some(expected) = &self.expected_model_sha256 {
                    verify_file(&path, expected)?;
                }
                let (model, placeholder) = self.load_model(&path)?;
                (model, path.display().to_string(), placeholder)
            }
            Some(Source::Loaded(model)) => (model, IN_MEMORY.to_string(), false),
            None => {
                return Err(ClassifierError::MissingArtifact(
                    "No classifier configured".to_string(),
                ))
            }
        };

        if scaler.n_features() != FEATURE_COUNT {
            return Err(ClassifierError::FeatureMismatch {
                expected: FEATURE_COUNT,
                actual: scaler.n_features(),
            });
        }
        if model.n_features() != FEATURE_COUNT {
            return Err(ClassifierError::FeatureMismatch {
                expected: FEATURE_COUNT,
                actual: model.n_features(),
            });
        }
        if model.n_classes() != self.labels.len() {
            log::error!(
                "Label table has {} entries, classifier has {} classes",
                self.labels.len(),
                model.n_classes()
            );
            return Err(ClassifierError::LabelMismatch {
                labels: self.labels.len(),
                classes: model.n_classes(),
            });
        }

        if placeholder {
            warn!(
                "Classifier {} is a placeholder fitted on synthetic data; its rankings are meaningless",
                model_source
            );
        }
        info!(
            "Predictor ready: {} features, {} classes, top {}",
            FEATURE_COUNT,
            model.n_classes(),
            self.top_k
        );

        Ok(Predictor {
            scaler,
            model,
            labels: Arc::new(self.labels),
            top_k: self.top_k,
            scaler_source,
            model_source,
            placeholder,
        })
    }

    fn load_scaler(&self, path: &Path) -> Result<Arc<dyn FeatureScaler>, ClassifierError> {
        if is_onnx(path) {
            let scaler = OnnxScaler::load(path, FEATURE_COUNT, &self.runtime_config)?;
            return Ok(Arc::new(scaler));
        }
        let artifact = read_artifact::<StandardScaler>(path, ArtifactKind::Scaler)?;
        check_header_width(path, artifact.header.n_features, artifact.payload.mean().len())?;
        info!("Scaler loaded successfully");
        Ok(Arc::new(artifact.payload))
    }

    fn load_model(&self, path: &Path) -> Result<(Arc<dyn ProbabilityModel>, bool), ClassifierError> {
        if is_onnx(path) {
            let model = OnnxClassifier::load(path, FEATURE_COUNT, &self.runtime_config)?;
            return Ok((Arc::new(model), false));
        }
        let artifact = read_artifact::<PrototypeModel>(path, ArtifactKind::Classifier)?;
        check_header_width(path, artifact.header.n_features, artifact.payload.n_features())?;
        info!("Classifier loaded successfully");
        Ok((Arc::new(artifact.payload), artifact.header.placeholder))
    }
}

fn source_path<T: ?Sized>(source: &Source<T>) -> Option<&Path> {
    match source {
        Source::Path(path) => Some(path.as_path()),
        Source::Loaded(_) => None,
    }
}

fn is_onnx(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("onnx"))
        .unwrap_or(false)
}

fn check_header_width(path: &Path, declared: usize, actual: usize) -> Result<(), ClassifierError> {
    if declared != actual {
        return Err(ClassifierError::ArtifactLoad(format!(
            "{} declares {} features but its payload has {}",
            path.display(),
            declared,
            actual
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn uniform_model(n_classes: usize) -> PrototypeModel {
        PrototypeModel::new(Array2::zeros((n_classes, FEATURE_COUNT)), 1.0).unwrap()
    }

    #[test]
    fn test_top_k_bounds() {
        for top_k in [0, 6] {
            let result = PredictorBuilder::new()
                .with_scaler(StandardScaler::identity(FEATURE_COUNT))
                .with_model(uniform_model(17))
                .with_top_k(top_k)
                .build();
            assert!(matches!(result, Err(ClassifierError::Validation(_))));
        }
    }

    #[test]
    fn test_missing_parts() {
        let result = PredictorBuilder::new().with_model(uniform_model(17)).build();
        assert!(matches!(result, Err(ClassifierError::MissingArtifact(_))));

        let result = PredictorBuilder::new()
            .with_scaler(StandardScaler::identity(FEATURE_COUNT))
            .build();
        assert!(matches!(result, Err(ClassifierError::MissingArtifact(_))));
    }

    #[test]
    fn test_empty_label_rejected() {
        let result = PredictorBuilder::new()
            .with_scaler(StandardScaler::identity(FEATURE_COUNT))
            .with_model(uniform_model(2))
            .with_labels(vec!["Chef", " "])
            .build();
        assert!(matches!(result, Err(ClassifierError::Validation(_))));
    }

    #[test]
    fn test_is_onnx() {
        assert!(is_onnx(Path::new("artifacts/model.ONNX")));
        assert!(!is_onnx(Path::new("model_compressed.bin")));
        assert!(!is_onnx(Path::new("onnx")));
    }
}
