//! ONNX Runtime backends for scalers and classifiers exported by an external
//! trainer.
//!
//! Both backends take a single `float32` input of shape `[batch, features]`.
//! - Scaler: the first output is the scaled batch, same shape as the input.
//! - Classifier: the output named `probabilities` (or, failing that, the last
//!   output) is a `[batch, classes]` float tensor. Classifiers exported with a
//!   ZipMap post-processor produce maps instead of a tensor and are rejected
//!   by the zero-row check at load.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array2, ArrayView2, Ix2};
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::model::ProbabilityModel;
use super::scaler::FeatureScaler;
use crate::runtime::{create_session_builder, RuntimeConfig};

const PROBABILITY_OUTPUT: &str = "probabilities";

#[derive(Debug)]
struct OnnxGraph {
    session: Session,
    input_name: String,
    output_index: usize,
}

impl OnnxGraph {
    fn load(path: &Path, config: &RuntimeConfig, preferred_output: Option<&str>) -> Result<Self, ClassifierError> {
        log::info!("Loading ONNX model from: {:?}", path);
        if !path.exists() {
            return Err(ClassifierError::MissingArtifact(format!(
                "{} not found",
                path.display()
            )));
        }

        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                log::error!("Failed to load ONNX model {:?}: {}", path, e);
                ClassifierError::ArtifactLoad(format!("{}: {}", path.display(), e))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                ClassifierError::ArtifactLoad(format!("{} declares no inputs", path.display()))
            })?;
        if session.outputs.is_empty() {
            return Err(ClassifierError::ArtifactLoad(format!(
                "{} declares no outputs",
                path.display()
            )));
        }
        let output_index = preferred_output
            .and_then(|name| session.outputs.iter().position(|o| o.name == name))
            .unwrap_or(match preferred_output {
                Some(_) => session.outputs.len() - 1,
                None => 0,
            });

        Ok(Self {
            session,
            input_name,
            output_index,
        })
    }

    fn run(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError> {
        let input = Tensor::from_array(batch.as_standard_layout().into_owned())
            .map_err(|e| ClassifierError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), input);

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::Inference(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.output_index]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        output_tensor
            .to_owned()
            .into_dimensionality::<Ix2>()
            .map_err(|e| ClassifierError::Inference(format!("Unexpected output shape: {}", e)))
    }

    /// Runs a zero row through the graph and returns the output width.
    fn output_width(&self, n_features: usize) -> Result<usize, ClassifierError> {
        let zeros = Array2::<f32>::zeros((1, n_features));
        let output = self.run(zeros.view()).map_err(|e| {
            ClassifierError::ArtifactLoad(format!("Zero-row check with {} features failed: {}", n_features, e))
        })?;
        Ok(output.ncols())
    }
}

/// A scaler exported to ONNX.
#[derive(Debug)]
pub struct OnnxScaler {
    graph: OnnxGraph,
    n_features: usize,
}

impl OnnxScaler {
    pub fn load(path: &Path, n_features: usize, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let graph = OnnxGraph::load(path, config, None)?;
        let width = graph.output_width(n_features)?;
        if width != n_features {
            return Err(ClassifierError::FeatureMismatch {
                expected: n_features,
                actual: width,
            });
        }
        log::info!("ONNX scaler validated ({} features)", n_features);
        Ok(Self { graph, n_features })
    }
}

impl FeatureScaler for OnnxScaler {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn transform(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError> {
        self.graph.run(batch)
    }
}

/// A probabilistic classifier exported to ONNX.
#[derive(Debug)]
pub struct OnnxClassifier {
    graph: OnnxGraph,
    n_features: usize,
    n_classes: usize,
}

impl OnnxClassifier {
    pub fn load(path: &Path, n_features: usize, config: &RuntimeConfig) -> Result<Self, ClassifierError> {
        let graph = OnnxGraph::load(path, config, Some(PROBABILITY_OUTPUT))?;
        let n_classes = graph.output_width(n_features)?;
        log::info!("Inferred class count from model: {}", n_classes);
        Ok(Self {
            graph,
            n_features,
            n_classes,
        })
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError> {
        self.graph.run(batch)
    }
}
