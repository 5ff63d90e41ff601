//! Offline preparation of the classifier artifact.
//!
//! Loads a source classifier and rewrites it compressed. When the source is
//! missing or unreadable a placeholder is fitted on random data instead, so
//! the prediction pipeline always has something to load. Placeholders are
//! flagged in the artifact header and logged at `warn`; they are only meant
//! for bootstrapping a fresh checkout.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::artifact::{
    read_artifact, sha256_file, write_artifact, Artifact, ArtifactError, ArtifactHeader,
    ArtifactKind, DEFAULT_COMPRESSION_LEVEL,
};
use crate::classifier::{ProbabilityModel, PrototypeModel, StandardScaler};
use crate::features::FEATURE_COUNT;
use crate::labels::CLASS_COUNT;

pub const SYNTHETIC_SAMPLES: usize = 100;

#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// Classifier to compress. Optional; a missing source yields a placeholder.
    pub source: Option<PathBuf>,
    pub output: PathBuf,
    /// Also write a scaler fitted on the synthetic data when a placeholder is
    /// generated.
    pub scaler_output: Option<PathBuf>,
    pub compression_level: u32,
    /// Seed for reproducible placeholders.
    pub seed: Option<u64>,
    pub samples: usize,
    pub classes: usize,
}

impl PrepareOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            source: None,
            output: output.into(),
            scaler_output: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            seed: None,
            samples: SYNTHETIC_SAMPLES,
            classes: CLASS_COUNT,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_scaler_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.scaler_output = Some(path.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Where the written classifier came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Read from `path`. `placeholder` carries the source header's flag, so a
    /// recompressed placeholder stays visible.
    Loaded { path: PathBuf, placeholder: bool },
    Placeholder { reason: String },
}

impl ModelSource {
    /// True when the written classifier was fitted on synthetic data, here
    /// or by an earlier run.
    pub fn is_placeholder(&self) -> bool {
        match self {
            ModelSource::Loaded { placeholder, .. } => *placeholder,
            ModelSource::Placeholder { .. } => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrepareOutcome {
    pub source: ModelSource,
    pub output: PathBuf,
    pub bytes_written: usize,
    pub sha256: String,
    /// Set when a scaler was written alongside a placeholder.
    pub scaler_output: Option<PathBuf>,
}

/// Synthetic training data: `samples` rows uniform in `[0, 1)` and labels
/// cycling through every class, then shuffled.
pub fn synthetic_dataset(
    samples: usize,
    n_features: usize,
    n_classes: usize,
    rng: &mut impl Rng,
) -> (Array2<f32>, Vec<usize>) {
    let x = Array2::from_shape_fn((samples, n_features), |_| rng.gen::<f32>());
    let mut y: Vec<usize> = (0..samples).map(|i| i % n_classes).collect();
    y.shuffle(rng);
    (x, y)
}

fn load_source(path: &Path) -> Result<Artifact<PrototypeModel>, String> {
    let artifact = read_artifact::<PrototypeModel>(path, ArtifactKind::Classifier)
        .map_err(|e| e.to_string())?;
    if artifact.payload.n_features() != FEATURE_COUNT {
        return Err(format!(
            "{} has {} features, expected {}",
            path.display(),
            artifact.payload.n_features(),
            FEATURE_COUNT
        ));
    }
    Ok(artifact)
}

/// Runs the preparer. Only a failure to write output is an error.
pub fn prepare(options: &PrepareOptions) -> Result<PrepareOutcome, ArtifactError> {
    let loaded = match &options.source {
        Some(path) => load_source(path).map(|artifact| (artifact, path.clone())),
        None => Err("no source classifier given".to_string()),
    };

    let (artifact, source, scaler) = match loaded {
        Ok((artifact, path)) => {
            let placeholder = artifact.header.placeholder;
            if placeholder {
                log::warn!(
                    "Source classifier {:?} is itself a placeholder ({}); the output will be one too",
                    path,
                    artifact.header.note.as_deref().unwrap_or("no note")
                );
            } else {
                log::info!("Model loaded from {:?} successfully", path);
            }
            (artifact, ModelSource::Loaded { path, placeholder }, None)
        }
        Err(reason) => {
            log::warn!("Failed to load source classifier: {}", reason);
            log::warn!("Generating a placeholder classifier from random data instead");
            let (model, scaler) = fit_placeholder(options)?;
            let header = ArtifactHeader::new(ArtifactKind::Classifier, FEATURE_COUNT)
                .placeholder(format!("synthetic fallback: {}", reason));
            (
                Artifact::new(header, model),
                ModelSource::Placeholder { reason },
                Some(scaler),
            )
        }
    };

    let bytes_written = write_artifact(
        &options.output,
        &artifact,
        Some(options.compression_level),
    )?;
    let sha256 = sha256_file(&options.output)?;
    log::info!(
        "Model saved as {:?} ({} bytes, sha256 {})",
        options.output,
        bytes_written,
        sha256
    );

    let scaler_output = match (&options.scaler_output, scaler) {
        (Some(path), Some(scaler)) => {
            let mut header = ArtifactHeader::new(ArtifactKind::Scaler, FEATURE_COUNT);
            if let ModelSource::Placeholder { reason } = &source {
                header = header.placeholder(format!("synthetic fallback: {}", reason));
            }
            write_artifact(path, &Artifact::new(header, scaler), Some(options.compression_level))?;
            log::info!("Scaler saved as {:?}", path);
            Some(path.clone())
        }
        (Some(path), None) => {
            log::info!("Source classifier loaded; leaving scaler {:?} untouched", path);
            None
        }
        _ => None,
    };

    Ok(PrepareOutcome {
        source,
        output: options.output.clone(),
        bytes_written,
        sha256,
        scaler_output,
    })
}

fn fit_placeholder(options: &PrepareOptions) -> Result<(PrototypeModel, StandardScaler), ArtifactError> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    if options.classes == 0 || options.samples < options.classes {
        return Err(ArtifactError::InvalidOptions(format!(
            "Need at least one sample per class, got {} samples for {} classes",
            options.samples, options.classes
        )));
    }
    let (x, y) = synthetic_dataset(options.samples, FEATURE_COUNT, options.classes, &mut rng);
    let scaler = StandardScaler::fit(x.view()).map_err(|e| ArtifactError::InvalidOptions(e.to_string()))?;
    let model = PrototypeModel::fit(x.view(), &y, options.classes, PrototypeModel::DEFAULT_TEMPERATURE)
        .map_err(|e| ArtifactError::InvalidOptions(e.to_string()))?;
    Ok((model, scaler))
}
