//! Career aspiration predictor.
//!
//! A student's profile is turned into a fixed 14-column feature vector,
//! normalised by a pre-fitted scaler and scored by a pre-fitted classifier.
//! The five most likely careers come back ranked by probability.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use aspire::{Gender, Predictor, Profile};
//!
//! let predictor = Predictor::builder()
//!     .with_scaler_path("scaler.bin")
//!     .with_model_path("model_compressed.bin")
//!     .build()?;
//!
//! let profile = Profile {
//!     gender: Gender::Female,
//!     part_time_job: false,
//!     ..Profile::default()
//! };
//! for p in predictor.predict_profile(&profile)? {
//!     println!("{}. {} ({:.1}%)", p.rank, p.label, p.probability * 100.0);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Artifacts
//!
//! Scaler and classifier are either native artifacts written by
//! `aspire-prepare` (see [`artifact`]) or `.onnx` exports, which run through
//! ONNX Runtime. Either way both are loaded once by
//! [`PredictorBuilder::build`] and never mutated afterwards, so a
//! [`Predictor`] can be shared across threads behind an `Arc`.

pub mod artifact;
pub mod classifier;
pub mod features;
pub mod form;
pub mod labels;
pub mod preparer;
pub mod profile;
mod runtime;

pub use artifact::{ArtifactError, ArtifactKind, ArtifactStore};
pub use classifier::{
    ClassifierError, FeatureScaler, Prediction, Predictor, PredictorBuilder, PredictorInfo,
    ProbabilityModel, PrototypeModel, StandardScaler,
};
pub use features::{assemble_features, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
pub use labels::CAREER_LABELS;
pub use preparer::{prepare, ModelSource, PrepareOptions, PrepareOutcome};
pub use profile::{Gender, Profile, Subject};
pub use runtime::RuntimeConfig;

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
