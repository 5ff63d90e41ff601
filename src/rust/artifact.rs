//! Storage for the serialized scaler and classifier.
//!
//! A native artifact is a bincode-encoded [`Artifact`] (header plus payload),
//! optionally wrapped in gzip. Readers sniff the gzip magic bytes so both
//! compressed and raw files load through the same path.

use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;
/// Environment variable overriding the artifact directory.
pub const ARTIFACTS_DIR_ENV: &str = "ASPIRE_ARTIFACTS_DIR";
/// Classifier the preparer tries to load before falling back to a placeholder.
pub const DEFAULT_SOURCE_MODEL_FILE: &str = "model.bin";
/// Compressed classifier read by the prediction pipeline.
pub const DEFAULT_MODEL_FILE: &str = "model_compressed.bin";
/// Scaler read by the prediction pipeline.
pub const DEFAULT_SCALER_FILE: &str = "scaler.bin";
/// Gzip level used when compressing classifiers.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 3;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Corrupted artifact {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },
    #[error("Artifact {} holds a {found}, expected a {expected}", path.display())]
    WrongKind {
        path: PathBuf,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("Artifact {} uses unsupported format version {found}", path.display())]
    UnsupportedVersion { path: PathBuf, found: u32 },
    #[error("Hash mismatch for {}: expected {expected}, got {actual}", path.display())]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Invalid preparer options: {0}")]
    InvalidOptions(String),
}

impl ArtifactError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ArtifactError::NotFound(path.to_path_buf())
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Scaler,
    Classifier,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Scaler => write!(f, "scaler"),
            ArtifactKind::Classifier => write!(f, "classifier"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub kind: ArtifactKind,
    /// Width of the feature vectors the payload was fitted on.
    pub n_features: usize,
    /// Set when the payload was synthesised instead of trained on real data.
    pub placeholder: bool,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    pub note: Option<String>,
}

impl ArtifactHeader {
    pub fn new(kind: ArtifactKind, n_features: usize) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            kind,
            n_features,
            placeholder: false,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            note: None,
        }
    }

    pub fn placeholder(mut self, note: impl Into<String>) -> Self {
        self.placeholder = true;
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact<T> {
    pub header: ArtifactHeader,
    pub payload: T,
}

impl<T> Artifact<T> {
    pub fn new(header: ArtifactHeader, payload: T) -> Self {
        Self { header, payload }
    }
}

/// Encodes an artifact, gzip-compressing it when `level` is given.
pub fn encode_artifact<T: Serialize>(
    artifact: &Artifact<T>,
    level: Option<u32>,
) -> Result<Vec<u8>, ArtifactError> {
    let data = bincode::serialize(artifact).map_err(|e| ArtifactError::Encode(e.to_string()))?;
    match level {
        Some(level) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
            encoder
                .write_all(&data)
                .map_err(|e| ArtifactError::Encode(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ArtifactError::Encode(e.to_string()))
        }
        None => Ok(data),
    }
}

/// Decodes artifact bytes read from `path`, checking kind and version.
pub fn decode_artifact<T: DeserializeOwned>(
    path: &Path,
    bytes: &[u8],
    expected: ArtifactKind,
) -> Result<Artifact<T>, ArtifactError> {
    let raw = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .map_err(|e| ArtifactError::Corrupted {
                path: path.to_path_buf(),
                reason: format!("gzip stream: {}", e),
            })?;
        decoded
    } else {
        bytes.to_vec()
    };

    // Check the header first so a kind mismatch is reported as such rather
    // than as a payload decoding failure.
    let header: ArtifactHeader =
        bincode::deserialize(&raw).map_err(|e| ArtifactError::Corrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: header.format_version,
        });
    }
    if header.kind != expected {
        return Err(ArtifactError::WrongKind {
            path: path.to_path_buf(),
            expected,
            found: header.kind,
        });
    }

    bincode::deserialize(&raw).map_err(|e| ArtifactError::Corrupted {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Reads and decodes the artifact at `path`.
pub fn read_artifact<T: DeserializeOwned>(
    path: &Path,
    expected: ArtifactKind,
) -> Result<Artifact<T>, ArtifactError> {
    log::info!("Reading {} artifact from {:?}", expected, path);
    let bytes = fs::read(path).map_err(|e| ArtifactError::io(path, e))?;
    log::info!("Read {} bytes", bytes.len());
    decode_artifact(path, &bytes, expected)
}

/// Writes `artifact` to `path`, replacing any existing file. Returns the
/// number of bytes written.
pub fn write_artifact<T: Serialize>(
    path: &Path,
    artifact: &Artifact<T>,
    level: Option<u32>,
) -> Result<usize, ArtifactError> {
    let bytes = encode_artifact(artifact, level)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;
    }
    log::info!("Writing {} bytes to {:?}", bytes.len(), path);
    fs::write(path, &bytes).map_err(|e| ArtifactError::io(path, e))?;
    Ok(bytes.len())
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String, ArtifactError> {
    let bytes = fs::read(path).map_err(|e| ArtifactError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks a file against an expected SHA-256 digest.
pub fn verify_file(path: &Path, expected_hash: &str) -> Result<(), ArtifactError> {
    log::info!("Verifying file: {:?}", path);
    let actual = sha256_file(path)?;
    log::info!("Calculated hash: {}", actual);
    log::info!("Expected hash:   {}", expected_hash);
    if actual.eq_ignore_ascii_case(expected_hash.trim()) {
        Ok(())
    } else {
        Err(ArtifactError::HashMismatch {
            path: path.to_path_buf(),
            expected: expected_hash.to_string(),
            actual,
        })
    }
}

/// Resolves where the scaler and classifier files live.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> Self {
        Self {
            artifacts_dir: artifacts_dir.as_ref().to_path_buf(),
        }
    }

    /// Creates a store rooted at the default artifacts directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_DIR_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        // 2. Artifacts sit next to wherever the tool is run from
        PathBuf::from(".")
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn source_model_path(&self) -> PathBuf {
        self.artifacts_dir.join(DEFAULT_SOURCE_MODEL_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join(DEFAULT_MODEL_FILE)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.artifacts_dir.join(DEFAULT_SCALER_FILE)
    }
}
