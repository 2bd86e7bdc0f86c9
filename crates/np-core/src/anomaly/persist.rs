//! Durable storage for fitted model parameters.
//!
//! Models are written as a versioned JSON envelope carrying a SHA-256
//! integrity digest of the payload. Writes go through a temp file and an
//! atomic rename. The forest itself is not serializable; the persisted
//! parameters are each detector's fitted scaler and scaled training
//! matrix, from which reload re-fits an equivalent forest.

use np_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Schema version for model artifacts.
pub const MODEL_SCHEMA_VERSION: &str = "1.0.0";

/// Versioned envelope around the persisted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Schema version for forward/backward compat checks.
    pub schema_version: String,
    /// RFC-3339 timestamp of artifact creation.
    pub generated_at: String,
    /// SHA-256 hex digest of the payload JSON.
    pub integrity_sha256: String,
    /// The fitted parameters.
    pub payload: ModelPayload,
}

/// Fitted parameters for both detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPayload {
    pub contamination: f64,
    pub traffic: DetectorParams,
    pub latency: DetectorParams,
}

/// Fitted parameters for one detector.
///
/// `samples` rows are already scaled; their width must equal the length of
/// `mean`/`scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub samples: Vec<Vec<f64>>,
}

/// Write the artifact atomically (temp file + rename).
pub fn save(path: &Path, payload: &ModelPayload) -> Result<()> {
    let payload_json = serde_json::to_string(payload)?;
    let artifact = ModelArtifact {
        schema_version: MODEL_SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        integrity_sha256: sha256_hex(payload_json.as_bytes()),
        payload: payload.clone(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&artifact)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read and verify an artifact. Schema or integrity mismatches surface as
/// `Error::ArtifactRejected`; callers treat every failure as "stay
/// untrained", never as a startup error.
pub fn load(path: &Path) -> Result<ModelPayload> {
    let raw = fs::read_to_string(path)?;
    let artifact: ModelArtifact = serde_json::from_str(&raw)?;

    if artifact.schema_version != MODEL_SCHEMA_VERSION {
        return Err(Error::ArtifactRejected(format!(
            "schema version {} (expected {})",
            artifact.schema_version, MODEL_SCHEMA_VERSION
        )));
    }

    let payload_json = serde_json::to_string(&artifact.payload)?;
    let digest = sha256_hex(payload_json.as_bytes());
    if digest != artifact.integrity_sha256 {
        return Err(Error::ArtifactRejected("integrity digest mismatch".into()));
    }

    Ok(artifact.payload)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
