//! Read the JSON model artifacts.
//!
//! Each reader deserializes into the typed artifact and validates it, so a
//! malformed artifact is rejected at load time rather than when the first
//! request is scored.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::domain::{HedonicArtifact, MarketArtifact, StructuralArtifact};
use crate::error::{RiskError, RiskResult};

pub fn read_hedonic_artifact(path: &Path) -> RiskResult<HedonicArtifact> {
    let artifact: HedonicArtifact = read_json(path)?;
    artifact.validate()?;
    Ok(artifact)
}

pub fn read_structural_artifact(path: &Path) -> RiskResult<StructuralArtifact> {
    let artifact: StructuralArtifact = read_json(path)?;
    artifact.validate()?;
    Ok(artifact)
}

pub fn read_market_artifact(path: &Path) -> RiskResult<MarketArtifact> {
    let artifact: MarketArtifact = read_json(path)?;
    artifact.validate()?;
    Ok(artifact)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> RiskResult<T> {
    let file = File::open(path).map_err(|e| RiskError::data(path, format!("failed to open JSON: {e}")))?;
    serde_json::from_reader(file).map_err(|e| RiskError::data(path, format!("invalid JSON: {e}")))
}
