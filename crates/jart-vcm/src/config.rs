//! YAML loading of the constant table.
//!
//! The file layout is the serde form of `ModelConstants`: four top-level
//! sections (`physical`, `nominal`, `negative`, `positive`). Fitted
//! coefficients may omit any sensitivity, which then defaults to zero.
//! Unknown keys are rejected so a misspelt coefficient cannot silently fall
//! back to a default.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::ModelConstants;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to serialize constant table: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Read a constant table from a YAML file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ModelConstants, ConfigError> {
    let path = path.as_ref().to_path_buf();
    let reader = std::fs::File::open(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let constants: ModelConstants =
        serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
    log::debug!("constant table loaded from {}", path.display());
    Ok(constants)
}

/// Parse a constant table from YAML text. Errors report the path as `<string>`.
pub fn from_yaml_str(text: &str) -> Result<ModelConstants, ConfigError> {
    serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: PathBuf::from("<string>"),
        source,
    })
}

/// Serialize a constant table, e.g. to dump the placeholder defaults as a template.
pub fn to_yaml_string(constants: &ModelConstants) -> Result<String, ConfigError> {
    serde_yaml::to_string(constants).map_err(ConfigError::Serialize)
}
