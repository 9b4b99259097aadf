//! Exclusion-list loading.
//!
//! The file is JSON: either a flat array of identifiers or an object with an
//! `exclusions` array. Problems never abort a run; [`load_exclusions`]
//! degrades them to an empty set and records why.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::models::ExclusionSet;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("exclusion file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read exclusion file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse exclusion file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExclusionFile {
    List(Vec<String>),
    Object { exclusions: Vec<String> },
}

pub fn read_exclusions(path: &Path) -> Result<ExclusionSet, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    // Editors on Windows like to leave a BOM in front of the JSON.
    let contents = contents.trim_start_matches('\u{feff}');
    if contents.trim().is_empty() {
        return Ok(ExclusionSet::empty());
    }

    let parsed: ExclusionFile =
        serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let entries = match parsed {
        ExclusionFile::List(entries) => entries,
        ExclusionFile::Object { exclusions } => exclusions,
    };
    Ok(ExclusionSet::new(entries))
}

pub fn load_exclusions(path: &Path, audit: &dyn AuditSink) -> ExclusionSet {
    match read_exclusions(path) {
        Ok(set) => {
            audit.info(&format!(
                "loaded {} exclusion(s) from {}",
                set.len(),
                path.display()
            ));
            set
        }
        Err(error @ ConfigError::NotFound { .. }) => {
            audit.info(&format!("{error}; no packages excluded"));
            ExclusionSet::empty()
        }
        Err(error) => {
            tracing::warn!(error = %error, "ignoring exclusion file");
            audit.warn(&format!("{error}; no packages excluded"));
            ExclusionSet::empty()
        }
    }
}
