//! Error types for registry edits, settings persistence and configuration.

use std::path::PathBuf;

/// A registry edit rejected before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("label and content are required")]
    MissingSnippetFields,
    #[error("chain name is required")]
    MissingChainName,
    #[error("chain must have at least one step")]
    EmptyChain,
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    #[error("label {label:?} collides with {existing:?} on slot {slot_id:?}")]
    SlotCollision {
        label: String,
        existing: String,
        slot_id: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("read settings {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write settings {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings root in {0} is not a json object")]
    NotAnObject(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
