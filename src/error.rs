//! Error types for workload preprocessing
//!
//! Every failure is fatal to the current resolution pass. Errors raised inside
//! a template instantiation or an external inclusion are wrapped once in
//! [`PreprocessError::InExpansion`] so the caller can see which location and
//! expansion chain produced them.

use std::path::PathBuf;

use thiserror::Error;

use crate::scope::Namespace;

pub type Result<T, E = PreprocessError> = std::result::Result<T, E>;

/// Main error type for the preprocessor
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Name '{name}' is not bound in the {namespace} namespace")]
    NameResolution { name: String, namespace: Namespace },

    #[error("Parameter '{name}' is not in scope and has no Default")]
    UnresolvedParameter { name: String },

    #[error("Template '{name}' is not defined in ActorTemplates")]
    UnknownTemplate { name: String },

    #[error("Template '{name}' is defined more than once in ActorTemplates")]
    DuplicateTemplate { name: String },

    #[error("Circular template reference: {chain}")]
    CircularTemplate { chain: String },

    #[error("Circular external inclusion: {chain}")]
    CircularInclusion { chain: String },

    #[error("Active phase index {index} is outside [0, {up_to})")]
    PhaseIndexOutOfRange { index: i64, up_to: u64 },

    #[error("Malformed '{construct}': {reason}")]
    MalformedStructure { construct: String, reason: String },

    #[error("Cannot load external document '{}': {reason}", path.display())]
    FileResolution { path: PathBuf, reason: String },

    #[error("Invalid YAML in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{source} (at {chain})")]
    InExpansion {
        chain: String,
        #[source]
        source: Box<PreprocessError>,
    },
}

impl PreprocessError {
    pub fn malformed(construct: impl Into<String>, reason: impl Into<String>) -> Self {
        PreprocessError::MalformedStructure {
            construct: construct.into(),
            reason: reason.into(),
        }
    }

    /// The underlying error with any expansion-chain context stripped
    pub fn root_cause(&self) -> &PreprocessError {
        match self {
            PreprocessError::InExpansion { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Rendered expansion chain, if the error was raised inside one
    pub fn expansion_chain(&self) -> Option<&str> {
        match self {
            PreprocessError::InExpansion { chain, .. } => Some(chain),
            _ => None,
        }
    }

    /// Attach the chain once; an error already carrying a chain was raised
    /// deeper and its chain is the longer one.
    pub(crate) fn within(self, chain: impl FnOnce() -> String) -> Self {
        match self {
            wrapped @ PreprocessError::InExpansion { .. } => wrapped,
            other => PreprocessError::InExpansion {
                chain: chain(),
                source: Box::new(other),
            },
        }
    }
}
