//! Document Loader
//!
//! Source of documents referenced by `ExternalPhaseConfig.Path`.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{PreprocessError, Result};
use crate::node::Node;

pub trait DocumentLoader {
    /// Load and parse the document at `path`, relative to `root`
    fn load(&self, path: &str, root: &Path) -> Result<Node>;
}

/// Reads documents from the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentLoader;

impl DocumentLoader for FsDocumentLoader {
    fn load(&self, path: &str, root: &Path) -> Result<Node> {
        let full_path = root.join(path);
        debug!("Loading external document {}", full_path.display());

        let content =
            std::fs::read_to_string(&full_path).map_err(|e| PreprocessError::FileResolution {
                path: full_path.clone(),
                reason: e.to_string(),
            })?;
        Node::from_yaml_str(&content, &full_path.display().to_string())
    }
}

/// Serves documents from memory, keyed by their relative path. The root is
/// ignored.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLoader {
    documents: HashMap<String, String>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<String>, yaml: impl Into<String>) -> Self {
        self.documents.insert(path.into(), yaml.into());
        self
    }
}

impl DocumentLoader for InMemoryLoader {
    fn load(&self, path: &str, root: &Path) -> Result<Node> {
        let yaml = self
            .documents
            .get(path)
            .ok_or_else(|| PreprocessError::FileResolution {
                path: root.join(path),
                reason: "no such document".to_string(),
            })?;
        Node::from_yaml_str(yaml, path)
    }
}
