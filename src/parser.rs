//! Workload Parser
//!
//! Turns user-written workload files into fully resolved documents:
//! parameters substituted, templates instantiated, phases synthesized and
//! external phase configs inlined.

use std::path::Path;

use tracing::info;

use crate::config::{PreprocessConfig, YamlSource};
use crate::error::{PreprocessError, Result};
use crate::loader::{DocumentLoader, FsDocumentLoader};
use crate::node::Node;
use crate::resolver::resolve_document;
use crate::smoke::convert_to_smoke_test;

pub struct WorkloadParser {
    config: PreprocessConfig,
    loader: Box<dyn DocumentLoader>,
}

impl WorkloadParser {
    /// Parser reading external phase configs from the filesystem
    pub fn new(config: PreprocessConfig) -> Self {
        Self::with_loader(config, FsDocumentLoader)
    }

    pub fn with_loader(config: PreprocessConfig, loader: impl DocumentLoader + 'static) -> Self {
        Self {
            config,
            loader: Box::new(loader),
        }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Parse and resolve a workload given as a file path or as YAML text
    pub fn parse(&self, source: &str, kind: YamlSource) -> Result<Node> {
        let document = match kind {
            YamlSource::File => {
                info!("Parsing workload file {}", source);
                let text = std::fs::read_to_string(source).map_err(|e| {
                    PreprocessError::FileResolution {
                        path: source.into(),
                        reason: e.to_string(),
                    }
                })?;
                Node::from_yaml_str(&text, source)?
            }
            YamlSource::String => {
                info!("Parsing workload from string ({} bytes)", source.len());
                Node::from_yaml_str(source, "<string>")?
            }
        };
        self.resolve(document)
    }

    /// Resolve an already parsed document
    pub fn resolve(&self, document: Node) -> Result<Node> {
        let resolved = resolve_document(
            &document,
            self.loader.as_ref(),
            &self.config.phase_config_root,
        )?;
        if self.config.smoke_test {
            info!("Converting workload to smoke-test form");
            Ok(convert_to_smoke_test(resolved))
        } else {
            Ok(resolved)
        }
    }
}

/// Resolve `document`, reading external phase configs relative to
/// `external_root`.
pub fn resolve(document: Node, external_root: &Path) -> Result<Node> {
    resolve_document(&document, &FsDocumentLoader, external_root)
}
