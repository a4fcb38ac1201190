//! External Inclusion Resolver - `{ExternalPhaseConfig: {Path, Parameters?, Key?}}`

use tracing::debug;

use super::{Resolver, Segment};
use crate::error::{PreprocessError, Result};
use crate::marker::EXTERNAL_KEY;
use crate::node::{Mapping, Node};
use crate::scope::{Namespace, ScopeStack};

/// Version metadata carried by phase files; not part of the phase itself
pub const PHASE_SCHEMA_VERSION_KEY: &str = "PhaseSchemaVersion";

impl Resolver<'_> {
    pub(super) fn include_external(
        &mut self,
        path: &str,
        parameters: Option<&Mapping>,
        key: Option<&str>,
        scope: &mut ScopeStack,
    ) -> Result<Node> {
        if self.is_including(path) {
            return Err(PreprocessError::CircularInclusion {
                chain: self.inclusion_chain(path),
            });
        }

        let mut document = match self.loader.load(path, self.root)? {
            Node::Mapping(mapping) => mapping,
            other => {
                return Err(PreprocessError::malformed(
                    EXTERNAL_KEY,
                    format!("'{}' must contain a mapping, found {}", path, other.kind()),
                ))
            }
        };
        document.remove(PHASE_SCHEMA_VERSION_KEY);

        let body = match key {
            None => Node::Mapping(document),
            Some(key) => document.remove(key).ok_or_else(|| {
                PreprocessError::malformed(
                    EXTERNAL_KEY,
                    format!("'{}' has no top-level key '{}'", path, key),
                )
            })?,
        };

        let arguments = self.resolve_arguments(parameters, scope)?;
        debug!(
            path,
            arguments = arguments.len(),
            "Including external phase config"
        );

        let mut frame = scope.enter();
        for (name, value) in arguments {
            frame.insert(name, value, Namespace::Parameter);
        }

        self.trail.push(Segment::External(path.to_string()));
        let resolved = self
            .resolve_node(&body, &mut frame)
            .map_err(|e| e.within(|| self.render_trail()))?;
        self.trail.pop();
        Ok(resolved)
    }

    /// Inclusions still being resolved sit on the trail
    fn is_including(&self, path: &str) -> bool {
        self.trail
            .iter()
            .any(|segment| matches!(segment, Segment::External(active) if active == path))
    }

    fn inclusion_chain(&self, repeated: &str) -> String {
        self.trail
            .iter()
            .filter_map(|segment| match segment {
                Segment::External(path) => Some(path.as_str()),
                _ => None,
            })
            .chain(std::iter::once(repeated))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
