//! Resolution pass
//!
//! One depth-first walk over the document. Literal mappings, sequences and
//! scalars are copied; each marker is dispatched to its handler:
//!
//! - `^Parameter` → [`parameter`]
//! - `ActorFromTemplate` → [`template`]
//! - `OnlyActiveInPhases` → [`phases`]
//! - `ExternalPhaseConfig` → [`external`]
//!
//! Handlers that bind names push a scope frame, recurse, and drop the frame
//! before returning, so siblings never see each other's bindings.

mod external;
mod parameter;
mod phases;
mod template;

use std::fmt::Write as _;
use std::path::Path;

use tracing::{info, trace};

use crate::error::{PreprocessError, Result};
use crate::loader::DocumentLoader;
use crate::marker::Marker;
use crate::node::{Mapping, Node};
use crate::registry::{TemplateRegistry, ACTOR_TEMPLATES_KEY};
use crate::scope::ScopeStack;

/// One step of the path from the document root to the node being resolved
#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
    Template(String),
    External(String),
}

pub struct Resolver<'a> {
    registry: &'a TemplateRegistry,
    loader: &'a dyn DocumentLoader,
    root: &'a Path,
    trail: Vec<Segment>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a TemplateRegistry, loader: &'a dyn DocumentLoader, root: &'a Path) -> Self {
        Self {
            registry,
            loader,
            root,
            trail: Vec::new(),
        }
    }

    /// Resolve `node` under the bindings currently in `scope`
    pub fn resolve_node(&mut self, node: &Node, scope: &mut ScopeStack) -> Result<Node> {
        match node {
            Node::Scalar(_) => Ok(node.clone()),
            Node::Sequence(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    resolved.push(self.descend(Segment::Index(index), |r| r.resolve_node(item, scope))?);
                }
                Ok(Node::Sequence(resolved))
            }
            Node::Mapping(mapping) => match Marker::classify(mapping)? {
                Some(marker) => self.resolve_marker(marker, scope),
                None => {
                    let mut resolved = Mapping::new();
                    for (key, value) in mapping.iter() {
                        let value = self.descend(Segment::Key(key.to_string()), |r| {
                            r.resolve_node(value, scope)
                        })?;
                        resolved.insert(key, value);
                    }
                    Ok(Node::Mapping(resolved))
                }
            },
        }
    }

    fn resolve_marker(&mut self, marker: Marker<'_>, scope: &mut ScopeStack) -> Result<Node> {
        trace!(marker = marker.key(), depth = scope.depth(), "Resolving marker");
        match marker {
            Marker::Parameter { name, default } => self.resolve_parameter(name, default, scope),
            Marker::TemplateRef {
                template_name,
                parameters,
            } => self.instantiate(template_name, parameters, scope),
            Marker::ActiveInPhases {
                active,
                up_to,
                phase_config,
            } => self.build_phases(active, up_to, phase_config, scope),
            Marker::ExternalInclusion {
                path,
                parameters,
                key,
            } => self.include_external(path, parameters, key, scope),
        }
    }

    /// Resolve caller-supplied arguments in the caller's scope, before the
    /// callee's frame is pushed.
    fn resolve_arguments(
        &mut self,
        parameters: Option<&Mapping>,
        scope: &mut ScopeStack,
    ) -> Result<Vec<(String, Node)>> {
        let mut arguments = Vec::new();
        if let Some(parameters) = parameters {
            for (name, value) in parameters.iter() {
                let value = self.descend(Segment::Key(name.to_string()), |r| {
                    r.resolve_node(value, scope)
                })?;
                arguments.push((name.to_string(), value));
            }
        }
        Ok(arguments)
    }

    /// On error the segment is left in place; the pass is aborted anyway and
    /// the trail then points at the failing node.
    fn descend<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.trail.push(segment);
        let out = f(self)?;
        self.trail.pop();
        Ok(out)
    }

    /// Current location, e.g. `Actors[2] -> template 'T' -> Phases[1]`
    fn render_trail(&self) -> String {
        let mut out = String::new();
        let mut after_expansion = false;
        for segment in &self.trail {
            match segment {
                Segment::Key(key) => {
                    if after_expansion {
                        out.push_str(" -> ");
                    } else if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                    after_expansion = false;
                }
                Segment::Index(index) => {
                    if after_expansion {
                        out.push_str(" -> ");
                    }
                    let _ = write!(out, "[{}]", index);
                    after_expansion = false;
                }
                Segment::Template(name) => {
                    if !out.is_empty() {
                        out.push_str(" -> ");
                    }
                    let _ = write!(out, "template '{}'", name);
                    after_expansion = true;
                }
                Segment::External(path) => {
                    if !out.is_empty() {
                        out.push_str(" -> ");
                    }
                    let _ = write!(out, "external '{}'", path);
                    after_expansion = true;
                }
            }
        }
        out
    }

    fn with_location(&self, err: PreprocessError) -> PreprocessError {
        if self.trail.is_empty() {
            err
        } else {
            err.within(|| self.render_trail())
        }
    }
}

/// Resolve a whole workload document.
///
/// `ActorTemplates` is consumed into the registry and dropped from the output;
/// every other top-level entry is walked in order.
pub fn resolve_document(document: &Node, loader: &dyn DocumentLoader, root: &Path) -> Result<Node> {
    let mapping = document.as_mapping().ok_or_else(|| {
        PreprocessError::malformed(
            "workload",
            format!("document must be a mapping, found {}", document.kind()),
        )
    })?;

    let registry = TemplateRegistry::from_document(mapping)?;

    let body: Mapping = mapping
        .iter()
        .filter(|(key, _)| *key != ACTOR_TEMPLATES_KEY)
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();

    let mut resolver = Resolver::new(&registry, loader, root);
    let mut scope = ScopeStack::new();
    let resolved = resolver
        .resolve_node(&Node::Mapping(body), &mut scope)
        .map_err(|e| resolver.with_location(e))?;

    info!(
        "Resolved workload with {} templates and {} top-level entries",
        registry.len(),
        resolved.as_mapping().map(Mapping::len).unwrap_or(0)
    );
    Ok(resolved)
}
