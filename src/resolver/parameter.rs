//! Parameter Resolver - `{^Parameter: {Name, Default?}}`

use tracing::trace;

use super::Resolver;
use crate::error::{PreprocessError, Result};
use crate::node::Node;
use crate::scope::{Namespace, ScopeStack};

impl Resolver<'_> {
    /// Substitute the innermost binding for `name`, else the walked
    /// `default`. Every substitution is an independent copy.
    pub(super) fn resolve_parameter(
        &mut self,
        name: &str,
        default: Option<&Node>,
        scope: &mut ScopeStack,
    ) -> Result<Node> {
        match scope.get(name, Namespace::Parameter).cloned() {
            Ok(value) => {
                trace!(parameter = name, "Substituting bound value");
                Ok(value)
            }
            Err(PreprocessError::NameResolution { .. }) => match default {
                Some(default) => {
                    trace!(parameter = name, "Substituting Default");
                    self.resolve_node(default, scope)
                }
                None => Err(PreprocessError::UnresolvedParameter {
                    name: name.to_string(),
                }),
            },
            Err(other) => Err(other),
        }
    }
}
