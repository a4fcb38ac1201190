//! Template Expander - `{ActorFromTemplate: {TemplateName, TemplateParameters}}`

use tracing::debug;

use super::{Resolver, Segment};
use crate::error::{PreprocessError, Result};
use crate::node::{Mapping, Node};
use crate::scope::{Namespace, ScopeStack};

impl Resolver<'_> {
    /// Copy the template's `Config` into a fresh frame bound to the caller's
    /// arguments and resolve it there. The frame is gone before the caller
    /// moves on to the next sibling.
    pub(super) fn instantiate(
        &mut self,
        template_name: &str,
        parameters: Option<&Mapping>,
        scope: &mut ScopeStack,
    ) -> Result<Node> {
        let registry = self.registry;
        let template = registry.require(template_name)?;

        // Templates being expanded are bound in the TemplateBinding namespace
        // of their frame, so a repeat anywhere up the stack is a cycle.
        if scope.contains(template_name, Namespace::TemplateBinding) {
            return Err(PreprocessError::CircularTemplate {
                chain: self.template_chain(template_name),
            });
        }

        let arguments = self.resolve_arguments(parameters, scope)?;
        debug!(
            template = template_name,
            arguments = arguments.len(),
            "Instantiating actor template"
        );

        let mut frame = scope.enter();
        frame.insert(
            template_name,
            Node::string(template_name),
            Namespace::TemplateBinding,
        );
        for (name, value) in arguments {
            frame.insert(name, value, Namespace::Parameter);
        }

        self.trail.push(Segment::Template(template_name.to_string()));
        let resolved = self
            .resolve_node(&template.config, &mut frame)
            .map_err(|e| e.within(|| self.render_trail()))?;
        self.trail.pop();
        Ok(resolved)
    }

    fn template_chain(&self, repeated: &str) -> String {
        self.trail
            .iter()
            .filter_map(|segment| match segment {
                Segment::Template(name) => Some(name.as_str()),
                _ => None,
            })
            .chain(std::iter::once(repeated))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
