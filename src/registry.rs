//! Template Registry - actor templates declared under `ActorTemplates`
//!
//! Built once from the input document before any actor is walked and never
//! mutated afterwards.

use tracing::debug;

use crate::error::{PreprocessError, Result};
use crate::node::{Mapping, Node};

pub const ACTOR_TEMPLATES_KEY: &str = "ActorTemplates";

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDefinition {
    pub name: String,
    pub config: Node,
}

#[derive(Debug, Default)]
pub struct TemplateRegistry {
    /// Definition order is kept for listing
    templates: Vec<TemplateDefinition>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every entry of a top-level `ActorTemplates` sequence.
    /// A document without one yields an empty registry.
    pub fn from_document(document: &Mapping) -> Result<Self> {
        let mut registry = Self::new();
        let entries = match document.get(ACTOR_TEMPLATES_KEY) {
            None => return Ok(registry),
            Some(node) if node.is_null() => return Ok(registry),
            Some(node) => node.as_sequence().ok_or_else(|| {
                PreprocessError::malformed(
                    ACTOR_TEMPLATES_KEY,
                    format!("must be a sequence, found {}", node.kind()),
                )
            })?,
        };

        for (index, entry) in entries.iter().enumerate() {
            let construct = format!("{}[{}]", ACTOR_TEMPLATES_KEY, index);
            let entry = entry.as_mapping().ok_or_else(|| {
                PreprocessError::malformed(&construct, format!("must be a mapping, found {}", entry.kind()))
            })?;
            let name = entry
                .get("TemplateName")
                .and_then(Node::as_str)
                .ok_or_else(|| PreprocessError::malformed(&construct, "missing string 'TemplateName'"))?;
            let config = entry
                .get("Config")
                .ok_or_else(|| PreprocessError::malformed(&construct, "missing 'Config'"))?;
            registry.register(name, config.clone())?;
        }

        debug!("Registered {} actor templates", registry.len());
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, config: Node) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(PreprocessError::DuplicateTemplate { name });
        }
        self.templates.push(TemplateDefinition { name, config });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Lookup that fails with `UnknownTemplate`
    pub fn require(&self, name: &str) -> Result<&TemplateDefinition> {
        self.get(name).ok_or_else(|| PreprocessError::UnknownTemplate {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(yaml: &str) -> Mapping {
        Node::from_yaml_str(yaml, "test")
            .unwrap()
            .as_mapping()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_registers_in_definition_order() {
        let doc = document(
            r#"
ActorTemplates:
- TemplateName: Second
  Config: {Name: b}
- TemplateName: First
  Config: {Name: a}
"#,
        );
        let registry = TemplateRegistry::from_document(&doc).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Second", "First"]);
        assert_eq!(
            registry.require("First").unwrap().config,
            Node::from_yaml_str("Name: a", "test").unwrap()
        );
    }

    #[test]
    fn test_duplicate_template() {
        let doc = document(
            r#"
ActorTemplates:
- TemplateName: T
  Config: {}
- TemplateName: T
  Config: {}
"#,
        );
        let err = TemplateRegistry::from_document(&doc).unwrap_err();
        assert!(matches!(err, PreprocessError::DuplicateTemplate { name } if name == "T"));
    }

    #[test]
    fn test_unknown_template() {
        let registry = TemplateRegistry::from_document(&document("Actors: []")).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.require("Nope"),
            Err(PreprocessError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn test_entry_without_config_is_malformed() {
        let doc = document("ActorTemplates:\n- TemplateName: T\n");
        let err = TemplateRegistry::from_document(&doc).unwrap_err();
        assert!(err.to_string().contains("ActorTemplates[0]"));
    }
}
