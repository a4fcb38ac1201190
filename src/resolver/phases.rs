//! Phase Array Builder - `{OnlyActiveInPhases: {Active, NopInPhasesUpTo, PhaseConfig}}`
//!
//! Places `PhaseConfig` at every active index of a `NopInPhasesUpTo`-long
//! sequence and fills the remaining positions with `{Nop: true}`.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{Resolver, Segment};
use crate::error::{PreprocessError, Result};
use crate::marker::ACTIVE_IN_PHASES_KEY;
use crate::node::Node;
use crate::scope::ScopeStack;

/// Largest accepted `NopInPhasesUpTo`
pub const MAX_PHASES: u64 = 100_000;

impl Resolver<'_> {
    pub(super) fn build_phases(
        &mut self,
        active: &Node,
        up_to: &Node,
        phase_config: &Node,
        scope: &mut ScopeStack,
    ) -> Result<Node> {
        let up_to = self.descend(Segment::Key("NopInPhasesUpTo".to_string()), |r| {
            r.resolve_node(up_to, scope)
        })?;
        let up_to = up_to
            .as_i64()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| {
                PreprocessError::malformed(
                    ACTIVE_IN_PHASES_KEY,
                    format!(
                        "'NopInPhasesUpTo' must be a non-negative integer, found {}",
                        describe(&up_to)
                    ),
                )
            })?;
        if up_to > MAX_PHASES {
            return Err(PreprocessError::malformed(
                ACTIVE_IN_PHASES_KEY,
                format!(
                    "'NopInPhasesUpTo' is {}, more than the maximum of {} phases",
                    up_to, MAX_PHASES
                ),
            ));
        }

        let active = self.descend(Segment::Key("Active".to_string()), |r| {
            r.resolve_node(active, scope)
        })?;
        let indices = active_indices(&active, up_to)?;

        // Only resolved when something will be placed
        let config = if indices.is_empty() {
            None
        } else {
            Some(self.descend(Segment::Key("PhaseConfig".to_string()), |r| {
                r.resolve_node(phase_config, scope)
            })?)
        };

        debug!(
            active = ?indices,
            up_to,
            "Synthesizing phases from OnlyActiveInPhases"
        );

        let phases = (0..up_to)
            .map(|position| match &config {
                Some(config) if indices.contains(&position) => config.clone(),
                _ => Node::nop(),
            })
            .collect();
        Ok(Node::Sequence(phases))
    }
}

/// Validate the resolved `Active` list against `[0, up_to)`
fn active_indices(active: &Node, up_to: u64) -> Result<BTreeSet<u64>> {
    let items = active.as_sequence().ok_or_else(|| {
        PreprocessError::malformed(
            ACTIVE_IN_PHASES_KEY,
            format!("'Active' must be a sequence, found {}", active.kind()),
        )
    })?;

    let mut indices = BTreeSet::new();
    for item in items {
        let index = item.as_i64().ok_or_else(|| {
            PreprocessError::malformed(
                ACTIVE_IN_PHASES_KEY,
                format!("'Active' entries must be integers, found {}", describe(item)),
            )
        })?;
        let position = u64::try_from(index)
            .ok()
            .filter(|p| *p < up_to)
            .ok_or(PreprocessError::PhaseIndexOutOfRange { index, up_to })?;
        if !indices.insert(position) {
            warn!(index, "Duplicate index in OnlyActiveInPhases.Active");
        }
    }
    Ok(indices)
}

fn describe(node: &Node) -> String {
    match node {
        Node::Scalar(scalar) => format!("{} '{}'", node.kind(), scalar),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::loader::InMemoryLoader;
    use crate::registry::TemplateRegistry;
    use crate::scope::Namespace;

    fn build(yaml: &str, scope: &mut ScopeStack) -> Result<Node> {
        let registry = TemplateRegistry::new();
        let loader = InMemoryLoader::new();
        let mut resolver = Resolver::new(&registry, &loader, Path::new("."));
        resolver.resolve_node(&Node::from_yaml_str(yaml, "test").unwrap(), scope)
    }

    fn yaml(text: &str) -> Node {
        Node::from_yaml_str(text, "expected").unwrap()
    }

    #[test]
    fn test_single_active_phase() {
        let out = build(
            r#"
OnlyActiveInPhases:
  Active: [1]
  NopInPhasesUpTo: 3
  PhaseConfig:
    Duration: 3 minutes
"#,
            &mut ScopeStack::new(),
        )
        .unwrap();
        assert_eq!(
            out,
            yaml("[{Nop: true}, {Duration: 3 minutes}, {Nop: true}]")
        );
    }

    #[test]
    fn test_out_of_range_index() {
        let err = build(
            "OnlyActiveInPhases: {Active: [5], NopInPhasesUpTo: 3, PhaseConfig: {}}",
            &mut ScopeStack::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::PhaseIndexOutOfRange { index: 5, up_to: 3 }
        ));
    }

    #[test]
    fn test_negative_index_is_out_of_range() {
        let err = build(
            "OnlyActiveInPhases: {Active: [-1], NopInPhasesUpTo: 3, PhaseConfig: {}}",
            &mut ScopeStack::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::PhaseIndexOutOfRange { index: -1, up_to: 3 }
        ));
    }

    #[test]
    fn test_upper_bound_is_exclusive() {
        let err = build(
            "OnlyActiveInPhases: {Active: [3], NopInPhasesUpTo: 3, PhaseConfig: {}}",
            &mut ScopeStack::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PreprocessError::PhaseIndexOutOfRange { .. }));
    }

    #[test]
    fn test_parameterised_indices_and_bound() {
        let mut scope = ScopeStack::new();
        scope.insert("Phase", Node::int(0), Namespace::Parameter);
        scope.insert("Total", Node::int(2), Namespace::Parameter);
        let out = build(
            r#"
OnlyActiveInPhases:
  Active: [{^Parameter: {Name: Phase, Default: 1}}]
  NopInPhasesUpTo: {^Parameter: {Name: Total}}
  PhaseConfig: {Repeat: {^Parameter: {Name: Repeat, Default: 10}}}
"#,
            &mut scope,
        )
        .unwrap();
        assert_eq!(out, yaml("[{Repeat: 10}, {Nop: true}]"));
    }

    #[test]
    fn test_multiple_and_duplicate_indices() {
        let out = build(
            "OnlyActiveInPhases: {Active: [2, 0, 2], NopInPhasesUpTo: 4, PhaseConfig: {Repeat: 1}}",
            &mut ScopeStack::new(),
        )
        .unwrap();
        assert_eq!(
            out,
            yaml("[{Repeat: 1}, {Nop: true}, {Repeat: 1}, {Nop: true}]")
        );
    }

    #[test]
    fn test_empty_active_fills_with_nops() {
        let out = build(
            "OnlyActiveInPhases: {Active: [], NopInPhasesUpTo: 2, PhaseConfig: {^Parameter: {Name: Unbound}}}",
            &mut ScopeStack::new(),
        )
        .unwrap();
        assert_eq!(out, yaml("[{Nop: true}, {Nop: true}]"));
    }

    #[test]
    fn test_non_integer_bound_is_malformed() {
        let err = build(
            "OnlyActiveInPhases: {Active: [0], NopInPhasesUpTo: three, PhaseConfig: {}}",
            &mut ScopeStack::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("NopInPhasesUpTo"));
    }

    #[test]
    fn test_huge_bound_is_rejected() {
        let err = build(
            "OnlyActiveInPhases: {Active: [], NopInPhasesUpTo: 1000000000000000, PhaseConfig: {}}",
            &mut ScopeStack::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PreprocessError::MalformedStructure { .. }));
        assert!(err.to_string().contains("maximum"));
    }

    #[test]
    fn test_bound_at_maximum_is_accepted() {
        let yaml = format!(
            "OnlyActiveInPhases: {{Active: [0], NopInPhasesUpTo: {}, PhaseConfig: {{Repeat: 1}}}}",
            MAX_PHASES
        );
        let out = build(&yaml, &mut ScopeStack::new()).unwrap();
        assert_eq!(out.as_sequence().map(<[Node]>::len), Some(MAX_PHASES as usize));
    }

    #[test]
    fn test_active_list_from_parameter() {
        let mut scope = ScopeStack::new();
        scope.insert(
            "ActivePhases",
            yaml("[0, 2]"),
            Namespace::Parameter,
        );
        let out = build(
            "OnlyActiveInPhases: {Active: {^Parameter: {Name: ActivePhases}}, NopInPhasesUpTo: 3, PhaseConfig: {Repeat: 5}}",
            &mut scope,
        )
        .unwrap();
        assert_eq!(out, yaml("[{Repeat: 5}, {Nop: true}, {Repeat: 5}]"));
    }
}
