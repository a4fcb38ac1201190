//! Smoke-test conversion
//!
//! Rewrites every phase block of a resolved workload so that it runs once and
//! quickly: pacing and duration keys are dropped and `Repeat` becomes `1`.

use tracing::debug;

use crate::node::{Mapping, Node};

pub const PHASES_KEY: &str = "Phases";

const REMOVED_KEYS: [&str; 5] = ["Duration", "Rate", "SleepBefore", "SleepAfter", "GlobalRate"];

/// Apply smoke-test conversion to every `Phases` sequence in `node`
pub fn convert_to_smoke_test(node: Node) -> Node {
    match node {
        Node::Mapping(mapping) => Node::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Node::Sequence(phases) if key == PHASES_KEY => {
                            debug!(phases = phases.len(), "Converting phases for smoke test");
                            Node::Sequence(phases.into_iter().map(convert_phase).collect())
                        }
                        other => convert_to_smoke_test(other),
                    };
                    (key, value)
                })
                .collect(),
        ),
        Node::Sequence(items) => {
            Node::Sequence(items.into_iter().map(convert_to_smoke_test).collect())
        }
        scalar => scalar,
    }
}

fn convert_phase(phase: Node) -> Node {
    match phase {
        Node::Mapping(block) => Node::Mapping(
            block
                .into_iter()
                .filter(|(key, _)| !REMOVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| match key.as_str() {
                    "Repeat" => (key, Node::int(1)),
                    _ => (key, value),
                })
                .collect::<Mapping>(),
        ),
        other => other,
    }
}
