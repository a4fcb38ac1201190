//! workload-preprocessor: resolves parameterised workload YAML
//!
//! Workload files may declare reusable actor templates and refer to values
//! that are only known at the point of use. This crate expands them into a
//! plain document with no markers left:
//!
//! - `{^Parameter: {Name, Default}}` - lexically scoped parameter lookup
//! - `{ActorFromTemplate: {TemplateName, TemplateParameters}}` - template
//!   instantiation in a fresh scope
//! - `{OnlyActiveInPhases: {Active, NopInPhasesUpTo, PhaseConfig}}` - phase
//!   list synthesis with `{Nop: true}` fill
//! - `{ExternalPhaseConfig: {Path, Parameters, Key}}` - inclusion of a
//!   separately stored phase document
//!
//! # Example
//!
//! ```yaml
//! ActorTemplates:
//! - TemplateName: Inserter
//!   Config:
//!     Name: {^Parameter: {Name: Name, Default: Inserter}}
//!     Phases:
//!       OnlyActiveInPhases:
//!         Active: [{^Parameter: {Name: Phase, Default: 1}}]
//!         NopInPhasesUpTo: 3
//!         PhaseConfig:
//!           Duration: {^Parameter: {Name: Duration, Default: 3 minutes}}
//!
//! Actors:
//! - ActorFromTemplate:
//!     TemplateName: Inserter
//!     TemplateParameters:
//!       Phase: 0
//!       Duration: 5 minutes
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod marker;
pub mod node;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod smoke;

// Re-export commonly used types
pub use config::{PreprocessConfig, YamlSource};
pub use error::{PreprocessError, Result};
pub use loader::{DocumentLoader, FsDocumentLoader, InMemoryLoader};
pub use marker::Marker;
pub use node::{Mapping, Node, Scalar};
pub use parser::{resolve, WorkloadParser};
pub use registry::{TemplateDefinition, TemplateRegistry};
pub use resolver::resolve_document;
pub use scope::{Namespace, ScopeGuard, ScopeStack};
pub use smoke::convert_to_smoke_test;
