//! Structural marker recognition
//!
//! A mapping whose single key is one of the marker names below is a marker.
//! The body is validated here so the resolver only sees well-formed markers.

use crate::error::{PreprocessError, Result};
use crate::node::{Mapping, Node};

pub const PARAMETER_KEY: &str = "^Parameter";
pub const TEMPLATE_REF_KEY: &str = "ActorFromTemplate";
pub const ACTIVE_IN_PHASES_KEY: &str = "OnlyActiveInPhases";
pub const EXTERNAL_KEY: &str = "ExternalPhaseConfig";

const MARKER_KEYS: [&str; 4] = [
    PARAMETER_KEY,
    TEMPLATE_REF_KEY,
    ACTIVE_IN_PHASES_KEY,
    EXTERNAL_KEY,
];

/// A recognised marker, borrowing from the document
#[derive(Debug, Clone, PartialEq)]
pub enum Marker<'a> {
    /// `{^Parameter: {Name, Default?}}`
    Parameter {
        name: &'a str,
        default: Option<&'a Node>,
    },
    /// `{ActorFromTemplate: {TemplateName, TemplateParameters?}}`
    TemplateRef {
        template_name: &'a str,
        parameters: Option<&'a Mapping>,
    },
    /// `{OnlyActiveInPhases: {Active, NopInPhasesUpTo, PhaseConfig}}`
    ActiveInPhases {
        active: &'a Node,
        up_to: &'a Node,
        phase_config: &'a Node,
    },
    /// `{ExternalPhaseConfig: {Path, Parameters?, Key?}}`
    ExternalInclusion {
        path: &'a str,
        parameters: Option<&'a Mapping>,
        key: Option<&'a str>,
    },
}

impl<'a> Marker<'a> {
    /// Classify a mapping. `Ok(None)` means literal content.
    pub fn classify(mapping: &'a Mapping) -> Result<Option<Marker<'a>>> {
        let (key, body) = match mapping.single_entry() {
            Some(entry) => entry,
            None => {
                if let Some(key) = mapping.keys().find(|k| MARKER_KEYS.contains(k)) {
                    return Err(PreprocessError::malformed(
                        key,
                        format!(
                            "must be the only key of its mapping, found siblings [{}]",
                            mapping.keys().collect::<Vec<_>>().join(", ")
                        ),
                    ));
                }
                return Ok(None);
            }
        };

        let marker = match key {
            PARAMETER_KEY => {
                let fields = Fields::new(key, body, &["Name", "Default"])?;
                Marker::Parameter {
                    name: fields.required_str("Name")?,
                    default: fields.optional("Default"),
                }
            }
            TEMPLATE_REF_KEY => {
                let fields = Fields::new(key, body, &["TemplateName", "TemplateParameters"])?;
                Marker::TemplateRef {
                    template_name: fields.required_str("TemplateName")?,
                    parameters: fields.optional_mapping("TemplateParameters")?,
                }
            }
            ACTIVE_IN_PHASES_KEY => {
                let fields = Fields::new(key, body, &["Active", "NopInPhasesUpTo", "PhaseConfig"])?;
                Marker::ActiveInPhases {
                    active: fields.required("Active")?,
                    up_to: fields.required("NopInPhasesUpTo")?,
                    phase_config: fields.required("PhaseConfig")?,
                }
            }
            EXTERNAL_KEY => {
                let fields = Fields::new(key, body, &["Path", "Parameters", "Key"])?;
                Marker::ExternalInclusion {
                    path: fields.required_str("Path")?,
                    parameters: fields.optional_mapping("Parameters")?,
                    key: fields.optional_str("Key")?,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(marker))
    }

    pub fn key(&self) -> &'static str {
        match self {
            Marker::Parameter { .. } => PARAMETER_KEY,
            Marker::TemplateRef { .. } => TEMPLATE_REF_KEY,
            Marker::ActiveInPhases { .. } => ACTIVE_IN_PHASES_KEY,
            Marker::ExternalInclusion { .. } => EXTERNAL_KEY,
        }
    }
}

/// Field access over a marker body with uniform error reporting
struct Fields<'a> {
    construct: &'a str,
    body: &'a Mapping,
}

impl<'a> Fields<'a> {
    fn new(construct: &'a str, body: &'a Node, allowed: &[&str]) -> Result<Self> {
        let body = body.as_mapping().ok_or_else(|| {
            PreprocessError::malformed(
                construct,
                format!("body must be a mapping, found {}", body.kind()),
            )
        })?;
        if let Some(unknown) = body.keys().find(|k| !allowed.contains(k)) {
            return Err(PreprocessError::malformed(
                construct,
                format!(
                    "unexpected key '{}', expected only [{}]",
                    unknown,
                    allowed.join(", ")
                ),
            ));
        }
        Ok(Self { construct, body })
    }

    fn optional(&self, field: &str) -> Option<&'a Node> {
        self.body.get(field)
    }

    fn required(&self, field: &str) -> Result<&'a Node> {
        self.body.get(field).ok_or_else(|| {
            PreprocessError::malformed(self.construct, format!("missing required key '{}'", field))
        })
    }

    fn required_str(&self, field: &str) -> Result<&'a str> {
        let node = self.required(field)?;
        node.as_str().ok_or_else(|| self.wrong_kind(field, "a string", node))
    }

    fn optional_str(&self, field: &str) -> Result<Option<&'a str>> {
        match self.optional(field) {
            None => Ok(None),
            Some(node) => node
                .as_str()
                .map(Some)
                .ok_or_else(|| self.wrong_kind(field, "a string", node)),
        }
    }

    /// Absent or empty (`null`) both mean no parameters
    fn optional_mapping(&self, field: &str) -> Result<Option<&'a Mapping>> {
        match self.optional(field) {
            None => Ok(None),
            Some(node) if node.is_null() => Ok(None),
            Some(node) => node
                .as_mapping()
                .map(Some)
                .ok_or_else(|| self.wrong_kind(field, "a mapping", node)),
        }
    }

    fn wrong_kind(&self, field: &str, expected: &str, found: &Node) -> PreprocessError {
        PreprocessError::malformed(
            self.construct,
            format!("'{}' must be {}, found {}", field, expected, found.kind()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        Node::from_yaml_str(yaml, "test")
            .unwrap()
            .as_mapping()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_parameter_marker() {
        let m = mapping(r#"{^Parameter: {Name: "Duration", Default: 3 minutes}}"#);
        let marker = Marker::classify(&m).unwrap().unwrap();
        assert_eq!(
            marker,
            Marker::Parameter {
                name: "Duration",
                default: Some(&Node::string("3 minutes")),
            }
        );
    }

    #[test]
    fn test_parameter_without_default() {
        let m = mapping(r#"{^Parameter: {Name: "Phase"}}"#);
        assert_eq!(
            Marker::classify(&m).unwrap(),
            Some(Marker::Parameter {
                name: "Phase",
                default: None
            })
        );
    }

    #[test]
    fn test_literal_mapping_is_not_a_marker() {
        let m = mapping("Name: Actor\nThreads: 2\n");
        assert_eq!(Marker::classify(&m).unwrap(), None);
        let single = mapping("Nop: true");
        assert_eq!(Marker::classify(&single).unwrap(), None);
    }

    #[test]
    fn test_marker_with_siblings_is_malformed() {
        let m = mapping("ActorFromTemplate: {TemplateName: T}\nName: extra\n");
        let err = Marker::classify(&m).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::MalformedStructure { ref construct, .. } if construct == TEMPLATE_REF_KEY
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let m = mapping("OnlyActiveInPhases: {Active: [1], PhaseConfig: {}}");
        let err = Marker::classify(&m).unwrap_err();
        assert!(err.to_string().contains("NopInPhasesUpTo"));
    }

    #[test]
    fn test_unknown_field() {
        let m = mapping("^Parameter: {Name: x, Fallback: 1}");
        let err = Marker::classify(&m).unwrap_err();
        assert!(err.to_string().contains("Fallback"));
    }

    #[test]
    fn test_name_must_be_string() {
        let m = mapping("^Parameter: {Name: [a, b]}");
        assert!(matches!(
            Marker::classify(&m),
            Err(PreprocessError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn test_external_marker_fields() {
        let m = mapping("ExternalPhaseConfig: {Path: phases/Good.yml, Parameters: {Repeat: 2}, Key: Phase}");
        match Marker::classify(&m).unwrap().unwrap() {
            Marker::ExternalInclusion {
                path,
                parameters,
                key,
            } => {
                assert_eq!(path, "phases/Good.yml");
                assert_eq!(parameters.unwrap().get("Repeat"), Some(&Node::int(2)));
                assert_eq!(key, Some("Phase"));
            }
            other => panic!("unexpected marker {:?}", other),
        }
    }

    #[test]
    fn test_null_template_parameters() {
        let m = mapping("ActorFromTemplate:\n  TemplateName: T\n  TemplateParameters:\n");
        assert_eq!(
            Marker::classify(&m).unwrap(),
            Some(Marker::TemplateRef {
                template_name: "T",
                parameters: None
            })
        );
    }
}
