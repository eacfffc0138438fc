//! Pipeline configuration documents.
//!
//! A pipeline document has a required `id`, an optional `description`, and
//! two processor lists:
//!
//! ```yaml
//! id: logs-sample
//! description: Parse sample data.
//! processors:
//!   - set:
//!       target_field: event.id
//!       value: "1234"
//! on_failure:
//!   - set:
//!       target_field: event.kind
//!       value: pipeline_error
//! ```
//!
//! Each processor entry is a single-key mapping from the processor type name
//! to its options. The reserved option keys are `id`, `if`, and `on_failure`
//! (which nests recursively); every other key is the processor's own
//! configuration and is bound by the registry when the pipeline is built.
//! JSON documents parse through the same path.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// A parsed pipeline document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processors: Vec<ProcessorEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_failure: Vec<ProcessorEntry>,
}

impl PipelineConfig {
    /// Parses a pipeline document from YAML (or JSON) text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|err| PipelineError::InvalidPipeline(format!("parse error: {err}")))
    }

    /// Parses a pipeline document from a YAML (or JSON) file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            PipelineError::InvalidPipeline(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&text)
    }
}

/// One element of a processor list: a single-key mapping from processor type
/// name to options. A `null` options body equals empty options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorEntry(pub BTreeMap<String, Option<ProcessorOptions>>);

impl ProcessorEntry {
    /// Creates an entry for the given processor type and options.
    pub fn new(processor_type: impl Into<String>, options: ProcessorOptions) -> Self {
        let mut entry = BTreeMap::new();
        entry.insert(processor_type.into(), Some(options));
        ProcessorEntry(entry)
    }

    /// Returns the processor type name and its options, enforcing the
    /// exactly-one-key shape.
    pub fn processor(&self) -> Result<(&str, ProcessorOptions)> {
        if self.0.len() > 1 {
            return Err(PipelineError::InvalidPipeline(
                "only one processor may be specified per entry".to_string(),
            ));
        }
        match self.0.iter().next() {
            Some((name, options)) => Ok((name.as_str(), options.clone().unwrap_or_default())),
            None => Err(PipelineError::InvalidPipeline(
                "processor entry cannot be empty".to_string(),
            )),
        }
    }
}

/// Per-processor options: the reserved keys plus the processor's own config
/// fields, captured verbatim for the registry to bind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Boolean predicate expression gating this processor.
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Handlers run when this processor fails. Recursive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_failure: Vec<ProcessorEntry>,

    /// The processor's own configuration fields, inlined alongside the
    /// reserved keys.
    #[serde(flatten)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_YAML: &str = r#"
---
id: logs-sample
description: |-
  Parse sample data.

  Incoming data must follow RFC123 or else!
processors:
  - set:
      target_field: event.id
      value: "1234"
on_failure:
  - set:
      target_field: event.kind
      value: pipeline_error
"#;

    #[test]
    fn parse_sample_yaml() {
        let config = PipelineConfig::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(config.id, "logs-sample");
        assert_eq!(
            config.description.as_deref(),
            Some("Parse sample data.\n\nIncoming data must follow RFC123 or else!")
        );
        assert_eq!(config.processors.len(), 1);
        assert_eq!(config.on_failure.len(), 1);

        let (name, options) = config.processors[0].processor().unwrap();
        assert_eq!(name, "set");
        assert_eq!(options.config.get("target_field"), Some(&json!("event.id")));
        assert_eq!(options.config.get("value"), Some(&json!("1234")));
    }

    #[test]
    fn parse_sample_json() {
        let json_doc = r#"
{
  "id": "logs-sample",
  "processors": [
    {"set": {"target_field": "event.id", "value": "1234"}}
  ]
}
"#;
        let config = PipelineConfig::from_yaml(json_doc).unwrap();
        assert_eq!(config.id, "logs-sample");
        assert_eq!(config.processors.len(), 1);
    }

    #[test]
    fn null_options_are_empty_options() {
        let config = PipelineConfig::from_yaml(
            r#"
id: p
processors:
  - remove:
  - set:
"#,
        )
        .unwrap();
        assert_eq!(config.processors.len(), 2);
        let (name, options) = config.processors[0].processor().unwrap();
        assert_eq!(name, "remove");
        assert_eq!(options, ProcessorOptions::default());
    }

    #[test]
    fn reserved_keys_are_split_from_config() {
        let config = PipelineConfig::from_yaml(
            r#"
id: p
processors:
  - lowercase:
      id: lc-1
      if: ctx.ready
      field: message
      on_failure:
        - set:
            target_field: event.kind
            value: pipeline_error
"#,
        )
        .unwrap();
        let (_, options) = config.processors[0].processor().unwrap();
        assert_eq!(options.id.as_deref(), Some("lc-1"));
        assert_eq!(options.condition.as_deref(), Some("ctx.ready"));
        assert_eq!(options.on_failure.len(), 1);
        assert_eq!(options.config.get("field"), Some(&json!("message")));
        assert!(!options.config.contains_key("id"));
        assert!(!options.config.contains_key("if"));
        assert!(!options.config.contains_key("on_failure"));
    }

    #[test]
    fn multi_key_entry_is_rejected_at_lookup() {
        let config = PipelineConfig::from_yaml(
            r#"
id: p
processors:
  - set:
      target_field: a
      value: x
    remove:
      fields: [b]
"#,
        )
        .unwrap();
        let err = config.processors[0].processor().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPipeline(_)));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let err = PipelineConfig::from_yaml("id: p\nprocesors: []\n").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPipeline(_)));
    }
}
