//! `set` — assigns a field to a literal value or a copy of another field.

use millrace_event::Value;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::processor::{Processor, ProcessorEvent};

/// Configuration for the `set` processor.
///
/// Exactly one of `value` and `copy_from` must be given. `ignore_missing`
/// is accepted for uniformity but has no effect: `set` never reads
/// `target_field`, so there is no missing key to ignore.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetConfig {
    /// The field to assign the output value to.
    pub target_field: String,

    /// The value to be set for the field.
    #[serde(default)]
    pub value: serde_json::Value,

    /// The origin field which will be copied to `target_field`.
    #[serde(default)]
    pub copy_from: Option<String>,

    #[serde(default)]
    pub ignore_missing: bool,

    #[serde(default)]
    pub ignore_failure: bool,
}

/// Sets one field and associates it with the specified value. If the field
/// already exists, its value is replaced with the provided one.
#[derive(Debug)]
pub struct Set {
    config: SetConfig,
    value: Option<Value>,
}

pub fn new(config: SetConfig) -> Result<Set> {
    let invalid = |reason: &str| PipelineError::ConfigInvalid {
        processor: "set".to_string(),
        reason: reason.to_string(),
    };

    if config.target_field.is_empty() {
        return Err(invalid("target_field must not be empty"));
    }

    let has_value = !config.value.is_null();
    let has_copy_from = config
        .copy_from
        .as_deref()
        .is_some_and(|field| !field.is_empty());
    if has_value && has_copy_from {
        return Err(invalid("value and copy_from are mutually exclusive"));
    }
    if !has_value && !has_copy_from {
        return Err(invalid("one of value or copy_from is required"));
    }

    let value = has_value.then(|| Value::from(config.value.clone()));
    Ok(Set { config, value })
}

impl Processor for Set {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        let value = match &self.value {
            Some(value) => value.clone(),
            None => {
                let source = self.config.copy_from.as_deref().unwrap_or_default();
                event
                    .get(source)
                    .cloned()
                    .ok_or_else(|| PipelineError::KeyMissing {
                        key: source.to_string(),
                    })?
            }
        };
        event.put(&self.config.target_field, value)?;
        Ok(())
    }

    fn ignore_missing(&self) -> bool {
        self.config.ignore_missing
    }

    fn ignore_failure(&self) -> bool {
        self.config.ignore_failure
    }
}
