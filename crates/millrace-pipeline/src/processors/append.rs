//! `append` — appends one or more values to an array field.

use millrace_event::Value;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::processor::{Processor, ProcessorEvent};

/// Configuration for the `append` processor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendConfig {
    /// Field to append to.
    pub field: String,

    /// The value to be appended. An array appends element-wise.
    pub value: serde_json::Value,

    /// If false, values already present in the field are not appended again.
    #[serde(default)]
    pub allow_duplicates: bool,

    #[serde(default)]
    pub ignore_missing: bool,
}

/// Appends values to an existing array. A missing field starts as an empty
/// array; a scalar field is converted to a one-element array first.
#[derive(Debug)]
pub struct Append {
    config: AppendConfig,
    values: Vec<Value>,
}

pub fn new(config: AppendConfig) -> Result<Append> {
    if config.field.is_empty() {
        return Err(PipelineError::ConfigInvalid {
            processor: "append".to_string(),
            reason: "field must not be empty".to_string(),
        });
    }

    let values = match Value::from(config.value.clone()) {
        Value::Array(items) => items,
        single => vec![single],
    };
    Ok(Append { config, values })
}

impl Processor for Append {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        let mut items = match event.get(&self.config.field).cloned() {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(scalar) => vec![scalar],
        };

        for candidate in &self.values {
            if self.config.allow_duplicates || !items.contains(candidate) {
                items.push(candidate.clone());
            }
        }

        event.put(&self.config.field, Value::Array(items))?;
        Ok(())
    }

    fn ignore_missing(&self) -> bool {
        self.config.ignore_missing
    }
}
