//! `lowercase` / `uppercase` — case-folds a string field.
//!
//! Folding uses Unicode full case mapping, so `"İstanbul"` lowercases to a
//! longer byte sequence and `"straße"` uppercases to `"STRASSE"`.

use millrace_event::{Value, ValueKind};
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::processor::{Processor, ProcessorEvent};

/// Shared configuration for the case-folding processors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    /// Source field to process.
    pub field: String,

    /// The field to assign the output value to. By default `field` is
    /// updated in place.
    #[serde(default)]
    pub target_field: Option<String>,

    #[serde(default)]
    pub ignore_missing: bool,
}

/// Converts a string field to its lowercase equivalent.
#[derive(Debug)]
pub struct Lowercase {
    config: CaseConfig,
}

/// Converts a string field to its uppercase equivalent.
#[derive(Debug)]
pub struct Uppercase {
    config: CaseConfig,
}

pub fn new_lowercase(config: CaseConfig) -> Result<Lowercase> {
    validate(&config, "lowercase")?;
    Ok(Lowercase { config })
}

pub fn new_uppercase(config: CaseConfig) -> Result<Uppercase> {
    validate(&config, "uppercase")?;
    Ok(Uppercase { config })
}

fn validate(config: &CaseConfig, processor: &str) -> Result<()> {
    if config.field.is_empty() {
        return Err(PipelineError::ConfigInvalid {
            processor: processor.to_string(),
            reason: "field must not be empty".to_string(),
        });
    }
    Ok(())
}

fn fold(config: &CaseConfig, event: &mut ProcessorEvent, map: fn(&str) -> String) -> Result<()> {
    let value = event
        .get(&config.field)
        .ok_or_else(|| PipelineError::KeyMissing {
            key: config.field.clone(),
        })?;
    let text = value.as_str().ok_or_else(|| PipelineError::TypeMismatch {
        field: config.field.clone(),
        expected: ValueKind::String.to_string(),
        actual: value.kind().to_string(),
    })?;

    let folded = map(text);
    let target = config
        .target_field
        .as_deref()
        .filter(|field| !field.is_empty())
        .unwrap_or(&config.field);
    event.put(target, Value::from(folded))?;
    Ok(())
}

impl Processor for Lowercase {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        fold(&self.config, event, str::to_lowercase)
    }

    fn ignore_missing(&self) -> bool {
        self.config.ignore_missing
    }
}

impl Processor for Uppercase {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        fold(&self.config, event, str::to_uppercase)
    }

    fn ignore_missing(&self) -> bool {
        self.config.ignore_missing
    }
}
