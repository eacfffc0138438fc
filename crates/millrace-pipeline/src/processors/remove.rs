//! `remove` — deletes fields from the event.

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::processor::{Processor, ProcessorEvent};

/// Configuration for the `remove` processor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveConfig {
    /// Fields to remove, in order.
    pub fields: Vec<String>,

    #[serde(default)]
    pub ignore_missing: bool,
}

/// Removes existing fields. The first field that does not exist fails the
/// processor unless `ignore_missing` is set.
#[derive(Debug)]
pub struct Remove {
    config: RemoveConfig,
}

pub fn new(config: RemoveConfig) -> Result<Remove> {
    if config.fields.is_empty() {
        return Err(PipelineError::ConfigInvalid {
            processor: "remove".to_string(),
            reason: "fields must not be empty".to_string(),
        });
    }
    Ok(Remove { config })
}

impl Processor for Remove {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        for field in &self.config.fields {
            if event.delete(field).is_none() && !self.config.ignore_missing {
                return Err(PipelineError::KeyMissing {
                    key: field.clone(),
                });
            }
        }
        Ok(())
    }

    fn ignore_missing(&self) -> bool {
        self.config.ignore_missing
    }
}
