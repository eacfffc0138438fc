//! The processor contract and the restricted event view handed to it.

use millrace_event::{Event, Value};

use crate::error::Result;

/// A single transformation unit in a pipeline.
///
/// Processors are pure functions of (config, event): they hold no mutable
/// state, so a built pipeline can be driven from multiple threads on
/// distinct events. They must not block on I/O.
///
/// The two flag accessors are a capability with defaults: processors whose
/// configuration carries `ignore_missing`/`ignore_failure` override them,
/// everything else reports `false`.
pub trait Processor: Send + Sync + std::fmt::Debug {
    /// Applies this processor to the event behind the view.
    fn process(&self, event: &mut ProcessorEvent) -> Result<()>;

    /// When true, a `KeyMissing` failure of this processor counts as
    /// success.
    fn ignore_missing(&self) -> bool {
        false
    }

    /// When true, any unrecovered failure of this processor counts as
    /// success.
    fn ignore_failure(&self) -> bool {
        false
    }
}

/// The mutable event view a processor operates on.
///
/// Wraps the event for the duration of one pipeline run and carries the
/// in-band cancel/drop flags. The flags are observable to the executor but
/// not to other processors.
#[derive(Debug)]
pub struct ProcessorEvent {
    data: Event,
    cancelled: bool,
    dropped: bool,
}

impl ProcessorEvent {
    pub(crate) fn new(data: Event) -> Self {
        ProcessorEvent {
            data,
            cancelled: false,
            dropped: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn put(&mut self, key: &str, value: Value) -> Result<Option<Value>> {
        Ok(self.data.put(key, value)?)
    }

    pub fn try_put(&mut self, key: &str, value: Value) -> Result<Option<Value>> {
        Ok(self.data.try_put(key, value)?)
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.data.delete(key)
    }

    /// Stops invocation of subsequent processors in this pipeline. The
    /// event is still emitted.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Marks the event as discarded: no further processors run and nothing
    /// is emitted.
    #[allow(clippy::should_implement_trait)]
    pub fn drop(&mut self) {
        self.dropped = true;
    }

    /// Read access to the whole event, e.g. for `if` condition evaluation.
    pub fn event(&self) -> &Event {
        &self.data
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn is_dropped(&self) -> bool {
        self.dropped
    }

    pub(crate) fn into_event(self) -> Event {
        self.data
    }
}
