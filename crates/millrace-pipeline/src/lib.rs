//! # millrace-pipeline
//!
//! The pipeline engine: a declarative, ordered sequence of field-level
//! processors applied to one event at a time.
//!
//! ## Architecture
//!
//! 1. Parse a [`PipelineConfig`] from YAML or JSON
//! 2. Build a [`Pipeline`] against a processor [`Registry`]
//! 3. Feed events through [`Pipeline::process`]; each call returns
//!    [`Outcome::Emit`] with the transformed event, [`Outcome::Drop`] when a
//!    processor discarded it, or an error when no failure handler recovered
//!
//! Per-processor `if` conditions, local and pipeline-level `on_failure`
//! handler chains, `ignore_missing`/`ignore_failure` flags, and in-band
//! cancel/drop signals are all honored by the executor, which also keeps
//! four monotonic counters per processor node.
//!
//! ```rust
//! use millrace_event::Event;
//! use millrace_pipeline::{Outcome, Pipeline, PipelineConfig, Registry};
//!
//! let config = PipelineConfig::from_yaml(r#"
//! id: enrich
//! processors:
//!   - set:
//!       target_field: event.kind
//!       value: enriched
//! "#).unwrap();
//!
//! let pipeline = Pipeline::new(&config, &Registry::with_builtins()).unwrap();
//! match pipeline.process(Event::new()).unwrap() {
//!     Outcome::Emit(event) => assert_eq!(event.get("event.kind").unwrap().as_str(), Some("enriched")),
//!     Outcome::Drop => unreachable!(),
//! }
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod exec;
pub mod metrics;
pub mod processor;
pub mod processors;
pub mod registry;

pub use condition::Condition;
pub use config::{PipelineConfig, ProcessorEntry, ProcessorOptions};
pub use error::{PipelineError, Result};
pub use exec::{Outcome, Pipeline};
pub use metrics::ProcessorMetrics;
pub use processor::{Processor, ProcessorEvent};
pub use registry::Registry;
