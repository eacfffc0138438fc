//! Pipeline construction and execution.
//!
//! A [`Pipeline`] is a tree of processor nodes built from a
//! [`PipelineConfig`] against a [`Registry`]. Execution walks the top-level
//! nodes in order, honoring per-node `if` conditions, the
//! `ignore_missing`/`ignore_failure` flags, local `on_failure` handler
//! chains, the pipeline-level `on_failure` chain, and the in-band
//! cancel/drop signals.

use log::debug;

use millrace_event::Event;

use crate::condition::{Condition, ConditionCompiler};
use crate::config::{PipelineConfig, ProcessorEntry, ProcessorOptions};
use crate::error::{PipelineError, Result};
use crate::metrics::{ProcessorMetrics, StepCounters};
use crate::processor::{Processor, ProcessorEvent};
use crate::registry::Registry;

/// The three-way result of a pipeline run: the (possibly mutated) event, a
/// deliberate drop, or — through `Result` — an unrecovered error.
#[derive(Debug)]
pub enum Outcome {
    /// The event passed through and should be emitted.
    Emit(Event),
    /// A processor dropped the event; nothing is emitted and no error is
    /// raised.
    Drop,
}

impl Outcome {
    /// Returns the emitted event, if any.
    pub fn into_event(self) -> Option<Event> {
        match self {
            Outcome::Emit(event) => Some(event),
            Outcome::Drop => None,
        }
    }
}

/// A built, immutable pipeline. Safe to drive from multiple threads on
/// distinct events.
pub struct Pipeline {
    id: String,
    processors: Vec<PipelineStep>,
    on_failure: Vec<PipelineStep>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("id", &self.id).finish()
    }
}

impl Pipeline {
    /// Builds a pipeline from its configuration. `if` expressions are
    /// retained but not evaluated; use
    /// [`Pipeline::with_condition_compiler`] to activate them.
    pub fn new(config: &PipelineConfig, registry: &Registry) -> Result<Self> {
        Self::build(config, registry, None)
    }

    /// Builds a pipeline, compiling each `if` expression into a predicate
    /// with the given compiler.
    pub fn with_condition_compiler(
        config: &PipelineConfig,
        registry: &Registry,
        compiler: ConditionCompiler<'_>,
    ) -> Result<Self> {
        Self::build(config, registry, Some(compiler))
    }

    fn build(
        config: &PipelineConfig,
        registry: &Registry,
        compiler: Option<ConditionCompiler<'_>>,
    ) -> Result<Self> {
        if config.id.is_empty() {
            return Err(PipelineError::InvalidPipeline(
                "pipeline must have a non-empty id".to_string(),
            ));
        }

        let processors = build_steps(
            &format!("{}.processors", config.id),
            &config.processors,
            registry,
            compiler,
        )?;
        let on_failure = build_steps(
            &format!("{}.on_failure", config.id),
            &config.on_failure,
            registry,
            compiler,
        )?;

        debug!(
            "built pipeline {:?} with {} processors",
            config.id,
            processors.len()
        );
        Ok(Pipeline {
            id: config.id.clone(),
            processors,
            on_failure,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs one event through the pipeline.
    pub fn process(&self, event: Event) -> Result<Outcome> {
        let mut view = ProcessorEvent::new(event);

        let mut failure = None;
        for step in &self.processors {
            match step.execute(&mut view) {
                Ok(()) => {
                    if view.is_dropped() || view.is_cancelled() {
                        break;
                    }
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            if self.on_failure.is_empty() {
                return Err(err);
            }
            for step in &self.on_failure {
                // An error inside the pipeline-level handler is fatal.
                step.execute(&mut view)?;
                if view.is_dropped() || view.is_cancelled() {
                    break;
                }
            }
        }

        if view.is_dropped() {
            Ok(Outcome::Drop)
        } else {
            Ok(Outcome::Emit(view.into_event()))
        }
    }

    /// Snapshots the counters of every processor node, including nested
    /// `on_failure` nodes, depth-first.
    pub fn metrics(&self) -> Vec<ProcessorMetrics> {
        let mut out = Vec::new();
        for step in self.processors.iter().chain(&self.on_failure) {
            step.collect_metrics(&mut out);
        }
        out
    }
}

/// One node of the pipeline tree: a concrete processor plus its execution
/// policy and counters.
struct PipelineStep {
    id: String,
    processor_type: String,
    condition: Option<Box<dyn Condition>>,
    ignore_missing: bool,
    ignore_failure: bool,
    on_failure: Vec<PipelineStep>,
    processor: Box<dyn Processor>,
    counters: StepCounters,
}

impl PipelineStep {
    fn execute(&self, view: &mut ProcessorEvent) -> Result<()> {
        self.counters.inc_received();

        if let Some(condition) = &self.condition {
            if !condition.matches(view.event()) {
                self.counters.inc_sent();
                return Ok(());
            }
        }

        match self.processor.process(view) {
            Ok(()) => {
                if view.is_dropped() {
                    self.counters.inc_discarded();
                } else {
                    self.counters.inc_sent();
                }
                Ok(())
            }
            Err(err) => self.recover(view, err),
        }
    }

    fn recover(&self, view: &mut ProcessorEvent, err: PipelineError) -> Result<()> {
        if view.is_dropped() {
            self.counters.inc_discarded();
            return Ok(());
        }

        if self.ignore_missing && err.is_key_missing() {
            self.counters.inc_sent();
            return Ok(());
        }

        let err = if self.on_failure.is_empty() {
            err
        } else {
            match self.run_on_failure(view) {
                Ok(()) => {
                    self.counters.inc_sent();
                    return Ok(());
                }
                // The handler chain itself failed; its error supersedes.
                Err(handler_err) => handler_err,
            }
        };

        if self.ignore_failure {
            self.counters.inc_sent();
            return Ok(());
        }

        self.counters.inc_errors();
        Err(err)
    }

    fn run_on_failure(&self, view: &mut ProcessorEvent) -> Result<()> {
        for step in &self.on_failure {
            step.execute(view)?;
            if view.is_dropped() || view.is_cancelled() {
                break;
            }
        }
        Ok(())
    }

    fn collect_metrics(&self, out: &mut Vec<ProcessorMetrics>) {
        out.push(self.counters.snapshot(&self.processor_type, &self.id));
        for step in &self.on_failure {
            step.collect_metrics(out);
        }
    }
}

fn build_steps(
    base_id: &str,
    entries: &[ProcessorEntry],
    registry: &Registry,
    compiler: Option<ConditionCompiler<'_>>,
) -> Result<Vec<PipelineStep>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (processor_type, options) = entry.processor()?;
            build_step(base_id, index, processor_type, &options, registry, compiler)
        })
        .collect()
}

fn build_step(
    base_id: &str,
    index: usize,
    processor_type: &str,
    options: &ProcessorOptions,
    registry: &Registry,
    compiler: Option<ConditionCompiler<'_>>,
) -> Result<PipelineStep> {
    // Pseudo JSON-path id, also used as the metrics component_id label.
    let id = format!("{base_id}[{index}].{processor_type}");

    let processor = registry.build(processor_type, &options.config)?;

    let condition = match (&options.condition, compiler) {
        (Some(expression), Some(compile)) => Some(compile(expression)?),
        _ => None,
    };

    let on_failure = build_steps(
        &format!("{id}.on_failure"),
        &options.on_failure,
        registry,
        compiler,
    )?;

    Ok(PipelineStep {
        ignore_missing: processor.ignore_missing(),
        ignore_failure: processor.ignore_failure(),
        id,
        processor_type: processor_type.to_string(),
        condition,
        on_failure,
        processor,
        counters: StepCounters::default(),
    })
}
