//! End-to-end pipeline scenarios: recovery chains, drop/cancel signals,
//! ignore flags, `if` conditions, and per-processor counters.

use millrace_event::{Event, Value};
use millrace_pipeline::{
    Condition, Outcome, Pipeline, PipelineConfig, PipelineError, Processor, ProcessorEvent,
    Registry, Result,
};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct FlagsConfig {
    #[serde(default)]
    ignore_failure: bool,
}

/// Always fails with a processor-defined error.
#[derive(Debug)]
struct Fail {
    config: FlagsConfig,
}

impl Processor for Fail {
    fn process(&self, _event: &mut ProcessorEvent) -> Result<()> {
        Err(PipelineError::Other("fail processor failed".to_string()))
    }

    fn ignore_failure(&self) -> bool {
        self.config.ignore_failure
    }
}

/// Drops every event.
#[derive(Debug)]
struct DropAll;

impl Processor for DropAll {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        event.drop();
        Ok(())
    }
}

/// Cancels further processing for every event.
#[derive(Debug)]
struct CancelAll;

impl Processor for CancelAll {
    fn process(&self, event: &mut ProcessorEvent) -> Result<()> {
        event.cancel();
        Ok(())
    }
}

fn registry() -> Registry {
    let mut registry = Registry::with_builtins();
    registry
        .register("fail", |config: FlagsConfig| Ok(Fail { config }))
        .unwrap();
    registry
        .register("drop", |_config: FlagsConfig| Ok(DropAll))
        .unwrap();
    registry
        .register("cancel", |_config: FlagsConfig| Ok(CancelAll))
        .unwrap();
    registry
}

fn pipeline(yaml: &str) -> Pipeline {
    let config = PipelineConfig::from_yaml(yaml).unwrap();
    Pipeline::new(&config, &registry()).unwrap()
}

fn vehicle_event() -> Event {
    let mut event = Event::new();
    event.put("vehicle.vin", Value::from("1234")).unwrap();
    event.put("vehicle.tag", Value::from("VCX-9833")).unwrap();
    event
}

fn emitted(outcome: Outcome) -> Event {
    match outcome {
        Outcome::Emit(event) => event,
        Outcome::Drop => panic!("expected an emitted event, got a drop"),
    }
}

fn metric<'a>(
    metrics: &'a [millrace_pipeline::ProcessorMetrics],
    id: &str,
) -> &'a millrace_pipeline::ProcessorMetrics {
    metrics
        .iter()
        .find(|m| m.component_id == id)
        .unwrap_or_else(|| panic!("no metrics for {id}"))
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn set_literal() {
    let pipe = pipeline(
        r#"
id: logs-sample
processors:
  - set:
      target_field: event.id
      value: "1234"
"#,
    );

    let event = emitted(pipe.process(Event::new()).unwrap());
    assert_eq!(event.get("event.id"), Some(&Value::from("1234")));
    assert_eq!(
        serde_json::to_string(&event).unwrap(),
        r#"{"event":{"id":"1234"}}"#
    );
}

#[test]
fn processor_error_without_recovery() {
    let pipe = pipeline(
        r#"
id: lowercase-non-existent
processors:
  - lowercase:
      field: non_existent
"#,
    );

    let err = pipe.process(vehicle_event()).unwrap_err();
    assert_eq!(
        err,
        PipelineError::KeyMissing {
            key: "non_existent".to_string()
        }
    );
}

#[test]
fn local_on_failure_recovers() {
    let pipe = pipeline(
        r#"
id: lowercase-non-existent
processors:
  - lowercase:
      field: non_existent
      on_failure:
        - set:
            target_field: event.kind
            value: pipeline_error
"#,
    );

    let event = emitted(pipe.process(vehicle_event()).unwrap());
    assert_eq!(event.get("event.kind"), Some(&Value::from("pipeline_error")));
    assert_eq!(event.get("vehicle.vin"), Some(&Value::from("1234")));

    let metrics = pipe.metrics();
    let lowercase = metric(&metrics, "lowercase-non-existent.processors[0].lowercase");
    assert_eq!((lowercase.received, lowercase.sent, lowercase.errors), (1, 1, 0));
    let handler = metric(
        &metrics,
        "lowercase-non-existent.processors[0].lowercase.on_failure[0].set",
    );
    assert_eq!((handler.received, handler.sent), (1, 1));
}

#[test]
fn global_on_failure_recovers() {
    let pipe = pipeline(
        r#"
id: lowercase-non-existent
processors:
  - lowercase:
      field: non_existent
on_failure:
  - set:
      target_field: event.kind
      value: pipeline_error
"#,
    );

    let event = emitted(pipe.process(vehicle_event()).unwrap());
    assert_eq!(event.get("event.kind"), Some(&Value::from("pipeline_error")));

    let metrics = pipe.metrics();
    let lowercase = metric(&metrics, "lowercase-non-existent.processors[0].lowercase");
    assert_eq!(lowercase.errors, 1);
    let handler = metric(&metrics, "lowercase-non-existent.on_failure[0].set");
    assert_eq!((handler.received, handler.sent), (1, 1));
}

#[test]
fn global_on_failure_error_is_fatal() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - fail:
on_failure:
  - lowercase:
      field: also_missing
"#,
    );

    let err = pipe.process(Event::new()).unwrap_err();
    assert_eq!(
        err,
        PipelineError::KeyMissing {
            key: "also_missing".to_string()
        }
    );
}

#[test]
fn append_wraps_scalar() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - append:
      field: tags
      value: b
"#,
    );

    let event = Event::from_json(serde_json::json!({"tags": "a"})).unwrap();
    let event = emitted(pipe.process(event).unwrap());
    assert_eq!(
        event.get("tags"),
        Some(&Value::Array(vec![Value::from("a"), Value::from("b")]))
    );
}

// ---------------------------------------------------------------------------
// Drop, cancel, ignore flags
// ---------------------------------------------------------------------------

#[test]
fn drop_consumes_the_event_and_stops_traversal() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - drop:
  - set:
      target_field: never
      value: reached
"#,
    );

    assert!(matches!(pipe.process(Event::new()).unwrap(), Outcome::Drop));

    let metrics = pipe.metrics();
    let dropper = metric(&metrics, "p.processors[0].drop");
    assert_eq!((dropper.received, dropper.discarded, dropper.sent), (1, 1, 0));
    let never = metric(&metrics, "p.processors[1].set");
    assert_eq!(never.received, 0);
}

#[test]
fn cancel_stops_traversal_but_emits() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - set:
      target_field: first
      value: ran
  - cancel:
  - set:
      target_field: second
      value: ran
"#,
    );

    let event = emitted(pipe.process(Event::new()).unwrap());
    assert_eq!(event.get("first"), Some(&Value::from("ran")));
    assert!(event.get("second").is_none());

    let metrics = pipe.metrics();
    let canceller = metric(&metrics, "p.processors[1].cancel");
    assert_eq!((canceller.received, canceller.sent), (1, 1));
    assert_eq!(metric(&metrics, "p.processors[2].set").received, 0);
}

#[test]
fn ignore_missing_converts_key_missing() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - lowercase:
      field: non_existent
      ignore_missing: true
  - set:
      target_field: after
      value: reached
"#,
    );

    let event = emitted(pipe.process(Event::new()).unwrap());
    assert_eq!(event.get("after"), Some(&Value::from("reached")));
}

#[test]
fn ignore_failure_converts_any_error() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - fail:
      ignore_failure: true
  - set:
      target_field: after
      value: reached
"#,
    );

    let event = emitted(pipe.process(Event::new()).unwrap());
    assert_eq!(event.get("after"), Some(&Value::from("reached")));

    let failing = pipe.metrics();
    let step = metric(&failing, "p.processors[0].fail");
    assert_eq!((step.sent, step.errors), (1, 0));
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// A minimal host-supplied compiler: the expression is a dot-path that must
/// exist on the event.
fn field_exists_compiler(expression: &str) -> Result<Box<dyn Condition>> {
    let path = expression.to_string();
    Ok(Box::new(move |event: &Event| event.get(&path).is_some()))
}

#[test]
fn false_condition_skips_the_processor() {
    let config = PipelineConfig::from_yaml(
        r#"
id: p
processors:
  - set:
      if: vehicle.recalled
      target_field: event.kind
      value: recall
"#,
    )
    .unwrap();
    let pipe =
        Pipeline::with_condition_compiler(&config, &registry(), &field_exists_compiler).unwrap();

    let event = emitted(pipe.process(vehicle_event()).unwrap());
    assert!(event.get("event.kind").is_none());

    let metrics = pipe.metrics();
    let step = metric(&metrics, "p.processors[0].set");
    assert_eq!((step.received, step.sent), (1, 1));
}

#[test]
fn true_condition_runs_the_processor() {
    let config = PipelineConfig::from_yaml(
        r#"
id: p
processors:
  - set:
      if: vehicle.vin
      target_field: event.kind
      value: vin_present
"#,
    )
    .unwrap();
    let pipe =
        Pipeline::with_condition_compiler(&config, &registry(), &field_exists_compiler).unwrap();

    let event = emitted(pipe.process(vehicle_event()).unwrap());
    assert_eq!(event.get("event.kind"), Some(&Value::from("vin_present")));
}

#[test]
fn without_a_compiler_conditions_are_inert() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - set:
      if: vehicle.recalled
      target_field: event.kind
      value: recall
"#,
    );

    let event = emitted(pipe.process(vehicle_event()).unwrap());
    assert_eq!(event.get("event.kind"), Some(&Value::from("recall")));
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn repeated_runs_are_deterministic() {
    let pipe = pipeline(
        r#"
id: p
processors:
  - set:
      target_field: event.id
      value: "1234"
  - lowercase:
      field: vehicle.tag
  - remove:
      fields: [vehicle.vin]
      ignore_missing: true
"#,
    );

    let first = emitted(pipe.process(vehicle_event()).unwrap());
    let second = emitted(pipe.process(vehicle_event()).unwrap());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
