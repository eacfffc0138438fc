//! The boolean predicate hook behind per-processor `if` expressions.
//!
//! The core evaluates no expression language of its own. A host installs a
//! compiler via [`Pipeline::with_condition_compiler`] that turns each `if`
//! string into a [`Condition`] at build time; without one, `if` expressions
//! are retained but never evaluated.
//!
//! [`Pipeline::with_condition_compiler`]: crate::Pipeline::with_condition_compiler

use millrace_event::Event;

use crate::error::Result;

/// A compiled boolean predicate over an event.
pub trait Condition: Send + Sync {
    fn matches(&self, event: &Event) -> bool;
}

impl<F> Condition for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn matches(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Compiles an `if` expression into a predicate during pipeline build.
pub type ConditionCompiler<'a> = &'a (dyn Fn(&str) -> Result<Box<dyn Condition>> + Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use millrace_event::Value;

    #[test]
    fn closures_are_conditions() {
        let condition = |event: &Event| event.get("flag").is_some();
        let mut event = Event::new();
        assert!(!condition.matches(&event));
        event.put("flag", Value::Bool(true)).unwrap();
        assert!(condition.matches(&event));
    }
}
