//! Processor type registry: name → configuration schema + factory.
//!
//! Each registration pairs a config type (any `Deserialize` struct) with a
//! factory function. Building a processor binds the raw key-value
//! configuration from the pipeline document onto the config type through
//! serde — defaults first, then user fields — and hands the bound config to
//! the factory. Unknown fields, missing required fields, type mismatches,
//! and numeric overflow are all rejected at bind time.

use std::collections::BTreeMap;

use log::debug;
use serde::de::DeserializeOwned;

use crate::error::{PipelineError, Result};
use crate::processor::Processor;
use crate::processors;

type Factory =
    Box<dyn Fn(&serde_json::Map<String, serde_json::Value>) -> Result<Box<dyn Processor>> + Send + Sync>;

/// An explicit, immutable-after-construction table of processor types.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    /// Returns an empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Returns a registry with all built-in processors registered.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        registry.must_register("append", processors::append::new);
        registry.must_register("community_id", processors::community_id::new);
        registry.must_register("lowercase", processors::case::new_lowercase);
        registry.must_register("remove", processors::remove::new);
        registry.must_register("set", processors::set::new);
        registry.must_register("uppercase", processors::case::new_uppercase);
        registry
    }

    /// Registers a processor type. Registering the same name twice fails
    /// with [`PipelineError::DuplicateProcessor`].
    pub fn register<C, P, F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        C: DeserializeOwned,
        P: Processor + 'static,
        F: Fn(C) -> Result<P> + Send + Sync + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(PipelineError::DuplicateProcessor {
                name: name.to_string(),
            });
        }

        let processor_type = name.to_string();
        let bind_and_build: Factory = Box::new(move |raw| {
            let config: C = serde_json::from_value(serde_json::Value::Object(raw.clone()))
                .map_err(|err| PipelineError::ConfigInvalid {
                    processor: processor_type.clone(),
                    reason: err.to_string(),
                })?;
            Ok(Box::new(factory(config)?))
        });

        debug!("registered {name:?} processor");
        self.factories.insert(name.to_string(), bind_and_build);
        Ok(())
    }

    /// As [`Registry::register`], but panics on a duplicate name. Double
    /// registration is a bug in the embedding program, not a runtime
    /// condition.
    pub fn must_register<C, P, F>(&mut self, name: &str, factory: F)
    where
        C: DeserializeOwned,
        P: Processor + 'static,
        F: Fn(C) -> Result<P> + Send + Sync + 'static,
    {
        if let Err(err) = self.register(name, factory) {
            panic!("{err}");
        }
    }

    /// Constructs a processor instance from its raw configuration.
    pub fn build(
        &self,
        name: &str,
        raw_config: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Box<dyn Processor>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PipelineError::UnknownProcessor {
                name: name.to_string(),
            })?;
        factory(raw_config)
    }

    /// Registered processor type names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
