//! Object-rooted field store with dot-path access.
//!
//! All access goes through dot-paths: `put("source.ip", ...)` writes the
//! `ip` field of the `source` object, creating intermediate objects as
//! needed. A literal dot inside a field name is escaped with a backslash:
//! `put("foo\\.bar", ...)` writes a single top-level field named `foo.bar`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};

use crate::error::{EventError, Result};
use crate::value::Value;

/// A single event: a tree of [`Value`]s rooted at an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    root: Root,
}

/// The root value. Kept as a [`Value`] so the empty path can hand out the
/// root object by reference; it is an `Object` by construction, always.
#[derive(Debug, Clone, PartialEq)]
struct Root(Value);

impl Default for Root {
    fn default() -> Self {
        Root(Value::Object(BTreeMap::new()))
    }
}

impl Event {
    /// Returns a new empty event.
    pub fn new() -> Self {
        Event::default()
    }

    /// Wraps an `Object` value as an event.
    ///
    /// # Panics
    ///
    /// Panics when `value` is not an `Object`. Passing any other variant is
    /// a bug in the caller, not a runtime condition.
    pub fn from_object_value(value: Value) -> Self {
        match value {
            Value::Object(_) => Event { root: Root(value) },
            other => panic!(
                "Event::from_object_value requires an object value, got {}",
                other.kind()
            ),
        }
    }

    /// Consumes the event, returning its root as an `Object` value.
    pub fn into_object_value(self) -> Value {
        self.root.0
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    fn fields(&self) -> &BTreeMap<String, Value> {
        match &self.root.0 {
            Value::Object(fields) => fields,
            _ => unreachable!("event root is always an object"),
        }
    }

    fn fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        match &mut self.root.0 {
            Value::Object(fields) => fields,
            _ => unreachable!("event root is always an object"),
        }
    }

    /// Returns the value at the given dot-path, or `None` if it does not
    /// exist. The empty path returns the root object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let path = key_to_path(key);
        if path.is_empty() {
            return Some(&self.root.0);
        }
        self.get_path(&path)
    }

    fn get_path(&self, path: &[String]) -> Option<&Value> {
        let mut current = self.fields();
        for segment in &path[..path.len() - 1] {
            current = current.get(segment)?.as_object()?;
        }
        current.get(&path[path.len() - 1])
    }

    /// Writes a value at the given dot-path, overwriting any existing leaf
    /// and creating missing intermediate objects. Returns the prior leaf
    /// value. Fails with [`EventError::TargetKeyNotObject`] when an existing
    /// intermediate is not an object, leaving the event unchanged.
    pub fn put(&mut self, key: &str, value: Value) -> Result<Option<Value>> {
        self.put_path(&key_to_path(key), value, true)
    }

    /// As [`Event::put`], but fails with [`EventError::KeyExists`] when the
    /// leaf already holds a value, leaving the event unchanged.
    pub fn try_put(&mut self, key: &str, value: Value) -> Result<Option<Value>> {
        self.put_path(&key_to_path(key), value, false)
    }

    fn put_path(&mut self, path: &[String], value: Value, overwrite: bool) -> Result<Option<Value>> {
        if path.is_empty() {
            return Err(EventError::EmptyKey);
        }
        if !overwrite && self.get_path(path).is_some() {
            return Err(EventError::KeyExists {
                path: path_string(path),
            });
        }

        let mut current = self.fields_mut();
        for segment in &path[..path.len() - 1] {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(BTreeMap::new()));
            match slot {
                Value::Object(inner) => current = inner,
                // Only reachable before any intermediate was created.
                _ => {
                    return Err(EventError::TargetKeyNotObject {
                        path: path_string(path),
                    })
                }
            }
        }
        Ok(current.insert(path[path.len() - 1].clone(), value))
    }

    /// Removes the top-level key of the given dot-path and returns the value
    /// addressed by the full path, or `None` if the path does not exist.
    ///
    /// Note the asymmetry for nested paths: `delete("a.b")` returns the
    /// value of `a.b` but removes all of `a`.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        let path = key_to_path(key);
        if path.is_empty() || self.get_path(&path).is_none() {
            return None;
        }

        let removed = self.fields_mut().remove(&path[0])?;

        // Walk the detached subtree to recover the addressed value.
        let mut current = removed;
        for segment in &path[1..] {
            match current {
                Value::Object(mut inner) => current = inner.remove(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => Ok(Event { root: Root(value) }),
            other => Err(D::Error::custom(format!(
                "an event must be a JSON object, got {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("<unencodable event>"),
        }
    }
}

// =============================================================================
// Dot-path tokenizer
// =============================================================================

/// Splits a dot-separated key into path segments.
///
/// A backslash escapes a following dot (`foo\.bar` is the single segment
/// `foo.bar`); before any other byte the backslash is consumed. Empty
/// segments are dropped.
pub(crate) fn key_to_path(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut scratch = String::new();
    let mut escape = false;

    for c in key.chars() {
        match c {
            '\\' => escape = true,
            '.' => {
                if escape {
                    scratch.push('.');
                } else if !scratch.is_empty() {
                    segments.push(std::mem::take(&mut scratch));
                }
                escape = false;
            }
            _ => {
                scratch.push(c);
                escape = false;
            }
        }
    }
    if !scratch.is_empty() {
        segments.push(scratch);
    }

    segments
}

/// Renders a segment list for error messages, e.g. `/source/ip`.
pub(crate) fn path_string(path: &[String]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in path {
        out.push('/');
        out.push_str(segment);
    }
    out
}
