use std::collections::{BTreeMap, HashMap};
use std::iter;

use crate::value::Value;

/// Environment for variable bindings
///
/// A frame owns its own bindings and borrows its parent. Function calls push a
/// child frame on top of the caller's environment for the duration of the
/// call; the parent can only be read through the child, so definitions made
/// inside a call never leak out of it.
#[derive(Debug, Default)]
pub struct Environment<'parent> {
    bindings: HashMap<String, Value>,
    parent: Option<&'parent Environment<'parent>>,
}

impl<'parent> Environment<'parent> {
    /// An empty root environment
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Root environment with the predefined names (`nil`)
    pub fn global() -> Self {
        let mut env = Environment::new();
        env.define("nil", Value::Nil);
        env
    }

    pub fn with_parent(parent: &'parent Environment<'parent>) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Bind `name` in this frame, replacing any binding this frame already had
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Look `name` up in this frame, then outward through the parents
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .get(name)
            .or_else(|| self.parent.and_then(|parent| parent.get(name)))
    }

    /// Every visible binding, sorted by name; inner frames shadow outer ones
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let frames: Vec<&Self> = iter::successors(Some(self), |env| env.parent).collect();
        let visible: BTreeMap<&str, &Value> = frames
            .into_iter()
            .rev()
            .flat_map(|env| env.bindings.iter())
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        visible
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value.clone()))
            .collect()
    }
}
