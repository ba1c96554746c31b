//! Raw inputs of one record

use pmml_types::{RawValue, Value};
use std::collections::HashMap;

/// Source of raw input values for one record
///
/// Values are returned by value; the context prepares and memoizes each one
/// at most once, so implementations may compute them on demand.
#[cfg_attr(test, mockall::automock)]
pub trait Arguments {
    /// Raw value of an input field, `None` when absent
    fn get(&self, name: &str) -> Option<RawValue>;

    /// Earlier raw values of an input field, most recent first
    ///
    /// `block` holds the current values of the lag's block indicator fields;
    /// only records sharing those values belong to the history. The current
    /// record is not part of it.
    fn history(&self, name: &str, block: &[Option<Value>]) -> Vec<Option<RawValue>> {
        let _ = (name, block);
        Vec::new()
    }
}

impl Arguments for HashMap<String, RawValue> {
    fn get(&self, name: &str) -> Option<RawValue> {
        HashMap::get(self, name).cloned()
    }
}

/// Arguments with nothing in them
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArguments;

pub(crate) static NO_ARGUMENTS: NoArguments = NoArguments;

impl Arguments for NoArguments {
    fn get(&self, _name: &str) -> Option<RawValue> {
        None
    }
}

/// In-memory record with optional per-field history
///
/// The history is a single block: block indicators are ignored.
#[derive(Debug, Clone, Default)]
pub struct Record {
    values: HashMap<String, RawValue>,
    history: HashMap<String, Vec<Option<RawValue>>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Set the earlier values of a field, most recent first
    pub fn with_history(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<RawValue>>,
    ) -> Self {
        self.history.insert(name.into(), values.into_iter().collect());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(name.into(), value.into());
    }
}

impl Arguments for Record {
    fn get(&self, name: &str) -> Option<RawValue> {
        self.values.get(name).cloned()
    }

    fn history(&self, name: &str, _block: &[Option<Value>]) -> Vec<Option<RawValue>> {
        self.history.get(name).cloned().unwrap_or_default()
    }
}
