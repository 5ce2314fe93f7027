//! Call-site unpacking packs.
//!
//! A `*` expression at a call site produces a [`PosPack`], a `**` expression
//! a [`KwPack`]. Both are consumed lazily by exactly one merge, and both end
//! with a terminal [`PosPack::validate`] / [`KwPack::validate`] that fails if
//! anything was left unconsumed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, RunResult},
    value::Value,
};

/// The contents of a `*iterable` unpacking expression.
///
/// Exposes a one-shot cursor: [`has_value`](Self::has_value) peeks,
/// [`value`](Self::value) advances. Once the merge finishes, whatever the
/// cursor has not reached is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosPack {
    values: Vec<Value>,
    cursor: usize,
}

impl PosPack {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, cursor: 0 }
    }

    /// True if the cursor has not reached the end.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.cursor < self.values.len()
    }

    /// Takes the next value, advancing the cursor.
    pub fn value(&mut self) -> Option<Value> {
        let value = self.values.get_mut(self.cursor)?;
        self.cursor += 1;
        Some(std::mem::replace(value, Value::None))
    }

    /// Number of values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }

    /// Terminal check: fails naming the leftover values if the cursor did
    /// not reach the end.
    pub fn validate(&self) -> RunResult<()> {
        if self.has_value() {
            return Err(Error::unconsumed_positional(&self.values[self.cursor..]));
        }
        Ok(())
    }
}

/// The contents of a `**mapping` unpacking expression.
///
/// Entries keep their mapping's iteration order and are destructively
/// removed as the merge consumes them by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KwPack {
    entries: IndexMap<String, Value>,
}

impl KwPack {
    /// Builds the pack, rejecting duplicate keys.
    pub fn new(pairs: impl IntoIterator<Item = (String, Value)>) -> RunResult<Self> {
        let mut entries = IndexMap::new();
        for (key, value) in pairs {
            if entries.insert(key.clone(), value).is_some() {
                return Err(Error::duplicate_keyword(&key));
            }
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Destructively removes and returns the entry under `key`.
    ///
    /// Removal preserves the order of the remaining entries.
    pub fn extract(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Drains every remaining entry, in insertion order.
    pub fn drain(&mut self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.entries.drain(..)
    }

    /// Terminal check: fails naming the leftover keys if any entries remain.
    pub fn validate(&self) -> RunResult<()> {
        if !self.entries.is_empty() {
            return Err(Error::unconsumed_keywords(self.entries.keys().map(String::as_str)));
        }
        Ok(())
    }
}
