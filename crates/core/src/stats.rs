//! Per-model usage counter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of applied suggestions per source-model label, stored under `llm-usage-stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageStats(BTreeMap<String, u64>);

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one use of `model` and returns the new count.
    pub fn record(&mut self, model: &str) -> u64 {
        let count = self.0.entry(model.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, model: &str) -> u64 {
        self.0.get(model).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(model, count)| (model.as_str(), *count))
    }

    pub fn into_inner(self) -> BTreeMap<String, u64> {
        self.0
    }
}
