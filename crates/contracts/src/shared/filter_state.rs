use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Текущие значения фильтров страницы (ключ фильтра → выбранное значение).
///
/// Ключ присутствует только если значение выбрано: пустые значения не
/// хранятся, поэтому в запрос никогда не уходит `turma=` без значения.
/// Ключи хранятся отсортированными, чтобы строка запроса была стабильной.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    values: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the state from raw `(name, value)` pairs, e.g. form fields.
    ///
    /// Empty values are skipped. When a name repeats, the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut state = Self::new();
        for (key, value) in pairs {
            state.set(key, value);
        }
        state
    }

    /// Sets a filter value. An empty (or whitespace-only) value removes the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.trim().is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Merges `extra` on top of `self` (values from `extra` win) and drops
    /// `excluded_key` from the result.
    ///
    /// Used to combine the form state with the query of a clicked pagination
    /// link; the CSRF field is passed as `excluded_key`.
    pub fn merged(&self, extra: &FilterState, excluded_key: &str) -> FilterState {
        let mut merged = self.clone();
        for (key, value) in extra.iter() {
            merged.values.insert(key.to_string(), value.to_string());
        }
        merged.values.remove(excluded_key);
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
