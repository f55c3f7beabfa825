//! The upstream code dictionary.
//!
//! A [`Mapping`] assigns a semantic tag (`"FOOTBALL"`, `"CURRENT"`, a team
//! name, ...) to every opaque code the feed uses for the current dictionary
//! cycle. Lookups are exact-match on the code string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Code to semantic-tag dictionary for one upstream cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct Mapping(BTreeMap<String, String>);

impl Mapping {
    /// Create an empty mapping.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Look up the semantic tag for a code.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Whether the code is part of this dictionary.
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    /// Resolve a code, passing unknown codes through unchanged.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).unwrap_or(code)
    }

    /// Insert or overwrite a single entry.
    pub fn insert(&mut self, code: impl Into<String>, tag: impl Into<String>) -> Option<String> {
        self.0.insert(code.into(), tag.into())
    }

    /// Number of codes in the dictionary.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(code, tag)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(code, tag)| (code.as_str(), tag.as_str()))
    }
}

impl<C: Into<String>, T: Into<String>> FromIterator<(C, T)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (C, T)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, tag)| (code.into(), tag.into()))
                .collect(),
        )
    }
}
