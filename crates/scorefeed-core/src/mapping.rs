//! Mapping store: the current code dictionary and its loader.
//!
//! The upstream sends its dictionary as a single string of `code:tag` pairs
//! joined by `;`. [`MappingStore::load`] parses that string into a
//! [`Mapping`]; [`MappingStore::replace`] installs a new dictionary in one
//! step.
//!
//! The installed dictionary is held behind an [`Arc`]. Readers take a cheap
//! handle with [`MappingStore::current`] and keep decoding against it even if
//! the store is replaced underneath them, so a decode never sees a mixture of
//! two dictionaries.

use std::sync::Arc;

use scorefeed_types::Mapping;
use tracing::debug;

/// Separator between `code:tag` pairs.
const PAIR_SEPARATOR: char = ';';

/// Separator between a code and its tag.
const CODE_SEPARATOR: char = ':';

/// Errors raised while loading a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// A pair had no `:` between code and tag.
    #[error("malformed mapping pair #{position}: {pair:?} has no ':' separator")]
    MissingSeparator {
        /// 1-based position of the pair in the input.
        position: usize,
        /// The offending pair text.
        pair: String,
    },
}

/// Holder of the currently installed dictionary.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    current: Arc<Mapping>,
    generation: u64,
}

impl MappingStore {
    /// Create a store holding an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `code:tag;code:tag` string into a [`Mapping`].
    ///
    /// Each pair is split on its first `:`, so tags may themselves contain
    /// colons. Empty segments (an empty input, or a trailing `;`) are
    /// skipped. When a code appears twice the later tag wins.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingSeparator`] if any non-empty pair has
    /// no `:`. Nothing is returned for the pairs that did parse.
    pub fn load(raw: &str) -> Result<Mapping, MappingError> {
        let mut mapping = Mapping::new();

        for (index, pair) in raw.split(PAIR_SEPARATOR).enumerate() {
            if pair.is_empty() {
                continue;
            }
            let (code, tag) =
                pair.split_once(CODE_SEPARATOR)
                    .ok_or_else(|| MappingError::MissingSeparator {
                        position: index.saturating_add(1),
                        pair: pair.to_owned(),
                    })?;
            mapping.insert(code, tag);
        }

        Ok(mapping)
    }

    /// Install a new dictionary, dropping the old one as a whole.
    pub fn replace(&mut self, mapping: Mapping) {
        debug!(
            previous = self.current.len(),
            next = mapping.len(),
            generation = self.generation.saturating_add(1),
            "Replacing mapping"
        );
        self.current = Arc::new(mapping);
        self.generation = self.generation.saturating_add(1);
    }

    /// A handle to the installed dictionary.
    pub fn current(&self) -> Arc<Mapping> {
        Arc::clone(&self.current)
    }

    /// Borrow the installed dictionary.
    pub fn mapping(&self) -> &Mapping {
        &self.current
    }

    /// How many times a dictionary has been installed.
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn load_simple_pairs() {
        let mapping = MappingStore::load("a:1;b:2").unwrap();
        let expected: Mapping = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(mapping, expected);
    }

    #[test]
    fn load_empty_input_is_empty_mapping() {
        let mapping = MappingStore::load("").unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn load_splits_on_first_colon_only() {
        let mapping = MappingStore::load("t1:Kick-off 20:45").unwrap();
        assert_eq!(mapping.get("t1"), Some("Kick-off 20:45"));
    }

    #[test]
    fn load_tolerates_trailing_separator() {
        let mapping = MappingStore::load("a:1;b:2;").unwrap();
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn load_fails_whole_on_malformed_pair() {
        let err = MappingStore::load("a:1;broken;c:3").unwrap_err();
        assert_eq!(
            err,
            MappingError::MissingSeparator {
                position: 2,
                pair: "broken".to_owned(),
            }
        );
    }

    #[test]
    fn duplicate_code_keeps_last_tag() {
        let mapping = MappingStore::load("a:1;a:2").unwrap();
        assert_eq!(mapping.get("a"), Some("2"));
    }

    #[test]
    fn replace_swaps_whole_mapping() {
        let mut store = MappingStore::new();
        store.replace(MappingStore::load("a:1;b:2").unwrap());
        let held = store.current();

        store.replace(MappingStore::load("c:3").unwrap());

        // The earlier handle still sees the complete old dictionary.
        assert_eq!(held.len(), 2);
        assert_eq!(held.get("a"), Some("1"));
        assert!(!store.mapping().contains("a"));
        assert_eq!(store.mapping().get("c"), Some("3"));
        assert_eq!(store.generation(), 2);
    }
}
