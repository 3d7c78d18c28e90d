use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Result;

/// Lookup table for help texts.
///
/// Texts that start with `$` are keys into the table (`"$create_s"` looks up
/// `create_s`); any other non-empty text is shown as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Translations {
    entries: HashMap<String, String>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a flat JSON object of `"key": "text"` pairs.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `text` for display. An empty `text` falls back to looking up
    /// `alternative`; unresolved keys render as an empty string.
    pub fn translate<'s>(&'s self, text: &'s str, alternative: &str) -> &'s str {
        if !text.is_empty() && !text.starts_with('$') {
            return text;
        }

        let key = text.strip_prefix('$').unwrap_or(alternative);
        self.get(key).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Translations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
