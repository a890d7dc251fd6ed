//! Series visibility
//!
//! Hidden series are tracked as a set of keys. Toggling never mutates in
//! place; it returns a new set so change detection is a plain comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keys of the series currently hidden from render
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeriesVisibility {
    hidden: BTreeSet<String>,
}

impl SeriesVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// New set with `key` removed if hidden, added otherwise
    pub fn toggled(&self, key: &str) -> Self {
        let mut hidden = self.hidden.clone();
        if !hidden.remove(key) {
            hidden.insert(key.to_string());
        }
        Self { hidden }
    }

    pub fn is_visible(&self, key: &str) -> bool {
        !self.hidden.contains(key)
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains(key)
    }

    pub fn hidden_keys(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SeriesVisibility {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            hidden: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Free-function form of [`SeriesVisibility::toggled`]
pub fn toggle(hidden: &SeriesVisibility, key: &str) -> SeriesVisibility {
    hidden.toggled(key)
}

/// Free-function form of [`SeriesVisibility::is_visible`]
pub fn is_visible(hidden: &SeriesVisibility, key: &str) -> bool {
    hidden.is_visible(key)
}
