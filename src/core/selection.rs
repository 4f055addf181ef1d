use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    domain::Quote,
    errors::Result,
    storage::{KeyValueStore, SELECTION_KEY},
};

/// Selection value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Quotes visible under the active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visible {
    Quotes(Vec<Quote>),
    /// The selected category currently has no quotes.
    NoMatches { category: String },
}

impl Visible {
    pub fn quotes(&self) -> &[Quote] {
        match self {
            Visible::Quotes(quotes) => quotes,
            Visible::NoMatches { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes().is_empty()
    }
}

/// Remembers and applies the active category filter.
pub struct SelectionState {
    backend: Arc<dyn KeyValueStore>,
    current: String,
}

impl SelectionState {
    /// Restores the persisted selection, reverting to `"all"` when it no longer names a known category.
    pub fn restore(backend: Arc<dyn KeyValueStore>, categories: &[String]) -> Self {
        let saved = match backend.read(SELECTION_KEY) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to read saved category; defaulting to all");
                None
            }
        };
        let current = match saved {
            Some(name) if is_known(&name, categories) => name,
            _ => ALL_CATEGORIES.to_string(),
        };
        Self { backend, current }
    }

    pub fn current_selection(&self) -> &str {
        &self.current
    }

    /// Selects `name` when it is `"all"` or one of `categories`, otherwise `"all"`, and persists the result.
    pub fn set_category(&mut self, name: &str, categories: &[String]) -> Result<&str> {
        let name = name.trim();
        let next = if is_known(name, categories) {
            name.to_string()
        } else {
            debug!(requested = name, "unknown category; falling back to all");
            ALL_CATEGORIES.to_string()
        };
        self.backend.write(SELECTION_KEY, &next)?;
        self.current = next;
        Ok(&self.current)
    }

    /// Filters `quotes` by the active selection.
    pub fn visible_quotes(&self, quotes: &[Quote]) -> Visible {
        if self.current == ALL_CATEGORIES {
            return Visible::Quotes(quotes.to_vec());
        }
        let matching: Vec<Quote> = quotes
            .iter()
            .filter(|quote| quote.category == self.current)
            .cloned()
            .collect();
        if matching.is_empty() {
            Visible::NoMatches {
                category: self.current.clone(),
            }
        } else {
            Visible::Quotes(matching)
        }
    }
}

fn is_known(name: &str, categories: &[String]) -> bool {
    name == ALL_CATEGORIES || categories.iter().any(|category| category == name)
}
