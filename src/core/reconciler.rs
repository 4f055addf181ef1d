//! Pure merge of the local collection with a freshly fetched remote batch.
//!
//! Remote quotes always supersede local quotes sharing the same `text`. Keys keep
//! the position of their first insertion: local keys stay in their original
//! relative order and remote-only keys are appended in arrival order.

use std::collections::HashMap;

use crate::domain::Quote;

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: Vec<Quote>,
    /// Remote quotes that replaced an entry already present under the same key.
    pub overwritten: usize,
    /// Remote quotes whose key was not present before.
    pub added: usize,
}

impl MergeOutcome {
    pub fn is_noop(&self) -> bool {
        self.overwritten == 0 && self.added == 0
    }
}

/// Insertion-ordered quote collection keyed by `text`.
#[derive(Debug, Default)]
pub(crate) struct KeyedQuotes {
    entries: Vec<Quote>,
    index: HashMap<String, usize>,
}

impl KeyedQuotes {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Stores `quote`, replacing in place when the key exists. Returns `true` on replacement.
    pub(crate) fn set(&mut self, quote: Quote) -> bool {
        match self.index.get(quote.key()) {
            Some(&position) => {
                self.entries[position] = quote;
                true
            }
            None => {
                self.index.insert(quote.text.clone(), self.entries.len());
                self.entries.push(quote);
                false
            }
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Quote> {
        self.entries
    }
}

impl FromIterator<Quote> for KeyedQuotes {
    fn from_iter<I: IntoIterator<Item = Quote>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut keyed = Self::with_capacity(iter.size_hint().0);
        for quote in iter {
            keyed.set(quote);
        }
        keyed
    }
}

/// Merges `remote` into `local` under the remote-wins rule.
pub fn reconcile(local: &[Quote], remote: &[Quote]) -> MergeOutcome {
    let mut keyed: KeyedQuotes = local.iter().cloned().collect();
    let mut overwritten = 0;
    let mut added = 0;
    for quote in remote {
        if keyed.set(quote.clone()) {
            overwritten += 1;
        } else {
            added += 1;
        }
    }
    MergeOutcome {
        merged: keyed.into_vec(),
        overwritten,
        added,
    }
}
