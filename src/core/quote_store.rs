use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    core::reconciler::KeyedQuotes,
    domain::{seed_quotes, Quote},
    errors::Result,
    storage::{KeyValueStore, QUOTES_KEY},
};

/// Listener invoked with the full collection after persisted mutations.
pub type QuotesListener = Arc<dyn Fn(&[Quote]) + Send + Sync>;

/// Snapshot of a changed collection together with the listeners to tell.
///
/// Taken while the store is locked and delivered after the lock is released, so
/// a listener may read the store again.
#[must_use = "a change is only announced when `deliver` is called"]
pub struct QuotesChanged {
    quotes: Vec<Quote>,
    listeners: Vec<QuotesListener>,
}

impl QuotesChanged {
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn deliver(self) {
        for listener in &self.listeners {
            listener(&self.quotes);
        }
    }
}

/// Outcome of an [`QuoteStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Ordered, durable quote collection keyed by `text`.
///
/// Every mutation is flushed to the backend before it returns; a failed flush
/// rolls the in-memory collection back so both copies stay identical. Persisted
/// mutations are collected into a pending change, see [`QuoteStore::take_change`].
pub struct QuoteStore {
    backend: Box<dyn KeyValueStore>,
    quotes: Vec<Quote>,
    listeners: Vec<QuotesListener>,
    changed: bool,
}

impl QuoteStore {
    /// Opens the store and hydrates it from the backend (or the seed set).
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let mut store = Self {
            backend,
            quotes: Vec::new(),
            listeners: Vec::new(),
            changed: false,
        };
        store.load();
        store
    }

    /// Re-reads the persisted collection. Missing or unreadable data yields the seed set.
    pub fn load(&mut self) -> &[Quote] {
        self.quotes = match self.backend.read(QUOTES_KEY) {
            Ok(Some(data)) => match serde_json::from_str::<Vec<Quote>>(&data) {
                Ok(quotes) => {
                    let quotes = dedupe(quotes);
                    debug!(count = quotes.len(), "loaded persisted quotes");
                    quotes
                }
                Err(err) => {
                    warn!(error = %err, "persisted quotes are corrupt; using seed set");
                    seed_quotes()
                }
            },
            Ok(None) => {
                info!("no persisted quotes; using seed set");
                seed_quotes()
            }
            Err(err) => {
                warn!(error = %err, "failed to read persisted quotes; using seed set");
                seed_quotes()
            }
        };
        &self.quotes
    }

    /// Current in-memory view.
    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn get(&self, text: &str) -> Option<&Quote> {
        self.quotes.iter().find(|quote| quote.text == text)
    }

    /// Overwrites the whole collection and persists it.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Result<()> {
        let previous = std::mem::replace(&mut self.quotes, dedupe(quotes));
        if let Err(err) = self.persist() {
            self.quotes = previous;
            return Err(err);
        }
        self.changed = true;
        Ok(())
    }

    /// Inserts a new key or replaces the existing entry in place.
    pub fn upsert(&mut self, quote: Quote) -> Result<UpsertOutcome> {
        match self.position(&quote.text) {
            Some(index) => {
                let previous = std::mem::replace(&mut self.quotes[index], quote);
                if let Err(err) = self.persist() {
                    self.quotes[index] = previous;
                    return Err(err);
                }
                self.changed = true;
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                self.quotes.push(quote);
                if let Err(err) = self.persist() {
                    self.quotes.pop();
                    return Err(err);
                }
                self.changed = true;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Adds `quote` only when its key is new. Returns whether it was added.
    pub fn insert_if_absent(&mut self, quote: Quote) -> Result<bool> {
        if self.position(&quote.text).is_some() {
            return Ok(false);
        }
        self.upsert(quote)?;
        Ok(true)
    }

    /// Distinct categories in order of first appearance.
    pub fn distinct_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for quote in &self.quotes {
            if !categories.iter().any(|existing| existing == &quote.category) {
                categories.push(quote.category.clone());
            }
        }
        categories
    }

    pub fn on_quotes_changed(&mut self, listener: impl Fn(&[Quote]) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// Returns the change accumulated since the last call, if anything was persisted.
    ///
    /// Deliver it only after releasing any lock around the store.
    pub fn take_change(&mut self) -> Option<QuotesChanged> {
        if !std::mem::take(&mut self.changed) {
            return None;
        }
        Some(QuotesChanged {
            quotes: self.quotes.clone(),
            listeners: self.listeners.clone(),
        })
    }

    /// Access to the backend for components that persist alongside the collection.
    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    fn position(&self, text: &str) -> Option<usize> {
        self.quotes.iter().position(|quote| quote.text == text)
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.quotes)?;
        self.backend.write(QUOTES_KEY, &json)
    }
}

fn dedupe(quotes: Vec<Quote>) -> Vec<Quote> {
    quotes.into_iter().collect::<KeyedQuotes>().into_vec()
}
