//! Facade tying the local store, the category filter, and remote sync together.

use std::{path::Path, sync::Arc};

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    domain::{quote::USER_AUTHOR, Quote},
    errors::Result,
    storage::{JsonFileStore, KeyValueStore},
    sync::{HttpGateway, RemoteGateway, SchedulerSettings, SyncScheduler},
};

use super::{
    lock_store, mutate_store, share,
    quote_store::{QuoteStore, UpsertOutcome},
    selection::{SelectionState, Visible},
    transfer::{self, ImportReport},
    SharedStore,
};

pub struct QuoteBook {
    store: SharedStore,
    selection: SelectionState,
    gateway: Arc<dyn RemoteGateway>,
    scheduler: Arc<SyncScheduler>,
}

impl QuoteBook {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn RemoteGateway>,
        settings: SchedulerSettings,
    ) -> Self {
        let store = QuoteStore::open(Box::new(backend.clone()));
        let selection = SelectionState::restore(backend, &store.distinct_categories());
        let store = share(store);
        let scheduler = Arc::new(SyncScheduler::new(
            store.clone(),
            gateway.clone(),
            settings,
        ));
        Self {
            store,
            selection,
            gateway,
            scheduler,
        }
    }

    /// Opens the file-backed store under `data_dir` with an HTTP gateway built from `config`.
    pub fn open(data_dir: &Path, config: &Config) -> Result<Self> {
        let backend = Arc::new(JsonFileStore::new(data_dir)?);
        let settings = SchedulerSettings::from(config);
        let gateway = Arc::new(HttpGateway::new(
            config.remote_url.clone(),
            settings.request_timeout,
        )?);
        info!(data_dir = %data_dir.display(), remote = %config.remote_url, "quote book opened");
        Ok(Self::new(backend, gateway, settings))
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn scheduler(&self) -> &Arc<SyncScheduler> {
        &self.scheduler
    }

    pub fn quotes(&self) -> Result<Vec<Quote>> {
        Ok(lock_store(&self.store)?.all().to_vec())
    }

    pub fn distinct_categories(&self) -> Result<Vec<String>> {
        Ok(lock_store(&self.store)?.distinct_categories())
    }

    /// Registers a listener fired after the store lock is released, so it may read the book again.
    pub fn on_quotes_changed(&self, listener: impl Fn(&[Quote]) + Send + Sync + 'static) -> Result<()> {
        lock_store(&self.store)?.on_quotes_changed(listener);
        Ok(())
    }

    /// Validates and stores a user quote, then posts it to the remote in the background.
    ///
    /// The remote post never affects the local outcome; its failure is only logged.
    pub fn add_quote(&self, text: &str, category: &str) -> Result<UpsertOutcome> {
        let quote = Quote::new(text, category, Some(USER_AUTHOR))?;
        let outcome = mutate_store(&self.store, |store| store.upsert(quote.clone()))?;
        self.post_in_background(quote);
        Ok(outcome)
    }

    pub fn current_selection(&self) -> &str {
        self.selection.current_selection()
    }

    /// Applies a category filter; unknown names select `"all"`. Returns the effective selection.
    pub fn set_category(&mut self, name: &str) -> Result<String> {
        let categories = self.distinct_categories()?;
        Ok(self.selection.set_category(name, &categories)?.to_string())
    }

    pub fn visible_quotes(&self) -> Result<Visible> {
        let store = lock_store(&self.store)?;
        Ok(self.selection.visible_quotes(store.all()))
    }

    /// Picks one quote at random from the visible set.
    pub fn random_quote(&self) -> Result<Option<Quote>> {
        let visible = self.visible_quotes()?;
        Ok(visible.quotes().choose(&mut rand::thread_rng()).cloned())
    }

    pub fn import_file(&self, path: &Path) -> Result<ImportReport> {
        mutate_store(&self.store, |store| transfer::import_file(store, path))
    }

    pub fn export_file(&self, path: &Path) -> Result<usize> {
        let store = lock_store(&self.store)?;
        transfer::export_file(&store, path)
    }

    fn post_in_background(&self, quote: Quote) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime available; skipping remote post");
            return;
        };
        let gateway = self.gateway.clone();
        runtime.spawn(async move {
            match gateway.post_record(&quote).await {
                Ok(_) => debug!(text = %quote.text, "quote posted to remote"),
                Err(err) => warn!(error = %err, text = %quote.text, "failed to post quote"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ALL_CATEGORIES;
    use crate::domain::{RawEntry, RawRecord};
    use crate::errors::QuoteError;
    use crate::storage::{MemoryStore, QUOTES_KEY};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingGateway {
        posted: Mutex<Vec<Quote>>,
        posted_signal: Notify,
    }

    #[async_trait]
    impl RemoteGateway for RecordingGateway {
        async fn fetch_batch(&self, _limit: usize) -> Result<Vec<RawEntry>> {
            Ok(vec![Ok(RawRecord::titled("remote"))])
        }

        async fn post_record(&self, quote: &Quote) -> Result<RawRecord> {
            self.posted.lock().unwrap().push(quote.clone());
            self.posted_signal.notify_one();
            Err(QuoteError::Gateway("remote rejected post".into()))
        }
    }

    fn book_with(raw: &str) -> (QuoteBook, Arc<RecordingGateway>) {
        let backend = Arc::new(MemoryStore::with_value(QUOTES_KEY, raw));
        let gateway = Arc::new(RecordingGateway::default());
        let book = QuoteBook::new(backend, gateway.clone(), SchedulerSettings::default());
        (book, gateway)
    }

    #[test]
    fn add_quote_rejects_missing_fields() {
        let (book, _gateway) = book_with("[]");
        assert!(matches!(
            book.add_quote("", "Wisdom"),
            Err(QuoteError::Validation(_))
        ));
        assert!(book.quotes().unwrap().is_empty());
    }

    #[test]
    fn add_quote_without_runtime_still_stores_locally() {
        let (book, gateway) = book_with("[]");
        assert_eq!(
            book.add_quote("Stay curious", "Wisdom").unwrap(),
            UpsertOutcome::Inserted
        );
        let quotes = book.quotes().unwrap();
        assert_eq!(quotes[0].author, USER_AUTHOR);
        assert!(gateway.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_post_does_not_undo_local_add() {
        let (book, gateway) = book_with("[]");
        book.add_quote("Stay curious", "Wisdom").unwrap();
        gateway.posted_signal.notified().await;

        assert_eq!(gateway.posted.lock().unwrap().len(), 1);
        assert_eq!(book.quotes().unwrap().len(), 1);
    }

    #[test]
    fn filter_and_random_pick_respect_selection() {
        let (mut book, _gateway) = book_with(
            r#"[{"text":"A","category":"Wisdom"},{"text":"B","category":"Humor"}]"#,
        );
        assert_eq!(book.set_category("Humor").unwrap(), "Humor");
        assert_eq!(book.random_quote().unwrap().unwrap().text, "B");

        assert_eq!(book.set_category("Missing").unwrap(), ALL_CATEGORIES);
        assert_eq!(book.visible_quotes().unwrap().quotes().len(), 2);
    }

    #[test]
    fn random_quote_is_none_when_category_empties() {
        let (mut book, _gateway) = book_with(r#"[{"text":"A","category":"Wisdom"}]"#);
        book.set_category("Wisdom").unwrap();
        lock_store(&book.store()).unwrap().replace_all(Vec::new()).unwrap();
        assert!(matches!(
            book.visible_quotes().unwrap(),
            Visible::NoMatches { .. }
        ));
        assert_eq!(book.random_quote().unwrap(), None);
    }

    #[tokio::test]
    async fn scheduler_updates_the_shared_store() {
        let (book, _gateway) = book_with(r#"[{"text":"A","category":"Wisdom"}]"#);
        let changes = Arc::new(Mutex::new(0));
        let counter = changes.clone();
        book.on_quotes_changed(move |_| *counter.lock().unwrap() += 1)
            .unwrap();

        book.scheduler().trigger().await;
        assert_eq!(book.quotes().unwrap().len(), 2);
        assert_eq!(book.distinct_categories().unwrap(), vec!["Wisdom", "Server"]);
        assert_eq!(*changes.lock().unwrap(), 1);
    }

    #[test]
    fn listeners_can_read_the_book_they_observe() {
        let (book, _gateway) = book_with("[]");
        let store = book.store();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = observed.clone();
        book.on_quotes_changed(move |_| {
            let len = store.try_lock().map(|guard| guard.len()).ok();
            sink.lock().unwrap().push(len);
        })
        .unwrap();

        book.add_quote("Stay curious", "Wisdom").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, r#"[{"text":"Keep going","category":"Grit"}]"#).unwrap();
        book.import_file(&path).unwrap();

        assert_eq!(*observed.lock().unwrap(), vec![Some(1), Some(2)]);
    }
}
