pub mod quote_book;
pub mod quote_store;
pub mod reconciler;
pub mod selection;
pub mod transfer;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{QuoteError, Result};

pub use quote_book::QuoteBook;
pub use quote_store::{QuoteStore, QuotesChanged, UpsertOutcome};
pub use reconciler::{reconcile, MergeOutcome};
pub use selection::{SelectionState, Visible, ALL_CATEGORIES};
pub use transfer::ImportReport;

/// Store handle shared between foreground actions and the sync scheduler.
pub type SharedStore = Arc<Mutex<QuoteStore>>;

pub fn share(store: QuoteStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Locks the shared store. Never hold the guard across an `.await`.
pub fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, QuoteStore>> {
    store
        .lock()
        .map_err(|_| QuoteError::Persistence("quote store lock poisoned".into()))
}

/// Runs `mutation` under the store lock, then announces persisted changes once the lock is released.
///
/// Changes that persisted before a failure inside `mutation` are still announced.
pub fn mutate_store<T>(
    store: &SharedStore,
    mutation: impl FnOnce(&mut QuoteStore) -> Result<T>,
) -> Result<T> {
    let (result, change) = {
        let mut guard = lock_store(store)?;
        let result = mutation(&mut *guard);
        (result, guard.take_change())
    };
    if let Some(change) = change {
        change.deliver();
    }
    result
}
