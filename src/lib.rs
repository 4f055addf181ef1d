#![doc(test(attr(deny(warnings))))]

//! Quotebook keeps a local, durable collection of quotes, filters it by
//! category, and periodically reconciles it with a remote source where remote
//! records win on key collisions.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod sync;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Quotebook tracing initialized.");
    });
}
