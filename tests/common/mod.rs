#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use once_cell::sync::Lazy;
use quotebook::config::{Config, ConfigManager};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated app directory.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// App directory whose config points at an address nothing listens on.
pub fn offline_base() -> PathBuf {
    let base = temp_base();
    let config = Config {
        remote_url: "http://127.0.0.1:9/posts".into(),
        request_timeout_secs: 1,
        ..Config::default()
    };
    ConfigManager::with_base_dir(base.clone())
        .expect("create config manager for temp dir")
        .save(&config)
        .expect("write offline config");
    base
}

pub fn quotes_json(entries: &[(&str, &str)]) -> String {
    let values: Vec<_> = entries
        .iter()
        .map(|(text, category)| serde_json::json!({ "text": text, "category": category }))
        .collect();
    serde_json::to_string(&values).expect("serialize quotes")
}
