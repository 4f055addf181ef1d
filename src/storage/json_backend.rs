use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    errors::{QuoteError, Result},
    utils::paths::ensure_dir,
};

use super::KeyValueStore;

const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// File-backed store mapping each key to `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_key(key), FILE_EXTENSION))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        write_atomic(&path, value)?;
        debug!(key, bytes = value.len(), "persisted value");
        Ok(())
    }
}

/// Writes `data` to `path` by staging a sibling temp file and renaming it over the target.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path).map_err(|err| {
        let _ = fs::remove_file(&tmp);
        QuoteError::Persistence(format!("failed to replace `{}`: {}", path.display(), err))
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn canonical_key(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "value".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (JsonFileStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonFileStore::new(temp.path().join("data")).expect("json store");
        (store, temp)
    }

    #[test]
    fn missing_key_reads_as_none() {
        let (store, _guard) = store_with_temp_dir();
        assert_eq!(store.read("quotes").expect("read"), None);
    }

    #[test]
    fn write_then_read_returns_value() {
        let (store, _guard) = store_with_temp_dir();
        store.write("quotes", "[]").expect("write");
        assert_eq!(store.read("quotes").expect("read").as_deref(), Some("[]"));
        assert!(store.key_path("quotes").ends_with("quotes.json"));
        assert!(!tmp_path(&store.key_path("quotes")).exists());
    }

    #[test]
    fn failed_write_preserves_previous_value() {
        let (store, _guard) = store_with_temp_dir();
        store.write("quotes", "[1]").expect("initial write");

        // A directory squatting on the temp path makes File::create fail.
        fs::create_dir_all(tmp_path(&store.key_path("quotes"))).unwrap();
        let result = store.write("quotes", "[2]");
        assert!(matches!(result, Err(QuoteError::Persistence(_))));
        assert_eq!(store.read("quotes").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let (store, _guard) = store_with_temp_dir();
        let path = store.key_path("../Selected Category");
        assert_eq!(path.parent(), Some(store.root()));
        assert!(path.ends_with("___selected_category.json"));
    }
}
