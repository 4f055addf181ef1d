//! JSON import and export of the quote collection.
//!
//! Import is first-write-wins: a record whose `text` already exists is skipped,
//! unlike sync where the remote copy replaces the local one.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    core::quote_store::QuoteStore,
    domain::Quote,
    errors::{QuoteError, Result},
    storage::json_backend::write_atomic,
};

/// Category given to imported records that carry none.
pub const IMPORT_FALLBACK_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_existing: usize,
    pub rejected: usize,
}

/// Reads a JSON array of quotes and adds every record with a new `text`.
pub fn import_json(store: &mut QuoteStore, reader: impl Read) -> Result<ImportReport> {
    let document: Value = serde_json::from_reader(reader)
        .map_err(|err| QuoteError::MalformedRecord(format!("failed to parse JSON: {}", err)))?;
    let Value::Array(records) = document else {
        return Err(QuoteError::Validation(
            "expected a JSON array of quotes".into(),
        ));
    };

    let mut report = ImportReport::default();
    for record in &records {
        let Some(quote) = quote_from_value(record) else {
            report.rejected += 1;
            continue;
        };
        if store.insert_if_absent(quote)? {
            report.imported += 1;
        } else {
            report.skipped_existing += 1;
        }
    }
    info!(
        imported = report.imported,
        skipped = report.skipped_existing,
        rejected = report.rejected,
        "import finished"
    );
    Ok(report)
}

pub fn import_file(store: &mut QuoteStore, path: &Path) -> Result<ImportReport> {
    let file = File::open(path).map_err(|err| {
        QuoteError::Validation(format!("cannot open `{}`: {}", path.display(), err))
    })?;
    import_json(store, BufReader::new(file))
}

/// Writes the current collection as a pretty-printed JSON array.
pub fn export_json(store: &QuoteStore, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, store.all())?;
    writer.flush()?;
    Ok(())
}

pub fn export_file(store: &QuoteStore, path: &Path) -> Result<usize> {
    let json = serde_json::to_string_pretty(store.all())?;
    write_atomic(path, &json)?;
    debug!(path = %path.display(), count = store.len(), "exported quotes");
    Ok(store.len())
}

fn quote_from_value(value: &Value) -> Option<Quote> {
    let text = value.get("text")?.as_str()?;
    let category = value
        .get("category")
        .and_then(Value::as_str)
        .filter(|category| !category.trim().is_empty())
        .unwrap_or(IMPORT_FALLBACK_CATEGORY);
    let author = value.get("author").and_then(Value::as_str);
    Quote::new(text, category, author).ok()
}
