mod common;

use std::sync::Arc;

use quotebook::{
    core::{reconcile, transfer, QuoteStore, UpsertOutcome},
    domain::Quote,
    errors::QuoteError,
    storage::{KeyValueStore, MemoryStore, QUOTES_KEY},
};

fn quote(text: &str, category: &str) -> Quote {
    Quote::new(text, category, None).unwrap()
}

fn store_with(raw: &str) -> (QuoteStore, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::with_value(QUOTES_KEY, raw));
    (QuoteStore::open(Box::new(backend.clone())), backend)
}

#[test]
fn reconcile_properties_hold_for_overlapping_sets() {
    let local = vec![quote("a", "X"), quote("b", "Y"), quote("c", "Z")];
    let remote = vec![quote("c", "Server"), quote("d", "Server"), quote("a", "Server")];

    let outcome = reconcile(&local, &remote);
    for remote_quote in &remote {
        let merged = outcome
            .merged
            .iter()
            .find(|q| q.text == remote_quote.text)
            .expect("remote key present");
        assert_eq!(merged, remote_quote);
    }
    let texts: Vec<_> = outcome.merged.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "b", "c", "d"]);

    let again = reconcile(&outcome.merged, &remote);
    assert_eq!(again.merged, outcome.merged);
    assert_eq!(reconcile(&local, &[]).merged, local);
}

#[test]
fn upsert_grows_only_for_new_keys() {
    let (mut store, backend) = store_with(&common::quotes_json(&[("a", "X")]));
    assert_eq!(store.upsert(quote("a", "Y")).unwrap(), UpsertOutcome::Replaced);
    assert_eq!(store.len(), 1);
    assert_eq!(store.upsert(quote("b", "Y")).unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.len(), 2);

    let persisted: Vec<Quote> =
        serde_json::from_str(&backend.read(QUOTES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted, store.all());
}

#[test]
fn failed_persistence_rolls_back_mutations() {
    let (mut store, backend) = store_with(&common::quotes_json(&[("a", "X")]));
    let before = store.all().to_vec();
    backend.set_fail_writes(true);

    assert!(matches!(
        store.upsert(quote("b", "Y")),
        Err(QuoteError::Persistence(_))
    ));
    assert!(store.replace_all(vec![quote("z", "Z")]).is_err());
    assert_eq!(store.all(), before.as_slice());
}

#[test]
fn import_keeps_existing_keys_and_export_round_trips() {
    let (mut store, _backend) = store_with(&common::quotes_json(&[("a", "Local")]));
    let payload = r#"[
        {"text": "a", "category": "Imported"},
        {"text": "b"},
        {"category": "missing text"}
    ]"#;

    let report = transfer::import_json(&mut store, payload.as_bytes()).unwrap();
    assert_eq!((report.imported, report.skipped_existing, report.rejected), (1, 1, 1));
    assert_eq!(store.get("a").unwrap().category, "Local");
    assert_eq!(store.get("b").unwrap().category, "Uncategorized");

    let mut exported = Vec::new();
    transfer::export_json(&store, &mut exported).unwrap();
    let (mut copy, _backend) = store_with("[]");
    transfer::import_json(&mut copy, exported.as_slice()).unwrap();
    assert_eq!(copy.all(), store.all());
}
