use tinywebdb_core::db::open_db_in_memory;
use tinywebdb_core::{EntryStore, RepoError, SqliteEntryStore};

#[test]
fn upsert_creates_then_overwrites() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    assert!(store.get_by_tag("color").unwrap().is_none());
    store.upsert("color", "\"red\"").unwrap();
    store.upsert("color", "\"blue\"").unwrap();

    let entry = store.get_by_tag("color").unwrap().unwrap();
    assert_eq!(entry.tag, "color");
    assert_eq!(entry.value, "\"blue\"");
    assert!(entry.updated_at > 0);
    assert_eq!(store.scan_all_ordered_by_tag().unwrap().len(), 1);
}

#[test]
fn upsert_refreshes_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    store.upsert("color", "1").unwrap();
    conn.execute(
        "UPDATE stored_entries SET updated_at = 1000 WHERE tag = 'color';",
        [],
    )
    .unwrap();
    store.upsert("color", "2").unwrap();

    let entry = store.get_by_tag("color").unwrap().unwrap();
    assert!(entry.updated_at > 1000);
}

#[test]
fn tags_are_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    store.upsert("Color", "1").unwrap();
    store.upsert("color", "2").unwrap();

    assert_eq!(store.get_by_tag("Color").unwrap().unwrap().value, "1");
    assert_eq!(store.get_by_tag("color").unwrap().unwrap().value, "2");
}

#[test]
fn delete_reports_whether_row_existed() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    store.upsert("gone", "1").unwrap();
    assert!(store.delete_by_tag("gone").unwrap());
    assert!(!store.delete_by_tag("gone").unwrap());
    assert!(store.get_by_tag("gone").unwrap().is_none());
}

#[test]
fn scan_is_ordered_by_tag_bytes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    for tag in ["b", "a", "B", "*all_tags*", "ä"] {
        store.upsert(tag, "0").unwrap();
    }

    let tags: Vec<String> = store
        .scan_all_ordered_by_tag()
        .unwrap()
        .into_iter()
        .map(|entry| entry.tag)
        .collect();
    let mut expected = tags.clone();
    expected.sort();
    assert_eq!(tags, expected);
    assert_eq!(tags, vec!["*all_tags*", "B", "a", "b", "ä"]);
}

#[test]
fn transaction_commits_on_ok() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    store
        .in_transaction(|store| {
            store.upsert("a", "1")?;
            store.upsert("b", "2")
        })
        .unwrap();

    assert!(conn.is_autocommit());
    assert_eq!(store.scan_all_ordered_by_tag().unwrap().len(), 2);
}

#[test]
fn transaction_rolls_back_on_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();
    store.upsert("kept", "1").unwrap();

    let result: Result<(), RepoError> = store.in_transaction(|store| {
        store.upsert("a", "1")?;
        store.delete_by_tag("kept")?;
        Err(RepoError::InvalidData("abort".to_string()))
    });

    assert!(matches!(result, Err(RepoError::InvalidData(_))));
    assert!(conn.is_autocommit());
    assert!(store.get_by_tag("a").unwrap().is_none());
    assert!(store.get_by_tag("kept").unwrap().is_some());
}

#[test]
fn nested_transaction_joins_outer() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntryStore::try_new(&conn).unwrap();

    store
        .in_transaction(|outer| {
            outer.upsert("a", "1")?;
            outer.in_transaction(|inner| inner.upsert("b", "2"))
        })
        .unwrap();

    assert_eq!(store.scan_all_ordered_by_tag().unwrap().len(), 2);
}
