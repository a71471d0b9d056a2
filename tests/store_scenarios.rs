//! End-to-end behavior of the store against real SQLite databases.

use sqlfilestore::core::consts::{NULL_DATETIME, ROOT_ID, ROOT_PATH};
use sqlfilestore::core::path;
use sqlfilestore::{
    Column, Context, FileStoreError, Record, RecordQueryOptions, RecordType, Store, StoreConfig,
};

fn open_store() -> Store {
    Store::open(&StoreConfig::in_memory()).unwrap()
}

fn root(store: &Store, ctx: &Context) -> Record {
    store
        .find_by_id(ctx, ROOT_ID, RecordQueryOptions::default())
        .unwrap()
        .unwrap()
}

fn mkdir(store: &Store, ctx: &Context, parent: &Record, name: &str) -> Record {
    let mut dir = Record::new_directory();
    dir.set_parent_id(parent.id())
        .set_name(name)
        .set_path(&path::child_path(parent.path(), name));
    store.create(ctx, &mut dir).unwrap();
    dir
}

fn touch(store: &Store, ctx: &Context, parent: &Record, name: &str, contents: &str) -> Record {
    let mut file = Record::new_file();
    file.set_parent_id(parent.id())
        .set_name(name)
        .set_path(&path::child_path(parent.path(), name))
        .set_contents(contents)
        .set_size(contents.len() as u64)
        .set_extension("txt");
    store.create(ctx, &mut file).unwrap();
    file
}

fn reload(store: &Store, ctx: &Context, id: &str) -> Record {
    store
        .find_by_id(
            ctx,
            id,
            RecordQueryOptions {
                with_soft_deleted: true,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap()
}

fn paths(records: &[Record]) -> Vec<String> {
    let mut paths: Vec<String> = records.iter().map(|r| r.path().to_string()).collect();
    paths.sort();
    paths
}

#[test]
fn create_then_find_round_trips() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let dir = mkdir(&store, &ctx, &root, "A");
    let file = touch(&store, &ctx, &dir, "f.txt", "hello");

    let found = store
        .find_by_id(&ctx, file.id(), RecordQueryOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(found, file);
    assert_eq!(found.size(), 5);
    assert_eq!(found.record_type(), Some(RecordType::File));
    assert_eq!(found.deleted_at(), NULL_DATETIME);

    let by_path = store
        .find_by_path(&ctx, "A/f.txt", RecordQueryOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(by_path.id(), file.id());
}

#[test]
fn update_writes_only_dirty_columns() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let mut file = touch(&store, &ctx, &root, "notes.txt", "v1");

    // Change a column behind the record's back; a partial update must not clobber it.
    store
        .connection()
        .execute(
            &format!(
                "UPDATE \"{}\" SET \"contents\" = 'external' WHERE \"id\" = ?1",
                store.table_name()
            ),
            [file.id()],
        )
        .unwrap();

    file.set_name("renamed.txt");
    assert!(file.is_column_dirty(Column::Name));
    store.update(&ctx, &mut file).unwrap();
    assert!(!file.is_dirty());

    let stored = reload(&store, &ctx, file.id());
    assert_eq!(stored.name(), "renamed.txt");
    assert_eq!(stored.contents(), "external");
}

#[test]
fn hydrated_record_update_is_noop() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let file = touch(&store, &ctx, &root, "a.txt", "x");

    let mut hydrated = reload(&store, &ctx, file.id());
    assert!(!hydrated.is_dirty());
    let before = hydrated.updated_at().to_string();

    store.update(&ctx, &mut hydrated).unwrap();
    assert_eq!(reload(&store, &ctx, file.id()).updated_at(), before);
}

#[test]
fn rename_directory_recalculates_descendants() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let mut dir_a = mkdir(&store, &ctx, &root, "A");
    let file = touch(&store, &ctx, &dir_a, "f.txt", "data");
    let sibling = mkdir(&store, &ctx, &root, "C");
    let sibling_file = touch(&store, &ctx, &sibling, "g.txt", "data");

    dir_a.set_name("B");
    store.recalculate_path(&ctx, &mut dir_a, None).unwrap();

    assert_eq!(dir_a.path(), "/B");
    assert_eq!(reload(&store, &ctx, dir_a.id()).path(), "/B");
    assert_eq!(reload(&store, &ctx, file.id()).path(), "/B/f.txt");
    assert_eq!(reload(&store, &ctx, sibling.id()).path(), "/C");
    assert_eq!(reload(&store, &ctx, sibling_file.id()).path(), "/C/g.txt");
    assert_eq!(reload(&store, &ctx, ROOT_ID).path(), ROOT_PATH);
}

#[test]
fn recalculation_with_unchanged_name_still_succeeds() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let mut dir = mkdir(&store, &ctx, &root, "same");
    let file = touch(&store, &ctx, &dir, "f.txt", "");

    store.recalculate_path(&ctx, &mut dir, Some(&root)).unwrap();

    assert_eq!(reload(&store, &ctx, dir.id()).path(), "/same");
    assert_eq!(reload(&store, &ctx, file.id()).path(), "/same/f.txt");
}

#[test]
fn delete_guard_counts_soft_deleted_children() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let dir = mkdir(&store, &ctx, &root, "A");
    let mut child = touch(&store, &ctx, &dir, "f.txt", "data");

    assert!(matches!(
        store.delete(&ctx, &dir),
        Err(FileStoreError::DirectoryNotEmpty(_))
    ));

    store.soft_delete(&ctx, &mut child).unwrap();
    assert!(reload(&store, &ctx, child.id()).is_soft_deleted());
    assert!(matches!(
        store.delete_by_id(&ctx, dir.id()),
        Err(FileStoreError::DirectoryNotEmpty(_))
    ));

    store.delete(&ctx, &child).unwrap();
    store.delete(&ctx, &dir).unwrap();

    let everything = RecordQueryOptions {
        with_soft_deleted: true,
        ..Default::default()
    };
    assert!(store.find_by_id(&ctx, dir.id(), everything.clone()).unwrap().is_none());
    assert!(store.find_by_id(&ctx, child.id(), everything).unwrap().is_none());
}

#[test]
fn soft_deleted_records_are_hidden_by_default() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let keep = touch(&store, &ctx, &root, "keep.txt", "");
    let gone = touch(&store, &ctx, &root, "gone.txt", "");

    store.soft_delete_by_id(&ctx, gone.id()).unwrap();

    let visible = store.list(&ctx, &RecordQueryOptions::default()).unwrap();
    assert_eq!(paths(&visible), vec!["/", "/keep.txt"]);
    assert_eq!(store.count(&ctx, RecordQueryOptions::default()).unwrap(), 2);
    assert!(store
        .find_by_id(&ctx, gone.id(), RecordQueryOptions::default())
        .unwrap()
        .is_none());

    let all = RecordQueryOptions {
        with_soft_deleted: true,
        ..Default::default()
    };
    assert_eq!(
        paths(&store.list(&ctx, &all).unwrap()),
        vec!["/", "/gone.txt", "/keep.txt"]
    );
    assert_eq!(store.count(&ctx, all).unwrap(), 3);
    assert!(keep.deleted_at() == NULL_DATETIME);
}

#[test]
fn path_prefix_query() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let dir_a = mkdir(&store, &ctx, &root, "A");
    touch(&store, &ctx, &dir_a, "f.txt", "");
    mkdir(&store, &ctx, &root, "B");
    touch(&store, &ctx, &root, "top.txt", "");

    let options = RecordQueryOptions {
        path_starts_with: Some("/A".to_string()),
        ..Default::default()
    };
    assert_eq!(
        paths(&store.list(&ctx, &options).unwrap()),
        vec!["/A", "/A/f.txt"]
    );
}

#[test]
fn list_filters_sorts_and_pages() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    for name in ["c.txt", "a.txt", "b.txt"] {
        touch(&store, &ctx, &root, name, "");
    }
    mkdir(&store, &ctx, &root, "dir");

    let files = RecordQueryOptions {
        parent_id: Some(ROOT_ID.to_string()),
        record_type: Some(RecordType::File),
        order_by: Some(Column::Name),
        sort_order: Some("ASC".to_string()),
        ..Default::default()
    };
    let names: Vec<String> = store
        .list(&ctx, &files)
        .unwrap()
        .iter()
        .map(|r| r.name().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

    let page = RecordQueryOptions {
        limit: Some(1),
        offset: Some(1),
        ..files.clone()
    };
    let paged = store.list(&ctx, &page).unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].name(), "b.txt");

    let descending = RecordQueryOptions {
        sort_order: None,
        ..files.clone()
    };
    assert_eq!(store.list(&ctx, &descending).unwrap()[0].name(), "c.txt");

    // Pagination never reaches a count.
    assert_eq!(store.count(&ctx, page).unwrap(), 3);
}

#[test]
fn projection_returns_partial_records() {
    let store = open_store();
    let ctx = Context::background();
    let root = root(&store, &ctx);
    let file = touch(&store, &ctx, &root, "a.txt", "payload");

    let options = RecordQueryOptions {
        id_in: vec![file.id().to_string(), "missing".to_string()],
        columns: vec![Column::Id, Column::Path],
        ..Default::default()
    };
    let records = store.list(&ctx, &options).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path(), "/a.txt");
    assert_eq!(records[0].contents(), "");
    assert_eq!(records[0].record_type(), None);
}

#[test]
fn expired_deadline_stops_operations() {
    let store = open_store();
    let ctx = Context::background().with_deadline(std::time::Instant::now());
    assert!(matches!(
        store.count(&ctx, RecordQueryOptions::default()),
        Err(FileStoreError::DeadlineExceeded)
    ));
}

#[test]
fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        db_path: dir.path().join("fs.db"),
        table_name: "nodes".to_string(),
        ..StoreConfig::default()
    };
    let ctx = Context::background();

    let file_id = {
        let store = Store::open(&config).unwrap();
        let root = root(&store, &ctx);
        touch(&store, &ctx, &root, "persisted.txt", "abc").id().to_string()
    };

    let store = Store::open(&config).unwrap();
    assert_eq!(store.table_name(), "nodes");
    let file = reload(&store, &ctx, &file_id);
    assert_eq!(file.path(), "/persisted.txt");
    assert_eq!(file.contents(), "abc");
    // Reopening does not create a second root.
    assert_eq!(
        store
            .count(
                &ctx,
                RecordQueryOptions {
                    path: Some(ROOT_PATH.to_string()),
                    ..Default::default()
                }
            )
            .unwrap(),
        1
    );
}
