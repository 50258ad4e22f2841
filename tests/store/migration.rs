use rusqlite::{Connection, params};
use seo_robots::core::codec::{self, RawValue};
use seo_robots::core::db;
use seo_robots::core::migration;
use seo_robots::core::resolve::{ResolutionTarget, resolve};
use seo_robots::core::schemas::{self, BackendType};
use seo_robots::core::store::AttributeIds;
use seo_robots::{AttributeStore, DirectiveSet, SqliteAttributeStore};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

fn legacy_catalog() -> (TempDir, PathBuf) {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("catalog.db");
    db::initialize_db(&db_path).expect("init db");

    let store = SqliteAttributeStore::open(&db_path).expect("open store");
    store.set_value(1, 0, schemas::ROBOTS_META_TAG, "2").expect("set");
    store.set_value(1, 2, schemas::ROBOTS_META_TAG, "7").expect("set");
    store.set_value(1, 0, schemas::PRODUCT_ROBOTS_META_TAG, "-1").expect("set");
    store.set_value(1, 0, schemas::APPLY_ROBOTS_TO_PRODUCTS, "1").expect("set");
    store.set_value(2, 0, schemas::ROBOTS_META_TAG, "0").expect("set");
    store.set_value(2, 0, schemas::PRODUCT_ROBOTS_META_TAG, "5").expect("set");
    store.set_value(3, 0, schemas::ROBOTS_META_TAG, "42").expect("set");
    (tmp, db_path)
}

fn connect(db_path: &Path) -> Connection {
    db::db_connect(&db_path.to_string_lossy()).expect("connect")
}

fn stored_text(conn: &Connection, code: &str, store_id: i64, entity_id: i64) -> Option<String> {
    let attribute_id = AttributeIds::load(conn)
        .expect("attributes")
        .id(code)
        .expect("attribute id");
    conn.query_row(
        "SELECT value FROM category_entity_text WHERE attribute_id = ?1 AND store_id = ?2 AND entity_id = ?3",
        params![attribute_id, store_id, entity_id],
        |row| row.get(0),
    )
    .ok()
}

fn int_values(conn: &Connection, code: &str) -> Vec<i64> {
    let attribute_id = AttributeIds::load(conn)
        .expect("attributes")
        .id(code)
        .expect("attribute id");
    let mut stmt = conn
        .prepare(
            "SELECT value FROM category_entity_int WHERE attribute_id = ?1 ORDER BY entity_id, store_id",
        )
        .expect("prepare");
    stmt.query_map(params![attribute_id], |row| row.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("collect")
}

#[test]
fn legacy_codes_move_to_structured_text() {
    let (_tmp, db_path) = legacy_catalog();
    let mut conn = connect(&db_path);

    let applied = migration::run_migrations(&mut conn).expect("migrate");
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].id, "2026_01_directive_storage");
    // 2, 7, 42 for meta; 5 for product meta.
    assert_eq!(applied[0].rows, 4);

    let attributes = AttributeIds::load(&conn).expect("attributes");
    for code in [schemas::ROBOTS_META_TAG, schemas::PRODUCT_ROBOTS_META_TAG] {
        assert_eq!(attributes.get(code).expect("info").backend, BackendType::Text);
    }

    let meta = stored_text(&conn, schemas::ROBOTS_META_TAG, 0, 1).expect("migrated row");
    assert_eq!(
        codec::decode(&RawValue::text(meta.clone())),
        DirectiveSet::from_keywords(&["noindex", "follow"])
    );
    assert_eq!(codec::encode(&codec::decode_code(2)), Some(meta));
    assert_eq!(
        codec::decode(&RawValue::text(
            stored_text(&conn, schemas::PRODUCT_ROBOTS_META_TAG, 0, 2).expect("migrated row")
        )),
        DirectiveSet::from_keywords(&["noindex", "nofollow", "noarchive"])
    );

    // Unknown codes become an empty list rather than disappearing.
    assert_eq!(
        stored_text(&conn, schemas::ROBOTS_META_TAG, 0, 3).as_deref(),
        Some("[]")
    );
}

#[test]
fn unknown_store_code_keeps_masking_default_scope() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("catalog.db");
    db::initialize_db(&db_path).expect("init db");
    let store = SqliteAttributeStore::open(&db_path).expect("open store");
    store.set_value(8, 0, schemas::ROBOTS_META_TAG, "1").expect("default scope");
    store.set_value(8, 2, schemas::ROBOTS_META_TAG, "42").expect("store 2");

    let before = store.category_rows(&[8], 2).expect("rows").remove(0);
    assert!(resolve(ResolutionTarget::CategoryMeta, &before).is_empty());

    let mut conn = connect(&db_path);
    migration::run_migrations(&mut conn).expect("migrate");

    let store = SqliteAttributeStore::open(&db_path).expect("reopen store");
    let after = store.category_rows(&[8], 2).expect("rows").remove(0);
    assert_eq!(after.robots, RawValue::text("[]"));
    assert!(resolve(ResolutionTarget::CategoryMeta, &after).is_empty());

    let default_scope = store.category_rows(&[8], 0).expect("rows").remove(0);
    assert_eq!(
        resolve(ResolutionTarget::CategoryMeta, &default_scope),
        DirectiveSet::from_keywords(&["noindex", "nofollow"])
    );
}

#[test]
fn sentinel_rows_survive_migration() {
    let (_tmp, db_path) = legacy_catalog();
    let mut conn = connect(&db_path);
    migration::run_migrations(&mut conn).expect("migrate");

    assert_eq!(int_values(&conn, schemas::ROBOTS_META_TAG), vec![0]);
    assert_eq!(int_values(&conn, schemas::PRODUCT_ROBOTS_META_TAG), vec![-1]);
    assert_eq!(int_values(&conn, schemas::APPLY_ROBOTS_TO_PRODUCTS), vec![1]);

    let store = SqliteAttributeStore::open(&db_path).expect("open store");
    let row = store.category_rows(&[1], 0).expect("rows").remove(0);
    assert_eq!(row.product_robots, RawValue::Int(-1));
    assert_eq!(
        resolve(ResolutionTarget::ProductMeta, &row),
        DirectiveSet::from_keywords(&["noindex", "follow"])
    );

    let row = store.category_rows(&[1], 2).expect("rows").remove(0);
    assert_eq!(
        resolve(ResolutionTarget::ProductMeta, &row),
        DirectiveSet::from_keywords(&["index", "nofollow", "noarchive"])
    );
}

#[test]
fn migrations_run_once_and_are_recorded() {
    let (_tmp, db_path) = legacy_catalog();
    let mut conn = connect(&db_path);

    assert!(!migration::is_applied(&conn, "2026_01_directive_storage").expect("check"));
    migration::run_migrations(&mut conn).expect("first run");
    assert!(migration::is_applied(&conn, "2026_01_directive_storage").expect("check"));
    assert!(migration::run_migrations(&mut conn).expect("second run").is_empty());

    let recorded: i64 = conn
        .query_row("SELECT COUNT(*) FROM seo_robots_migrations", [], |row| row.get(0))
        .expect("count");
    assert_eq!(recorded, 1);
}

#[test]
fn migration_body_is_idempotent() {
    let (_tmp, db_path) = legacy_catalog();
    let conn = connect(&db_path);

    assert_eq!(migration::migrate_directive_storage(&conn).expect("first"), 4);
    let before = stored_text(&conn, schemas::ROBOTS_META_TAG, 2, 1);
    assert_eq!(migration::migrate_directive_storage(&conn).expect("second"), 0);
    assert_eq!(stored_text(&conn, schemas::ROBOTS_META_TAG, 2, 1), before);
}

#[test]
fn structured_values_are_writable_after_migration() {
    let (_tmp, db_path) = legacy_catalog();
    let mut conn = connect(&db_path);
    migration::run_migrations(&mut conn).expect("migrate");

    let store = SqliteAttributeStore::open(&db_path).expect("open store");
    store
        .set_value(
            4,
            0,
            schemas::ROBOTS_META_TAG,
            r#"[{"value":"max-snippet","bot":"","modification":"20"}]"#,
        )
        .expect("structured write");
    store.set_value(4, 0, schemas::PRODUCT_ROBOTS_META_TAG, "-1").expect("sentinel write");

    let row = store.category_rows(&[4], 0).expect("rows").remove(0);
    assert_eq!(seo_robots::format(&resolve(ResolutionTarget::CategoryMeta, &row)), "max-snippet:20");
    assert_eq!(row.product_robots, RawValue::text("-1"));
}
