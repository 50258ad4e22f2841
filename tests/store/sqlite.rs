use rusqlite::params;
use seo_robots::core::adapter;
use seo_robots::core::codec::RawValue;
use seo_robots::core::config::RobotsConfig;
use seo_robots::core::db;
use seo_robots::core::error::RobotsError;
use seo_robots::core::resolve::{ResolutionTarget, resolve};
use seo_robots::core::schemas;
use seo_robots::{AttributeStore, DirectiveSet, KnownBots, RobotsService, SqliteAttributeStore};
use tempfile::{TempDir, tempdir};

fn fresh_store() -> (TempDir, SqliteAttributeStore) {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("catalog.db");
    db::initialize_db(&db_path).expect("init db");
    let store = SqliteAttributeStore::open(&db_path).expect("open store");
    (tmp, store)
}

#[test]
fn init_registers_every_attribute_once() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("nested").join("catalog.db");
    db::initialize_db(&db_path).expect("first init");
    db::initialize_db(&db_path).expect("re-init is harmless");

    let store = SqliteAttributeStore::open(&db_path).expect("open store");
    assert_eq!(store.attributes().len(), schemas::ATTRIBUTES.len());

    let conn = store.connect().expect("connect");
    let fk_on: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .expect("pragma foreign_keys");
    assert_eq!(fk_on, 1);
}

#[test]
fn open_without_attributes_is_not_found() {
    let tmp = tempdir().expect("tempdir");
    let db_path = tmp.path().join("empty.db");
    let conn = db::db_connect(&db_path.to_string_lossy()).expect("connect");
    conn.execute(schemas::EAV_ATTRIBUTE_SCHEMA, []).expect("attribute table");
    drop(conn);

    match SqliteAttributeStore::open(&db_path) {
        Err(RobotsError::NotFound(msg)) => assert!(msg.contains("seo-robots init")),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("store opened without attributes"),
    }
}

#[test]
fn store_scope_overrides_default_scope() {
    let (_tmp, store) = fresh_store();
    store.set_value(10, 0, schemas::ROBOTS_META_TAG, "2").expect("default scope");
    store.set_value(10, 1, schemas::ROBOTS_META_TAG, "4").expect("store 1");

    let in_store_1 = store.category_rows(&[10], 1).expect("rows");
    assert_eq!(in_store_1[0].robots, RawValue::Int(4));

    let in_store_2 = store.category_rows(&[10], 2).expect("rows");
    assert_eq!(in_store_2[0].robots, RawValue::Int(2));
    assert_eq!(
        resolve(ResolutionTarget::CategoryMeta, &in_store_2[0]),
        DirectiveSet::from_keywords(&["noindex", "follow"])
    );
}

#[test]
fn unset_attributes_take_registered_defaults() {
    let (_tmp, store) = fresh_store();
    store
        .set_value(11, 0, schemas::X_ROBOTS_HEADER, r#"["noarchive"]"#)
        .expect("header");

    let row = store.category_rows(&[11], 0).expect("rows").remove(0);
    assert_eq!(row.robots, RawValue::text("0"));
    assert_eq!(row.product_x_robots, RawValue::Absent);
    assert!(!row.applies_robots_to_products());
    assert!(row.uses_meta_for_x_robots());
    assert!(row.uses_category_robots_for_products());

    // Meta is unset, so the header still mirrors it rather than using its own value.
    assert!(resolve(ResolutionTarget::CategoryHeader, &row).is_empty());
}

#[test]
fn clearing_a_store_value_falls_back_to_default_scope() {
    let (_tmp, store) = fresh_store();
    store.set_value(12, 0, schemas::ROBOTS_META_TAG, "1").expect("default scope");
    store.set_value(12, 3, schemas::ROBOTS_META_TAG, "8").expect("store 3");
    store
        .clear_value(12, 3, schemas::ROBOTS_META_TAG)
        .expect("clear store 3");

    let row = store.category_rows(&[12], 3).expect("rows").remove(0);
    assert_eq!(row.robots, RawValue::Int(1));
}

#[test]
fn integer_storage_rejects_structured_values() {
    let (_tmp, store) = fresh_store();
    match store.set_value(13, 0, schemas::ROBOTS_META_TAG, r#"["noindex"]"#) {
        Err(RobotsError::ConfigError(msg)) => assert!(msg.contains("migrate")),
        other => panic!("unexpected result: {:?}", other.err()),
    }
    match store.set_value(13, 0, "robots_unknown", "1") {
        Err(RobotsError::NotFound(_)) => {}
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn text_value_shadows_int_value_in_the_same_scope() {
    let (_tmp, store) = fresh_store();
    store.set_value(14, 0, schemas::ROBOTS_META_TAG, "2").expect("int row");
    let conn = store.connect().expect("connect");
    let attribute_id = store
        .attributes()
        .id(schemas::ROBOTS_META_TAG)
        .expect("attribute id");
    conn.execute(
        "INSERT INTO category_entity_text(attribute_id, store_id, entity_id, value) VALUES(?1, 0, 14, ?2)",
        params![attribute_id, r#"["index","follow"]"#],
    )
    .expect("text row");

    let row = store.category_rows(&[14], 0).expect("rows").remove(0);
    assert_eq!(row.robots, RawValue::text(r#"["index","follow"]"#));
}

#[test]
fn rows_follow_caller_order_without_duplicates() {
    let (_tmp, store) = fresh_store();
    for id in [21, 22, 23] {
        store.set_value(id, 0, schemas::ROBOTS_META_TAG, "4").expect("set");
    }

    let ids: Vec<i64> = store
        .category_rows(&[23, 21, 99, 23, 22], 0)
        .expect("rows")
        .into_iter()
        .map(|row| row.category_id)
        .collect();
    assert_eq!(ids, vec![23, 21, 22]);
    assert!(store.category_rows(&[], 0).expect("rows").is_empty());
}

#[test]
fn product_rows_only_include_applying_categories() {
    let (_tmp, store) = fresh_store();
    store.set_value(31, 0, schemas::PRODUCT_ROBOTS_META_TAG, "2").expect("set");
    store.set_value(31, 0, schemas::APPLY_ROBOTS_TO_PRODUCTS, "1").expect("set");
    store.set_value(32, 0, schemas::PRODUCT_ROBOTS_META_TAG, "1").expect("set");
    store.set_value(33, 0, schemas::PRODUCT_ROBOTS_META_TAG, "4").expect("set");
    store.set_value(33, 0, schemas::APPLY_ROBOTS_TO_PRODUCTS, "1").expect("set");
    store.set_value(33, 5, schemas::APPLY_ROBOTS_TO_PRODUCTS, "0").expect("set");

    let ids = |store_id| -> Vec<i64> {
        store
            .product_rows(&[33, 32, 31], store_id, ResolutionTarget::ProductMeta)
            .expect("rows")
            .into_iter()
            .map(|row| row.category_id)
            .collect()
    };
    assert_eq!(ids(0), vec![33, 31]);
    assert_eq!(ids(5), vec![31]);

    let header_rows = store
        .product_rows(&[31, 32, 33], 0, ResolutionTarget::ProductHeader)
        .expect("rows");
    assert!(header_rows.is_empty());
    let category_rows = store
        .product_rows(&[31], 0, ResolutionTarget::CategoryMeta)
        .expect("rows");
    assert!(category_rows.is_empty());
}

#[test]
fn service_resolves_products_over_sqlite() {
    let (_tmp, store) = fresh_store();
    store.set_value(41, 0, schemas::ROBOTS_META_TAG, "4").expect("set");
    store.set_value(41, 0, schemas::PRODUCT_ROBOTS_META_TAG, "-1").expect("set");
    store.set_value(41, 0, schemas::APPLY_ROBOTS_TO_PRODUCTS, "1").expect("set");
    store.set_value(42, 0, schemas::PRODUCT_ROBOTS_META_TAG, "6").expect("set");
    store.set_value(42, 0, schemas::APPLY_ROBOTS_TO_PRODUCTS, "1").expect("set");
    store
        .set_value(42, 0, schemas::PRODUCT_X_ROBOTS_HEADER, r#"["noindex"]"#)
        .expect("set");
    store.set_value(42, 0, schemas::APPLY_X_ROBOTS_TO_PRODUCTS, "1").expect("set");
    store
        .set_value(42, 0, schemas::USE_CATEGORY_X_ROBOTS_FOR_PRODUCTS, "0")
        .expect("set");

    let service = RobotsService::new(store, RobotsConfig::default());
    assert_eq!(service.category_meta(41, 0).as_deref(), Some("index, follow"));
    assert_eq!(service.product_meta(&[41], 0).as_deref(), Some("index, follow"));
    assert_eq!(
        service.product_meta(&[41, 42], 0).as_deref(),
        Some("noindex, follow, noarchive")
    );
    assert_eq!(service.product_header(&[41, 42], 0).as_deref(), Some("noindex"));

    let batch = service.products(
        ResolutionTarget::ProductMeta,
        &[(1, vec![41]), (2, vec![42, 41]), (3, vec![99])],
        0,
    );
    assert_eq!(batch[&1].as_deref(), Some("index, follow"));
    assert_eq!(batch[&2].as_deref(), Some("noindex, follow, noarchive"));
    assert_eq!(batch[&3], None);
}

#[test]
fn use_default_at_store_scope_masks_default_scope_directives() {
    let (_tmp, store) = fresh_store();
    let bots = KnownBots::default();
    store.set_value(15, 0, schemas::ROBOTS_META_TAG, "1").expect("default meta");
    store.set_value(15, 0, schemas::USE_META_FOR_X_ROBOTS, "0").expect("flag");
    store
        .set_value(15, 0, schemas::X_ROBOTS_HEADER, r#"["noindex","nofollow"]"#)
        .expect("default header");

    for code in [schemas::ROBOTS_META_TAG, schemas::X_ROBOTS_HEADER] {
        let stored = adapter::on_write(&RawValue::text("0"), code, &bots)
            .expect("valid write")
            .expect("use-default is stored");
        store.set_value(15, 2, code, &stored).expect("store 2");
    }

    let store_2 = store.category_rows(&[15], 2).expect("rows").remove(0);
    assert_eq!(store_2.robots, RawValue::Int(0));
    assert!(resolve(ResolutionTarget::CategoryMeta, &store_2).is_empty());
    assert!(resolve(ResolutionTarget::CategoryHeader, &store_2).is_empty());

    let default_scope = store.category_rows(&[15], 0).expect("rows").remove(0);
    assert_eq!(
        resolve(ResolutionTarget::CategoryHeader, &default_scope),
        DirectiveSet::from_keywords(&["noindex", "nofollow"])
    );
}
