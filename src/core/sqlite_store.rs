//! SQLite-backed [`AttributeStore`] over the EAV category tables.

use crate::core::codec::RawValue;
use crate::core::db;
use crate::core::error::RobotsError;
use crate::core::resolve::{CategoryId, RawAttributeRow, ResolutionTarget, StoreId};
use crate::core::schemas::{self, BackendType};
use crate::core::store::{AttributeIds, AttributeInfo, AttributeStore, assign, dedup_ids};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

pub struct SqliteAttributeStore {
    db_path: PathBuf,
    attributes: AttributeIds,
}

/// `COALESCE` over store text, store int, default text, default int.
/// `?1` is the requested store id.
fn scoped_value_sql(info: &AttributeInfo) -> String {
    let lookup = |table: &str, scope: &str| {
        format!(
            "(SELECT v.value FROM {table} v WHERE v.attribute_id = {id} AND v.store_id = {scope} AND v.entity_id = ce.entity_id)",
            table = table,
            id = info.id,
            scope = scope
        )
    };
    let text = BackendType::Text.value_table();
    let int = BackendType::Int.value_table();
    format!(
        "COALESCE({}, {}, {}, {})",
        lookup(text, "?1"),
        lookup(int, "?1"),
        lookup(text, "0"),
        lookup(int, "0")
    )
}

fn raw_from_sql(value: SqlValue, info: &AttributeInfo) -> RawValue {
    match value {
        SqlValue::Null => RawValue::from(info.default_value.clone()),
        SqlValue::Integer(n) => RawValue::Int(n),
        SqlValue::Real(f) => RawValue::Text(f.to_string()),
        SqlValue::Text(s) => RawValue::Text(s),
        SqlValue::Blob(_) => RawValue::Absent,
    }
}

impl SqliteAttributeStore {
    /// Opens the database and resolves attribute ids once.
    pub fn open(db_path: &Path) -> Result<Self, RobotsError> {
        let conn = db::db_connect(&db_path.to_string_lossy())?;
        let attributes = AttributeIds::load(&conn)?;
        if attributes.is_empty() {
            return Err(RobotsError::NotFound(format!(
                "no robots attributes registered in {} (run `seo-robots init`)",
                db_path.display()
            )));
        }
        Ok(Self {
            db_path: db_path.to_path_buf(),
            attributes,
        })
    }

    pub fn attributes(&self) -> &AttributeIds {
        &self.attributes
    }

    pub fn connect(&self) -> Result<Connection, RobotsError> {
        db::db_connect(&self.db_path.to_string_lossy())
    }

    /// Upserts a raw storage value for one `(attribute, scope, entity)` key.
    ///
    /// The value goes to the table of the attribute's backend type; any
    /// row for the same key in the other table is removed so it cannot
    /// shadow or resurface behind the new value.
    pub fn set_value(
        &self,
        category_id: CategoryId,
        store_id: StoreId,
        code: &str,
        value: &str,
    ) -> Result<(), RobotsError> {
        let info = self.attributes.get(code)?;
        let sql_value = match info.backend {
            BackendType::Int => SqlValue::Integer(value.trim().parse::<i64>().map_err(|_| {
                RobotsError::ConfigError(format!(
                    "attribute '{}' uses integer storage and cannot hold '{}' (run `seo-robots migrate`)",
                    code, value
                ))
            })?),
            BackendType::Text => SqlValue::Text(value.to_string()),
        };

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO category_entity(entity_id) VALUES(?1)",
            params![category_id],
        )?;
        for backend in [BackendType::Int, BackendType::Text] {
            if backend != info.backend {
                tx.execute(
                    &format!(
                        "DELETE FROM {} WHERE attribute_id = ?1 AND store_id = ?2 AND entity_id = ?3",
                        backend.value_table()
                    ),
                    params![info.id, store_id, category_id],
                )?;
            }
        }
        tx.execute(
            &format!(
                "INSERT INTO {}(attribute_id, store_id, entity_id, value) VALUES(?1, ?2, ?3, ?4)
                 ON CONFLICT(attribute_id, store_id, entity_id) DO UPDATE SET value = excluded.value",
                info.backend.value_table()
            ),
            params![info.id, store_id, category_id, sql_value],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Removes the stored value so the scope falls back again.
    pub fn clear_value(
        &self,
        category_id: CategoryId,
        store_id: StoreId,
        code: &str,
    ) -> Result<(), RobotsError> {
        let info = self.attributes.get(code)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        for backend in [BackendType::Int, BackendType::Text] {
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE attribute_id = ?1 AND store_id = ?2 AND entity_id = ?3",
                    backend.value_table()
                ),
                params![info.id, store_id, category_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn fetch(
        &self,
        category_ids: &[CategoryId],
        store_id: StoreId,
        apply_code: Option<&str>,
    ) -> Result<Vec<RawAttributeRow>, RobotsError> {
        let ids = dedup_ids(category_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let columns: Vec<(&'static str, &AttributeInfo)> = schemas::ATTRIBUTES
            .iter()
            .filter_map(|def| self.attributes.get(def.code).ok().map(|info| (def.code, info)))
            .collect();

        let mut sql = String::from("SELECT ce.entity_id");
        for (_, info) in &columns {
            sql.push_str(", ");
            sql.push_str(&scoped_value_sql(info));
        }
        let placeholders: Vec<String> = (0..ids.len()).map(|i| format!("?{}", i + 2)).collect();
        sql.push_str(&format!(
            " FROM category_entity ce WHERE ce.entity_id IN ({})",
            placeholders.join(", ")
        ));
        if let Some(code) = apply_code {
            let info = self.attributes.get(code)?;
            sql.push_str(&format!(
                " AND CAST(COALESCE({}, 0) AS INTEGER) <> 0",
                scoped_value_sql(info)
            ));
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let bind = std::iter::once(store_id).chain(ids.iter().copied());
        let rows = stmt.query_map(params_from_iter(bind), |row| {
            let mut out = RawAttributeRow::new(row.get(0)?);
            for (i, (code, info)) in columns.iter().enumerate() {
                let value: SqlValue = row.get(i + 1)?;
                assign(&mut out, code, raw_from_sql(value, info));
            }
            Ok(out)
        })?;

        let mut by_id: FxHashMap<CategoryId, RawAttributeRow> = FxHashMap::default();
        for r in rows {
            let row = r?;
            by_id.insert(row.category_id, row);
        }
        Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
    }
}

impl AttributeStore for SqliteAttributeStore {
    fn category_rows(
        &self,
        category_ids: &[CategoryId],
        store_id: StoreId,
    ) -> Result<Vec<RawAttributeRow>, RobotsError> {
        self.fetch(category_ids, store_id, None)
    }

    fn product_rows(
        &self,
        category_ids: &[CategoryId],
        store_id: StoreId,
        target: ResolutionTarget,
    ) -> Result<Vec<RawAttributeRow>, RobotsError> {
        let apply_code = match target {
            ResolutionTarget::ProductMeta => schemas::APPLY_ROBOTS_TO_PRODUCTS,
            ResolutionTarget::ProductHeader => schemas::APPLY_X_ROBOTS_TO_PRODUCTS,
            _ => return Ok(Vec::new()),
        };
        self.fetch(category_ids, store_id, Some(apply_code))
    }
}
