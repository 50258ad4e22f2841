//! Data migrations for robots attribute storage.
//!
//! Migrations are registered in [`all_migrations`] in chronological order
//! and recorded in `seo_robots_migrations` once applied, so the runner
//! only executes each one once. Every migration body is also idempotent
//! on its own: running it against already migrated data changes nothing.

use crate::core::codec::{self, USE_CATEGORY_ROBOTS, USE_DEFAULT};
use crate::core::error::RobotsError;
use crate::core::schemas::{self, BackendType};
use crate::core::store::AttributeIds;
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info};

/// Stored for codes outside the legacy table; reads back as "not set".
const EMPTY_DIRECTIVES: &str = "[]";

/// Migration definition
pub struct Migration {
    /// Stable identifier recorded once applied
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Returns the number of rows rewritten
    pub up: fn(&Connection) -> Result<usize, RobotsError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub id: String,
    pub description: String,
    pub rows: usize,
}

/// All migrations in chronological order
pub fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "2026_01_directive_storage",
        description: "Store category robots directives as JSON text instead of integer codes",
        up: migrate_directive_storage,
    }]
}

pub fn is_applied(conn: &Connection, id: &str) -> Result<bool, RobotsError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT id FROM seo_robots_migrations WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Applies every pending migration, each in its own transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<Vec<AppliedMigration>, RobotsError> {
    conn.execute(schemas::MIGRATIONS_SCHEMA, [])?;

    let mut applied = Vec::new();
    for migration in all_migrations() {
        if is_applied(conn, migration.id)? {
            debug!(id = migration.id, "migration already applied");
            continue;
        }

        let tx = conn.transaction()?;
        let rows = (migration.up)(&tx).map_err(|e| {
            RobotsError::MigrationError(format!("{} failed: {}", migration.id, e))
        })?;
        tx.execute(
            "INSERT INTO seo_robots_migrations(id, description, applied_at) VALUES(?1, ?2, ?3)",
            params![migration.id, migration.description, time::now_epoch_z()],
        )?;
        tx.commit()?;

        info!(id = migration.id, rows, "migration applied");
        applied.push(AppliedMigration {
            id: migration.id.to_string(),
            description: migration.description.to_string(),
            rows,
        });
    }
    Ok(applied)
}

/// Moves the legacy directive attributes to text storage.
///
/// Every integer code other than the two sentinels is rewritten into the
/// canonical JSON value in `category_entity_text` (upsert on
/// `(attribute, scope, entity)`) and its integer row deleted. Sentinel
/// rows stay where they are. Codes outside the legacy table decode to
/// nothing and are written as an empty list, so a store-scope row keeps
/// masking the default scope.
pub fn migrate_directive_storage(conn: &Connection) -> Result<usize, RobotsError> {
    let attributes = AttributeIds::load(conn)?;
    let mut rewritten = 0;

    for code in [schemas::ROBOTS_META_TAG, schemas::PRODUCT_ROBOTS_META_TAG] {
        let Ok(attribute_id) = attributes.id(code) else {
            debug!(code, "attribute not installed, nothing to migrate");
            continue;
        };

        conn.execute(
            "UPDATE eav_attribute SET backend_type = ?1 WHERE attribute_id = ?2",
            params![BackendType::Text.as_str(), attribute_id],
        )?;

        let legacy: Vec<(i64, i64, i64)> = {
            let mut stmt = conn.prepare(
                "SELECT store_id, entity_id, value FROM category_entity_int
                 WHERE attribute_id = ?1 AND value IS NOT NULL",
            )?;
            let rows = stmt.query_map(params![attribute_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect::<Result<_, _>>()?
        };

        for (store_id, entity_id, value) in legacy {
            if value == USE_DEFAULT || value == USE_CATEGORY_ROBOTS {
                continue;
            }

            let json = codec::encode(&codec::decode_code(value))
                .unwrap_or_else(|| EMPTY_DIRECTIVES.to_string());
            conn.execute(
                "INSERT INTO category_entity_text(attribute_id, store_id, entity_id, value)
                 VALUES(?1, ?2, ?3, ?4)
                 ON CONFLICT(attribute_id, store_id, entity_id) DO UPDATE SET value = excluded.value",
                params![attribute_id, store_id, entity_id, json],
            )?;
            conn.execute(
                "DELETE FROM category_entity_int
                 WHERE attribute_id = ?1 AND store_id = ?2 AND entity_id = ?3",
                params![attribute_id, store_id, entity_id],
            )?;
            rewritten += 1;
        }
    }

    Ok(rewritten)
}
