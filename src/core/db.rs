use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, params};
use std::fs;
use std::path::Path;

pub fn db_connect(db_path: &str) -> Result<Connection, error::RobotsError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(conn)
}

/// Creates the tables and registers the robots attributes. Safe to re-run.
pub fn initialize_db(db_path: &Path) -> Result<(), error::RobotsError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let conn = db_connect(&db_path.to_string_lossy())?;
    install_schema(&conn)
}

pub fn install_schema(conn: &Connection) -> Result<(), error::RobotsError> {
    for schema in schemas::ALL_SCHEMAS {
        conn.execute(schema, [])?;
    }
    for def in schemas::ATTRIBUTES.iter() {
        conn.execute(
            "INSERT OR IGNORE INTO eav_attribute(attribute_code, backend_type, default_value)
             VALUES(?1, ?2, ?3)",
            params![def.code, def.backend.as_str(), def.default_value],
        )?;
    }
    Ok(())
}
