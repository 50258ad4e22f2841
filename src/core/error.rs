use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RobotsError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Invalid robots directives: {}", .0.join(", "))]
    InvalidDirectives(Vec<String>),
    #[error("Migration error: {0}")]
    MigrationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<toml::de::Error> for RobotsError {
    fn from(err: toml::de::Error) -> Self {
        RobotsError::ConfigError(err.to_string())
    }
}
