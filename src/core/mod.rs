//! Directive engine and its storage plumbing.
//!
//! Pure, storage-free pieces: [`directive`], [`codec`], [`validate`],
//! [`resolve`], [`aggregate`], [`format`]. Everything that touches a
//! database or the filesystem sits behind [`store`], [`sqlite_store`],
//! [`migration`] and [`config`].

pub mod adapter;
pub mod aggregate;
pub mod codec;
pub mod config;
pub mod db;
pub mod directive;
pub mod error;
pub mod format;
pub mod migration;
pub mod resolve;
pub mod schemas;
pub mod service;
pub mod sqlite_store;
pub mod store;
pub mod time;
pub mod validate;
