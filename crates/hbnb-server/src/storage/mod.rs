//! Storage engines
//!
//! `FileStorage` keeps everything in memory and snapshots it to one JSON
//! file. `DbStorage` uses SQLite (embedded) through sqlx.

pub mod db;
pub mod file;

pub use db::DbStorage;
pub use file::FileStorage;
