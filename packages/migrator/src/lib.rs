// PasteMe Migrator - Core
//
// One-shot migration of paste records from the sharded 2.x MySQL schema into
// the consolidated 3.x schema.
//
// The pipeline lives in data_migrations/; the stores it talks to are reached
// through the Base* traits in kernel/.

pub mod config;
pub mod data_migrations;
pub mod domains;
pub mod kernel;

pub use config::*;
