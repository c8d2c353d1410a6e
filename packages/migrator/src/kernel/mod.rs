//! Kernel module - database infrastructure behind the migration.

pub mod mysql;
pub mod test_dependencies;
pub mod traits;

pub use mysql::{MySqlLegacySource, MySqlPasteStore};
pub use traits::*;
