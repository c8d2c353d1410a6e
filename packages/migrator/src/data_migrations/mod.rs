//! Paste migration from the sharded 2.x schema into the 3.x schema
//!
//! This module is the whole pipeline of the one-shot migration:
//!
//! - `sequence`: raise the 3.x `permanents` auto-increment above the 2.x id
//!   counter before anything is written
//! - `shards`: the ordered list of legacy tables per paste class
//! - `normalize`: legacy row -> 3.x paste (defaults, empty guard, entity decoding)
//! - `workflow`: the driver; one transaction per class, fail-fast
//! - `report`: counters and elapsed times
//!
//! # Usage
//!
//! ```rust,ignore
//! let source = MySqlLegacySource::connect(&config.legacy.connection_url()).await?;
//! let store = MySqlPasteStore::connect(&config.database_url).await?;
//!
//! let mut migration = PasteMigration::new(&source, &store, MigrationOptions::default());
//! let report = migration.run().await?;
//! ```
//!
//! Re-running against a destination that already holds migrated rows is not
//! supported: the first duplicate key aborts the run.

pub mod error;
pub mod normalize;
pub mod report;
pub mod sequence;
pub mod shards;
mod workflow;

pub use error::{MigrationError, SourceError};
pub use normalize::normalize;
pub use report::{ClassReport, MigrationReport};
pub use sequence::{fix_auto_increment, SequenceFix};
pub use shards::{ShardPlan, DEFAULT_PERMANENT_SHARDS};
pub use workflow::{MigrationOptions, MigrationPhase, PasteMigration, DEFAULT_PROGRESS_EVERY};
