//! Migration counters and the final summary

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;
use tracing::info;

use super::sequence::SequenceFix;
use crate::domains::pastes::PasteKind;

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Outcome of migrating one paste class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    pub kind: PasteKind,
    /// Pastes saved successfully
    pub count: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

/// Summary of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub sequence: SequenceFix,
    pub permanent: ClassReport,
    pub temporary: ClassReport,
}

impl MigrationReport {
    pub fn total_count(&self) -> u64 {
        self.permanent.count + self.temporary.count
    }

    pub fn total_elapsed(&self) -> Duration {
        self.permanent.elapsed + self.temporary.elapsed
    }

    /// Emit the closing summary at info level
    pub fn log_summary(&self) {
        info!("=====================================");
        if self.dry_run {
            info!("Dry run: nothing was committed");
        }
        info!(
            "{} records total, cost: {:?}",
            self.total_count(),
            self.total_elapsed()
        );
        info!(
            "{} permanents cost: {:?}",
            self.permanent.count, self.permanent.elapsed
        );
        info!(
            "{} temporaries cost: {:?}",
            self.temporary.count, self.temporary.elapsed
        );
    }
}
