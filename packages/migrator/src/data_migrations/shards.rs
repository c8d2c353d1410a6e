//! Shard enumeration for the legacy paste tables
//!
//! Permanent pastes are spread over `perm0`..`perm{N-1}`; temporary pastes
//! live in the single `temp` table. Shards are visited in ascending index
//! order, one after the other.

use std::slice;

use crate::domains::pastes::{LegacyTable, PasteKind};

/// Number of permanent shards in a stock 2.x deployment
pub const DEFAULT_PERMANENT_SHARDS: u8 = 10;

/// Ordered list of the legacy tables to read, per paste class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPlan {
    permanent: Vec<LegacyTable>,
    temporary: LegacyTable,
}

impl Default for ShardPlan {
    fn default() -> Self {
        Self::new(DEFAULT_PERMANENT_SHARDS)
    }
}

impl ShardPlan {
    pub fn new(permanent_shards: u8) -> Self {
        Self {
            permanent: (0..permanent_shards)
                .map(LegacyTable::permanent_shard)
                .collect(),
            temporary: LegacyTable::temporary(),
        }
    }

    /// Tables holding pastes of `kind`, in the order they must be read
    pub fn tables(&self, kind: PasteKind) -> &[LegacyTable] {
        match kind {
            PasteKind::Permanent => &self.permanent,
            PasteKind::Temporary => slice::from_ref(&self.temporary),
        }
    }

    pub fn permanent_shards(&self) -> usize {
        self.permanent.len()
    }
}
