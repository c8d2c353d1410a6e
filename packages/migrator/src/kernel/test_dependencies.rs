// Test doubles for the legacy source and the destination store
//
// In-memory stand-ins that mimic the MySQL behavior the migration relies on:
// missing tables fail the query, uncommitted transactions vanish, and the
// permanents auto-increment never moves backwards.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{BaseLegacySource, BasePasteStore, BasePasteTransaction};
use crate::data_migrations::error::SourceError;
use crate::domains::pastes::{LegacyPasteRow, LegacyTable, Paste, PasteKind};

// =============================================================================
// Mock Legacy Source
// =============================================================================

#[derive(Debug, Clone)]
enum MockRow {
    Row(LegacyPasteRow),
    Undecodable,
}

pub struct MockLegacySource {
    id_counter: Option<u64>,
    tables: HashMap<String, Vec<MockRow>>,
    failing_tables: HashSet<String>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl Default for MockLegacySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLegacySource {
    /// Empty source with a zero id counter and no tables at all
    pub fn new() -> Self {
        Self {
            id_counter: Some(0),
            tables: HashMap::new(),
            failing_tables: HashSet::new(),
            queried: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create `temp` and `perm0`..`perm{shards-1}` with no rows
    pub fn with_empty_tables(mut self, shards: u8) -> Self {
        self.tables
            .entry(LegacyTable::temporary().name().to_string())
            .or_default();
        for index in 0..shards {
            self.tables
                .entry(LegacyTable::permanent_shard(index).name().to_string())
                .or_default();
        }
        self
    }

    pub fn with_id_counter(mut self, value: u64) -> Self {
        self.id_counter = Some(value);
        self
    }

    /// Make the counter query fail, as if the `id` table were missing
    pub fn without_id_counter(mut self) -> Self {
        self.id_counter = None;
        self
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<LegacyPasteRow>) -> Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.into_iter().map(MockRow::Row));
        self
    }

    /// Append a row whose columns do not decode
    pub fn with_undecodable_row(mut self, table: &str) -> Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(MockRow::Undecodable);
        self
    }

    pub fn with_failing_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    /// Tables queried so far, in query order
    pub fn queried_tables(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseLegacySource for MockLegacySource {
    async fn read_id_counter(&self) -> Result<u64> {
        self.id_counter
            .ok_or_else(|| anyhow!("Table 'pasteme.id' doesn't exist"))
    }

    fn fetch_rows<'a>(
        &'a self,
        table: &'a LegacyTable,
    ) -> BoxStream<'a, Result<LegacyPasteRow, SourceError>> {
        let name = table.name();
        self.queried.lock().unwrap().push(name.to_string());

        let items: Vec<Result<LegacyPasteRow, SourceError>> = match self.tables.get(name) {
            Some(_) if self.failing_tables.contains(name) => vec![Err(SourceError::Query(
                anyhow!("Lost connection to MySQL server during query"),
            ))],
            Some(rows) => rows
                .iter()
                .map(|row| match row {
                    MockRow::Row(row) => Ok(row.clone()),
                    MockRow::Undecodable => Err(SourceError::Decode(anyhow!(
                        "error occurred while decoding column \"text\""
                    ))),
                })
                .collect(),
            None => vec![Err(SourceError::Query(anyhow!(
                "Table 'pasteme.{}' doesn't exist",
                name
            )))],
        };

        stream::iter(items).boxed()
    }
}

// =============================================================================
// Mock Paste Store
// =============================================================================

/// A paste as the mock store holds it; permanents carry their issued id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPaste {
    pub id: Option<u64>,
    pub paste: Paste,
}

/// Calls observed by the mock store, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    SetNextPermanentId(u64),
    Begin,
    Save(PasteKind, String),
    Commit { rows: usize },
    Rollback,
    /// Transaction dropped without commit or rollback
    Discarded { rows: usize },
}

struct MockStoreState {
    next_permanent_id: u64,
    committed: Vec<StoredPaste>,
    events: Vec<StoreEvent>,
    failing_keys: HashSet<String>,
    fail_alter: bool,
    fail_begin: bool,
    fail_commit: bool,
}

#[derive(Clone)]
pub struct MockPasteStore {
    state: Arc<Mutex<MockStoreState>>,
}

impl Default for MockPasteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPasteStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockStoreState {
                next_permanent_id: 1,
                committed: Vec::new(),
                events: Vec::new(),
                failing_keys: HashSet::new(),
                fail_alter: false,
                fail_begin: false,
                fail_commit: false,
            })),
        }
    }

    /// Reject saves of the given key
    pub fn with_failing_key(self, key: &str) -> Self {
        self.state.lock().unwrap().failing_keys.insert(key.to_string());
        self
    }

    pub fn with_failing_alter(self) -> Self {
        self.state.lock().unwrap().fail_alter = true;
        self
    }

    pub fn with_failing_begin(self) -> Self {
        self.state.lock().unwrap().fail_begin = true;
        self
    }

    pub fn with_failing_commit(self) -> Self {
        self.state.lock().unwrap().fail_commit = true;
        self
    }

    /// Pre-populate committed rows, as left behind by an earlier run
    pub fn with_committed(self, paste: Paste) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = match paste.kind {
                PasteKind::Permanent => {
                    let id = state.next_permanent_id;
                    state.next_permanent_id += 1;
                    Some(id)
                }
                PasteKind::Temporary => None,
            };
            state.committed.push(StoredPaste { id, paste });
        }
        self
    }

    /// Id the next inserted permanent paste would receive
    pub fn next_permanent_id(&self) -> u64 {
        self.state.lock().unwrap().next_permanent_id
    }

    pub fn committed(&self) -> Vec<StoredPaste> {
        self.state.lock().unwrap().committed.clone()
    }

    pub fn committed_of(&self, kind: PasteKind) -> Vec<StoredPaste> {
        self.committed()
            .into_iter()
            .filter(|stored| stored.paste.kind == kind)
            .collect()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.state.lock().unwrap().events.clone()
    }
}

#[async_trait]
impl BasePasteStore for MockPasteStore {
    async fn set_next_permanent_id(&self, next_id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_alter {
            return Err(anyhow!("ALTER command denied to user 'pasteme'"));
        }

        // Like InnoDB, never below max(id) + 1
        let floor = state
            .committed
            .iter()
            .filter_map(|stored| stored.id)
            .max()
            .map_or(1, |max| max + 1);
        state.next_permanent_id = next_id.max(floor);
        state.events.push(StoreEvent::SetNextPermanentId(next_id));
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn BasePasteTransaction>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_begin {
            return Err(anyhow!("Too many connections"));
        }
        state.events.push(StoreEvent::Begin);

        Ok(Box::new(MockPasteTransaction {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
            finished: false,
        }))
    }
}

pub struct MockPasteTransaction {
    state: Arc<Mutex<MockStoreState>>,
    pending: Vec<StoredPaste>,
    finished: bool,
}

#[async_trait]
impl BasePasteTransaction for MockPasteTransaction {
    async fn save(&mut self, paste: &Paste) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        let duplicate = state
            .committed
            .iter()
            .chain(self.pending.iter())
            .any(|stored| stored.paste.kind == paste.kind && stored.paste.key == paste.key);
        if duplicate || state.failing_keys.contains(&paste.key) {
            return Err(anyhow!(
                "Duplicate entry '{}' for key '{}.key'",
                paste.key,
                paste.kind.destination_table()
            ));
        }

        // Ids are consumed at insert time, even if the transaction rolls back
        let id = match paste.kind {
            PasteKind::Permanent => {
                let id = state.next_permanent_id;
                state.next_permanent_id += 1;
                Some(id)
            }
            PasteKind::Temporary => None,
        };

        state
            .events
            .push(StoreEvent::Save(paste.kind, paste.key.clone()));
        self.pending.push(StoredPaste {
            id,
            paste: paste.clone(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finished = true;
        let pending = std::mem::take(&mut this.pending);

        let mut state = this.state.lock().unwrap();
        if state.fail_commit {
            return Err(anyhow!("Deadlock found when trying to get lock"));
        }
        state.events.push(StoreEvent::Commit {
            rows: pending.len(),
        });
        state.committed.extend(pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finished = true;
        this.pending.clear();
        this.state.lock().unwrap().events.push(StoreEvent::Rollback);
        Ok(())
    }
}

impl Drop for MockPasteTransaction {
    fn drop(&mut self) {
        if !self.finished {
            if let Ok(mut state) = self.state.lock() {
                state.events.push(StoreEvent::Discarded {
                    rows: self.pending.len(),
                });
            }
        }
    }
}
