use thiserror::Error;

use crate::domains::pastes::PasteKind;

/// Failure while reading a legacy table
///
/// Query failures (missing shard, bad SQL, lost connection) are kept apart
/// from rows that do not decode into the expected four columns.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("query failed")]
    Query(#[source] anyhow::Error),

    #[error("row decode failed")]
    Decode(#[source] anyhow::Error),
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => Self::Decode(err.into()),
            _ => Self::Query(err.into()),
        }
    }
}

/// Fatal migration errors
///
/// Every variant ends the run; the diagnostic names the stage and the
/// table, key or entity class involved. The underlying cause is only reachable
/// through `source()`, so `{:#}` prints it once.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Connect to {store} database failed")]
    Connect {
        store: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Query from legacy table `{table}` failed")]
    CounterRead {
        table: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Alter table `{table}` AUTO_INCREMENT to {next_id} failed")]
    SequenceAlter {
        table: &'static str,
        next_id: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("Query on legacy table `{table}` failed")]
    Query {
        table: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Scan of legacy table `{table}` failed")]
    Scan {
        table: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Begin {kind} transaction failed")]
    Begin {
        kind: PasteKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Paste {key} ({kind}) save failed")]
    Persist {
        kind: PasteKind,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Commit of {kind} pastes failed")]
    Commit {
        kind: PasteKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Rollback of {kind} pastes failed")]
    Rollback {
        kind: PasteKind,
        #[source]
        source: anyhow::Error,
    },
}

impl MigrationError {
    /// Attach the table name to a source-side failure
    pub fn from_source(table: &str, err: SourceError) -> Self {
        match err {
            SourceError::Query(source) => Self::Query {
                table: table.to_string(),
                source,
            },
            SourceError::Decode(source) => Self::Scan {
                table: table.to_string(),
                source,
            },
        }
    }
}
