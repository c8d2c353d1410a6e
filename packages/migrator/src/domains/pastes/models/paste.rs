use anyhow::Result;
use serde::Serialize;
use sqlx::{MySqlConnection, MySqlPool};
use std::fmt;

/// Destination table whose auto-increment must continue the legacy sequence
pub const PERMANENTS_TABLE: &str = "permanents";
pub const TEMPORARIES_TABLE: &str = "temporaries";

/// Entity class of a paste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasteKind {
    Permanent,
    Temporary,
}

impl PasteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Temporary => "temporary",
        }
    }

    /// Table the 3.x schema stores this class in
    pub fn destination_table(&self) -> &'static str {
        match self {
            Self::Permanent => PERMANENTS_TABLE,
            Self::Temporary => TEMPORARIES_TABLE,
        }
    }
}

impl fmt::Display for PasteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A paste normalized for the 3.x schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paste {
    pub kind: PasteKind,
    pub key: String,
    pub lang: String,
    pub content: String,
    pub password: String,
}

impl Paste {
    /// Insert into the table matching `self.kind` on the caller's connection
    /// (normally an open transaction)
    pub async fn insert(&self, conn: &mut MySqlConnection) -> Result<()> {
        let sql = match self.kind {
            PasteKind::Permanent => {
                "INSERT INTO `permanents` (`key`, `lang`, `content`, `password`) VALUES (?, ?, ?, ?)"
            }
            PasteKind::Temporary => {
                "INSERT INTO `temporaries` (`key`, `lang`, `content`, `password`) VALUES (?, ?, ?, ?)"
            }
        };

        sqlx::query(sql)
            .bind(&self.key)
            .bind(&self.lang)
            .bind(&self.content)
            .bind(&self.password)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Set the next id `permanents` will issue
    ///
    /// DDL takes no bind parameters, hence the formatted integer. MySQL commits
    /// DDL implicitly; the new value is durable once this returns.
    pub async fn set_next_permanent_id(next_id: u64, pool: &MySqlPool) -> Result<()> {
        let sql = format!(
            "ALTER TABLE `{}` AUTO_INCREMENT = {}",
            PERMANENTS_TABLE, next_id
        );
        sqlx::query(&sql).execute(pool).await?;
        Ok(())
    }
}
