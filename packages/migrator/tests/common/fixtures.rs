//! Legacy and destination schemas plus seeding helpers.

use anyhow::Result;
use sqlx::MySqlPool;

macro_rules! permanent_shard {
    ($name:literal) => {
        concat!(
            "CREATE TABLE `",
            $name,
            "` (`key` INT UNSIGNED NOT NULL PRIMARY KEY, `type` VARCHAR(16) NULL, ",
            "`text` MEDIUMTEXT NOT NULL, `passwd` VARCHAR(64) NULL) DEFAULT CHARSET = utf8mb4"
        )
    };
}

/// The 2.x layout: an id counter, ten permanent shards and one temporary table
pub const LEGACY_SCHEMA: &[&str] = &[
    "CREATE TABLE `id` (`id` INT UNSIGNED NOT NULL) DEFAULT CHARSET = utf8mb4",
    "INSERT INTO `id` (`id`) VALUES (0)",
    permanent_shard!("perm0"),
    permanent_shard!("perm1"),
    permanent_shard!("perm2"),
    permanent_shard!("perm3"),
    permanent_shard!("perm4"),
    permanent_shard!("perm5"),
    permanent_shard!("perm6"),
    permanent_shard!("perm7"),
    permanent_shard!("perm8"),
    permanent_shard!("perm9"),
    "CREATE TABLE `temp` (`key` VARCHAR(16) NOT NULL PRIMARY KEY, `type` VARCHAR(16) NULL, \
     `text` MEDIUMTEXT NOT NULL, `passwd` VARCHAR(64) NULL) DEFAULT CHARSET = utf8mb4",
];

/// The 3.x layout the migration writes into
pub const DESTINATION_SCHEMA: &[&str] = &[
    "CREATE TABLE `permanents` (\
     `id` BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
     `key` VARCHAR(16) NOT NULL UNIQUE, \
     `lang` VARCHAR(16) NOT NULL, \
     `content` MEDIUMTEXT NOT NULL, \
     `password` VARCHAR(64) NOT NULL) DEFAULT CHARSET = utf8mb4",
    "CREATE TABLE `temporaries` (\
     `key` VARCHAR(16) NOT NULL PRIMARY KEY, \
     `lang` VARCHAR(16) NOT NULL, \
     `content` MEDIUMTEXT NOT NULL, \
     `password` VARCHAR(64) NOT NULL) DEFAULT CHARSET = utf8mb4",
];

pub async fn set_legacy_counter(pool: &MySqlPool, value: u64) -> Result<()> {
    sqlx::query("UPDATE `id` SET `id` = ?")
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_legacy_row(
    pool: &MySqlPool,
    table: &str,
    key: &str,
    lang: Option<&str>,
    text: &str,
    passwd: Option<&str>,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO `{}` (`key`, `type`, `text`, `passwd`) VALUES (?, ?, ?, ?)",
        table
    );
    sqlx::query(&sql)
        .bind(key)
        .bind(lang)
        .bind(text)
        .bind(passwd)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn drop_legacy_table(pool: &MySqlPool, table: &str) -> Result<()> {
    sqlx::query(&format!("DROP TABLE `{}`", table))
        .execute(pool)
        .await?;
    Ok(())
}

/// (id, key, lang, content, password) of every migrated permanent, by id
pub async fn permanents(pool: &MySqlPool) -> Result<Vec<(u64, String, String, String, String)>> {
    let rows = sqlx::query_as(
        "SELECT `id`, `key`, `lang`, `content`, `password` FROM `permanents` ORDER BY `id`",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// (key, lang, content, password) of every migrated temporary, by key
pub async fn temporaries(pool: &MySqlPool) -> Result<Vec<(String, String, String, String)>> {
    let rows = sqlx::query_as(
        "SELECT `key`, `lang`, `content`, `password` FROM `temporaries` ORDER BY `key`",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
