// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use budgetsheet_app::{SheetStorage, StorageError};
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

pub const APP_NAME: &str = "budgetsheet";
/// Matches the per-origin allowance browsers give local storage.
pub const DEFAULT_QUOTA_BYTES: i64 = 5 << 20;

const REQUIRED_COLUMNS: [&str; 3] = ["key", "value", "updated_at"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInfo {
    pub key: String,
    pub bytes: i64,
    pub updated_at: OffsetDateTime,
}

/// SQLite-backed sheet slots: one row per key, writes bounded by a byte quota
/// counted over keys plus values.
pub struct Store {
    conn: Connection,
    quota_bytes: i64,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn, true)?;
        Ok(Self {
            conn,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        })
    }

    /// Opens an existing database without write access; every save is
    /// reported as access denied.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("open database read-only at {}", path.display()))?;
        configure_connection(&conn, false)?;
        Ok(Self {
            conn,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn, true)?;
        Ok(Self {
            conn,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if table_exists(&self.conn, "sheet_slots")? {
            validate_schema(&self.conn)
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")
        }
    }

    pub fn set_quota_bytes(&mut self, value: i64) -> Result<()> {
        if value <= 0 {
            bail!("storage quota must be positive, got {value}");
        }
        self.quota_bytes = value;
        Ok(())
    }

    pub fn quota_bytes(&self) -> i64 {
        self.quota_bytes
    }

    pub fn used_bytes(&self) -> Result<i64> {
        self.conn
            .query_row(
                "
                SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
                FROM sheet_slots
                ",
                [],
                |row| row.get(0),
            )
            .context("sum stored sheet bytes")
    }

    pub fn put_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let used_elsewhere: i64 = self
            .conn
            .query_row(
                "
                SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
                FROM sheet_slots
                WHERE key <> ?
                ",
                params![key],
                |row| row.get(0),
            )
            .map_err(|error| classify_sqlite_error(&error))?;
        let incoming = i64::try_from(key.len() + value.len())
            .map_err(|_| StorageError::QuotaExceeded)?;
        if used_elsewhere.saturating_add(incoming) > self.quota_bytes {
            debug!(
                key,
                used_elsewhere,
                incoming,
                quota = self.quota_bytes,
                "sheet slot write over quota"
            );
            return Err(StorageError::QuotaExceeded);
        }

        let now = now_rfc3339().map_err(|error| StorageError::Unspecified(error.to_string()))?;
        self.conn
            .execute(
                "
                INSERT INTO sheet_slots (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, value, now],
            )
            .map_err(|error| classify_sqlite_error(&error))?;
        Ok(())
    }

    pub fn list_slots(&self) -> Result<Vec<SlotInfo>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT key, length(CAST(key AS BLOB)) + length(CAST(value AS BLOB)), updated_at
                FROM sheet_slots
                ORDER BY key ASC
                ",
            )
            .context("prepare sheet slots query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("query sheet slots")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect sheet slots")?;

        rows.into_iter()
            .map(|(key, bytes, updated_at)| {
                let updated_at = OffsetDateTime::parse(&updated_at, &Rfc3339)
                    .with_context(|| format!("parse updated_at {updated_at:?} for slot {key}"))?;
                Ok(SlotInfo {
                    key,
                    bytes,
                    updated_at,
                })
            })
            .collect()
    }

    fn read_slot(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM sheet_slots WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }
}

impl SheetStorage for Store {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.read_slot(key)
            .map_err(|error| classify_sqlite_error(&error))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.put_slot(key, value)
    }
}

/// Maps SQLite failures onto the storage failure classes shown to users.
pub fn classify_sqlite_error(error: &rusqlite::Error) -> StorageError {
    match error.sqlite_error_code() {
        Some(
            ErrorCode::ReadOnly
            | ErrorCode::PermissionDenied
            | ErrorCode::AuthorizationForStatementDenied
            | ErrorCode::CannotOpen,
        ) => StorageError::AccessDenied,
        Some(ErrorCode::DiskFull | ErrorCode::TooBig) => StorageError::QuotaExceeded,
        _ => StorageError::Unspecified(error.to_string()),
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("BUDGETSHEET_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!(
            "cannot resolve data directory; set BUDGETSHEET_DB_PATH to a writable database path"
        )
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("budgetsheet.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let columns = table_columns(conn, "sheet_slots")?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !columns.contains(*column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "table `sheet_slots` is missing required columns: {}; point [storage].db_path at a budgetsheet database",
            missing.join(", ")
        );
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            params![table],
            |row| row.get(0),
        )
        .with_context(|| format!("check table {table}"))?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(columns)
}

fn configure_connection(conn: &Connection, writable: bool) -> Result<()> {
    let pragmas = if writable {
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        "
    } else {
        "PRAGMA busy_timeout = 5000;"
    };
    conn.execute_batch(pragmas)
        .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

#[cfg(test)]
mod tests {
    use super::{Store, classify_sqlite_error};
    use budgetsheet_app::StorageError;
    use rusqlite::ffi;

    fn sqlite_error(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn classify_maps_codes_to_failure_kinds() {
        assert_eq!(
            classify_sqlite_error(&sqlite_error(ffi::SQLITE_READONLY)),
            StorageError::AccessDenied
        );
        assert_eq!(
            classify_sqlite_error(&sqlite_error(ffi::SQLITE_PERM)),
            StorageError::AccessDenied
        );
        assert_eq!(
            classify_sqlite_error(&sqlite_error(ffi::SQLITE_FULL)),
            StorageError::QuotaExceeded
        );
        assert!(matches!(
            classify_sqlite_error(&sqlite_error(ffi::SQLITE_CORRUPT)),
            StorageError::Unspecified(_)
        ));
    }

    #[test]
    fn quota_must_be_positive() -> anyhow::Result<()> {
        let mut store = Store::open_memory()?;
        let error = store
            .set_quota_bytes(0)
            .expect_err("zero quota should fail");
        assert!(error.to_string().contains("must be positive"));
        store.set_quota_bytes(1024)?;
        assert_eq!(store.quota_bytes(), 1024);
        Ok(())
    }
}
