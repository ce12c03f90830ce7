// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{SheetKey, SheetStorage, Snapshot, StorageError};

/// A stored value that cannot be used as a snapshot. Recovered by treating
/// the slot as empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedStoredData {
    #[error("stored value is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("stored value is a JSON {0}, expected an array of rows")]
    NotAnArray(&'static str),
}

pub fn decode_snapshot(raw: &str) -> Result<Snapshot, MalformedStoredData> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|error| MalformedStoredData::InvalidJson(error.to_string()))?;
    Snapshot::from_json(&value).ok_or(MalformedStoredData::NotAnArray(json_kind(&value)))
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(|error| StorageError::Unspecified(error.to_string()))
}

/// Reads the saved snapshot for `key`. Missing, unreadable, and malformed
/// values all come back as `None`; the cause is logged, never returned.
pub fn load_snapshot<S>(storage: &S, key: &SheetKey) -> Option<Snapshot>
where
    S: SheetStorage + ?Sized,
{
    let raw = match storage.get(key.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = %key, "no saved snapshot");
            return None;
        }
        Err(error) => {
            error!(key = %key, %error, "cannot read saved snapshot, ignoring saved data");
            return None;
        }
    };
    if raw.is_empty() {
        return None;
    }

    match decode_snapshot(&raw) {
        Ok(snapshot) => {
            debug!(key = %key, rows = snapshot.row_count(), "loaded saved snapshot");
            Some(snapshot)
        }
        Err(malformed) => {
            warn!(key = %key, error = %malformed, "ignoring malformed saved snapshot");
            None
        }
    }
}

pub fn save_snapshot<S>(
    storage: &mut S,
    key: &SheetKey,
    snapshot: &Snapshot,
) -> Result<(), StorageError>
where
    S: SheetStorage + ?Sized,
{
    let raw = encode_snapshot(snapshot)?;
    storage.set(key.as_str(), &raw).inspect_err(|error| {
        error!(key = %key, %error, bytes = raw.len(), "save failed");
    })?;
    debug!(key = %key, bytes = raw.len(), "saved snapshot");
    Ok(())
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{MalformedStoredData, decode_snapshot, load_snapshot, save_snapshot};
    use crate::{MemoryStorage, SheetKey, Snapshot, StorageError};

    fn key() -> SheetKey {
        SheetKey::from_path("/budgets/q1.html")
    }

    #[test]
    fn load_returns_none_when_slot_is_empty() {
        assert_eq!(load_snapshot(&MemoryStorage::new(), &key()), None);
    }

    #[test]
    fn load_treats_invalid_json_as_absent() {
        let storage = MemoryStorage::new().with_entry("budgetSheet:q1.html", "{not valid");
        assert_eq!(load_snapshot(&storage, &key()), None);
        assert!(matches!(
            decode_snapshot("{not valid"),
            Err(MalformedStoredData::InvalidJson(_))
        ));
    }

    #[test]
    fn load_treats_non_array_as_absent() {
        let storage = MemoryStorage::new().with_entry("budgetSheet:q1.html", r#"{"a":1}"#);
        assert_eq!(load_snapshot(&storage, &key()), None);
        assert_eq!(
            decode_snapshot("42"),
            Err(MalformedStoredData::NotAnArray("number"))
        );
    }

    #[test]
    fn load_treats_denied_storage_as_absent() {
        assert_eq!(load_snapshot(&MemoryStorage::denied(), &key()), None);
    }

    #[test]
    fn save_writes_json_rows_under_key() -> Result<(), StorageError> {
        let mut storage = MemoryStorage::new();
        save_snapshot(
            &mut storage,
            &key(),
            &Snapshot::from_rows([["10", "99"], ["30", "40"]]),
        )?;
        assert_eq!(
            storage.raw("budgetSheet:q1.html"),
            Some(r#"[["10","99"],["30","40"]]"#)
        );
        assert_eq!(
            load_snapshot(&storage, &key()),
            Some(Snapshot::from_rows([["10", "99"], ["30", "40"]]))
        );
        Ok(())
    }

    #[test]
    fn save_reports_quota_failure() {
        let mut storage = MemoryStorage::with_quota(8);
        let result = save_snapshot(&mut storage, &key(), &Snapshot::from_rows([["1"]]));
        assert_eq!(result, Err(StorageError::QuotaExceeded));
        assert!(storage.is_empty());
    }
}
