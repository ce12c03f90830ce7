// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use thiserror::Error;

/// Failure classes a storage backend reports. Each has a distinct notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage access denied")]
    AccessDenied,
    #[error("storage failure: {0}")]
    Unspecified(String),
}

impl StorageError {
    pub const fn kind(&self) -> StorageErrorKind {
        match self {
            Self::QuotaExceeded => StorageErrorKind::QuotaExceeded,
            Self::AccessDenied => StorageErrorKind::AccessDenied,
            Self::Unspecified(_) => StorageErrorKind::Unspecified,
        }
    }

    pub const fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    QuotaExceeded,
    AccessDenied,
    Unspecified,
}

impl StorageErrorKind {
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::QuotaExceeded => {
                "Could not save: Storage quota exceeded. Please clear some data or try again."
            }
            Self::AccessDenied => {
                "Could not save: Storage access denied. Please check your storage settings."
            }
            Self::Unspecified => "Could not save: An unexpected error occurred. Please try again.",
        }
    }
}

/// Keyed string slots, the way a browser's local storage is addressed.
pub trait SheetStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage. Usage is counted as key plus value bytes across all
/// slots; a write that would push usage past the quota is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    slots: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    denied: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Every read and write fails with [`StorageError::AccessDenied`].
    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }

    pub fn used_bytes(&self) -> usize {
        self.slots
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl SheetStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.denied {
            return Err(StorageError::AccessDenied);
        }
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.denied {
            return Err(StorageError::AccessDenied);
        }
        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .slots
                .get(key)
                .map_or(0, |existing| key.len() + existing.len());
            let projected = self.used_bytes() - replaced + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
