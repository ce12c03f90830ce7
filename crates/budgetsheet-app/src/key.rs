// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SHEET_KEY_PREFIX: &str = "budgetSheet:";
pub const DEFAULT_SHEET_NAME: &str = "budget_sheet";

/// Storage slot name for one page's table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SheetKey(String);

impl SheetKey {
    /// Last path segment with the query string stripped, prefixed with `budgetSheet:`.
    pub fn from_path(path: &str) -> Self {
        let path = path.split('?').next().unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        let file = if file.is_empty() {
            DEFAULT_SHEET_NAME
        } else {
            file
        };
        Self(format!("{SHEET_KEY_PREFIX}{file}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SheetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::SheetKey;

    #[test]
    fn key_uses_last_path_segment() {
        assert_eq!(
            SheetKey::from_path("/budgets/2026/q1.html").as_str(),
            "budgetSheet:q1.html"
        );
    }

    #[test]
    fn key_strips_query_string() {
        assert_eq!(
            SheetKey::from_path("/budgets/q1.html?view=print&lang=en").as_str(),
            "budgetSheet:q1.html"
        );
    }

    #[test]
    fn key_defaults_when_segment_is_empty() {
        assert_eq!(SheetKey::from_path("").as_str(), "budgetSheet:budget_sheet");
        assert_eq!(
            SheetKey::from_path("/budgets/").as_str(),
            "budgetSheet:budget_sheet"
        );
        assert_eq!(
            SheetKey::from_path("/?tab=2").as_str(),
            "budgetSheet:budget_sheet"
        );
    }

    #[test]
    fn key_accepts_bare_file_name() {
        assert_eq!(
            SheetKey::from_path("transport.html").to_string(),
            "budgetSheet:transport.html"
        );
    }
}
