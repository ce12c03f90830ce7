// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use budgetsheet_app::Page;
use std::fs;
use std::path::Path;

pub fn load_page(path: &Path) -> Result<Page> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read page file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse page JSON {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::load_page;
    use anyhow::Result;
    use budgetsheet_app::{Markers, SheetKey, locate_sheet};

    #[test]
    fn bundled_demo_page_loads_and_locates() -> Result<()> {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../demos/q1-budget.json");
        let page = load_page(&path)?;
        assert_eq!(SheetKey::from_path(&page.path).as_str(), "budgetSheet:q1.html");
        let location = locate_sheet(&page, &Markers::default())?;
        assert_eq!(location.table, 0);
        assert_eq!(location.controls, Some(0));
        Ok(())
    }

    #[test]
    fn invalid_json_names_the_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("page.json");
        std::fs::write(&path, "<table>")?;
        let error = load_page(&path).expect_err("html is not a page file");
        assert!(error.to_string().contains("parse page JSON"));
        Ok(())
    }
}
