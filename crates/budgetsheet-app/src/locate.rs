// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};

use crate::{Markers, Page};

/// Where the editor's table and controls container live inside a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLocation {
    pub table: usize,
    pub controls: Option<usize>,
}

pub fn locate_sheet(page: &Page, markers: &Markers) -> Result<SheetLocation> {
    let table = page
        .tables
        .iter()
        .position(|table| table.has_class(&markers.table))
        .ok_or_else(|| {
            anyhow!(
                "page {:?} has no table with class `{}`; check [sheet].table_class",
                page.path,
                markers.table
            )
        })?;
    let controls = page
        .controls
        .iter()
        .position(|container| container.has_class(&markers.controls));
    Ok(SheetLocation { table, controls })
}
