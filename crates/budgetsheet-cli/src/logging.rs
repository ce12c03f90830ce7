// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BUDGETSHEET_LOG";

/// The terminal belongs to the UI, so events go to an append-only file.
pub fn init(path: &Path, level: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(env::var(LOG_ENV).ok().as_deref(), level)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn filter(directives: Option<&str>, level: &str) -> Result<EnvFilter> {
    match directives {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .with_context(|| format!("parse {LOG_ENV}={directives:?}")),
        _ => EnvFilter::try_new(level).with_context(|| format!("parse log level {level:?}")),
    }
}
