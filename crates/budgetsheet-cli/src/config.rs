// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use budgetsheet_app::{DEFAULT_CONTROLS_CLASS, DEFAULT_LABEL_CLASS, DEFAULT_TABLE_CLASS, Markers};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub sheet: Sheet,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            sheet: Sheet::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
    pub quota_bytes: Option<i64>,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            db_path: None,
            quota_bytes: Some(budgetsheet_store::DEFAULT_QUOTA_BYTES),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub table_class: Option<String>,
    pub label_class: Option<String>,
    pub controls_class: Option<String>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self {
            table_class: Some(DEFAULT_TABLE_CLASS.to_owned()),
            label_class: Some(DEFAULT_LABEL_CLASS.to_owned()),
            controls_class: Some(DEFAULT_CONTROLS_CLASS.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub path: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("BUDGETSHEET_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set BUDGETSHEET_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(budgetsheet_store::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and place values under [storage], [sheet], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            budgetsheet_store::validate_db_path(db_path)?;
        }

        if let Some(quota) = self.storage.quota_bytes
            && quota <= 0
        {
            bail!(
                "storage.quota_bytes in {} must be positive, got {}",
                path.display(),
                quota
            );
        }

        for (field, value) in [
            ("table_class", &self.sheet.table_class),
            ("label_class", &self.sheet.label_class),
            ("controls_class", &self.sheet.controls_class),
        ] {
            if let Some(class) = value
                && (class.trim().is_empty() || class.contains(char::is_whitespace))
            {
                bail!(
                    "sheet.{field} in {} must be a single class name, got {class:?}",
                    path.display()
                );
            }
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => budgetsheet_store::default_db_path(),
        }
    }

    pub fn quota_bytes(&self) -> i64 {
        self.storage
            .quota_bytes
            .unwrap_or(budgetsheet_store::DEFAULT_QUOTA_BYTES)
    }

    pub fn markers(&self) -> Markers {
        let defaults = Markers::default();
        Markers {
            table: self.sheet.table_class.clone().unwrap_or(defaults.table),
            label_column: self
                .sheet
                .label_class
                .clone()
                .unwrap_or(defaults.label_column),
            controls: self
                .sheet
                .controls_class
                .clone()
                .unwrap_or(defaults.controls),
            ..Markers::default()
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path to a writable log file")
        })?;
        Ok(data_root
            .join(budgetsheet_store::APP_NAME)
            .join("budgetsheet.log"))
    }

    pub fn log_level(&self) -> String {
        self.log
            .level
            .as_deref()
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_ascii_lowercase()
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# budgetsheet config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/budgetsheet/budgetsheet.db)\n# db_path = \"/absolute/path/to/budgetsheet.db\"\nquota_bytes = {}\n\n[sheet]\ntable_class = \"{}\"\nlabel_class = \"{}\"\ncontrols_class = \"{}\"\n\n[log]\n# path = \"/absolute/path/to/budgetsheet.log\"\nlevel = \"{}\"\n",
            path.display(),
            budgetsheet_store::DEFAULT_QUOTA_BYTES,
            DEFAULT_TABLE_CLASS,
            DEFAULT_LABEL_CLASS,
            DEFAULT_CONTROLS_CLASS,
            DEFAULT_LOG_LEVEL,
        )
    }
}
