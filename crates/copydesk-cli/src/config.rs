// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_AUTHOR: &str = "데스크";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            backend: Backend::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Remote,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Backend {
    pub kind: Option<BackendKind>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub author: Option<String>,
    pub editors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("COPYDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set COPYDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(copydesk_db::APP_NAME);
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
                    "config file {} has no version; add `version = 1` at the top",
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
            copydesk_db::validate_db_path(db_path)?;
        }

        if self.backend_kind() == BackendKind::Remote {
            if self.base_url().is_none() {
                bail!(
                    "[backend].base_url is required in {} when kind = \"remote\"",
                    path.display()
                );
            }
            if self.api_key().is_none() {
                bail!(
                    "[backend].api_key is required in {} when kind = \"remote\"",
                    path.display()
                );
            }
        }

        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "[backend].timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(author) = &self.ui.author
            && author.trim().is_empty()
        {
            bail!("[ui].author in {} must not be blank", path.display());
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => copydesk_db::default_db_path(),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind.unwrap_or_default()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.backend
            .base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.backend
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.backend.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn author(&self) -> &str {
        self.ui
            .author
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_AUTHOR)
    }

    pub fn editors(&self) -> Vec<String> {
        self.ui
            .editors
            .iter()
            .flatten()
            .map(|editor| editor.trim())
            .filter(|editor| !editor.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# copydesk config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is the platform data dir (for example ~/.local/share/copydesk/copydesk.db)\n# db_path = \"/absolute/path/to/copydesk.db\"\n\n[backend]\n# \"sqlite\" keeps articles in the local database; \"remote\" talks to a PostgREST service.\nkind = \"sqlite\"\n# base_url = \"https://project.example.co\"\n# api_key = \"anon-key\"\ntimeout = \"{}\"\n\n[ui]\nauthor = \"{}\"\n# Assignee choices for the editor column. Store profiles are added to this list.\neditors = []\n\n[log]\n# Overridden by COPYDESK_LOG.\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_TIMEOUT,
            DEFAULT_AUTHOR,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use <N>ms or <N>s (for example 500ms or 10s)")
}
