//! Startup settings: defaults, then `species_catalog.toml`, then environment,
//! then command-line flags.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use client_core::AfterSave;
use serde::Deserialize;
use shared::domain::UserId;

pub const DEFAULT_CONFIG_FILE: &str = "species_catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub viewer_id: UserId,
    pub after_save: AfterSave,
    pub log_filter: String,
    pub toast_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            viewer_id: UserId(1),
            after_save: AfterSave::Close,
            log_filter: "info".into(),
            toast_seconds: 6,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    database_url: Option<String>,
    viewer_id: Option<i64>,
    after_save: Option<String>,
    log_filter: Option<String>,
    toast_seconds: Option<u64>,
}

pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", config_path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", config_path.display()))
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileConfig = toml::from_str(raw)?;
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.viewer_id {
        settings.viewer_id = UserId(v);
    }
    if let Some(v) = file_cfg.after_save {
        settings.after_save = v.parse().map_err(|err: String| anyhow!(err))?;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.toast_seconds {
        settings.toast_seconds = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("SPECIES_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
        settings.database_url = v;
    }
    if let Some(v) = lookup("SPECIES_VIEWER_ID") {
        let parsed = v
            .trim()
            .parse::<i64>()
            .with_context(|| format!("SPECIES_VIEWER_ID must be an integer, got '{v}'"))?;
        settings.viewer_id = UserId(parsed);
    }
    if let Some(v) = lookup("SPECIES_AFTER_SAVE") {
        settings.after_save = v
            .parse()
            .map_err(|err: String| anyhow!("SPECIES_AFTER_SAVE: {err}"))?;
    }
    if let Some(v) = lookup("SPECIES_LOG") {
        settings.log_filter = v;
    }
    Ok(())
}

fn default_database_url() -> String {
    let path = dirs::data_local_dir()
        .map(|dir| dir.join("species_catalog").join("species.db"))
        .unwrap_or_else(|| PathBuf::from("./data/species.db"));
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

/// Turns a bare path or `sqlite:` path into a `sqlite://` URL. The storage layer
/// creates the file's directory when it connects.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return default_database_url();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
