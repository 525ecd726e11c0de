use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;
use shared::protocol::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use tracing::warn;

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub store: StoreBackend,
    pub seed: bool,
    pub default_page_size: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            database_url: "sqlite://./data/catalog.db".into(),
            store: StoreBackend::Sqlite,
            seed: true,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    store: Option<String>,
    seed: Option<bool>,
    default_page_size: Option<i64>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the optional settings file, then environment variables.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__STORE") {
        match v.parse() {
            Ok(store) => settings.store = store,
            Err(error) => warn!(%error, "ignoring APP__STORE"),
        }
    }

    if let Some(v) = env("APP__SEED") {
        match v.trim().parse::<bool>() {
            Ok(seed) => settings.seed = seed,
            Err(_) => warn!(value = %v, "ignoring APP__SEED; expected true or false"),
        }
    }

    if let Some(v) = env("APP__DEFAULT_PAGE_SIZE") {
        match v.trim().parse::<i64>() {
            Ok(size) => set_page_size(&mut settings, size),
            Err(_) => warn!(value = %v, "ignoring APP__DEFAULT_PAGE_SIZE"),
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.store {
        match v.parse() {
            Ok(store) => settings.store = store,
            Err(error) => warn!(%error, "ignoring store setting"),
        }
    }
    if let Some(v) = file_cfg.seed {
        settings.seed = v;
    }
    if let Some(v) = file_cfg.default_page_size {
        set_page_size(settings, v);
    }
}

fn set_page_size(settings: &mut Settings, size: i64) {
    if (1..=MAX_PAGE_SIZE).contains(&size) {
        settings.default_page_size = size;
    } else {
        warn!(size, max = MAX_PAGE_SIZE, "ignoring out of range default page size");
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
