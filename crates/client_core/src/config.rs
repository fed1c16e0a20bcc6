use std::{fs, io::ErrorKind, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub api_token: Option<String>,
    pub project: Option<String>,
    pub user: Option<String>,
    pub notification_lifetime_ms: u64,
    pub dispatcher_capacity: usize,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            api_token: None,
            project: None,
            user: None,
            notification_lifetime_ms: 5000,
            dispatcher_capacity: 64,
            request_timeout_secs: 30,
        }
    }
}

impl ClientSettings {
    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_lifetime_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    api_token: Option<String>,
    project: Option<String>,
    user: Option<String>,
    notification_lifetime_ms: Option<u64>,
    dispatcher_capacity: Option<usize>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `client.toml` in the working directory, then `APP__*` variables.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file_settings(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if file_cfg.api_token.is_some() {
        settings.api_token = file_cfg.api_token;
    }
    if file_cfg.project.is_some() {
        settings.project = file_cfg.project;
    }
    if file_cfg.user.is_some() {
        settings.user = file_cfg.user;
    }
    if let Some(v) = file_cfg.notification_lifetime_ms {
        settings.notification_lifetime_ms = v;
    }
    if let Some(v) = file_cfg.dispatcher_capacity {
        settings.dispatcher_capacity = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Some(v) = lookup("APP__PROJECT") {
        settings.project = Some(v);
    }
    if let Some(v) = lookup("APP__USER") {
        settings.user = Some(v);
    }
    if let Some(parsed) = lookup("APP__NOTIFICATION_LIFETIME_MS").and_then(|v| v.parse().ok()) {
        settings.notification_lifetime_ms = parsed;
    }
    if let Some(parsed) = lookup("APP__DISPATCHER_CAPACITY").and_then(|v| v.parse().ok()) {
        settings.dispatcher_capacity = parsed;
    }
    if let Some(parsed) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = parsed;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
