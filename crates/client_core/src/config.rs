use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::protocol::PayloadEncoding;
use tracing::warn;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "predict_client.toml";
pub const DEFAULT_RESULT_LABEL: &str = "Prediction: ";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub server_url: String,
    pub endpoint_path: String,
    pub encoding: PayloadEncoding,
    pub result_label: String,
    /// Unset means the request may wait forever.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            endpoint_path: "/predict".into(),
            encoding: PayloadEncoding::Multipart,
            result_label: DEFAULT_RESULT_LABEL.into(),
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn endpoint_url(&self) -> Result<Url> {
        let base = Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        base.join(&self.endpoint_path).with_context(|| {
            format!(
                "cannot join endpoint path '{}' onto '{}'",
                self.endpoint_path, self.server_url
            )
        })
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the flat TOML file at `path` if readable, then environment
/// values looked up through `env`.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(e) => warn!(path = %path.display(), "ignoring unreadable client config: {e}"),
        }
    }

    if let Some(v) = env("PREDICT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__ENDPOINT_PATH") {
        settings.endpoint_path = v;
    }
    if let Some(v) = env("APP__PAYLOAD_ENCODING") {
        apply_encoding(&mut settings, &v);
    }
    if let Some(v) = env("APP__RESULT_LABEL") {
        settings.result_label = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }

    settings
}

fn apply_file(settings: &mut ClientSettings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("endpoint_path") {
        settings.endpoint_path = v.clone();
    }
    if let Some(v) = file_cfg.get("payload_encoding") {
        apply_encoding(settings, v);
    }
    if let Some(v) = file_cfg.get("result_label") {
        settings.result_label = v.clone();
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        apply_timeout(settings, v);
    }
}

fn apply_encoding(settings: &mut ClientSettings, raw: &str) {
    match raw.parse::<PayloadEncoding>() {
        Ok(encoding) => settings.encoding = encoding,
        Err(e) => warn!("keeping {} payload encoding: {e}", settings.encoding),
    }
}

fn apply_timeout(settings: &mut ClientSettings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(0) => settings.request_timeout_secs = None,
        Ok(secs) => settings.request_timeout_secs = Some(secs),
        Err(_) => warn!(value = raw, "ignoring invalid request timeout"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
