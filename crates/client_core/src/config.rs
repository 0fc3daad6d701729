use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    workflow::WorkflowOptions,
};

pub const CONFIG_FILE: &str = "contractiq.toml";
pub const LOCAL_SERVER_URL: &str = "http://localhost:5000";
pub const DEPLOYED_SERVER_URL: &str = "https://vibrationrobotics.com/docusign";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Explicit backend URL; when unset it is derived from `hostname`.
    pub server_url: Option<String>,
    pub hostname: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub auto_analyze: bool,
    pub reanalyze_after_rewrite: bool,
    pub use_ai_positioning: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            hostname: "localhost".into(),
            database_url: "sqlite://./data/contractiq.db".into(),
            request_timeout_secs: 120,
            auto_analyze: true,
            reanalyze_after_rewrite: false,
            use_ai_positioning: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server_url: Option<String>,
    hostname: Option<String>,
    database_url: Option<String>,
    request_timeout_secs: Option<u64>,
    auto_analyze: Option<bool>,
    reanalyze_after_rewrite: Option<bool>,
    use_ai_positioning: Option<bool>,
}

/// Local development hosts talk to the dev server, everything else to the
/// deployed instance.
pub fn resolve_server_url(hostname: &str) -> &'static str {
    match hostname.trim().to_ascii_lowercase().as_str() {
        "localhost" | "127.0.0.1" | "::1" | "[::1]" => LOCAL_SERVER_URL,
        _ => DEPLOYED_SERVER_URL,
    }
}

impl ClientConfig {
    pub fn server_url(&self) -> ClientResult<String> {
        let raw = match self.server_url.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => resolve_server_url(&self.hostname).to_string(),
        };

        let parsed = Url::parse(&raw)
            .map_err(|err| ClientError::Config(format!("server_url '{raw}' is invalid: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "server_url must start with http:// or https://, got '{raw}'"
            )));
        }

        Ok(raw.trim_end_matches('/').to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            auto_analyze: self.auto_analyze,
            reanalyze_after_rewrite: self.reanalyze_after_rewrite,
            use_ai_positioning: self.use_ai_positioning,
        }
    }

    fn apply_file(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<FileConfig>(raw) {
            Ok(file_cfg) => file_cfg,
            Err(err) => {
                warn!("config: ignoring unreadable {CONFIG_FILE}: {err}");
                return;
            }
        };

        if let Some(v) = file_cfg.server_url {
            self.server_url = Some(v);
        }
        if let Some(v) = file_cfg.hostname {
            self.hostname = v;
        }
        if let Some(v) = file_cfg.database_url {
            self.database_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.auto_analyze {
            self.auto_analyze = v;
        }
        if let Some(v) = file_cfg.reanalyze_after_rewrite {
            self.reanalyze_after_rewrite = v;
        }
        if let Some(v) = file_cfg.use_ai_positioning {
            self.use_ai_positioning = v;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CONTRACTIQ_SERVER_URL") {
            self.server_url = Some(v);
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = Some(v);
        }
        if let Some(v) = lookup("APP__HOSTNAME") {
            self.hostname = v;
        }
        if let Some(v) = lookup("APP__DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }
        if let Some(v) = lookup("APP__AUTO_ANALYZE").and_then(|v| parse_flag(&v)) {
            self.auto_analyze = v;
        }
        if let Some(v) = lookup("APP__REANALYZE_AFTER_REWRITE").and_then(|v| parse_flag(&v)) {
            self.reanalyze_after_rewrite = v;
        }
        if let Some(v) = lookup("APP__USE_AI_POSITIONING").and_then(|v| parse_flag(&v)) {
            self.use_ai_positioning = v;
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Defaults, then `contractiq.toml` (or `path`), then environment.
pub fn load_config(path: Option<&Path>) -> ClientConfig {
    let mut config = ClientConfig::default();

    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        config.apply_file(&raw);
    }

    config.apply_env(|key| std::env::var(key).ok());
    config
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
