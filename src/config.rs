use std::fs;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const DEFAULT_DATABASE_PATH: &str = "data/client.db";

pub const API_BASE_ENV: &str = "FRIENDCHAT_API_BASE";

/// Base URL của API, có thể cố định lúc build qua `FRIENDCHAT_API_BASE`.
pub const DEFAULT_API_BASE: &str = match option_env!("FRIENDCHAT_API_BASE") {
    Some(base) => base,
    None => "http://127.0.0.1:8000",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// CLI/env ghi đè giá trị trong file.
    pub fn with_overrides(mut self, api_base: Option<String>, database_path: Option<String>) -> Self {
        if let Some(api_base) = api_base {
            self.api_base = api_base;
        }
        if let Some(database_path) = database_path {
            self.database_path = database_path;
        }
        self
    }

    pub fn endpoints(&self) -> ClientResult<Endpoints> {
        Endpoints::parse(&self.api_base)
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

/// REST base và URL WebSocket tương ứng (`http→ws`, `https→wss`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_base: Url,
    socket_base: Url,
}

impl Endpoints {
    pub fn parse(api_base: &str) -> ClientResult<Self> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: api_base.to_string(),
            reason,
        };

        let mut api = Url::parse(api_base).map_err(|err| invalid(err.to_string()))?;
        // Url::join thay thế segment cuối nếu thiếu dấu `/`.
        if !api.path().ends_with('/') {
            let path = format!("{}/", api.path());
            api.set_path(&path);
        }

        let socket_scheme = match api.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(invalid(format!("unsupported scheme `{other}`"))),
        };
        let mut socket = api.clone();
        socket
            .set_scheme(socket_scheme)
            .map_err(|()| invalid(format!("cannot switch scheme to {socket_scheme}")))?;

        Ok(Self {
            api_base: api,
            socket_base: socket,
        })
    }

    /// `path` không có dấu `/` ở đầu, ví dụ `friends/list`.
    pub fn api(&self, path: &str) -> ClientResult<Url> {
        self.api_base
            .join(path)
            .map_err(|err| ClientError::InvalidUrl {
                url: format!("{}{path}", self.api_base),
                reason: err.to_string(),
            })
    }

    pub fn chat_socket(&self, token: &str) -> ClientResult<Url> {
        let mut url = self
            .socket_base
            .join("chat/ws")
            .map_err(|err| ClientError::InvalidUrl {
                url: format!("{}chat/ws", self.socket_base),
                reason: err.to_string(),
            })?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}
