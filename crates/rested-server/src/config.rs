use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Start-up settings for the HTTP transport.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// URL prefix the resource tree is mounted under, e.g. `api`.
    pub prefix: String,
    /// Compress responses with gzip when the client accepts it.
    pub gzip: bool,
    /// Indent JSON bodies.
    pub pretty: bool,
    /// Attach a JSON reason to error responses.
    pub debug: bool,
    /// Directory served for paths outside the prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            prefix: "api".into(),
            gzip: true,
            pretty: true,
            debug: false,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The prefix as a path: `"api"` and `"/api/"` both become `"/api"`,
    /// an empty prefix becomes `""`.
    pub fn mount_path(&self) -> String {
        let trimmed = self.prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
