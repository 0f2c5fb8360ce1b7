//! Server configuration.
//!
//! Stored as JSON at `<config dir>/morphgallery/config.json`. Missing
//! fields fall back to their defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use morphgallery_protocol::DEFAULT_MAX_UPLOAD_SIZE;
use serde::{Deserialize, Serialize};

use crate::ServerError;

/// Settings of a gallery server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Flat directory holding the stored images.
    pub upload_dir: PathBuf,
    /// Largest accepted upload, in bytes.
    pub max_upload_size: u64,
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,
    /// Public root URL used in item URLs instead of the request's host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from the default location.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load server config, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<PathBuf, ServerError> {
        let path = config_path().ok_or_else(|| {
            ServerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no configuration directory",
            ))
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ServerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "server config saved");
        Ok(())
    }
}

/// Path of the configuration file, if a config directory can be found.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("morphgallery").join("config.json"))
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_size, 52_428_800);
        assert_eq!(config.bind.port(), 8080);
        assert!(config.public_url.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ServerConfig {
            upload_dir: PathBuf::from("/srv/gallery"),
            max_upload_size: 1024,
            bind: "127.0.0.1:9000".parse().unwrap(),
            public_url: Some("https://pics.example.com".into()),
        };

        config.save_to(&path).unwrap();
        assert_eq!(ServerConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_upload_size": 10}"#).unwrap();

        let config = ServerConfig::load_from(&path).unwrap();
        assert_eq!(config.max_upload_size, 10);
        assert_eq!(config.bind.port(), 8080);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ServerConfig::load_from(&path),
            Err(ServerError::Config(_))
        ));
    }
}
