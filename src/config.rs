use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{store::IpfsCli, utils::read_to_string};

const DEFAULT_IPFS: &str = "ipfs";
const DEFAULT_GATEWAY: &str = "http://localhost:8080";

/// Settings shared by every command, usually left at their defaults.
///
/// `gateway` only shapes the default channel link. Enclosure URLs in the feed
/// use the gateway named in each channel's template.
///
/// ```toml
/// ipfs = "/usr/local/bin/ipfs"
/// gateway = "http://localhost:8080"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    ipfs: PathBuf,
    gateway: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ipfs: PathBuf::from(DEFAULT_IPFS),
            gateway: DEFAULT_GATEWAY.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FailToLoadSettings {
    #[error("Cannot read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid settings file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Settings {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FailToLoadSettings> {
        let path = path.as_ref();
        let content = read_to_string(path)
            .await
            .map_err(|source| FailToLoadSettings::Io {
                path: path.to_path_buf(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| FailToLoadSettings::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self, FailToLoadSettings> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn ipfs(&self) -> &Path {
        &self.ipfs
    }

    pub fn set_ipfs(&mut self, ipfs: impl Into<PathBuf>) {
        self.ipfs = ipfs.into();
    }

    #[must_use]
    pub const fn gateway(&self) -> &str {
        self.gateway.as_str()
    }

    /// Link used for a channel that has no home page of its own
    #[must_use]
    pub fn ipns_link(&self, key: &str) -> String {
        format!("{}/ipns/{key}", self.gateway.trim_end_matches('/'))
    }

    #[must_use]
    pub fn ipfs_cli(&self) -> IpfsCli {
        IpfsCli::new(&self.ipfs)
    }
}
