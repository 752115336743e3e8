//! Access to the content-addressed storage network.
//!
//! The network is reached through its command-line tool. [`KeyStore`] and [`ContentStore`]
//! describe the handful of calls this crate makes, and [`IpfsCli`] implements them by
//! spawning `ipfs`.

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Identifier of a publishing key, as printed by the storage tool
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

/// Content identifier of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

macro_rules! identifier {
    ($($ty:ty),*) => {
        $(
        impl $ty {
            /// Wrap an identifier string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice
            #[must_use]
            pub const fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.0
            }
        }
        )*
    };
}

identifier!(KeyId, ContentId);

/// A named key known to the storage tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Identifier of the key
    pub id: KeyId,
    /// Local name of the key
    pub name: String,
}

/// Errors raised while talking to the storage tool
#[derive(Debug, Error)]
pub enum StoreError {
    /// The tool could not be started at all
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted
        command: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The tool exited with a non-zero status
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        /// Command line that failed
        command: String,
        /// Exit status description
        status: String,
        /// Captured standard error, trimmed
        stderr: String,
    },
    /// The tool succeeded but printed no identifier
    #[error("`{command}` printed no identifier")]
    EmptyOutput {
        /// Command line that produced nothing
        command: String,
    },
}

/// Generation and bookkeeping of publishing keys
pub trait KeyStore {
    /// Generate a new key under the given name and return its identifier
    fn generate_key(&self, name: &str) -> impl Future<Output = Result<KeyId, StoreError>> + Send;

    /// List every key the tool knows about
    fn list_keys(&self) -> impl Future<Output = Result<Vec<KeyEntry>, StoreError>> + Send;

    /// Remove the key with the given name
    fn remove_key(&self, name: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Uploading content and moving mutable names
pub trait ContentStore {
    /// Upload a file and return its content identifier
    fn upload(&self, path: &Path) -> impl Future<Output = Result<ContentId, StoreError>> + Send;

    /// Point the mutable name of `key` at `content`
    fn publish(
        &self,
        key: &str,
        content: &ContentId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The `ipfs` command-line tool
#[derive(Debug, Clone)]
pub struct IpfsCli {
    binary: PathBuf,
}

impl Default for IpfsCli {
    fn default() -> Self {
        Self::new("ipfs")
    }
}

impl IpfsCli {
    /// Use the given binary, looked up in `PATH` when it is a bare name
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Path of the binary in use
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn run(&self, args: &[OsString]) -> Result<String, StoreError> {
        let command = self.describe(args);
        debug!(%command, "invoking storage tool");

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|source| StoreError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StoreError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run_for_identifier(&self, args: &[OsString]) -> Result<String, StoreError> {
        let id = self.run(args).await?;
        if id.is_empty() {
            return Err(StoreError::EmptyOutput {
                command: self.describe(args),
            });
        }
        Ok(id)
    }

    fn describe(&self, args: &[OsString]) -> String {
        let mut command = self.binary.display().to_string();
        for arg in args {
            command.push(' ');
            command.push_str(&arg.to_string_lossy());
        }
        command
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<OsString> {
    parts.into_iter().map(OsString::from).collect()
}

impl KeyStore for IpfsCli {
    async fn generate_key(&self, name: &str) -> Result<KeyId, StoreError> {
        self.run_for_identifier(&args(["key", "gen", name]))
            .await
            .map(KeyId)
    }

    async fn list_keys(&self) -> Result<Vec<KeyEntry>, StoreError> {
        let listing = self.run(&args(["key", "list", "-l"])).await?;
        Ok(parse_key_listing(&listing))
    }

    async fn remove_key(&self, name: &str) -> Result<(), StoreError> {
        self.run(&args(["key", "rm", name])).await.map(|_| ())
    }
}

impl ContentStore for IpfsCli {
    async fn upload(&self, path: &Path) -> Result<ContentId, StoreError> {
        let mut argv = args(["add", "-Q"]);
        argv.push(path.as_os_str().to_owned());
        self.run_for_identifier(&argv).await.map(ContentId)
    }

    async fn publish(&self, key: &str, content: &ContentId) -> Result<(), StoreError> {
        let key = format!("--key={key}");
        self.run(&args(["name", "publish", &key, content.as_str()]))
            .await
            .map(|_| ())
    }
}

/// Parse `ipfs key list -l` output: one `<id> <name>` pair per line.
fn parse_key_listing(listing: &str) -> Vec<KeyEntry> {
    listing
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let id = parts.next()?;
            let name = parts.next()?;
            Some(KeyEntry {
                id: KeyId::new(id),
                name: name.to_string(),
            })
        })
        .collect()
}
