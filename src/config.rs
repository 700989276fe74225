//! Session settings and the optional configuration file.
//!
//! Everything here is resolved by the binary before dispatch; the library
//! itself never reads the environment.

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mail-sender.config.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// When to upgrade the session with STARTTLS.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
pub enum StartTls {
    /// Stay on plain TCP. Credentials are sent in the clear.
    Never,
    /// Upgrade when the relay advertises STARTTLS.
    #[default]
    Opportunistic,
    /// Fail unless the session can be upgraded.
    Required,
}

/// How the `Subject` header is encoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
pub enum SubjectEncoding {
    /// Always emit RFC 2047 encoded words, even for plain ASCII.
    #[default]
    Always,
    /// Only encode subjects containing characters outside printable ASCII.
    WhenNeeded,
}

/// Deadlines for the relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Establishing the TCP connection.
    ///
    /// Default: 30 seconds
    pub connect_secs: u64,

    /// Each command/reply exchange, including the greeting and the TLS
    /// handshake.
    ///
    /// Default: 30 seconds
    pub command_secs: u64,

    /// Transmitting the message and receiving the final verdict.
    ///
    /// Default: 120 seconds (2 minutes)
    pub data_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            command_secs: 30,
            data_secs: 120,
        }
    }
}

impl Timeouts {
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub const fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    #[must_use]
    pub const fn data(&self) -> Duration {
        Duration::from_secs(self.data_secs)
    }
}

/// Knobs for one dispatch, beyond the endpoint and the draft.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The name we introduce ourselves with in EHLO/HELO.
    pub helo_name: String,
    pub starttls: StartTls,
    pub subject_encoding: SubjectEncoding,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            helo_name: "localhost".to_string(),
            starttls: StartTls::default(),
            subject_encoding: SubjectEncoding::default(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Contents of a `mail-sender.config.ron` file.
///
/// Every field is optional; command-line flags and environment variables
/// take precedence over anything set here.
///
/// ```ron
/// (
///     addr: Some("smtp.example.com:587"),
///     user: Some("bot"),
///     to: Some("ops@example.com"),
///     settings: (
///         starttls: Required,
///         timeouts: (command_secs: 10),
///     ),
/// )
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub addr: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub settings: Settings,
}

impl FileConfig {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid RON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration file, if there is one.
    ///
    /// An explicit path must exist. Without one, `./mail-sender.config.ron`
    /// is used when present and built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path is missing, or the file can't
    /// be read or parsed.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let fallback = Path::new(".").join(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            Self::load(&fallback)
        } else {
            Ok(Self::default())
        }
    }
}
