//! Configuration structure
// (c) 2026 The rconsole authors

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize, de};
use strum::VariantNames as _;

use crate::protocol::{ResponseEnd, SessionSettings};
use crate::util::TimeFormat;

/// The RCON password.
///
/// This never appears in `Debug` or `Display` output, and is never serialized.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(String);

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // The environment provider types `RCON_PASSWORD=1234` as a number.
        struct PasswordVisitor;
        impl de::Visitor<'_> for PasswordVisitor {
            type Value = Password;
            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a password string")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Password, E> {
                Ok(Password::new(v))
            }
            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Password, E> {
                Ok(Password::new(v.to_string()))
            }
            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Password, E> {
                Ok(Password::new(v.to_string()))
            }
            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Password, E> {
                Ok(Password::new(v.to_string()))
            }
        }
        deserializer.deserialize_any(PasswordVisitor)
    }
}

impl Password {
    /// Wraps a password
    #[must_use]
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }
    /// Is there a password at all?
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }
    /// Accessor for the actual secret. Use sparingly.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password({self})")
    }
}

impl std::fmt::Display for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_set() { "********" } else { "<unset>" })
    }
}

/// How to tell that a multi-packet RCON response has finished
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    clap::ValueEnum,
    Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ResponseEndMode {
    /// Wait for a short idle gap (`response_grace`) after the last packet
    #[default]
    Idle,
    /// Take the first response packet only
    FirstPacket,
}

impl<'de> Deserialize<'de> for ResponseEndMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let lower = s.to_ascii_lowercase().replace('_', "-");
        std::str::FromStr::from_str(&lower)
            .map_err(|_| de::Error::unknown_variant(&s, ResponseEndMode::VARIANTS))
    }
}

/// The set of configurable options.
///
/// In configuration files and the environment each field is written in
/// upper case with an `RCON_` prefix, e.g. `RCON_CONNECT_TIMEOUT=10`.
/// See [the configuration module](crate::config) for details.
///
/// There is no `default()`; the hard-wired defaults are in [`Configuration::system_default()`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Configuration {
    // CONNECTION ==================================================================
    /// RCON server host name or address
    pub host: String,
    /// RCON server TCP port
    pub port: u16,
    /// RCON password. Empty means RCON is not configured; only the
    /// stdin and attach fallbacks can work.
    #[serde(default, skip_serializing)]
    pub password: Password,

    // FALLBACK TRANSPORTS =========================================================
    /// Name of the container the server runs in. Empty disables the container-based transports.
    pub container: String,
    /// Container engine CLI (`docker`, `podman`)
    pub container_engine: String,
    /// Name of the structured-protocol client binary (e.g. `rcon-cli`), looked for
    /// both inside the container and on the local `PATH`. Empty disables both.
    pub cli: String,
    /// A `pgrep -f` pattern identifying a server process on this host, for stdin injection.
    /// Empty disables host-side injection.
    pub server_process: String,

    // TIMING ======================================================================
    /// TCP connect timeout [seconds]
    pub connect_timeout: u64,
    /// Timeout waiting for each expected reply [seconds]
    pub read_timeout: u64,
    /// How to detect the end of a multi-packet response
    pub response_end: ResponseEndMode,
    /// Idle gap that ends a response in `idle` mode [milliseconds]
    pub response_grace: u64,
    /// Time allowed for the terminal-attach transport [seconds]
    pub attach_timeout: u64,

    // OUTPUT ======================================================================
    /// Format of log timestamps
    pub time_format: TimeFormat,
}

static SYSTEM_DEFAULT_CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration {
    host: "localhost".into(),
    port: 25575,
    password: Password::default(),

    container: "minecraft-server".into(),
    container_engine: "docker".into(),
    cli: "rcon-cli".into(),
    server_process: String::new(),

    connect_timeout: 5,
    read_timeout: 5,
    response_end: ResponseEndMode::Idle,
    response_grace: 250,
    attach_timeout: 2,

    time_format: TimeFormat::Local,
});

impl Configuration {
    /// Hard-wired configuration defaults
    #[must_use]
    pub fn system_default() -> &'static Self {
        &SYSTEM_DEFAULT_CONFIG
    }

    /// Checks the values for consistency beyond what the types guarantee
    pub fn validate(self) -> Result<Self> {
        anyhow::ensure!(!self.host.trim().is_empty(), "host must not be empty");
        anyhow::ensure!(self.port != 0, "port must be in the range 1-65535");
        anyhow::ensure!(
            self.connect_timeout > 0 && self.read_timeout > 0,
            "timeouts must be at least 1 second"
        );
        anyhow::ensure!(
            self.container.is_empty() || !self.container_engine.is_empty(),
            "a container is configured but the container engine is empty"
        );
        Ok(self)
    }

    /// Connect timeout as a Duration
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Read timeout as a Duration
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    /// Settings for an RCON [`Session`](crate::protocol::Session)
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            connect_timeout: self.connect_timeout(),
            read_timeout: self.read_timeout(),
            response_end: match self.response_end {
                ResponseEndMode::Idle => {
                    ResponseEnd::Idle(Duration::from_millis(self.response_grace))
                }
                ResponseEndMode::FirstPacket => ResponseEnd::FirstPacket,
            },
        }
    }

    /// The longest any single transport attempt may take before we give up on it
    /// and move on to the next.
    ///
    /// An RCON exchange is connect + auth reply + response + grace, so this is
    /// one timeout window: it never allows two full read timeouts back to back.
    #[must_use]
    pub fn attempt_deadline(&self) -> Duration {
        self.connect_timeout() + self.read_timeout() + Duration::from_millis(self.response_grace)
    }
}
