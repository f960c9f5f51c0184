//! Configuration error reporting
// (c) 2026 The rconsole authors

use figment::error::{Kind, OneOf};
use thiserror::Error;

use super::source::key_name;

/// A configuration value that could not be used.
///
/// Settings are named the way the user writes them (`RCON_PORT`), and the file
/// or environment that supplied the bad value is given where known.
#[derive(Debug, Error)]
#[error("{problem}{}{}", for_key(.key.as_deref()), in_origin(.origin.as_deref()))]
pub struct ConfigFileError {
    problem: String,
    key: Option<String>,
    origin: Option<String>,
    #[source]
    inner: Box<figment::Error>,
}

fn for_key(key: Option<&str>) -> String {
    key.map(|k| format!(" for {k}")).unwrap_or_default()
}

fn in_origin(origin: Option<&str>) -> String {
    origin.map(|o| format!(" in {o}")).unwrap_or_default()
}

fn describe(kind: &Kind) -> String {
    match kind {
        Kind::InvalidType(found, wanted) | Kind::InvalidValue(found, wanted) => {
            format!("invalid value: found {found}, expected {wanted}")
        }
        Kind::UnknownVariant(found, choices) => {
            format!("unknown value {found}, expected {}", OneOf(choices))
        }
        Kind::MissingField(field) => format!("{} is required", key_name(field)),
        other => other.to_string(),
    }
}

impl From<figment::Error> for ConfigFileError {
    fn from(e: figment::Error) -> Self {
        let origin = e.metadata.as_ref().map(|md| {
            md.source
                .as_ref()
                .map_or_else(|| md.name.to_string(), ToString::to_string)
        });
        Self {
            problem: describe(&e.kind),
            key: e.path.last().map(String::as_str).map(key_name),
            origin,
            inner: Box::new(e),
        }
    }
}

impl ConfigFileError {
    /// The setting at fault (`RCON_PORT`), if the error concerns a single one
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The underlying figment error
    #[must_use]
    pub fn figment(&self) -> &figment::Error {
        &self.inner
    }
}
