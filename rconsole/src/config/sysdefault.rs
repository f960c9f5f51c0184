//! The lowest configuration layer
// (c) 2026 The rconsole authors

use figment::value::{Dict, Map};
use figment::{Metadata, Profile, Provider, providers::Serialized};

use super::Configuration;

/// Serves [`Configuration::system_default`] to figment, so that every field
/// has a value and a source even when nothing else sets it
#[derive(Debug, Clone, Copy)]
pub(super) struct SystemDefault;

impl SystemDefault {
    /// Source name shown by `show-config`
    pub(super) const META_NAME: &str = "built-in default";
}

impl Provider for SystemDefault {
    fn metadata(&self) -> Metadata {
        Metadata::named(Self::META_NAME)
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(Configuration::system_default()).data()
    }
}
