//! Configuration file wrangling
// (c) 2026 The rconsole authors

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use figment::{Figment, Provider, providers::Env};
use serde::Deserialize;
use tracing::debug;

use super::errors::ConfigFileError;
use super::source::{KEY_PREFIX, KeyValueFile, key_name};
use super::sysdefault::SystemDefault;
use super::{BASE_CONFIG_FILENAME, Configuration, PROJECT_CONFIG_DIR};

/// Processes and merges all configuration sources.
///
/// In increasing order of priority:
/// 1. hard-wired defaults
/// 1. configuration file(s), see [`Manager::config_files`]
/// 1. `RCON_*` environment variables
/// 1. anything merged in later with [`Manager::merge_provider`] (the command line)
///
/// The configuration is read once per process and then treated as immutable.
#[derive(Debug, Clone)]
pub struct Manager {
    data: Figment,
    /// Problems found while reading files. These are reported once logging is up.
    warnings: Vec<String>,
}

impl Manager {
    fn new(apply_env: bool, files: &[PathBuf]) -> Self {
        let mut new1 = Self {
            data: Figment::from(SystemDefault),
            warnings: Vec::new(),
        };
        for f in files {
            new1.add_config(f);
        }
        if apply_env {
            new1.merge_provider(Env::prefixed(KEY_PREFIX));
        }
        new1
    }

    /// General constructor for production use.
    ///
    /// If `explicit` is given, that file is the only one read (and it must exist).
    pub fn standard(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            anyhow::ensure!(p.exists(), "configuration file {} not found", p.display());
        }
        Ok(Self::new(true, &Self::config_files(explicit)))
    }

    /// Testing constructor: defaults only, no files, no environment
    #[cfg(test)]
    #[must_use]
    pub(crate) fn without_files() -> Self {
        Self::new(false, &[])
    }

    /// Defaults and the given files only, ignoring the environment
    #[must_use]
    pub(crate) fn with_files(files: &[PathBuf]) -> Self {
        Self::new(false, files)
    }

    /// Returns the list of configuration files we read, lowest priority first.
    ///
    /// Without an explicit file these are the per-user file and then the
    /// project file, `config/rcon.conf` relative to the working directory.
    #[must_use]
    pub fn config_files(explicit: Option<&Path>) -> Vec<PathBuf> {
        if let Some(p) = explicit {
            return vec![p.to_path_buf()];
        }
        let mut files = Vec::new();
        if let Some(mut p) = dirs::config_dir() {
            p.push(env!("CARGO_PKG_NAME"));
            p.push(BASE_CONFIG_FILENAME);
            files.push(p);
        }
        files.push(Self::project_config_file());
        files
    }

    /// The file `setup` writes to when not told otherwise
    #[must_use]
    pub fn project_config_file() -> PathBuf {
        [PROJECT_CONFIG_DIR, BASE_CONFIG_FILENAME].iter().collect()
    }

    fn add_config(&mut self, path: &Path) {
        if !path.exists() {
            debug!("configuration file {path:?} not present");
            return;
        }
        if let Some(w) = exposure_warning(path) {
            self.warnings.push(w);
        }
        match KeyValueFile::read(path) {
            Ok(kv) => self.merge_provider(kv),
            // Keep going: the fallback transports may still work without it.
            Err(e) => self.warnings.push(format!("{e:#}")),
        }
    }

    /// Problems found while reading configuration files
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    /// This uses figment's `merge` operation, which prefers to _replace_ existing items.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider);
    }

    /// Attempts to extract a particular struct from the data.
    ///
    /// Within rconsole, `T` is usually [Configuration], but it isn't intrinsically required to be.
    pub(crate) fn get<'de, T>(&self) -> Result<T, ConfigFileError>
    where
        T: Deserialize<'de>,
    {
        self.data
            .extract_lossy::<T>()
            .map_err(ConfigFileError::from)
    }

    /// Extracts and validates the [`Configuration`]
    pub fn configuration(&self) -> Result<Configuration> {
        self.get::<Configuration>()?
            .validate()
            .context("invalid configuration")
    }

    /// Where did the value of a field come from?
    fn source_of(&self, field: &str) -> String {
        match self.data.find_metadata(field) {
            Some(md) => match &md.source {
                Some(src) => src.to_string(),
                None => md.name.to_string(),
            },
            None => SystemDefault::META_NAME.to_string(),
        }
    }

    /// Renders the effective configuration, one field per line with its source.
    /// The password is never shown.
    pub fn describe(&self) -> Result<String> {
        let cfg = self.configuration()?;
        let value = serde_json::to_value(&cfg)?;
        let mut out = String::new();
        let _ = writeln!(out, "{:<24} {:<24} {}", "Key", "Value", "Source");
        let _ = writeln!(
            out,
            "{:<24} {:<24} {}",
            key_name("password"),
            cfg.password.to_string(),
            self.source_of("password")
        );
        if let Some(fields) = value.as_object() {
            for (field, v) in fields {
                let v = v.as_str().map_or_else(|| v.to_string(), String::from);
                let _ = writeln!(
                    out,
                    "{:<24} {v:<24} {}",
                    key_name(field),
                    self.source_of(field)
                );
            }
        }
        Ok(out)
    }
}

/// The password lives in this file in plain text, so it should not be readable by others.
#[cfg(unix)]
fn exposure_warning(path: &Path) -> Option<String> {
    use std::os::unix::fs::PermissionsExt as _;
    let mode = std::fs::metadata(path).ok()?.permissions().mode();
    (mode & 0o077 != 0).then(|| {
        format!(
            "{} is accessible by other users (mode {:o}); consider chmod 600",
            path.display(),
            mode & 0o777
        )
    })
}

#[cfg(not(unix))]
fn exposure_warning(_path: &Path) -> Option<String> {
    None
}
