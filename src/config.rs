//! Configuration parsing for projmirror
//!
//! An optional `projmirror.toml` in the source project folder tunes which
//! directories and files the mirror picks up.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::mirror::{DEFAULT_EXTENSIONS, DEFAULT_IGNORE_DIRS, IgnoreScope, MirrorOptions};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "projmirror.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Directory names skipped while mirroring (case-insensitive)
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// File extensions turned into linked items
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Whether `ignore_dirs` applies below the source root
    #[serde(default)]
    pub ignore_scope: IgnoreScope,

    /// Visit entries in file name order for reproducible output
    #[serde(default = "default_true")]
    pub sort_entries: bool,
}

fn default_ignore_dirs() -> Vec<String> {
    DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()).collect()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_dirs: default_ignore_dirs(),
            extensions: default_extensions(),
            ignore_scope: IgnoreScope::default(),
            sort_entries: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Location of the configuration file inside a source folder, if present
    pub fn find_config(source_dir: &Path) -> Option<PathBuf> {
        let path = source_dir.join(CONFIG_FILE_NAME);
        path.is_file().then_some(path)
    }

    /// Load `explicit` if given, otherwise the source folder's config file,
    /// otherwise the defaults. Returns the path that was read, if any.
    pub fn resolve(source_dir: &Path, explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config(source_dir),
        };

        match path {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Mirror options described by this configuration
    pub fn mirror_options(&self) -> MirrorOptions {
        MirrorOptions {
            ignore_dirs: self.ignore_dirs.clone(),
            extensions: self.extensions.clone(),
            ignore_scope: self.ignore_scope,
            sort_entries: self.sort_entries,
            ..Default::default()
        }
    }
}
