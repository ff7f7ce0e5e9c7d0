//! Configuration management for rbeautify.
//!
//! A [`Config`] is assembled from layers, weakest first: `rbeautify.toml`
//! files found around the document, command-line flags, then a
//! `# rbeautify:` directive inside the document itself.
//!
//! Discovery looks in the home directory and in every directory from the
//! filesystem root down to the document's own; nearer files win.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// File names recognized in each searched directory, weakest first
const CONFIG_FILE_NAMES: &[&str] = &["rbeautify.toml", ".rbeautify.toml"];

fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .find_map(|var| std::env::var_os(var))
        .map(PathBuf::from)
}

fn default_indent_unit() -> String {
    "  ".to_string()
}

fn default_impose_indent() -> bool {
    true
}

/// Settings that control reindenting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// String emitted once per depth level (default: two spaces)
    #[serde(default = "default_indent_unit")]
    pub indent_unit: String,

    /// Reindent at all; when false documents are copied unchanged (default: true)
    #[serde(default = "default_impose_indent")]
    pub impose_indent: bool,
}

/// One config file as written
///
/// Every key is optional so that a file only overrides what it mentions.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    /// Number of spaces per level
    pub indent: Option<usize>,
    /// Indent with one tab per level
    pub tabs: Option<bool>,
    /// Literal indent string; wins over `indent` and `tabs`
    pub indent_unit: Option<String>,
    pub impose_indent: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            indent_unit: default_indent_unit(),
            impose_indent: default_impose_indent(),
        }
    }
}

impl Config {
    /// Longest accepted indent unit
    const MAX_INDENT_UNIT: usize = 16;

    /// Describe the first problem with these settings, if any
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        let unit = &self.indent_unit;
        if unit.is_empty() {
            Some("indent_unit must not be empty".to_string())
        } else if unit.chars().any(|c| c != ' ' && c != '\t') {
            Some(format!("indent_unit {unit:?} may only contain spaces and tabs"))
        } else if unit.len() > Self::MAX_INDENT_UNIT {
            Some(format!(
                "indent_unit length {} exceeds maximum of {}",
                unit.len(),
                Self::MAX_INDENT_UNIT
            ))
        } else {
            None
        }
    }

    /// Indent with `width` spaces per level
    pub fn set_indent_width(&mut self, width: usize) {
        self.indent_unit = " ".repeat(width);
    }

    /// Indent with one tab per level
    pub fn set_tabs(&mut self) {
        self.indent_unit = "\t".to_string();
    }

    /// Defaults overlaid with the keys set in one TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply_partial(&read_partial(path)?);
        Ok(config)
    }

    /// Overlay the keys a file actually set
    ///
    /// Within one file `indent_unit` beats `tabs`, which beats `indent`.
    fn apply_partial(&mut self, partial: &PartialConfig) {
        if let Some(width) = partial.indent {
            self.set_indent_width(width);
        }
        if partial.tabs == Some(true) {
            self.set_tabs();
        }
        if let Some(unit) = &partial.indent_unit {
            self.indent_unit.clone_from(unit);
        }
        if let Some(impose) = partial.impose_indent {
            self.impose_indent = impose;
        }
    }

    /// Config files that apply to `start_path`, weakest first
    ///
    /// The home directory comes first, then each directory from the root
    /// down to `start_path` (its parent when it names a file, the working
    /// directory when it does not exist).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        let mut dirs: Vec<PathBuf> = home_dir().into_iter().collect();
        if let Some(dir) = start_dir {
            let mut lineage: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            lineage.reverse();
            dirs.extend(lineage);
        }

        let mut found: Vec<PathBuf> = Vec::new();
        for candidate in dirs
            .iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        {
            // The home directory may also be an ancestor
            if candidate.is_file() && !found.contains(&candidate) {
                found.push(candidate);
            }
        }
        found
    }

    /// Defaults overlaid with every discovered file in turn
    ///
    /// Unreadable or malformed files are logged and skipped.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in Self::discover_config_files(start_path) {
            match read_partial(&path) {
                Ok(partial) => config.apply_partial(&partial),
                Err(e) => warn!("skipping config file {}: {e:#}", path.display()),
            }
        }
        config
    }
}

fn read_partial(path: &Path) -> anyhow::Result<PartialConfig> {
    use anyhow::Context;

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("invalid TOML in {}", path.display()))
}
