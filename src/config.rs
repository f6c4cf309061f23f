//! Configuration loading: category table, exclusion filters and organize
//! options.
//!
//! Configuration is stored in TOML format with the following structure:
//!
//! ```toml
//! [organize]
//! skip_identical = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["tmp"]
//! regex = ['^~\$']
//!
//! [filters.include]
//! patterns = []
//!
//! [[categories]]
//! name = "Images"
//! extensions = [".jpg", ".png"]
//! description = "Pictures"
//! ```
//!
//! Every section is optional. When `categories` is present it replaces the
//! built-in table entirely, in the order written. Hidden files are never
//! organized, whatever the include rules say.

use crate::classifier::FALLBACK_CATEGORY;
use crate::error::ConfigError;
use crate::file_category::{CategoryRule, CategoryTable};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".foldertidy.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeSettings,

    #[serde(default)]
    pub filters: FilterRules,

    /// Replacement category table, in priority order.
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
}

/// Options for the move step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeSettings {
    /// Leave a file in place when an identical copy already sits at its
    /// destination, instead of moving it under a numbered name.
    #[serde(default)]
    pub skip_identical: bool,
}

/// Exclusion filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db", "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, with or without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.foldertidy.toml` in the current directory
    /// 3. Look for `~/.config/foldertidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is not valid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("foldertidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.categories = config
            .categories
            .into_iter()
            .map(CategoryRule::normalized)
            .collect();
        Ok(config)
    }

    /// Builds the category table: the configured one, or the built-in one
    /// when none is configured.
    ///
    /// # Errors
    ///
    /// Rejects duplicate, empty or reserved names and names that are not a
    /// single path component.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        if self.categories.is_empty() {
            return Ok(CategoryTable::default());
        }

        let mut seen = HashSet::new();
        for rule in &self.categories {
            let name = rule.name();
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidCategory(
                    "category name cannot be empty".to_string(),
                ));
            }
            if name == FALLBACK_CATEGORY {
                return Err(ConfigError::InvalidCategory(format!(
                    "'{}' is reserved for unmatched files",
                    FALLBACK_CATEGORY
                )));
            }
            if name.contains(['/', '\\']) || name == "." || name == ".." || name.starts_with('.')
            {
                return Err(ConfigError::InvalidCategory(format!(
                    "'{}' is not a valid directory name",
                    name
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::InvalidCategory(format!(
                    "duplicate category '{}'",
                    name
                )));
            }
        }

        Ok(CategoryTable::new(self.categories.clone()))
    }

    /// Compile the filter rules for matching.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Compiled filter structures for file name matching.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a file should be organized (not excluded).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Exact filename match - if matched, exclude
    /// 3. File extension match - if matched, exclude
    /// 4. Glob pattern match - if matched, exclude
    /// 5. Regex pattern match - if matched, exclude
    /// 6. Default: include
    ///
    /// Hidden files are rejected by the session before filters apply.
    pub fn should_include(&self, file_name: &str) -> bool {
        if self.include_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if let Some((_, ext)) = file_name.rsplit_once('.')
            && self.exclude_extensions.contains(&ext.to_lowercase())
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}
