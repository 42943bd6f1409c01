//! Configuration management for ghdocs.
//!
//! Parses `ghdocs.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `source.repo`
//! - `source.api_url`
//! - `source.token`
//! - `source.default_branch`
//! - `source.local_dir`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override repository identifier (`owner/name`).
    pub repo: Option<String>,
    /// Override local development snapshot directory.
    pub local_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ghdocs.toml";

/// Default documentation file pattern (relative to the repository root).
pub const DEFAULT_DOCS_PATTERN: &str = r"^docs/.+\.md$";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Source host configuration (paths and secrets as raw strings from TOML).
    source: SourceConfigRaw,
    /// Cache sizing and expiry.
    pub cache: CacheConfig,

    /// Resolved source configuration (set after loading).
    #[serde(skip)]
    pub source_resolved: SourceConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Where the list of known versions comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    /// Repository tags endpoint.
    #[default]
    Tags,
    /// Tag names of published (non-draft) releases.
    Releases,
}

/// Raw source configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SourceConfigRaw {
    repo: Option<String>,
    api_url: Option<String>,
    token: Option<String>,
    default_branch: Option<String>,
    local_dir: Option<String>,
    docs_pattern: Option<String>,
    tags_from: Option<TagSource>,
    languages: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

/// Resolved source host configuration.
#[derive(Debug)]
pub struct SourceConfig {
    /// Repository identifier (`owner/name`).
    pub repo: String,
    /// Host API base URL without trailing slash.
    pub api_url: String,
    /// API token (`None` for anonymous access).
    pub token: Option<String>,
    /// Default branch name (e.g. "main").
    pub default_branch: String,
    /// Local snapshot directory backing the `local` ref.
    pub local_dir: Option<PathBuf>,
    /// Regex selecting documentation files inside an archive.
    pub docs_pattern: String,
    /// Source of the known version list.
    pub tags_from: TagSource,
    /// Translation subtrees (`docs/<lang>/`) kept out of the default menu.
    pub languages: Vec<String>,
    /// HTTP timeout for host requests.
    pub timeout: Duration,
}

impl SourceConfig {
    /// Fully qualified ref of the default branch (e.g. `refs/heads/main`).
    #[must_use]
    pub fn default_branch_ref(&self) -> String {
        format!("refs/heads/{}", self.default_branch)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            api_url: "https://api.github.com".to_owned(),
            token: None,
            default_branch: "main".to_owned(),
            local_dir: None,
            docs_pattern: DEFAULT_DOCS_PATTERN.to_owned(),
            tags_from: TagSource::Tags,
            languages: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Cache sizing and expiry configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether cached entries are honored (`false` forces fresh fetches).
    pub enabled: bool,
    /// Maximum number of rendered documents.
    pub max_docs: usize,
    /// Maximum number of menus.
    pub max_menus: usize,
    /// Maximum number of tag and branch lists.
    pub max_lists: usize,
    /// Maximum number of raw files.
    pub max_files: usize,
    /// TTL for content at immutable tag refs.
    pub tag_ttl_secs: u64,
    /// TTL for content at mutable branch refs.
    pub branch_ttl_secs: u64,
    /// TTL for tag and branch lists.
    pub list_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_docs: 300,
            max_menus: 20,
            max_lists: 10,
            max_files: 100,
            tag_ttl_secs: 24 * 60 * 60,
            branch_ttl_secs: 5 * 60,
            list_ttl_secs: 5 * 60,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`source.token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a positive size.
fn require_positive(value: usize, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ghdocs.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// final configuration is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(repo) = &settings.repo {
            self.source_resolved.repo.clone_from(repo);
        }
        if let Some(local_dir) = &settings.local_dir {
            self.source_resolved.local_dir = Some(local_dir.clone());
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache.enabled = cache_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            server: ServerConfig::default(),
            source: SourceConfigRaw::default(),
            cache: CacheConfig::default(),
            source_resolved: SourceConfig::default(),
            config_path: None,
        };
        // No local snapshot unless configured, but resolve relative overrides
        // against the same base a config file would use.
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_source()?;
        self.validate_cache()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate source configuration.
    fn validate_source(&self) -> Result<(), ConfigError> {
        let source = &self.source_resolved;

        require_non_empty(&source.repo, "source.repo")?;
        match source.repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            }
            _ => {
                return Err(ConfigError::Validation(format!(
                    "source.repo must have the form owner/name, got '{}'",
                    source.repo
                )));
            }
        }

        require_non_empty(&source.api_url, "source.api_url")?;
        require_http_url(&source.api_url, "source.api_url")?;
        require_non_empty(&source.default_branch, "source.default_branch")?;

        if let Err(e) = regex::Regex::new(&source.docs_pattern) {
            return Err(ConfigError::Validation(format!(
                "source.docs_pattern is not a valid regex: {e}"
            )));
        }

        if let Some(lang) = source
            .languages
            .iter()
            .find(|l| l.is_empty() || l.contains('/'))
        {
            return Err(ConfigError::Validation(format!(
                "source.languages entries must be single path segments, got '{lang}'"
            )));
        }

        if source.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "source.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate cache configuration.
    fn validate_cache(&self) -> Result<(), ConfigError> {
        require_positive(self.cache.max_docs, "cache.max_docs")?;
        require_positive(self.cache.max_menus, "cache.max_menus")?;
        require_positive(self.cache.max_lists, "cache.max_lists")?;
        require_positive(self.cache.max_files, "cache.max_files")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        let source = &mut self.source;
        expand::expand_opt(&mut source.repo, "source.repo")?;
        expand::expand_opt(&mut source.api_url, "source.api_url")?;
        expand::expand_opt(&mut source.token, "source.token")?;
        expand::expand_opt(&mut source.default_branch, "source.default_branch")?;
        expand::expand_opt(&mut source.local_dir, "source.local_dir")?;

        Ok(())
    }

    /// Resolve raw source settings against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.source;
        let defaults = SourceConfig::default();

        self.source_resolved = SourceConfig {
            repo: raw.repo.clone().unwrap_or(defaults.repo),
            api_url: raw
                .api_url
                .as_deref()
                .map_or(defaults.api_url, |url| url.trim_end_matches('/').to_owned()),
            token: raw.token.clone(),
            default_branch: raw.default_branch.clone().unwrap_or(defaults.default_branch),
            local_dir: raw.local_dir.as_deref().map(|dir| config_dir.join(dir)),
            docs_pattern: raw.docs_pattern.clone().unwrap_or(defaults.docs_pattern),
            tags_from: raw.tags_from.unwrap_or_default(),
            languages: raw.languages.clone().unwrap_or_default(),
            timeout: raw
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
        };
    }
}
