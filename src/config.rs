use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::domain::commit::{DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME, DEFAULT_MESSAGE_TEMPLATE};
use crate::domain::CommitAuthor;
use crate::error::{Result, TagBumpError};

pub const CONFIG_FILE_NAME: &str = "tagbump.toml";
pub const ENV_FILE_NAME: &str = ".env";
pub const USER_ENV: &str = "GIT_USER";
pub const TOKEN_ENV: &str = "GIT_TOKEN";

/// Represents the complete configuration for tagbump.
///
/// Every section is optional in the file; missing values fall back to defaults.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub commit: CommitConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Local override for the environment credentials.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Remote and push policy.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default)]
    pub force: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            remote: default_remote(),
            force: false,
        }
    }
}

fn default_author_name() -> String {
    DEFAULT_AUTHOR_NAME.to_string()
}

fn default_author_email() -> String {
    DEFAULT_AUTHOR_EMAIL.to_string()
}

fn default_message() -> String {
    DEFAULT_MESSAGE_TEMPLATE.to_string()
}

/// Identity and message used for bump commits.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommitConfig {
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,

    /// Message template; `{tag}` is replaced by the desired tag
    #[serde(default = "default_message")]
    pub message: String,
}

impl CommitConfig {
    pub fn author(&self) -> CommitAuthor {
        CommitAuthor::new(&self.author_name, &self.author_email)
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        CommitConfig {
            author_name: default_author_name(),
            author_email: default_author_email(),
            message: default_message(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Deadline for the whole run's network work; 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `tagbump.toml` in current directory
/// 3. `.tagbump.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed, or an explicit
///   path does not exist
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        return load_config_file(Path::new(path));
    }

    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_file(&local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if user.exists() {
            return load_config_file(&user);
        }
    }

    Ok(Config::default())
}

fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        TagBumpError::config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;

    parse_config(&config_str)
        .map_err(|e| TagBumpError::config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Parse a configuration document.
pub fn parse_config(config_str: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(config_str)
}

/// Load `KEY=value` pairs from a dotenv file into the process environment.
///
/// Variables that are already set keep their value. Returns `false` when the
/// file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(TagBumpError::config(format!(
            "Invalid env file {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Username/token pair used for HTTPS basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Credentials {
            user: user.into(),
            token: token.into(),
        }
    }

    /// Resolve credentials from `GIT_USER`/`GIT_TOKEN`, overridden by the
    /// config file's `[credentials]` section.
    pub fn resolve(overrides: &CredentialsConfig) -> Result<Self> {
        Self::resolve_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Same as [`Credentials::resolve`] with an explicit environment lookup.
    pub fn resolve_with<F>(lookup: F, overrides: &CredentialsConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user = pick(overrides.user.as_deref(), lookup(USER_ENV), USER_ENV)?;
        let token = pick(overrides.token.as_deref(), lookup(TOKEN_ENV), TOKEN_ENV)?;
        Ok(Credentials { user, token })
    }
}

fn pick(file_value: Option<&str>, env_value: Option<String>, key: &str) -> Result<String> {
    file_value
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or(env_value.filter(|v| !v.is_empty()))
        .ok_or_else(|| {
            TagBumpError::config(format!(
                "Missing {}: set the environment variable, add it to {} or to [credentials] in {}",
                key, ENV_FILE_NAME, CONFIG_FILE_NAME
            ))
        })
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}
