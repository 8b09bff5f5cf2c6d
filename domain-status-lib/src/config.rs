//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and DS_*
//! environment variables, and merging file configurations with proper
//! precedence rules. Resolving the final client settings against CLI flags is
//! left to the caller.

use crate::error::DomainApiError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// API credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsConfig>,

    /// HTTP client settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSection>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// `[credentials]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CredentialsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_code: Option<String>,

    /// Operator identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// `[client]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClientSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// HTTP timeout (as string, e.g., "5s", "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Pause between batch checks (e.g., "500ms", "1s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Default output format: "text", "json" or "csv"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Output formats accepted in `[output] format`.
pub const OUTPUT_FORMATS: &[&str] = &["text", "json", "csv"];

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `File` if the file is missing or unreadable, `Config` if it is not
    /// valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainApiError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainApiError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainApiError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainApiError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG file first, then the home directory file, then the local file;
    /// later files override earlier ones field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainApiError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        if self.verbose {
            for path in &loaded_files {
                info!("loaded config file {}", path.display());
            }
        }

        Ok(merged_config)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-status.toml", "./.domain-status.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-status.toml", "domain-status.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// `$XDG_CONFIG_HOME/domain-status/config.toml`, defaulting to `~/.config`.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-status").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` take precedence.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            credentials: match (lower.credentials, higher.credentials) {
                (Some(lower), Some(higher)) => Some(CredentialsConfig {
                    app_code: higher.app_code.or(lower.app_code),
                    erp: higher.erp.or(lower.erp),
                    token: higher.token.or(lower.token),
                }),
                (lower, higher) => higher.or(lower),
            },
            client: match (lower.client, higher.client) {
                (Some(lower), Some(higher)) => Some(ClientSection {
                    base_url: higher.base_url.or(lower.base_url),
                    timeout: higher.timeout.or(lower.timeout),
                    interval: higher.interval.or(lower.interval),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    format: higher.format.or(lower.format),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainApiError> {
        if let Some(credentials) = &config.credentials {
            for (name, value) in [
                ("app_code", &credentials.app_code),
                ("erp", &credentials.erp),
                ("token", &credentials.token),
            ] {
                if matches!(value, Some(v) if v.trim().is_empty()) {
                    return Err(DomainApiError::config(format!(
                        "credentials.{} must not be empty",
                        name
                    )));
                }
            }
        }

        if let Some(client) = &config.client {
            if let Some(base_url) = &client.base_url {
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(DomainApiError::config(format!(
                        "client.base_url '{}' must start with http:// or https://",
                        base_url
                    )));
                }
            }

            for (name, value) in [("timeout", &client.timeout), ("interval", &client.interval)] {
                if let Some(value) = value {
                    if parse_duration_string(value).is_none() {
                        return Err(DomainApiError::config(format!(
                            "Invalid client.{} '{}'. Use format like '500ms', '5s', '2m'",
                            name, value
                        )));
                    }
                }
            }
        }

        if let Some(format) = config.output.as_ref().and_then(|o| o.format.as_ref()) {
            if !OUTPUT_FORMATS.contains(&format.to_lowercase().as_str()) {
                return Err(DomainApiError::config(format!(
                    "Invalid output.format '{}'. Use one of: {}",
                    format,
                    OUTPUT_FORMATS.join(", ")
                )));
            }
        }

        Ok(())
    }
}

/// Values read from DS_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub app_code: Option<String>,
    pub erp: Option<String>,
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub interval: Option<Duration>,
    pub config: Option<String>,
    pub file: Option<String>,
    pub json: Option<bool>,
}

/// Load configuration from DS_* environment variables.
///
/// Invalid values are logged as warnings and ignored. The token value is
/// never logged.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok(), verbose)
}

/// Same as [`load_env_config`] with an injectable variable source.
pub fn load_env_config_from<F>(lookup: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let report = |key: &str, value: &str| {
        if verbose {
            info!("Using {}={}", key, value);
        }
    };

    let mut env_config = EnvConfig::default();

    for (key, slot) in [
        ("DS_APP_CODE", &mut env_config.app_code),
        ("DS_ERP", &mut env_config.erp),
        ("DS_CONFIG", &mut env_config.config),
        ("DS_FILE", &mut env_config.file),
    ] {
        if let Some(value) = non_empty(key) {
            report(key, &value);
            *slot = Some(value);
        }
    }

    if let Some(token) = non_empty("DS_TOKEN") {
        report("DS_TOKEN", "<redacted>");
        env_config.token = Some(token);
    }

    if let Some(base_url) = non_empty("DS_BASE_URL") {
        if base_url.starts_with("http://") || base_url.starts_with("https://") {
            report("DS_BASE_URL", &base_url);
            env_config.base_url = Some(base_url);
        } else {
            warn!("Invalid DS_BASE_URL='{}', must start with http:// or https://", base_url);
        }
    }

    for (key, slot) in [
        ("DS_TIMEOUT", &mut env_config.timeout),
        ("DS_INTERVAL", &mut env_config.interval),
    ] {
        if let Some(value) = non_empty(key) {
            match parse_duration_string(&value) {
                Some(duration) => {
                    report(key, &value);
                    *slot = Some(duration);
                }
                None => warn!(
                    "Invalid {}='{}', use format like '500ms', '5s', '2m'",
                    key, value
                ),
            }
        }
    }

    if let Some(value) = non_empty("DS_JSON") {
        match parse_bool(&value) {
            Some(json) => {
                report("DS_JSON", &value);
                env_config.json = Some(json);
            }
            None => warn!("Invalid DS_JSON='{}', use true/false", value),
        }
    }

    env_config
}

/// Parse a duration string like "500ms", "5s", "2m"; bare numbers are seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
