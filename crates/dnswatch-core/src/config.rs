//! Configuration types for dnswatch
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main dnswatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Scope filter value: only instances whose scope tag equals this are listed
    pub scope: String,

    /// Tag key that carries the scope
    #[serde(default = "default_scope_tag")]
    pub scope_tag: String,

    /// Inventory provider configuration
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Hostname synthesis settings
    #[serde(default)]
    pub naming: NamingConfig,

    /// Output artifact settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Poll cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl WatchConfig {
    /// Create a configuration for `scope` with defaults everywhere else
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            scope_tag: default_scope_tag(),
            inventory: InventoryConfig::default(),
            naming: NamingConfig::default(),
            output: OutputConfig::default(),
            schedule: ScheduleConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the settings the poll loop depends on
    ///
    /// The inventory section is validated separately when the provider is
    /// created (see [`InventoryConfig::validate`]), since callers may hand
    /// the `Watcher` an inventory built by other means.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.scope.trim().is_empty() {
            return Err(crate::Error::config("Scope filter cannot be empty"));
        }
        if self.scope_tag.trim().is_empty() {
            return Err(crate::Error::config("Scope tag key cannot be empty"));
        }

        self.naming.validate()?;
        self.output.validate()?;
        self.schedule.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Inventory provider configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryConfig {
    /// JSON inventory endpoint over HTTP(S)
    Http {
        /// Endpoint URL
        url: String,
        /// Optional bearer token
        #[serde(default)]
        token: Option<String>,
        /// Per-request timeout in seconds
        #[serde(default = "default_http_timeout_secs")]
        timeout_secs: u64,
    },

    /// JSON inventory document on disk, re-read on every query
    File {
        /// Path to the document
        path: String,
    },

    /// Custom inventory
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl InventoryConfig {
    /// Validate the inventory configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            InventoryConfig::Http {
                url, timeout_secs, ..
            } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP inventory URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "HTTP inventory URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("HTTP inventory timeout must be > 0"));
                }
                Ok(())
            }
            InventoryConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File inventory path cannot be empty"));
                }
                Ok(())
            }
            InventoryConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom inventory factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom inventory config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the inventory type name
    pub fn type_name(&self) -> &str {
        match self {
            InventoryConfig::Http { .. } => "http",
            InventoryConfig::File { .. } => "file",
            InventoryConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig::Http {
            url: String::new(),
            token: None,
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

// Hides the bearer token
impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryConfig::Http {
                url,
                token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("url", url)
                .field("token", &token.as_ref().map(|_| "<REDACTED>"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            InventoryConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
            InventoryConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Hostname synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Domain suffix appended to every name (e.g. "zone.local")
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,

    /// Tag key carrying the instance role
    #[serde(default = "default_role_tag")]
    pub role_tag: String,
}

impl NamingConfig {
    /// Validate the naming configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.domain_suffix)?;
        if self.role_tag.trim().is_empty() {
            return Err(crate::Error::config("Role tag key cannot be empty"));
        }
        Ok(())
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            domain_suffix: default_domain_suffix(),
            role_tag: default_role_tag(),
        }
    }
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Hosts file consumed by the local resolver
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Log the table instead of writing it
    #[serde(default)]
    pub dry_run: bool,
}

impl OutputConfig {
    /// Validate the output configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.path.file_name().is_none() {
            return Err(crate::Error::config(format!(
                "Output path must name a file. Got: '{}'",
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            dry_run: false,
        }
    }
}

/// Poll cadence, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Sleep after a cycle that found nothing new
    #[serde(default = "default_stable_interval_secs")]
    pub stable_interval_secs: u64,

    /// Sleep after a cycle that published a new table
    ///
    /// Shorter than the stable interval: a change usually means a rolling
    /// deployment is in progress and more changes follow.
    #[serde(default = "default_active_interval_secs")]
    pub active_interval_secs: u64,

    /// Sleep after a failed cycle
    #[serde(default = "default_failure_interval_secs")]
    pub failure_interval_secs: u64,
}

impl ScheduleConfig {
    /// Validate the schedule
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.stable_interval_secs == 0 {
            return Err(crate::Error::config("Stable interval must be > 0"));
        }
        if self.active_interval_secs == 0 {
            return Err(crate::Error::config("Active interval must be > 0"));
        }
        if self.failure_interval_secs == 0 {
            return Err(crate::Error::config("Failure interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            stable_interval_secs: default_stable_interval_secs(),
            active_interval_secs: default_active_interval_secs(),
            failure_interval_secs: default_failure_interval_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the watch event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, and
/// hyphen placement. Not comprehensive, but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }
        validate_label(label).map_err(crate::Error::config)?;
    }

    Ok(())
}

/// Check one DNS label: 1-63 ASCII letters, digits, or hyphens, not
/// starting or ending with a hyphen
///
/// Returns a description of the problem. The label is escaped in it, so
/// the message is safe to log whatever the label contains.
pub fn validate_label(label: &str) -> Result<(), String> {
    if label.is_empty() {
        return Err("Domain label cannot be empty".to_string());
    }

    if label.len() > 63 {
        return Err(format!(
            "Domain label too long: {} chars (max 63). Label: '{}'",
            label.len(),
            label.escape_debug()
        ));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(format!(
            "Domain label contains invalid characters. Label: '{}'. \
            Valid: alphanumeric and hyphen only.",
            label.escape_debug()
        ));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(format!(
            "Domain label cannot start or end with hyphen. Label: '{}'",
            label
        ));
    }

    Ok(())
}

fn default_scope_tag() -> String {
    "substrate:zone".to_string()
}

fn default_domain_suffix() -> String {
    "zone.local".to_string()
}

fn default_role_tag() -> String {
    "substrate:role".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("/etc/dnsmasq/extra-hosts/ec2")
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_stable_interval_secs() -> u64 {
    60
}

fn default_active_interval_secs() -> u64 {
    10
}

fn default_failure_interval_secs() -> u64 {
    120
}

fn default_event_channel_capacity() -> usize {
    100
}
