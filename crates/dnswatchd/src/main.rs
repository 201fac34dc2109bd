// # dnswatchd - hosts table daemon
//
// Thin integration layer around `dnswatch_core::Watcher`:
//
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Register inventories and build the configured one
// 4. Run the poll loop until the process is terminated
//
// ## Configuration
//
// ### Scope and naming
// - `DNSWATCH_SCOPE`: Scope tag value to publish (required)
// - `DNSWATCH_SCOPE_TAG`: Tag key carrying the scope (default `substrate:zone`)
// - `DNSWATCH_ROLE_TAG`: Tag key carrying the role (default `substrate:role`)
// - `DNSWATCH_DOMAIN_SUFFIX`: Suffix for every hostname (default `zone.local`)
//
// ### Inventory
// - `DNSWATCH_INVENTORY_TYPE`: `http` (default) or `file`
// - `DNSWATCH_INVENTORY_URL`: Endpoint (for http)
// - `DNSWATCH_INVENTORY_TOKEN`: Bearer token (optional, for http)
// - `DNSWATCH_INVENTORY_PATH`: JSON document (for file)
//
// ### Output
// - `DNSWATCH_OUTPUT_PATH`: Hosts file (default `/etc/dnsmasq/extra-hosts/ec2`)
// - `DNSWATCH_DRY_RUN`: Log the table instead of writing it
//
// ### Schedule
// - `DNSWATCH_STABLE_INTERVAL_SECS`: Sleep after an unchanged cycle (default 60)
// - `DNSWATCH_ACTIVE_INTERVAL_SECS`: Sleep after a publication (default 10)
// - `DNSWATCH_FAILURE_INTERVAL_SECS`: Sleep after a failed cycle (default 120)
//
// ## Example
//
// ```bash
// export DNSWATCH_SCOPE=corp
// export DNSWATCH_INVENTORY_URL=https://inventory.internal/instances
// export DNSWATCH_INVENTORY_TOKEN=your_token
//
// dnswatchd
// ```

use anyhow::{Context, Result};
use dnswatch_core::config::{InventoryConfig, WatchConfig};
use dnswatch_core::traits::HostsSink;
use dnswatch_core::{DryRunSink, FileSink, InventoryRegistry, TokioSleeper, WatchEvent, Watcher};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DnsWatchExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DnsWatchExitCode> for ExitCode {
    fn from(code: DnsWatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration as read from the environment
#[derive(Clone)]
struct Config {
    scope: String,
    scope_tag: Option<String>,
    role_tag: Option<String>,
    domain_suffix: Option<String>,
    inventory_type: String,
    inventory_url: Option<String>,
    inventory_token: Option<String>,
    inventory_path: Option<String>,
    output_path: Option<String>,
    dry_run: bool,
    stable_interval_secs: Option<u64>,
    active_interval_secs: Option<u64>,
    failure_interval_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, treating empty values as unset
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            scope: var("DNSWATCH_SCOPE").unwrap_or_default(),
            scope_tag: var("DNSWATCH_SCOPE_TAG"),
            role_tag: var("DNSWATCH_ROLE_TAG"),
            domain_suffix: var("DNSWATCH_DOMAIN_SUFFIX"),
            inventory_type: var("DNSWATCH_INVENTORY_TYPE").unwrap_or_else(|| "http".to_string()),
            inventory_url: var("DNSWATCH_INVENTORY_URL"),
            inventory_token: var("DNSWATCH_INVENTORY_TOKEN"),
            inventory_path: var("DNSWATCH_INVENTORY_PATH"),
            output_path: var("DNSWATCH_OUTPUT_PATH"),
            dry_run: var("DNSWATCH_DRY_RUN")
                .map(|value| parse_bool("DNSWATCH_DRY_RUN", &value))
                .transpose()?
                .unwrap_or(false),
            stable_interval_secs: parse_var(&var, "DNSWATCH_STABLE_INTERVAL_SECS")?,
            active_interval_secs: parse_var(&var, "DNSWATCH_ACTIVE_INTERVAL_SECS")?,
            failure_interval_secs: parse_var(&var, "DNSWATCH_FAILURE_INTERVAL_SECS")?,
            log_level: var("DNSWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the parts of the configuration only the daemon knows about
    ///
    /// Everything that reaches the core is validated again there.
    fn validate(&self) -> Result<()> {
        if self.scope.is_empty() {
            anyhow::bail!(
                "DNSWATCH_SCOPE is required. \
                Set it via: export DNSWATCH_SCOPE=your_zone"
            );
        }

        match self.inventory_type.as_str() {
            "http" => {
                if self.inventory_url.is_none() {
                    anyhow::bail!(
                        "DNSWATCH_INVENTORY_URL is required when DNSWATCH_INVENTORY_TYPE=http"
                    );
                }
            }
            "file" => {
                if self.inventory_path.is_none() {
                    anyhow::bail!(
                        "DNSWATCH_INVENTORY_PATH is required when DNSWATCH_INVENTORY_TYPE=file"
                    );
                }
            }
            _ => anyhow::bail!(
                "DNSWATCH_INVENTORY_TYPE '{}' is not supported. \
                Supported types: http, file",
                self.inventory_type
            ),
        }

        self.log_level()?;

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn inventory_config(&self) -> InventoryConfig {
        match self.inventory_type.as_str() {
            "file" => InventoryConfig::File {
                path: self.inventory_path.clone().unwrap_or_default(),
            },
            _ => InventoryConfig::Http {
                url: self.inventory_url.clone().unwrap_or_default(),
                token: self.inventory_token.clone(),
                timeout_secs: dnswatch_inventory_http::DEFAULT_HTTP_TIMEOUT.as_secs(),
            },
        }
    }

    /// Build the core configuration, keeping core defaults for unset values
    fn watch_config(&self) -> WatchConfig {
        let mut config = WatchConfig::new(self.scope.clone());
        config.inventory = self.inventory_config();

        if let Some(scope_tag) = &self.scope_tag {
            config.scope_tag = scope_tag.clone();
        }
        if let Some(role_tag) = &self.role_tag {
            config.naming.role_tag = role_tag.clone();
        }
        if let Some(suffix) = &self.domain_suffix {
            config.naming.domain_suffix = suffix.clone();
        }
        if let Some(path) = &self.output_path {
            config.output.path = PathBuf::from(path);
        }
        config.output.dry_run = self.dry_run;

        if let Some(secs) = self.stable_interval_secs {
            config.schedule.stable_interval_secs = secs;
        }
        if let Some(secs) = self.active_interval_secs {
            config.schedule.active_interval_secs = secs;
        }
        if let Some(secs) = self.failure_interval_secs {
            config.schedule.failure_interval_secs = secs;
        }

        config
    }
}

fn parse_var<F, T>(var: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid number: '{}'", key, value))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: '{}'", key, value),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnsWatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnsWatchExitCode::ConfigError.into();
    }

    let watch_config = config.watch_config();
    if let Err(e) = watch_config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DnsWatchExitCode::ConfigError.into();
    }

    // validate() already checked the level
    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsWatchExitCode::ConfigError.into();
    }

    info!("Starting dnswatchd daemon");
    info!(
        "Configuration loaded: scope {}={}, inventory {}",
        watch_config.scope_tag,
        watch_config.scope,
        watch_config.inventory.type_name()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsWatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let watcher = match build_watcher(watch_config).await {
            Ok(watcher) => watcher,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DnsWatchExitCode::ConfigError;
            }
        };

        match run_daemon(watcher).await {
            Ok(()) => DnsWatchExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DnsWatchExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Create the inventory, sink, and watcher
///
/// Any failure here is a startup error.
async fn build_watcher(config: WatchConfig) -> Result<Watcher> {
    let registry = InventoryRegistry::with_builtins();
    dnswatch_inventory_http::register(&registry);
    debug!("Registered inventories: {:?}", registry.list_inventories());

    let inventory = registry
        .create_inventory(&config.inventory)
        .context("Failed to create inventory")?;
    info!("Inventory: {}", inventory.provider_name());

    let sink: Box<dyn HostsSink> = if config.output.dry_run {
        warn!("DRY-RUN mode: the hosts table will be logged, not written");
        Box::new(DryRunSink::new(config.output.path.clone()))
    } else {
        Box::new(
            FileSink::new(&config.output.path)
                .await
                .context("Failed to prepare output file")?,
        )
    };

    let (watcher, events) = Watcher::new(inventory, sink, Box::new(TokioSleeper), config)?;
    tokio::spawn(drain_events(events));

    Ok(watcher)
}

/// Consume watch events so the loop never sees a closed channel
async fn drain_events(mut events: mpsc::Receiver<WatchEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Watch event: {:?}", event);
    }
}

/// Run the poll loop until a termination signal arrives
async fn run_daemon(watcher: Watcher) -> Result<()> {
    tokio::select! {
        _ = watcher.run() => {
            anyhow::bail!("Poll loop exited unexpectedly");
        }
        received = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", received?);
            info!("Shutting down daemon");
        }
    }

    Ok(())
}

/// Wait for SIGTERM or SIGINT
///
/// The loop holds no state worth flushing: the output file is always either
/// the previous or the next complete table.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_URL", "https://inventory.internal/instances"),
        ])
        .unwrap();
        config.validate().unwrap();

        let watch = config.watch_config();
        watch.validate().unwrap();
        assert_eq!(watch.scope, "corp");
        assert_eq!(watch.scope_tag, "substrate:zone");
        assert_eq!(watch.naming.role_tag, "substrate:role");
        assert_eq!(watch.naming.domain_suffix, "zone.local");
        assert_eq!(
            watch.output.path,
            PathBuf::from("/etc/dnsmasq/extra-hosts/ec2")
        );
        assert!(!watch.output.dry_run);
        assert_eq!(watch.inventory.type_name(), "http");

        let schedule = dnswatch_core::Schedule::from_config(&watch.schedule);
        assert_eq!(schedule.stable, Duration::from_secs(60));
        assert_eq!(schedule.active, Duration::from_secs(10));
        assert_eq!(schedule.failure, Duration::from_secs(120));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "lab"),
            ("DNSWATCH_SCOPE_TAG", "env"),
            ("DNSWATCH_ROLE_TAG", "role"),
            ("DNSWATCH_DOMAIN_SUFFIX", "lab.internal"),
            ("DNSWATCH_INVENTORY_TYPE", "file"),
            ("DNSWATCH_INVENTORY_PATH", "/var/lib/dnswatch/inventory.json"),
            ("DNSWATCH_OUTPUT_PATH", "/tmp/hosts/lab"),
            ("DNSWATCH_DRY_RUN", "true"),
            ("DNSWATCH_STABLE_INTERVAL_SECS", "300"),
            ("DNSWATCH_ACTIVE_INTERVAL_SECS", " 5 "),
            ("DNSWATCH_FAILURE_INTERVAL_SECS", "600"),
            ("DNSWATCH_LOG_LEVEL", "DEBUG"),
        ])
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);

        let watch = config.watch_config();
        assert_eq!(watch.scope_tag, "env");
        assert_eq!(watch.naming.role_tag, "role");
        assert_eq!(watch.naming.domain_suffix, "lab.internal");
        assert_eq!(watch.output.path, PathBuf::from("/tmp/hosts/lab"));
        assert!(watch.output.dry_run);
        assert_eq!(watch.schedule.stable_interval_secs, 300);
        assert_eq!(watch.schedule.active_interval_secs, 5);
        assert_eq!(watch.schedule.failure_interval_secs, 600);
        assert_eq!(
            watch.inventory,
            InventoryConfig::File {
                path: "/var/lib/dnswatch/inventory.json".to_string()
            }
        );
    }

    #[test]
    fn test_missing_scope_rejected() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "   "),
            ("DNSWATCH_INVENTORY_URL", "https://inventory.internal/instances"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DNSWATCH_SCOPE is required"));
    }

    #[test]
    fn test_inventory_requirements() {
        let http = config_from(&[("DNSWATCH_SCOPE", "corp")]).unwrap();
        assert!(http.validate().is_err());

        let file = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_TYPE", "file"),
        ])
        .unwrap();
        assert!(file.validate().is_err());

        let unknown = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_TYPE", "ec2"),
        ])
        .unwrap();
        let err = unknown.validate().unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let err = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_STABLE_INTERVAL_SECS", "a minute"),
        ])
        .err()
        .unwrap();
        assert!(format!("{:#}", err).contains("DNSWATCH_STABLE_INTERVAL_SECS"));
    }

    #[test]
    fn test_zero_interval_rejected_by_core() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_URL", "https://inventory.internal/instances"),
            ("DNSWATCH_FAILURE_INTERVAL_SECS", "0"),
        ])
        .unwrap();
        config.validate().unwrap();
        assert!(config.watch_config().validate().is_err());
    }

    #[test]
    fn test_bad_suffix_rejected_by_core() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_URL", "https://inventory.internal/instances"),
            ("DNSWATCH_DOMAIN_SUFFIX", "zone..local"),
        ])
        .unwrap();
        assert!(config.watch_config().validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_URL", "https://inventory.internal/instances"),
            ("DNSWATCH_LOG_LEVEL", "verbose"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_not_in_debug() {
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_URL", "https://inventory.internal/instances"),
            ("DNSWATCH_INVENTORY_TOKEN", "secret_token_12345"),
        ])
        .unwrap();
        let debug_str = format!("{:?}", config.watch_config().inventory);
        assert!(!debug_str.contains("secret_token"));
    }

    #[tokio::test]
    async fn test_build_watcher_from_file_inventory() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("extra-hosts").join("ec2");
        let config = config_from(&[
            ("DNSWATCH_SCOPE", "corp"),
            ("DNSWATCH_INVENTORY_TYPE", "file"),
            ("DNSWATCH_INVENTORY_PATH", "/nonexistent/inventory.json"),
            ("DNSWATCH_OUTPUT_PATH", output.to_str().unwrap()),
        ])
        .unwrap();

        let watcher = build_watcher(config.watch_config()).await;
        assert!(watcher.is_ok());
        assert!(output.parent().unwrap().is_dir(), "output directory is created");
    }
}
