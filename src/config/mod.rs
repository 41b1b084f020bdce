//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::types::{InstallType, Mode};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "freshgate";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SITE_URL: &str = "http://localhost:8080";
const DEFAULT_RESULTS_STALE_TIME_SECS: u64 = 86_400;
const DEFAULT_HEALTH_TTL_MS: u64 = 180_000;

/// Command-line arguments for the freshgate binary.
#[derive(Debug, Parser)]
#[command(name = "freshgate", version, about = "Freshness-gated results and health API")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FRESHGATE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle serving persisted query results from cache.
    #[arg(
        long = "cache-results-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_results_enabled: Option<bool>,

    /// Override the staleness window of persisted query results.
    #[arg(long = "cache-results-stale-time-seconds", value_name = "SECONDS")]
    pub cache_results_stale_time_seconds: Option<u64>,

    /// Override the health snapshot lifetime.
    #[arg(long = "cache-health-ttl-ms", value_name = "MILLIS")]
    pub cache_health_ttl_ms: Option<u64>,

    /// Override the deployment mode (default|demo|pr|cloud_beta|development).
    #[arg(long = "site-mode", value_name = "MODE")]
    pub site_mode: Option<String>,

    /// Override the install type (unknown|docker_image|bash|heroku).
    #[arg(long = "site-install-type", value_name = "TYPE")]
    pub site_install_type: Option<String>,

    /// Override the public site URL.
    #[arg(long = "site-url", value_name = "URL")]
    pub site_url: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub site: SiteSettings,
    pub pylon: PylonSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub results_enabled: bool,
    pub results_stale_time: Duration,
    pub health_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub mode: Mode,
    pub install_type: InstallType,
    pub url: String,
}

/// Support widget identity. Both values are optional; without a secret no
/// verification hash is produced.
#[derive(Clone, Default)]
pub struct PylonSettings {
    pub app_id: Option<String>,
    pub identity_verification_secret: Option<String>,
}

impl std::fmt::Debug for PylonSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PylonSettings")
            .field("app_id", &self.app_id)
            .field(
                "identity_verification_secret",
                &self.identity_verification_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FRESHGATE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    site: RawSiteSettings,
    pylon: RawPylonSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_results_enabled {
            self.cache.results_enabled = Some(enabled);
        }
        if let Some(seconds) = overrides.cache_results_stale_time_seconds {
            self.cache.results_stale_time_seconds = Some(seconds);
        }
        if let Some(ms) = overrides.cache_health_ttl_ms {
            self.cache.health_ttl_ms = Some(ms);
        }
        if let Some(mode) = overrides.site_mode.as_ref() {
            self.site.mode = Some(mode.clone());
        }
        if let Some(install_type) = overrides.site_install_type.as_ref() {
            self.site.install_type = Some(install_type.clone());
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cache,
            site,
            pylon,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;
        let site = build_site_settings(site)?;
        let pylon = build_pylon_settings(pylon);

        Ok(Self {
            server,
            logging,
            cache,
            site,
            pylon,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = Duration::from_secs(non_zero(
        graceful_secs,
        "server.graceful_shutdown_seconds",
    )?);

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let stale_secs = cache
        .results_stale_time_seconds
        .unwrap_or(DEFAULT_RESULTS_STALE_TIME_SECS);
    let health_ttl_ms = cache.health_ttl_ms.unwrap_or(DEFAULT_HEALTH_TTL_MS);

    // A zero staleness window is allowed and yields a zero expiry buffer.
    Ok(CacheSettings {
        results_enabled: cache.results_enabled.unwrap_or(true),
        results_stale_time: Duration::from_secs(stale_secs),
        health_ttl: Duration::from_millis(non_zero(health_ttl_ms, "cache.health_ttl_ms")?),
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let mode = match site.mode {
        Some(value) => {
            Mode::from_str(&value).map_err(|err| LoadError::invalid("site.mode", err))?
        }
        None => Mode::default(),
    };
    let install_type = match site.install_type {
        Some(value) => InstallType::from_str(&value)
            .map_err(|err| LoadError::invalid("site.install_type", err))?,
        None => InstallType::default(),
    };

    let url = site
        .url
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    if url.is_empty() {
        return Err(LoadError::invalid("site.url", "url must not be empty"));
    }

    Ok(SiteSettings {
        mode,
        install_type,
        url,
    })
}

fn build_pylon_settings(pylon: RawPylonSettings) -> PylonSettings {
    PylonSettings {
        app_id: non_blank(pylon.app_id),
        identity_verification_secret: non_blank(pylon.identity_verification_secret),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    results_enabled: Option<bool>,
    results_stale_time_seconds: Option<u64>,
    health_ttl_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    mode: Option<String>,
    install_type: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPylonSettings {
    app_id: Option<String>,
    identity_verification_secret: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero(value: u64, key: &'static str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
