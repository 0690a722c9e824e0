//! Bridge Config
//!
//! Settings shared by the listener, the host executor and the capture handler.
//! Loaded from the global store, then the project store merged over it.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

/// Settings file name inside a [`JsonStore`]
pub const BRIDGE_CONFIG_FILE: &str = "config.json";

// ============================================================================
// Bridge Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Interface the listener binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Listener port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long a request waits for its result before answering 504
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cadence the host scheduler uses for the executor tick
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Worker threads of the listener runtime
    #[serde(default = "default_listener_threads")]
    pub listener_threads: usize,

    /// How long `stop()` waits for the listener runtime to wind down
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    #[serde(default)]
    pub render: RenderConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            listener_threads: default_listener_threads(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            render: RenderConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// Global settings, then project settings merged over them.
    ///
    /// A missing global config directory is not an error.
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<PartialConfig>(BRIDGE_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        let project = JsonStore::current_project()?;
        if let Some(project_config) = project.load_optional::<PartialConfig>(BRIDGE_CONFIG_FILE)? {
            config.merge(project_config);
        }

        Ok(config)
    }

    /// Load from one explicit store, falling back to defaults.
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        let mut config = Self::new();
        if let Some(partial) = store.load_optional::<PartialConfig>(BRIDGE_CONFIG_FILE)? {
            config.merge(partial);
        }
        Ok(config)
    }

    pub fn save(&self, store: &JsonStore) -> Result<()> {
        store.save(BRIDGE_CONFIG_FILE, self)
    }

    fn merge(&mut self, other: PartialConfig) {
        if let Some(host) = other.host {
            self.host = host;
        }
        if let Some(port) = other.port {
            self.port = port;
        }
        if let Some(secs) = other.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(ms) = other.tick_interval_ms {
            self.tick_interval_ms = ms;
        }
        if let Some(threads) = other.listener_threads {
            self.listener_threads = threads;
        }
        if let Some(ms) = other.shutdown_grace_ms {
            self.shutdown_grace_ms = ms;
        }
        if let Some(render) = other.render {
            self.render.merge(render);
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs().max(1);
        self
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    /// Listen address; `host` may be an IPv4 or IPv6 literal or a host name.
    ///
    /// Names are resolved and the first address wins. Anything that is not a
    /// syntactically valid name is rejected without a lookup.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let invalid = |reason: String| Error::Config(format!("Invalid listen address {}:{}: {}", self.host, self.port, reason));
        if !is_host_name(host) {
            return Err(invalid("not an IP address or host name".to_string()));
        }
        (host, self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("name did not resolve".to_string()))
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Reject values that would make the bridge unusable.
    ///
    /// Port 0 is allowed (ephemeral port, used by tests).
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("requestTimeoutSecs must be > 0".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tickIntervalMs must be > 0".to_string()));
        }
        if self.listener_threads == 0 {
            return Err(Error::Config("listenerThreads must be > 0".to_string()));
        }
        if self.render.file_stem.is_empty() {
            return Err(Error::Config("render.fileStem must not be empty".to_string()));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(Error::Config("render resolution must be non-zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Render Config
// ============================================================================

/// View capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Directory the capture is written to (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// File name of the capture, without extension
    #[serde(default = "default_file_stem")]
    pub file_stem: String,

    /// Engine used when the host supports it
    #[serde(default = "default_preferred_engine")]
    pub preferred_engine: String,

    /// Engine used otherwise
    #[serde(default = "default_fallback_engine")]
    pub fallback_engine: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_stem: default_file_stem(),
            preferred_engine: default_preferred_engine(),
            fallback_engine: default_fallback_engine(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl RenderConfig {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    fn merge(&mut self, other: PartialRenderConfig) {
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
        if let Some(stem) = other.file_stem {
            self.file_stem = stem;
        }
        if let Some(engine) = other.preferred_engine {
            self.preferred_engine = engine;
        }
        if let Some(engine) = other.fallback_engine {
            self.fallback_engine = engine;
        }
        if let Some(width) = other.width {
            self.width = width;
        }
        if let Some(height) = other.height {
            self.height = height;
        }
    }
}

// ============================================================================
// Partial (file) representation
// ============================================================================

/// What a settings file may contain; absent keys keep the lower layer's value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialConfig {
    host: Option<String>,
    port: Option<u16>,
    request_timeout_secs: Option<u64>,
    tick_interval_ms: Option<u64>,
    listener_threads: Option<usize>,
    shutdown_grace_ms: Option<u64>,
    render: Option<PartialRenderConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialRenderConfig {
    output_dir: Option<PathBuf>,
    file_stem: Option<String>,
    preferred_engine: Option<String>,
    fallback_engine: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Dot-separated labels of ASCII letters, digits and inner hyphens
fn is_host_name(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_listener_threads() -> usize {
    2
}

fn default_shutdown_grace_ms() -> u64 {
    500
}

fn default_file_stem() -> String {
    "agent_view".to_string()
}

fn default_preferred_engine() -> String {
    "EEVEE_NEXT".to_string()
}

fn default_fallback_engine() -> String {
    "EEVEE".to_string()
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}
