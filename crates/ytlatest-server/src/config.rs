//! Layered configuration: built-in defaults, then `ytlatest.toml`, then
//! `YTLATEST_*` environment variables (`__` separates sections), then `PORT`.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use ytlatest_core::FormatPolicy;
use ytlatest_extractor::AcquisitionStrategy;
use ytlatest_resolver::chromium::DEFAULT_USER_AGENT;

/// Optional configuration file, looked up from the working directory upwards.
pub const CONFIG_FILE: &str = "ytlatest.toml";

/// Prefix for environment overrides, e.g. `YTLATEST_AUDIO__STRATEGY=external-tool`.
pub const ENV_PREFIX: &str = "YTLATEST_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub resolver: ResolverSettings,
    pub audio: AudioSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from every provider.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverSettings {
    /// Seconds to wait for the listing to show a video.
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// Browser identity presented to the listing page.
    pub user_agent: String,
    /// Chrome/Chromium binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 60,
            poll_interval_ms: 250,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_executable: None,
            headless: true,
        }
    }
}

impl ResolverSettings {
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AudioSettings {
    pub strategy: AcquisitionStrategy,
    pub format_policy: FormatPolicy,
    /// `User-Agent` for media requests.
    pub user_agent: String,
    /// JSON cookie export (`[{"name": .., "value": ..}]`) sent with media requests.
    pub cookie_file: Option<PathBuf>,
    pub ytdlp_path: PathBuf,
    /// Browser whose cookie store yt-dlp should read (`chrome`, `firefox`, ...).
    pub cookies_from_browser: Option<String>,
    /// Ceiling on one yt-dlp run, in seconds.
    pub process_timeout_secs: u64,
    /// Parent directory for per-request scratch directories.
    pub temp_root: Option<PathBuf>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            strategy: AcquisitionStrategy::default(),
            format_policy: FormatPolicy::default(),
            user_agent: "Mozilla/5.0".to_string(),
            cookie_file: None,
            ytdlp_path: PathBuf::from("yt-dlp"),
            cookies_from_browser: None,
            process_timeout_secs: 120,
            temp_root: None,
        }
    }
}

impl AudioSettings {
    pub const fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}
