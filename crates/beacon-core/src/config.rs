use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Namespace of the persisted notification entries. Part of the on-disk
/// contract: existing stores written under this name must stay readable.
pub const STORE_NAMESPACE: &str = "LocalNotification";
/// First platform API level that supports the mutable builder path.
pub const MODERN_BUILDER_MIN_API: u32 = 16;
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_TICK_MILLIS: u64 = 1_000;
/// Edits younger than this are treated as update-driven re-triggers.
pub const UPDATE_WINDOW_MS: i64 = 1_000;

/// Top-level config (beacon.toml + BEACON_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

/// Host application identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Used as the notification title when a record carries none.
    #[serde(default = "default_app_name")]
    pub name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Detected capability of the display platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Platform API level; below [`MODERN_BUILDER_MIN_API`] the legacy
    /// immutable-notification path is selected.
    #[serde(default = "default_api_level")]
    pub api_level: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_level: default_api_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding named drawable/sound resources (`res://name`).
    #[serde(default = "default_resource_dir")]
    pub resource_dir: String,
    /// Root for `file://` paths relative to the web bundle.
    #[serde(default = "default_www_dir")]
    pub www_dir: String,
    #[serde(default = "default_icon_uri")]
    pub default_icon: String,
    #[serde(default = "default_sound_uri")]
    pub default_sound: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            resource_dir: default_resource_dir(),
            www_dir: default_www_dir(),
            default_icon: default_icon_uri(),
            default_sound: default_sound_uri(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Events emitted before the host signals readiness are buffered up to
    /// this many; the oldest is dropped beyond it.
    #[serde(default = "default_queue_capacity")]
    pub event_queue_capacity: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

fn default_app_name() -> String {
    "Beacon".to_string()
}

fn default_store_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.beacon/notifications.db", home)
}

fn default_api_level() -> u32 {
    MODERN_BUILDER_MIN_API
}

fn default_resource_dir() -> String {
    "res".to_string()
}

fn default_www_dir() -> String {
    "www".to_string()
}

fn default_icon_uri() -> String {
    "res://icon".to_string()
}

fn default_sound_uri() -> String {
    "res://platform_default".to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_EVENT_QUEUE_CAPACITY
}

fn default_tick_millis() -> u64 {
    DEFAULT_TICK_MILLIS
}

impl BeaconConfig {
    /// Load config: explicit path > ~/.beacon/beacon.toml, then BEACON_* env.
    ///
    /// A missing file is not an error; every section falls back to defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: BeaconConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("BEACON_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.beacon/beacon.toml", home)
}
