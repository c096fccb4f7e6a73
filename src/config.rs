use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::DeckTuning;
use crate::services::SupabaseTables;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub deck: DeckSettings,
    #[serde(default)]
    pub replay: ReplaySettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    #[serde(default = "default_swipes_table")]
    pub swipes_table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SupabaseSettings {
    /// Both the project URL and the anon key are set
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }

    pub fn tables(&self) -> SupabaseTables {
        SupabaseTables {
            profiles: self.profiles_table.clone(),
            swipes: self.swipes_table.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            profiles_table: default_profiles_table(),
            swipes_table: default_swipes_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_profiles_table() -> String { "profiles".to_string() }
fn default_swipes_table() -> String { "swipes".to_string() }
fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct DeckSettings {
    #[serde(default = "default_trigger_velocity")]
    pub trigger_velocity: f64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_exit_margin")]
    pub exit_margin: f64,
    #[serde(default = "default_friction")]
    pub friction: f64,
    #[serde(default = "default_drag_tension")]
    pub drag_tension: f64,
    #[serde(default = "default_settle_tension")]
    pub settle_tension: f64,
    #[serde(default = "default_exit_tension")]
    pub exit_tension: f64,
    #[serde(default = "default_precision")]
    pub precision: f64,
    #[serde(default = "default_true")]
    pub entry_animation: bool,
    /// Fixes the card tilt layout; random when unset
    #[serde(default)]
    pub seed: Option<u64>,
    /// Maximum number of candidates loaded into one deck
    #[serde(default = "default_deck_size")]
    pub size: usize,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            trigger_velocity: default_trigger_velocity(),
            viewport_width: default_viewport_width(),
            exit_margin: default_exit_margin(),
            friction: default_friction(),
            drag_tension: default_drag_tension(),
            settle_tension: default_settle_tension(),
            exit_tension: default_exit_tension(),
            precision: default_precision(),
            entry_animation: true,
            seed: None,
            size: default_deck_size(),
        }
    }
}

impl From<&DeckSettings> for DeckTuning {
    fn from(s: &DeckSettings) -> Self {
        DeckTuning {
            trigger_velocity: s.trigger_velocity,
            viewport_width: s.viewport_width,
            exit_margin: s.exit_margin,
            friction: s.friction,
            drag_tension: s.drag_tension,
            settle_tension: s.settle_tension,
            exit_tension: s.exit_tension,
            precision: s.precision,
            entry_animation: s.entry_animation,
        }
    }
}

fn default_trigger_velocity() -> f64 { 0.2 }
fn default_viewport_width() -> f64 { 1280.0 }
fn default_exit_margin() -> f64 { 200.0 }
fn default_friction() -> f64 { 50.0 }
fn default_drag_tension() -> f64 { 800.0 }
fn default_settle_tension() -> f64 { 500.0 }
fn default_exit_tension() -> f64 { 200.0 }
fn default_precision() -> f64 { 0.01 }
fn default_deck_size() -> usize { 20 }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaySettings {
    /// Local candidate list; the backend is queried when unset
    #[serde(default)]
    pub candidates_path: Option<PathBuf>,
    #[serde(default = "default_gestures_path")]
    pub gestures_path: PathBuf,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
    /// Sleep between frames instead of simulating time
    #[serde(default)]
    pub realtime: bool,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_password: Option<String>,
    /// Write decisions to the swipes table
    #[serde(default)]
    pub record_decisions: bool,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            candidates_path: None,
            gestures_path: default_gestures_path(),
            frame_ms: default_frame_ms(),
            realtime: false,
            user_email: None,
            user_password: None,
            record_decisions: false,
        }
    }
}

fn default_gestures_path() -> PathBuf { PathBuf::from("demos/gestures.json") }
fn default_frame_ms() -> f64 { 1000.0 / 60.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

fn default_cache_ttl() -> u64 { 300 }
fn default_cache_entries() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SOLO_)
    /// 5. SUPABASE_URL / SUPABASE_ANON_KEY, as issued by the Supabase dashboard
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SOLO__DECK__TRIGGER_VELOCITY -> deck.trigger_velocity
            .add_source(
                Environment::with_prefix("SOLO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_supabase_env(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SOLO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Take the project URL and anon key from the conventional Supabase
/// environment variables when present
fn apply_supabase_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("SUPABASE_URL") {
        builder = builder.set_override("supabase.url", url)?;
    }
    if let Ok(key) = env::var("SUPABASE_ANON_KEY") {
        builder = builder.set_override("supabase.anon_key", key)?;
    }

    builder.build()
}
