use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then lets environment
/// variables (prefix `XIAOZHI__`) override it, and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("XIAOZHI")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic consistency checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let s = &self.stream;
        if s.chunk_size == 0 {
            return Err("stream.chunk_size must be >= 1".to_string());
        }
        if s.high_water < s.chunk_size {
            return Err("stream.high_water must be >= stream.chunk_size".to_string());
        }
        if s.low_water > s.high_water {
            return Err("stream.low_water must be <= stream.high_water".to_string());
        }
        if s.pool_slots < 2 {
            return Err("stream.pool_slots must be >= 2".to_string());
        }
        if s.resync_step == 0 {
            return Err("stream.resync_step must be >= 1".to_string());
        }
        if self.pause.recheck_ms == 0 {
            return Err("pause.recheck_ms must be >= 1".to_string());
        }
        if self.search.artist_limit == 0 {
            return Err("search.artist_limit must be >= 1".to_string());
        }
        if self.output.sample_rate == 0 {
            return Err("output.sample_rate must be >= 1".to_string());
        }
        if self.output.max_queued_packets == 0 {
            return Err("output.max_queued_packets must be >= 1".to_string());
        }
        if self.storage.namespace.trim().is_empty() {
            return Err("storage.namespace must not be empty".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `XIAOZHI_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("XIAOZHI_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/xiaozhi-media/config.toml`
/// or `~/.config/xiaozhi-media/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    config_home().map(|d| d.join("xiaozhi-media").join("config.toml"))
}

/// Default location of the persisted resume/playlist store, next to the config file.
pub fn default_state_path() -> Option<PathBuf> {
    config_home().map(|d| d.join("xiaozhi-media").join("state.toml"))
}

fn config_home() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    }
}
