//! Configuration loader and schema types.
//!
//! This module exposes the settings that size the streaming pipeline, tune
//! the pause coordinator and fuzzy search, and locate the card roots and the
//! persisted state file.

mod load;
mod schema;

pub use load::{default_config_path, default_state_path, resolve_config_path};
pub use schema::*;

/// Load settings, falling back to defaults (with a warning) when the file is
/// unreadable or the values are inconsistent. Config is optional; failures
/// never prevent the engine from starting.
pub fn load_or_default() -> Settings {
    match Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => s,
            Err(msg) => {
                tracing::warn!("invalid config, using defaults: {msg}");
                Settings::default()
            }
        },
        Err(e) => {
            tracing::warn!("failed to load config, using defaults: {e}");
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests;
