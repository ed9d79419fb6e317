use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `CANTO__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CANTO")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("exclusions.names")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.poll_interval_ms == 0 {
            return Err("audio.poll_interval_ms must be >= 1".to_string());
        }
        if self.audio.low_water_buffers == 0 {
            return Err("audio.low_water_buffers must be >= 1".to_string());
        }
        if self.estimator.workers == 0 {
            return Err("estimator.workers must be >= 1".to_string());
        }
        if self.library.track_extension.trim().trim_start_matches('.').is_empty() {
            return Err("library.track_extension must not be empty".to_string());
        }
        Ok(())
    }

    /// Session state path: the configured one, else the XDG state default.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session.state_path.clone().or_else(default_state_path)
    }
}

/// Resolve the config path from `CANTO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CANTO_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/canto/config.toml`
/// or `~/.config/canto/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("canto").join("config.toml"))
}

/// `$XDG_STATE_HOME/canto/session.toml`, or `~/.local/state/canto/session.toml`.
pub fn default_state_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("canto").join("session.toml"))
}
