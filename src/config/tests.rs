use super::load::{default_config_path, default_state_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_canto_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CANTO_CONFIG_PATH", "/tmp/canto-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/canto-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("canto")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("canto")
            .join("config.toml")
    );
}

#[test]
fn default_state_path_falls_back_to_home_local_state() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_state_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir/.local/state/canto/session.toml")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
shuffle = true
loop_playlist = false

[audio]
poll_interval_ms = 20
low_water_buffers = 3

[library]
track_extension = "MUS"
segment_extension = "ogg"
recursive = false
include_hidden = true
follow_links = false

[estimator]
enabled = false
workers = 4

[exclusions]
enabled = true
names = ["SPC1", "spc2.acm"]

[playlist]
export_format = "latin1"

[session]
state_path = "/tmp/canto-session.toml"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CANTO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CANTO__AUDIO__POLL_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert!(s.playback.shuffle);
    assert!(!s.playback.loop_playlist);
    assert_eq!(s.audio.poll_interval_ms, 20);
    assert_eq!(s.audio.low_water_buffers, 3);
    assert_eq!(s.library.track_extension, "MUS");
    assert_eq!(s.library.segment_extension, "ogg");
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert!(!s.estimator.enabled);
    assert_eq!(s.estimator.workers, 4);
    assert!(s.exclusions.enabled);
    assert_eq!(s.exclusions.names, vec!["SPC1".to_string(), "spc2.acm".to_string()]);
    assert!(matches!(s.playlist.export_format, PlaylistFormatSetting::M3u));
    assert_eq!(
        s.session_path(),
        Some(std::path::PathBuf::from("/tmp/canto-session.toml"))
    );
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
poll_interval_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CANTO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CANTO__AUDIO__POLL_INTERVAL_MS", "10");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.poll_interval_ms, 10);
}

#[test]
fn validate_rejects_zero_workers_and_zero_poll_interval() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.estimator.workers = 0;
    assert!(s.validate().unwrap_err().contains("estimator.workers"));

    let mut s = Settings::default();
    s.audio.poll_interval_ms = 0;
    assert!(s.validate().unwrap_err().contains("poll_interval_ms"));
}
