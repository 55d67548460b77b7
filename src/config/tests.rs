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
fn resolve_config_path_prefers_explicit_env_var() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XIAOZHI_CONFIG_PATH", "/tmp/xiaozhi-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xiaozhi-test-config.toml")
    );
}

#[test]
fn default_paths_prefer_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let base = std::path::PathBuf::from("/tmp/xdg-config-home").join("xiaozhi-media");
    assert_eq!(default_config_path().unwrap(), base.join("config.toml"));
    assert_eq!(default_state_path().unwrap(), base.join("state.toml"));
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("xiaozhi-media")
            .join("config.toml")
    );
}

#[test]
fn defaults_match_card_layout_and_pipeline_sizes() {
    let s = Settings::default();
    assert_eq!(s.library.music_root, std::path::PathBuf::from("/sdcard/音乐"));
    assert_eq!(s.library.story_root, std::path::PathBuf::from("/sdcard/故事"));
    assert_eq!(s.stream.chunk_size, 4096);
    assert_eq!(s.stream.high_water, 256 * 1024);
    assert_eq!(s.stream.low_water, 32 * 1024);
    assert_eq!(s.stream.resume_backoff, 2048);
    assert_eq!(s.pause.recheck().as_secs(), 2);
    assert_eq!(s.pause.auto_resume().as_secs(), 10);
    assert_eq!(s.output.sample_rate, 24_000);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file_and_parse_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
mode = "shuffle"
story_mode = "repeat"

[library]
music_root = "/mnt/card/music"
extensions = ["mp3"]
include_hidden = true

[stream]
chunk_size = 2048
low_water = 8192

[pause]
recheck_ms = 50
auto_resume_ms = 500

[search]
artist_limit = 3
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("XIAOZHI_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("XIAOZHI__STREAM__CHUNK_SIZE");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.mode, PlayModeSetting::Random);
    assert_eq!(s.playback.story_mode, PlayModeSetting::Loop);
    assert_eq!(s.library.music_root, std::path::PathBuf::from("/mnt/card/music"));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.include_hidden);
    assert_eq!(s.stream.chunk_size, 2048);
    assert_eq!(s.stream.low_water, 8192);
    assert_eq!(s.stream.high_water, 256 * 1024);
    assert_eq!(s.pause.recheck_ms, 50);
    assert_eq!(s.pause.auto_resume_ms, 500);
    assert_eq!(s.search.artist_limit, 3);
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[stream]
chunk_size = 2048
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("XIAOZHI_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("XIAOZHI__STREAM__CHUNK_SIZE", "1024");

    let s = Settings::load().unwrap();
    assert_eq!(s.stream.chunk_size, 1024);
}

#[test]
fn validate_rejects_inverted_water_marks() {
    let mut s = Settings::default();
    s.stream.low_water = s.stream.high_water + 1;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.stream.chunk_size = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.output.max_queued_packets = 0;
    assert!(s.validate().is_err());
}
