use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::{TempDir, tempdir};

use super::*;
use crate::audio::testing::RecordingSink;
use crate::audio::{DeviceState, PcmPacket, SharedDeviceState};
use crate::config::{PlayModeSetting, Settings};
use crate::playback::{PlaybackStore, ResumePoint};
use crate::storage::TomlStore;
use crate::stream::testing::{FRAME_LEN, FakeDecoder, frames};

const WAIT: Duration = Duration::from_secs(5);

fn settings() -> Settings {
    let mut s = Settings::default();
    s.stream.chunk_size = 1024;
    s.stream.pool_slots = 24;
    s.stream.high_water = 16 * 1024;
    s.stream.low_water = 4 * 1024;
    s.stream.resync_step = 1024;
    s.stream.join_timeout_ms = 2_000;
    s.stream.progress_log_frames = 0;
    s.pause.recheck_ms = 10;
    s.pause.auto_resume_ms = 150;
    s.playback.mode = PlayModeSetting::Once;
    s.playback.story_mode = PlayModeSetting::Once;
    s
}

struct FixedBattery;

impl BatterySource for FixedBattery {
    fn battery_level(&self) -> Option<u8> {
        Some(80)
    }

    fn is_charging(&self) -> bool {
        true
    }
}

struct Rig {
    dir: TempDir,
    kv: Arc<TomlStore>,
    sink: Arc<RecordingSink>,
    device: Arc<SharedDeviceState>,
    player: MediaPlayer,
}

impl Rig {
    fn new() -> Self {
        Self::reopen(tempdir().unwrap(), Arc::new(TomlStore::in_memory()))
    }

    /// A fresh player over an existing card and store.
    fn reopen(dir: TempDir, kv: Arc<TomlStore>) -> Self {
        let sink = Arc::new(RecordingSink::new());
        let device = Arc::new(SharedDeviceState::default());
        let io = PlayerIo {
            sink: sink.clone(),
            device: device.clone(),
            store: kv.clone(),
            battery: Some(Arc::new(FixedBattery)),
        };
        let decoders: DecoderFactory =
            Box::new(|| -> Box<dyn FrameDecoder> { Box::new(FakeDecoder::default()) });
        let player = MediaPlayer::with_decoder(settings(), io, decoders).unwrap();
        player.seed_rng(42);
        Self {
            dir,
            kv,
            sink,
            device,
            player,
        }
    }

    fn music_root(&self) -> PathBuf {
        self.dir.path().join("音乐")
    }

    fn story_root(&self) -> PathBuf {
        self.dir.path().join("故事")
    }

    fn add_track(&self, name: &str, frame_count: usize) -> PathBuf {
        let root = self.music_root();
        fs::create_dir_all(&root).unwrap();
        let path = root.join(name);
        fs::write(&path, frames(frame_count)).unwrap();
        path
    }

    fn add_story(&self, category: &str, story: &str, chapter_frames: &[usize]) {
        let dir = self.story_root().join(category).join(story);
        fs::create_dir_all(&dir).unwrap();
        for (i, &n) in chapter_frames.iter().enumerate() {
            fs::write(dir.join(format!("{:02}.mp3", i + 1)), frames(n)).unwrap();
        }
    }

    fn scan(&self) {
        assert!(self.player.scan_music_library(Some(&self.music_root())));
    }

    fn scan_stories(&self) {
        assert!(self.player.scan_story_library(Some(&self.story_root())));
    }

    fn store(&self) -> PlaybackStore {
        PlaybackStore::new(self.kv.clone(), "music")
    }

    fn saved_path(&self) -> Option<PathBuf> {
        self.store().load_music().and_then(|m| m.path)
    }

    /// Stop once at least `packets` packets have been played.
    fn play_until(&self, packets: usize) -> Vec<PcmPacket> {
        assert!(
            wait_until(|| self.sink.packet_count() >= packets),
            "only {} packets played",
            self.sink.packet_count()
        );
        self.player.stop();
        self.sink.packets()
    }

    fn wait_idle(&self) {
        assert!(wait_until(|| self.player.status().now_playing.is_none()));
    }
}

fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Lengths of the per-session packet runs; each session starts at timestamp 0.
fn runs(packets: &[PcmPacket]) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::new();
    for p in packets {
        if p.timestamp_ms == 0 || out.is_empty() {
            out.push(0);
        }
        if let Some(last) = out.last_mut() {
            *last += 1;
        }
    }
    out
}

#[test]
fn once_mode_plays_a_single_track_and_stops() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    let b = rig.add_track("b.mp3", 4);
    rig.scan();

    assert!(rig.player.play_song("b"));
    rig.wait_idle();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(runs(&rig.sink.packets()), vec![4]);

    let saved = rig.store().load_music().unwrap();
    assert_eq!(saved.path, Some(b));
    assert_eq!(saved.point.offset, 0);
}

#[test]
fn order_mode_walks_the_library_and_wraps() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.add_track("b.mp3", 4);
    rig.add_track("c.mp3", 5);
    rig.scan();
    assert!(rig.player.set_play_mode(PlayMode::Order));

    assert!(rig.player.play_index(0));
    let played = runs(&rig.play_until(30));
    assert_eq!(played[..5], [3, 4, 5, 3, 4]);
}

#[test]
fn loop_mode_repeats_the_same_track() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.add_track("b.mp3", 4);
    rig.scan();
    assert!(rig.player.set_play_mode(PlayMode::Loop));

    assert!(rig.player.play_index(1));
    let played = runs(&rig.play_until(20));
    // Each session rewinds once at its first end of file.
    assert_eq!(played[..2], [8, 8]);
}

#[test]
fn random_mode_never_repeats_back_to_back() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.add_track("b.mp3", 4);
    rig.add_track("c.mp3", 5);
    rig.scan();
    assert!(rig.player.set_play_mode(PlayMode::Random));

    assert!(rig.player.play_index(0));
    let played = runs(&rig.play_until(60));
    let complete = &played[..played.len() - 1];
    assert!(complete.len() >= 5, "{played:?}");
    for pair in complete.windows(2) {
        assert_ne!(pair[0], pair[1], "{played:?}");
    }
}

#[test]
fn next_moves_the_cursor_even_after_playback_ended() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    let b = rig.add_track("b.mp3", 3);
    rig.scan();

    assert!(rig.player.play_index(0));
    rig.wait_idle();
    assert!(rig.player.next());
    assert_eq!(rig.saved_path(), Some(b));
    assert_eq!(rig.player.status().playlist_position, 1);
}

#[test]
fn play_index_clamps_past_the_end() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    let b = rig.add_track("b.mp3", 3);
    rig.scan();

    assert!(rig.player.play_index(99));
    assert_eq!(rig.saved_path(), Some(b));
}

#[test]
fn artist_playlist_is_ad_hoc() {
    let rig = Rig::new();
    rig.add_track("周杰伦-晴天.mp3", 3);
    rig.add_track("周杰伦-稻香.mp3", 3);
    rig.add_track("林俊杰-江南.mp3", 3);
    rig.scan();

    assert!(rig.player.play_by_artist("周杰伦"));
    assert_eq!(rig.player.status().playlist, "artist:周杰伦");
    let first = rig.saved_path().unwrap();
    assert!(rig.player.next());
    let second = rig.saved_path().unwrap();

    assert_ne!(first, second);
    for p in [first, second] {
        assert!(p.to_string_lossy().contains("周杰伦"), "{}", p.display());
    }
    assert!(rig.player.playlist_names().is_empty());
    assert!(!rig.player.play_by_artist("王菲"));
}

#[test]
fn files_outside_the_index_play_without_touching_the_resume_point() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.scan();
    let loose = rig.dir.path().join("loose.mp3");
    fs::write(&loose, frames(4)).unwrap();

    assert!(rig.player.play_from_sd(&loose));
    rig.wait_idle();
    assert_eq!(runs(&rig.sink.packets()), vec![4]);
    assert_eq!(rig.store().load_music(), None);

    assert!(!rig.player.play_from_sd(&rig.dir.path().join("missing.mp3")));
}

#[test]
fn saved_offset_resumes_mid_track() {
    let rig = Rig::new();
    let long = rig.add_track("long.mp3", 40);
    rig.scan();
    rig.store()
        .save_music(
            0,
            &long,
            ResumePoint {
                offset: (20 * FRAME_LEN + 100) as u64,
                elapsed_ms: 5_000,
                duration_ms: None,
            },
        )
        .unwrap();

    assert!(rig.player.resume_saved_playback());
    rig.wait_idle();
    let packets = rig.sink.packets();
    // 8192 rounded, backed off to 6144, first full frame is frame 15.
    assert_eq!(packets.len(), 25);
    assert_eq!(packets[0].timestamp_ms, 5_000);
    assert_eq!(rig.store().load_music().unwrap().point.offset, 0);
}

#[test]
fn resume_finds_a_track_that_moved_in_the_index() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    let b = rig.add_track("b.mp3", 4);
    rig.scan();
    rig.store().save_music(0, &b, ResumePoint::default()).unwrap();

    assert!(rig.player.resume_saved_playback());
    rig.wait_idle();
    assert_eq!(runs(&rig.sink.packets()), vec![4]);
}

#[test]
fn resume_without_saved_position_fails() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.scan();
    assert!(!rig.player.resume_saved_playback());
    assert!(!rig.player.resume_saved_story_playback());
}

#[test]
fn manual_pause_holds_until_resume() {
    let rig = Rig::new();
    rig.add_track("long.mp3", 40);
    rig.scan();
    rig.device.set(DeviceState::Speaking);

    assert!(rig.player.play_index(0));
    assert!(rig.player.pause());
    rig.device.set(DeviceState::Idle);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(rig.sink.packet_count(), 0);

    assert!(rig.player.resume());
    rig.wait_idle();
    assert_eq!(rig.sink.packet_count(), 40);
}

#[test]
fn stop_while_device_busy_ends_playback_without_advancing() {
    let rig = Rig::new();
    let a = rig.add_track("a.mp3", 3);
    rig.add_track("b.mp3", 3);
    rig.scan();
    assert!(rig.player.set_play_mode(PlayMode::Order));
    rig.device.set(DeviceState::Speaking);

    assert!(rig.player.play_index(0));
    thread::sleep(Duration::from_millis(50));
    assert!(rig.player.stop());
    rig.device.set(DeviceState::Idle);
    thread::sleep(Duration::from_millis(50));

    assert_eq!(rig.sink.packet_count(), 0);
    assert!(rig.player.status().now_playing.is_none());
    assert_eq!(rig.saved_path(), Some(a));
    assert!(!rig.player.stop());
    assert!(!rig.player.pause());
}

#[test]
fn story_chapters_advance_into_the_next_story() {
    let rig = Rig::new();
    rig.add_story("童话", "三只小猪", &[3, 4, 5]);
    rig.add_story("童话", "小红帽", &[6]);
    rig.scan_stories();
    assert!(rig.player.set_story_mode(PlayMode::Order));

    assert!(rig.player.play_story(Some("童话"), Some("三只小猪")));
    let played = runs(&rig.play_until(30));
    // The last story of a category falls back to a random other story.
    assert_eq!(played[..5], [3, 4, 5, 6, 3]);
}

#[test]
fn story_loop_mode_replays_the_chapter() {
    let rig = Rig::new();
    rig.add_story("童话", "三只小猪", &[3, 4]);
    rig.scan_stories();
    assert!(rig.player.set_story_mode(PlayMode::Loop));

    assert!(rig.player.play_story(None, Some("三只小猪")));
    let played = runs(&rig.play_until(20));
    assert_eq!(played[..2], [6, 6]);
}

#[test]
fn story_position_is_saved_and_resumed() {
    let rig = Rig::new();
    rig.add_story("寓言", "龟兔赛跑", &[3]);
    rig.add_story("童话", "小红帽", &[4, 5]);
    rig.scan_stories();

    assert!(rig.player.play_story_chapter(Some("童话"), "小红帽", 1));
    rig.wait_idle();
    let saved = rig.store().load_story().unwrap();
    assert_eq!((saved.category.as_str(), saved.story.as_str()), ("童话", "小红帽"));
    assert_eq!(saved.chapter, 1);

    let before = rig.sink.packet_count();
    assert!(rig.player.resume_saved_story_playback());
    rig.wait_idle();
    assert_eq!(rig.sink.packet_count() - before, 5);
}

#[test]
fn story_resumes_from_elapsed_time_when_no_offset_was_saved() {
    let rig = Rig::new();
    rig.add_story("童话", "小红帽", &[40]);
    rig.scan_stories();
    let point = ResumePoint {
        offset: 0,
        elapsed_ms: 500,
        duration_ms: Some(1_000),
    };
    rig.store().save_story("童话", "小红帽", 0, point).unwrap();

    assert!(rig.player.resume_saved_story_playback());
    rig.wait_idle();
    // Halfway through 40 frames is byte 8340, rounded to 8192; reading
    // backs off 2 KiB and the first whole frame is the 16th.
    let packets = rig.sink.packets();
    assert_eq!(packets.len(), 25);
    assert_eq!(packets[0].timestamp_ms, 500);
}

#[test]
fn category_only_story_request_stays_in_the_category() {
    let rig = Rig::new();
    rig.add_story("寓言", "龟兔赛跑", &[3]);
    rig.add_story("童话", "小红帽", &[3]);
    rig.add_story("童话", "白雪公主", &[3]);
    rig.scan_stories();

    for _ in 0..5 {
        assert!(rig.player.play_story(Some("童话"), None));
        assert_eq!(rig.store().load_story().unwrap().category, "童话");
    }
    assert!(!rig.player.play_story(Some("科幻"), None));
}

#[test]
fn named_playlists_play_persist_and_delete() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.add_track("b.mp3", 4);
    rig.add_track("c.mp3", 5);
    rig.scan();

    assert!(rig.player.create_playlist("睡前", &["c", "a", "nothing like it"]));
    assert!(!rig.player.create_playlist("空", &["zzzz"]));
    assert_eq!(rig.player.playlist_names(), vec!["睡前".to_string()]);

    assert!(rig.player.set_play_mode(PlayMode::Order));
    assert!(rig.player.play_playlist("睡前"));
    assert_eq!(rig.player.status().playlist, "睡前");
    let played = runs(&rig.play_until(20));
    assert_eq!(played[..3], [5, 3, 5]);
    assert_eq!(rig.store().last_playlist().as_deref(), Some("睡前"));

    assert!(rig.player.delete_playlist("睡前"));
    assert!(!rig.player.delete_playlist("睡前"));
    assert_eq!(rig.player.status().playlist, "default");
    assert!(rig.player.playlist_names().is_empty());
    assert!(!rig.player.play_playlist("睡前"));
}

#[test]
fn last_playlist_and_modes_survive_a_restart() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.add_track("b.mp3", 4);
    rig.scan();
    assert!(rig.player.create_playlist("运动", &["b"]));
    assert!(rig.player.play_playlist("运动"));
    assert!(rig.player.set_play_mode(PlayMode::Random));
    assert!(rig.player.set_story_mode(PlayMode::Loop));
    rig.wait_idle();

    let Rig { dir, kv, player, .. } = rig;
    drop(player);
    let rig = Rig::reopen(dir, kv);
    rig.scan();

    let status = rig.player.status();
    assert_eq!(status.playlist, "运动");
    assert_eq!(status.mode, PlayMode::Random);
    assert_eq!(status.story_mode, PlayMode::Loop);
    assert_eq!(status.tracks, 2);
}

#[test]
fn status_reports_libraries_and_battery() {
    let rig = Rig::new();
    rig.add_track("a.mp3", 3);
    rig.add_story("童话", "小红帽", &[3]);
    rig.scan();
    rig.scan_stories();

    let status = rig.player.status();
    assert_eq!((status.tracks, status.stories), (1, 1));
    assert_eq!(status.battery_level, Some(80));
    assert!(status.charging);
    assert!(status.now_playing.is_none());
    assert_eq!(rig.player.search("a", 3).len(), 1);
    assert!(!rig.player.scan_music_library(Some(Path::new("/definitely/not/here"))));
}
