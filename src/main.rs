use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use xiaozhi_media::audio::{DeviceState, RodioSink, SharedDeviceState};
use xiaozhi_media::config::{self, Settings};
use xiaozhi_media::playback::PlayMode;
use xiaozhi_media::player::{MediaPlayer, PlayerIo};
use xiaozhi_media::storage::{KvStore, TomlStore};

const HELP: &str = "\
commands:
  play <song>                 fuzzy title search, then play
  index <n>                   play position n of the active playlist
  artist <name>               play up to five tracks by an artist
  file <path>                 play a file by path
  search <query>              list matches
  next | stop | pause | resume
  mode <once|loop|random|order>
  story-mode <once|loop|random|order>
  story [<category>/]<story>  play a story (no argument: random)
  resume-music | resume-story continue from the saved position
  playlist list | play <name> | delete <name> | create <name> <song>, <song>...
  device <idle|listening|speaking|...>  simulate the assistant state
  status | help | quit";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xiaozhi_media=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut settings = config::load_or_default();
    let mut args = env::args().skip(1);
    if let Some(music) = args.next() {
        settings.library.music_root = PathBuf::from(music);
    }
    if let Some(stories) = args.next() {
        settings.library.story_root = PathBuf::from(stories);
    }

    let store = open_store(&settings);
    let sink = Arc::new(RodioSink::open(settings.output.clone())?);
    let device = Arc::new(SharedDeviceState::default());
    let player = MediaPlayer::new(
        settings,
        PlayerIo {
            sink,
            device: device.clone(),
            store,
            battery: None,
        },
    )?;

    player.scan_music_library(None);
    player.scan_story_library(None);
    let status = player.status();
    println!(
        "{} tracks, {} stories. Type `help` for commands.",
        status.tracks, status.stories
    );

    let stdin = io::stdin();
    let mut out = io::stdout();
    write!(out, "> ")?;
    out.flush()?;
    for line in stdin.lock().lines() {
        if !dispatch(&player, &device, line?.trim()) {
            break;
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    player.stop();
    Ok(())
}

fn open_store(settings: &Settings) -> Arc<dyn KvStore> {
    let path = settings
        .storage
        .path
        .clone()
        .or_else(config::default_state_path);
    let Some(path) = path else {
        return Arc::new(TomlStore::in_memory());
    };
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("cannot create {}: {e}", dir.display());
        }
    }
    match TomlStore::open(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("state file unusable, positions will not persist: {e}");
            Arc::new(TomlStore::in_memory())
        }
    }
}

fn report(ok: bool) {
    if !ok {
        println!("failed (see log)");
    }
}

/// Run one command line. Returns `false` to quit.
fn dispatch(player: &MediaPlayer, device: &SharedDeviceState, line: &str) -> bool {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    match cmd {
        "" => {}
        "quit" | "exit" => return false,
        "help" => println!("{HELP}"),
        "play" if arg.is_empty() => report(player.resume()),
        "play" => report(player.play_song(arg)),
        "index" => match arg.parse::<usize>() {
            Ok(n) => report(player.play_index(n)),
            Err(_) => println!("index needs a number"),
        },
        "artist" => report(player.play_by_artist(arg)),
        "file" => report(player.play_from_sd(Path::new(arg))),
        "search" => {
            for (i, e) in player.search(arg, 10).iter().enumerate() {
                println!("{:>2}. {}  ({})", i + 1, e.display(), e.file_path.display());
            }
        }
        "next" => report(player.next()),
        "stop" => report(player.stop()),
        "pause" => report(player.pause()),
        "resume" => report(player.resume()),
        "mode" | "story-mode" => match arg.parse::<PlayMode>() {
            Ok(mode) if cmd == "mode" => report(player.set_play_mode(mode)),
            Ok(mode) => report(player.set_story_mode(mode)),
            Err(e) => println!("{e}"),
        },
        "story" => {
            let ok = match arg.split_once('/') {
                _ if arg.is_empty() => player.play_story(None, None),
                Some((category, "")) => player.play_story(Some(category), None),
                Some((category, story)) => player.play_story(Some(category), Some(story)),
                None => player.play_story(None, Some(arg)),
            };
            report(ok);
        }
        "resume-music" => report(player.resume_saved_playback()),
        "resume-story" => report(player.resume_saved_story_playback()),
        "playlist" => playlist_command(player, arg),
        "device" => match arg.parse::<DeviceState>() {
            Ok(state) => device.set(state),
            Err(e) => println!("{e}"),
        },
        "status" => print_status(player),
        other => println!("unknown command `{other}`; try `help`"),
    }
    true
}

fn playlist_command(player: &MediaPlayer, arg: &str) {
    let (sub, rest) = match arg.split_once(char::is_whitespace) {
        Some((s, r)) => (s, r.trim()),
        None => (arg, ""),
    };
    match sub {
        "list" | "" => {
            for name in player.playlist_names() {
                println!("  {name}");
            }
        }
        "play" => report(player.play_playlist(rest)),
        "delete" => report(player.delete_playlist(rest)),
        "create" => {
            let Some((name, songs)) = rest.split_once(char::is_whitespace) else {
                println!("usage: playlist create <name> <song>, <song>...");
                return;
            };
            let songs: Vec<&str> = songs
                .split([',', '，'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            report(player.create_playlist(name, &songs));
        }
        other => println!("unknown playlist command `{other}`"),
    }
}

fn print_status(player: &MediaPlayer) {
    let s = player.status();
    match &s.now_playing {
        Some(now) => {
            let progress = s.progress.unwrap_or_default();
            println!(
                "{now} [{:?}] {}s, byte {}, {} kbit/s",
                progress.state,
                progress.elapsed_ms / 1000,
                progress.position,
                progress.bitrate_kbps
            );
        }
        None => println!("stopped"),
    }
    println!(
        "mode {} / story mode {} / playlist {} #{} / {} tracks, {} stories",
        s.mode,
        s.story_mode,
        s.playlist,
        s.playlist_position + 1,
        s.tracks,
        s.stories
    );
}
