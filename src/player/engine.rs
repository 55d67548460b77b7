//! Shared state behind [`MediaPlayer`](super::MediaPlayer).
//!
//! Lock order: `switch`, then `state`, then `session`. `rng` and the store
//! are leaves. The finish hook runs on a decoder thread and takes none of
//! the player locks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::audio::{AudioSink, BatterySource, DeviceStateSource};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::event::{EVENT_TRACK_FINISHED, EventGroup};
use crate::library::{
    MusicEntry, MusicIndex, MusicLibrary, StoryIndex, StoryLibrary, read_duration,
};
use crate::playback::{
    PlayMode, PlaybackStore, PlaylistState, ResumePoint, StartAt, StoryCursor,
    next_chapter_in_story,
};
use crate::stream::{FinishHook, SessionIo, SessionReport, StreamOptions, StreamingSession};

use super::types::{NowPlaying, PlayerStatus};
use super::{DecoderFactory, PlayerIo};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn duration_ms(entry: &MusicEntry) -> Option<u64> {
    entry.duration.and_then(|d| u64::try_from(d.as_millis()).ok())
}

struct PlayerState {
    mode: PlayMode,
    story_mode: PlayMode,
    playlist: PlaylistState,
    /// Target of the running session, if any.
    now: Option<NowPlaying>,
    /// Target of the most recent session, kept after it ends.
    last: Option<NowPlaying>,
}

pub(super) struct Engine {
    settings: Settings,
    music: MusicLibrary,
    stories: StoryLibrary,
    sink: Arc<dyn AudioSink>,
    device: Arc<dyn DeviceStateSource>,
    battery: Option<Arc<dyn BatterySource>>,
    decoders: DecoderFactory,
    store: PlaybackStore,
    pub(super) events: EventGroup,
    state: Mutex<PlayerState>,
    session: Mutex<Option<StreamingSession>>,
    /// Held by everything that replaces or ends the running session.
    switch: Mutex<()>,
    /// Id of the newest session; bumped again by an explicit stop.
    session_seq: AtomicU64,
    /// Id of the last session that ran to its end on its own.
    finished_seq: AtomicU64,
    rng: Mutex<StdRng>,
}

impl Engine {
    pub(super) fn new(settings: Settings, io: PlayerIo, decoders: DecoderFactory) -> Self {
        let store = PlaybackStore::new(io.store, settings.storage.namespace.clone());
        let (mode, story_mode) = store.load_modes();
        let state = PlayerState {
            mode: mode.unwrap_or_else(|| settings.playback.mode.into()),
            story_mode: story_mode.unwrap_or_else(|| settings.playback.story_mode.into()),
            playlist: PlaylistState::full_library(),
            now: None,
            last: None,
        };
        debug!(mode = %state.mode, story_mode = %state.story_mode, "player state loaded");

        Self {
            music: MusicLibrary::new(settings.library.clone()),
            stories: StoryLibrary::new(settings.library.clone()),
            settings,
            sink: io.sink,
            device: io.device,
            battery: io.battery,
            decoders,
            store,
            events: EventGroup::new(),
            state: Mutex::new(state),
            session: Mutex::new(None),
            switch: Mutex::new(()),
            session_seq: AtomicU64::new(0),
            finished_seq: AtomicU64::new(0),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub(super) fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(super) fn seed_rng(&self, seed: u64) {
        *lock(&self.rng) = StdRng::seed_from_u64(seed);
    }

    // --- library -------------------------------------------------------

    pub(super) fn scan_music(&self, root: Option<&Path>) -> Result<usize> {
        let root = root.map_or_else(|| self.settings.library.music_root.clone(), Path::to_path_buf);
        let count = self.music.scan(&root)?;
        let index = self.music.snapshot();

        let mut st = lock(&self.state);
        if st.playlist.is_full_library() {
            if let Some(name) = self.store.last_playlist() {
                if let Some(paths) = self.store.load_playlist(&name) {
                    info!(playlist = %name, "restoring last playlist");
                    st.playlist = PlaylistState::custom(name, paths, &index);
                }
            }
        }
        st.playlist.resolve(&index);
        Ok(count)
    }

    pub(super) fn scan_stories(&self, root: Option<&Path>) -> Result<usize> {
        let root = root.map_or_else(|| self.settings.library.story_root.clone(), Path::to_path_buf);
        self.stories.scan(&root)
    }

    pub(super) fn music_snapshot(&self) -> Arc<MusicIndex> {
        self.music.snapshot()
    }

    pub(super) fn story_snapshot(&self) -> Arc<StoryIndex> {
        self.stories.snapshot()
    }

    pub(super) fn search(&self, query: &str, limit: usize) -> Vec<MusicEntry> {
        let index = self.music.snapshot();
        index
            .search_ranked(query, limit, &self.settings.search)
            .into_iter()
            .filter_map(|r| index.get(r.index).cloned())
            .collect()
    }

    // --- sessions ------------------------------------------------------

    /// Stop whatever is playing and start `target`. Callers hold `switch`.
    fn switch_to(
        self: &Arc<Self>,
        target: NowPlaying,
        start: StartAt,
        rewind_on_eof: bool,
    ) -> Result<()> {
        self.stop_session();
        let seq = self.session_seq.fetch_add(1, Ordering::SeqCst) + 1;

        // A crash mid-track still resumes the right file.
        self.save_position(
            &target,
            ResumePoint {
                offset: start.offset,
                elapsed_ms: start.elapsed_ms,
                duration_ms: None,
            },
        );

        let weak = Arc::downgrade(self);
        let finished = target.clone();
        let on_finish: FinishHook = Box::new(move |report| {
            if let Some(engine) = weak.upgrade() {
                engine.session_finished(seq, &finished, &report);
            }
        });
        let io = SessionIo {
            sink: Arc::clone(&self.sink),
            device: Arc::clone(&self.device),
            decoder: (self.decoders)(),
        };
        let options = StreamOptions {
            path: target.path().to_path_buf(),
            start_offset: start.offset,
            start_elapsed_ms: start.elapsed_ms,
            rewind_on_eof,
        };
        let session = StreamingSession::start(
            options,
            io,
            &self.settings.stream,
            &self.settings.pause,
            on_finish,
        )?;

        info!(now_playing = %target, offset = start.offset, "playback started");
        *lock(&self.session) = Some(session);
        let mut st = lock(&self.state);
        st.last = Some(target.clone());
        st.now = Some(target);
        Ok(())
    }

    /// Stop and join the running session, if any.
    fn stop_session(&self) -> bool {
        let old = lock(&self.session).take();
        lock(&self.state).now = None;
        match old {
            Some(mut session) => {
                if !session.stop() {
                    warn!(path = %session.path().display(), "session threads detached on stop");
                }
                true
            }
            None => false,
        }
    }

    /// Finish hook body; runs on the decoder thread.
    fn session_finished(&self, seq: u64, target: &NowPlaying, report: &SessionReport) {
        let point = if report.completed {
            ResumePoint::default()
        } else {
            ResumePoint {
                offset: report.position,
                elapsed_ms: report.elapsed_ms,
                duration_ms: report.duration_estimate_ms,
            }
        };
        self.save_position(target, point);

        if !report.completed || report.stopped || self.session_seq.load(Ordering::SeqCst) != seq {
            return;
        }
        if self.device.device_state().is_idle() {
            self.finished_seq.store(seq, Ordering::SeqCst);
            self.events.set(EVENT_TRACK_FINISHED);
        } else {
            debug!(now_playing = %target, "device busy at end of track, not advancing");
        }
    }

    fn save_position(&self, target: &NowPlaying, point: ResumePoint) {
        let saved = match target {
            NowPlaying::Track {
                index,
                path,
                duration_ms,
                ..
            } => self.store.save_music(
                *index,
                path,
                ResumePoint {
                    duration_ms: duration_ms.or(point.duration_ms),
                    ..point
                },
            ),
            NowPlaying::Chapter {
                category,
                story,
                chapter,
                ..
            } => self.store.save_story(category, story, *chapter, point),
            NowPlaying::File { .. } => Ok(()),
        };
        if let Err(e) = saved {
            warn!("failed to save playback position: {e}");
        }
    }

    // --- music ---------------------------------------------------------

    /// Play the current entry of `playlist` and make it the active playlist.
    fn play_track(
        self: &Arc<Self>,
        index: &MusicIndex,
        playlist: PlaylistState,
        start: StartAt,
    ) -> Result<()> {
        let track = playlist
            .current_track()
            .ok_or_else(|| Error::NotFound("playlist is empty".to_string()))?;
        let entry = index
            .get(track)
            .ok_or_else(|| Error::NotFound(format!("track {track}")))?;
        let target = NowPlaying::Track {
            index: track,
            path: entry.file_path.clone(),
            title: entry.display(),
            duration_ms: duration_ms(entry),
        };
        let rewind = lock(&self.state).mode == PlayMode::Loop;
        self.switch_to(target, start, rewind)?;

        let mut st = lock(&self.state);
        if st.playlist.name != playlist.name {
            self.remember_playlist(&playlist);
        }
        st.playlist = playlist;
        Ok(())
    }

    fn remember_playlist(&self, playlist: &PlaylistState) {
        let saved = if playlist.is_full_library() {
            self.store.set_last_playlist(None)
        } else if self.store.load_playlist(&playlist.name).is_some() {
            self.store.set_last_playlist(Some(&playlist.name))
        } else {
            Ok(())
        };
        if let Err(e) = saved {
            warn!("failed to save last playlist: {e}");
        }
    }

    /// The active playlist positioned on `track`, or the full library when
    /// the active one does not contain it.
    fn playlist_at(&self, index: &MusicIndex, track: usize) -> PlaylistState {
        let mut playlist = lock(&self.state).playlist.clone();
        let position = match playlist.position_of(track) {
            Some(p) => p,
            None => {
                playlist = PlaylistState::full_library();
                track
            }
        };
        let len = playlist.len(index.len());
        playlist.set_play_index(position, len);
        playlist
    }

    pub(super) fn play_index(self: &Arc<Self>, position: usize) -> Result<()> {
        let _switch = lock(&self.switch);
        let index = self.music.snapshot();
        let mut playlist = lock(&self.state).playlist.clone();
        let len = playlist.len(index.len());
        playlist
            .set_play_index(position, len)
            .ok_or_else(|| Error::NotFound("playlist is empty".to_string()))?;
        self.play_track(&index, playlist, StartAt::default())
    }

    pub(super) fn play_song(self: &Arc<Self>, query: &str) -> Result<()> {
        let _switch = lock(&self.switch);
        let index = self.music.snapshot();
        let track = index
            .search(query, &self.settings.search)
            .ok_or_else(|| Error::NotFound(format!("song {query:?}")))?;
        let playlist = self.playlist_at(&index, track);
        self.play_track(&index, playlist, StartAt::default())
    }

    pub(super) fn play_by_artist(self: &Arc<Self>, artist: &str) -> Result<()> {
        let _switch = lock(&self.switch);
        let index = self.music.snapshot();
        let tracks = index.find_by_artist(artist, &self.settings.search, &mut *lock(&self.rng));
        if tracks.is_empty() {
            return Err(Error::NotFound(format!("artist {artist:?}")));
        }
        let paths: Vec<PathBuf> = tracks
            .iter()
            .filter_map(|&i| index.get(i))
            .map(|e| e.file_path.clone())
            .collect();
        let mut playlist = PlaylistState::custom(format!("artist:{artist}"), paths, &index);
        playlist.set_play_index(0, playlist.len(index.len()));
        info!(artist, tracks = tracks.len(), "playing artist");
        self.play_track(&index, playlist, StartAt::default())
    }

    /// Play a file by path. Indexed files join the playlist cursor.
    pub(super) fn play_file(self: &Arc<Self>, path: &Path) -> Result<()> {
        let _switch = lock(&self.switch);
        let index = self.music.snapshot();
        match index.find_by_path(path) {
            Some(track) => {
                let playlist = self.playlist_at(&index, track);
                self.play_track(&index, playlist, StartAt::default())
            }
            None => self.switch_to(
                NowPlaying::File {
                    path: path.to_path_buf(),
                },
                StartAt::default(),
                false,
            ),
        }
    }

    /// Pick the next track per the music mode. `auto` is an end-of-track
    /// advance; a command always moves on. `Ok(false)` means nothing follows.
    fn advance_music(self: &Arc<Self>, auto: bool) -> Result<bool> {
        let index = self.music.snapshot();
        let (mode, mut playlist) = {
            let st = lock(&self.state);
            (st.mode, st.playlist.clone())
        };
        let len = playlist.len(index.len());
        let next = match mode {
            PlayMode::Once if auto => return Ok(false),
            PlayMode::Loop if auto => playlist.set_play_index(playlist.current_index, len),
            PlayMode::Random => playlist.next_random(len, &mut *lock(&self.rng)),
            _ => playlist.next_order(len),
        };
        if next.is_none() {
            return Err(Error::NotFound("playlist is empty".to_string()));
        }
        self.play_track(&index, playlist, StartAt::default())?;
        Ok(true)
    }

    // --- stories -------------------------------------------------------

    fn play_chapter(self: &Arc<Self>, index: &StoryIndex, at: StoryCursor, start: StartAt) -> Result<()> {
        let entry = index
            .get(at.story)
            .ok_or_else(|| Error::NotFound(format!("story {}", at.story)))?;
        let path = entry.chapter(at.chapter).ok_or_else(|| {
            Error::NotFound(format!("chapter {} of {}", at.chapter + 1, entry.story_name))
        })?;
        let target = NowPlaying::Chapter {
            category: entry.category.clone(),
            story: entry.story_name.clone(),
            chapter: at.chapter,
            path: path.to_path_buf(),
        };
        let rewind = lock(&self.state).story_mode == PlayMode::Loop;
        self.switch_to(target, start, rewind)
    }

    /// Start a story. Without a story name a random story is picked, from
    /// `category` when given.
    pub(super) fn play_story(
        self: &Arc<Self>,
        category: Option<&str>,
        story: Option<&str>,
        chapter: usize,
    ) -> Result<()> {
        let _switch = lock(&self.switch);
        let index = self.stories.snapshot();
        let search = &self.settings.search;

        let category = match category {
            Some(c) => Some(
                index
                    .find_category(c, search)
                    .ok_or_else(|| Error::NotFound(format!("story category {c:?}")))?,
            ),
            None => None,
        };
        let found = match (category, story) {
            (Some(c), Some(s)) => index
                .find_story_in_category(c, s, search)
                .or_else(|| index.find_story(s, search)),
            (None, Some(s)) => index.find_story(s, search),
            (Some(c), None) => index
                .category(c)
                .and_then(|cat| cat.stories.choose(&mut *lock(&self.rng)).copied()),
            (None, None) => {
                let all: Vec<usize> = (0..index.len()).collect();
                all.choose(&mut *lock(&self.rng)).copied()
            }
        };
        let story = found.ok_or_else(|| Error::NotFound(format!("story {story:?}")))?;
        let chapters = index.get(story).map_or(0, |e| e.chapters.len());
        let chapter = chapter.min(chapters.saturating_sub(1));
        self.play_chapter(&index, StoryCursor::new(story, chapter), StartAt::default())
    }

    fn advance_story(self: &Arc<Self>, auto: bool) -> Result<bool> {
        let (last, mode) = {
            let st = lock(&self.state);
            (st.last.clone(), st.story_mode)
        };
        let Some(NowPlaying::Chapter {
            category,
            story,
            chapter,
            ..
        }) = last
        else {
            return Err(Error::InvalidState("no story has been played".to_string()));
        };
        let index = self.stories.snapshot();
        let story = index
            .locate(&category, &story)
            .ok_or_else(|| Error::NotFound(format!("story {story:?} after rescan")))?;
        let at = StoryCursor::new(story, chapter);

        let next = match mode {
            PlayMode::Once if auto => return Ok(false),
            PlayMode::Loop if auto => Some(at),
            m => next_chapter_in_story(&index, at, m, &mut *lock(&self.rng)),
        };
        let next = next.ok_or_else(|| Error::NotFound("no further chapter".to_string()))?;
        self.play_chapter(&index, next, StartAt::default())?;
        Ok(true)
    }

    // --- transport -----------------------------------------------------

    pub(super) fn next(self: &Arc<Self>) -> Result<()> {
        let _switch = lock(&self.switch);
        let story = lock(&self.state).last.as_ref().is_some_and(NowPlaying::is_story);
        if story {
            self.advance_story(false)?;
        } else {
            self.advance_music(false)?;
        }
        Ok(())
    }

    /// Runs on the advance task after a session reached its end.
    pub(super) fn on_track_finished(self: &Arc<Self>) {
        let _switch = lock(&self.switch);
        let seq = self.session_seq.load(Ordering::SeqCst);
        if self.finished_seq.load(Ordering::SeqCst) != seq {
            debug!("ignoring the end of a replaced session");
            return;
        }
        let story = lock(&self.state).last.as_ref().is_some_and(NowPlaying::is_story);
        let advanced = if story {
            self.advance_story(true)
        } else {
            self.advance_music(true)
        };
        match advanced {
            Ok(true) => {}
            Ok(false) => {
                info!("playback finished");
                self.stop_session();
                self.sink.set_output_sample_rate(None);
            }
            Err(e) => {
                warn!("could not advance playback: {e}");
                self.stop_session();
                self.sink.set_output_sample_rate(None);
            }
        }
    }

    pub(super) fn stop(&self) -> bool {
        let _switch = lock(&self.switch);
        // Invalidates an end-of-track event already in flight.
        self.session_seq.fetch_add(1, Ordering::SeqCst);
        let stopped = self.stop_session();
        self.sink.set_output_sample_rate(None);
        if stopped {
            info!("playback stopped");
        }
        stopped
    }

    pub(super) fn pause(&self) -> bool {
        lock(&self.session)
            .as_ref()
            .is_some_and(StreamingSession::pause)
    }

    pub(super) fn resume(&self) -> bool {
        lock(&self.session)
            .as_ref()
            .is_some_and(StreamingSession::resume)
    }

    pub(super) fn set_play_mode(&self, mode: PlayMode) -> Result<()> {
        let (music, story) = {
            let mut st = lock(&self.state);
            st.mode = mode;
            (st.mode, st.story_mode)
        };
        info!(%mode, "play mode set");
        self.store.save_modes(music, story)
    }

    pub(super) fn set_story_mode(&self, mode: PlayMode) -> Result<()> {
        let (music, story) = {
            let mut st = lock(&self.state);
            st.story_mode = mode;
            (st.mode, st.story_mode)
        };
        info!(%mode, "story mode set");
        self.store.save_modes(music, story)
    }

    // --- resume --------------------------------------------------------

    pub(super) fn resume_saved_playback(self: &Arc<Self>) -> Result<()> {
        let _switch = lock(&self.switch);
        let saved = self
            .store
            .load_music()
            .ok_or_else(|| Error::NotFound("no saved music position".to_string()))?;
        let index = self.music.snapshot();
        let track = match &saved.path {
            Some(path) if index.get(saved.index).is_some_and(|e| &e.file_path == path) => saved.index,
            Some(path) => index
                .find_by_path(path)
                .ok_or_else(|| Error::NotFound(format!("{}", path.display())))?,
            None if saved.index < index.len() => saved.index,
            None => return Err(Error::NotFound(format!("track {}", saved.index))),
        };
        let entry = index
            .get(track)
            .ok_or_else(|| Error::NotFound(format!("track {track}")))?;
        let point = ResumePoint {
            duration_ms: saved.point.duration_ms.or_else(|| duration_ms(entry)),
            ..saved.point
        };
        let start = point.plan(entry.file_size);
        info!(
            track = %entry.display(),
            offset = start.offset,
            elapsed_ms = start.elapsed_ms,
            "resuming saved playback"
        );
        let playlist = self.playlist_at(&index, track);
        self.play_track(&index, playlist, start)
    }

    pub(super) fn resume_saved_story_playback(self: &Arc<Self>) -> Result<()> {
        let _switch = lock(&self.switch);
        let saved = self
            .store
            .load_story()
            .ok_or_else(|| Error::NotFound("no saved story position".to_string()))?;
        let index = self.stories.snapshot();
        let story = index
            .locate(&saved.category, &saved.story)
            .ok_or_else(|| Error::NotFound(format!("story {:?}", saved.story)))?;
        let entry = index
            .get(story)
            .ok_or_else(|| Error::NotFound(format!("story {:?}", saved.story)))?;
        let chapter = saved.chapter.min(entry.chapters.len().saturating_sub(1));
        let start = match entry.chapter(chapter) {
            Some(path) if chapter == saved.chapter => {
                let point = ResumePoint {
                    duration_ms: saved.point.duration_ms.or_else(|| {
                        read_duration(path).and_then(|d| u64::try_from(d.as_millis()).ok())
                    }),
                    ..saved.point
                };
                point.plan(fs::metadata(path)?.len())
            }
            _ => StartAt::default(),
        };
        info!(
            story = %saved.story,
            chapter,
            offset = start.offset,
            "resuming saved story"
        );
        self.play_chapter(&index, StoryCursor::new(story, chapter), start)
    }

    // --- playlists -----------------------------------------------------

    /// Save a named playlist of the best match for each query.
    pub(super) fn create_playlist(&self, name: &str, songs: &[&str]) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() || name.contains('\n') {
            return Err(Error::InvalidState(
                "playlist name must be a non-empty single line".to_string(),
            ));
        }
        let index = self.music.snapshot();
        let mut paths: Vec<PathBuf> = Vec::new();
        for query in songs {
            match index
                .search(query, &self.settings.search)
                .and_then(|i| index.get(i))
            {
                Some(e) if !paths.contains(&e.file_path) => paths.push(e.file_path.clone()),
                Some(_) => {}
                None => warn!(query = %query, "no track matches, left out of playlist"),
            }
        }
        if paths.is_empty() {
            return Err(Error::NotFound(format!("no tracks for playlist {name:?}")));
        }
        self.store.save_playlist(name, &paths)?;
        info!(playlist = name, tracks = paths.len(), "playlist saved");

        let mut st = lock(&self.state);
        if st.playlist.name == name && !st.playlist.is_full_library() {
            let current = st.playlist.current_index;
            st.playlist = PlaylistState::custom(name, paths.clone(), &index);
            st.playlist.current_index = current;
            st.playlist.resolve(&index);
        }
        Ok(paths.len())
    }

    pub(super) fn play_playlist(self: &Arc<Self>, name: &str) -> Result<()> {
        let _switch = lock(&self.switch);
        let paths = self
            .store
            .load_playlist(name)
            .ok_or_else(|| Error::NotFound(format!("playlist {name:?}")))?;
        let index = self.music.snapshot();
        let mut playlist = PlaylistState::custom(name, paths, &index);
        let len = playlist.len(index.len());
        playlist.set_play_index(0, len).ok_or_else(|| {
            Error::NotFound(format!("no track of playlist {name:?} is on the card"))
        })?;
        self.play_track(&index, playlist, StartAt::default())
    }

    /// Returns whether the playlist existed. Deleting the active playlist
    /// falls back to the full library at the same track.
    pub(super) fn delete_playlist(&self, name: &str) -> Result<bool> {
        let existed = self.store.delete_playlist(name)?;
        let mut st = lock(&self.state);
        if st.playlist.name == name && !st.playlist.is_full_library() {
            let index = self.music.snapshot();
            let current = st.playlist.current_track();
            st.playlist = PlaylistState::full_library();
            if let Some(track) = current {
                st.playlist.set_play_index(track, index.len());
            }
        }
        if existed {
            info!(playlist = name, "playlist deleted");
        }
        Ok(existed)
    }

    pub(super) fn playlist_names(&self) -> Vec<String> {
        self.store.playlist_names()
    }

    pub(super) fn status(&self) -> PlayerStatus {
        let (now_playing, mode, story_mode, playlist, playlist_position) = {
            let st = lock(&self.state);
            (
                st.now.clone(),
                st.mode,
                st.story_mode,
                st.playlist.name.clone(),
                st.playlist.current_index,
            )
        };
        let progress = lock(&self.session)
            .as_ref()
            .map(StreamingSession::progress);
        PlayerStatus {
            now_playing,
            progress,
            mode,
            story_mode,
            playlist,
            playlist_position,
            tracks: self.music.snapshot().len(),
            stories: self.stories.snapshot().len(),
            battery_level: self.battery.as_ref().and_then(|b| b.battery_level()),
            charging: self.battery.as_ref().is_some_and(|b| b.is_charging()),
        }
    }
}
