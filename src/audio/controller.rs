// Playback controller - owns the selection, the transport state and the
// auto-play sequence. Everything the UI can do to the player goes through here.

use super::{AudioBackend, CatalogError, PlaybackError, Song, SongCatalog, SongScanner};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Selected,
    Playing,
    Paused,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    CatalogLoaded { songs: usize },
    SongSelected(Song),
    SongStarted(Song),
    Paused,
    Resumed,
    Stopped,
    AutoPlayFinished,
    Error(String),
}

/// Timing of the auto-play sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Wait after starting a song before the first busy check, so the
    /// backend has time to report the stream as running.
    pub grace_period: Duration,
    pub poll_interval: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&crate::config::Config> for PlaybackSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            grace_period: Duration::from_millis(config.playback.grace_period_ms),
            poll_interval: Duration::from_millis(config.playback.poll_interval_ms.max(1)),
        }
    }
}

/// What the UI needs to draw one frame.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub state: PlaybackState,
    pub current: Option<usize>,
    pub current_song: Option<Song>,
    pub songs: Vec<Song>,
    pub base_path: PathBuf,
    pub auto_play: bool,
    pub auto_play_running: bool,
}

struct State {
    catalog: SongCatalog,
    current: Option<usize>,
    playback: PlaybackState,
    // backend holds a stream that has to be stopped before the next load
    loaded: bool,
}

struct Shared {
    backend: Arc<dyn AudioBackend>,
    scanner: SongScanner,
    settings: PlaybackSettings,
    state: Mutex<State>,
    auto_play: AtomicBool,
    // bumped whenever the live auto-play sequence must give up
    generation: AtomicU64,
    events: Mutex<Option<mpsc::UnboundedSender<PlayerEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Cheap to clone; clones share the same player.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        scanner: SongScanner,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                scanner,
                settings,
                state: Mutex::new(State {
                    catalog: SongCatalog::empty(),
                    current: None,
                    playback: PlaybackState::Idle,
                    loaded: false,
                }),
                auto_play: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                events: Mutex::new(None),
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn set_event_sender(&self, sender: mpsc::UnboundedSender<PlayerEvent>) {
        *lock(&self.shared.events) = Some(sender);
    }

    pub fn settings(&self) -> PlaybackSettings {
        self.shared.settings
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.playback_state()
    }

    pub fn auto_play(&self) -> bool {
        self.shared.auto_play.load(Ordering::SeqCst)
    }

    /// Flip the auto-play flag. A running sequence notices on its next poll
    /// and ends; the song it was playing carries on.
    pub fn set_auto_play(&self, enabled: bool) {
        let was = self.shared.auto_play.swap(enabled, Ordering::SeqCst);
        if was != enabled {
            info!("Auto-play {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn is_auto_playing(&self) -> bool {
        lock(&self.shared.worker)
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.shared.lock_state();
        ControllerSnapshot {
            state: state.playback,
            current: state.current,
            current_song: state.current.and_then(|i| state.catalog.get(i)).cloned(),
            songs: state.catalog.songs().to_vec(),
            base_path: state.catalog.base_path().to_path_buf(),
            auto_play: self.auto_play(),
            auto_play_running: self.is_auto_playing(),
        }
    }

    /// Make the song at `index` current, stopping whatever was playing.
    /// Returns false (and changes nothing) when the index is out of range.
    pub fn select(&self, index: usize) -> bool {
        let mut state = self.shared.lock_state();
        if index >= state.catalog.len() {
            return false;
        }
        self.shared.cancel_sequence();
        self.shared.select_locked(&mut state, index)
    }

    pub fn select_by_name(&self, name: &str) -> bool {
        let index = self.shared.lock_state().catalog.position(name);
        match index {
            Some(index) => self.select(index),
            None => false,
        }
    }

    /// Play the current song, or start the auto-play sequence when auto-play
    /// is on. With nothing selected (and auto-play off) this does nothing and
    /// returns `Ok(false)`.
    pub fn play(&self) -> Result<bool, PlaybackError> {
        if self.auto_play() {
            self.start_sequence()?;
            return Ok(true);
        }

        self.shared.cancel_sequence();
        let mut state = self.shared.lock_state();
        self.shared.play_locked(&mut state)
    }

    /// Pause a playing song. A song that already ran out drops back to
    /// `Selected` instead, so it can be played again.
    pub fn pause(&self) -> bool {
        let mut state = self.shared.lock_state();
        if state.playback != PlaybackState::Playing {
            debug!("pause ignored in {:?}", state.playback);
            return false;
        }
        if !self.shared.backend.is_busy() {
            debug!("pause ignored: song already finished");
            state.playback = PlaybackState::Selected;
            return false;
        }
        self.shared.backend.pause();
        state.playback = PlaybackState::Paused;
        self.shared.emit(PlayerEvent::Paused);
        true
    }

    pub fn unpause(&self) -> bool {
        let mut state = self.shared.lock_state();
        if state.playback != PlaybackState::Paused {
            debug!("unpause ignored in {:?}", state.playback);
            return false;
        }
        self.shared.backend.unpause();
        state.playback = PlaybackState::Playing;
        self.shared.emit(PlayerEvent::Resumed);
        true
    }

    pub fn toggle_pause(&self) -> bool {
        match self.state() {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.unpause(),
            _ => false,
        }
    }

    /// Back to `Idle`: selection cleared, backend halted, any auto-play
    /// sequence ended. The auto-play flag itself is left alone.
    pub fn stop(&self) {
        self.shared.cancel_sequence();
        let mut state = self.shared.lock_state();
        if state.playback == PlaybackState::Idle && state.current.is_none() && !state.loaded {
            return;
        }
        self.shared.backend.stop();
        state.loaded = false;
        state.current = None;
        state.playback = PlaybackState::Idle;
        info!("Playback stopped");
        self.shared.emit(PlayerEvent::Stopped);
    }

    /// Stop, turn auto-play off and load a new folder. The old catalog is
    /// dropped even when the new one cannot be read.
    pub fn select_new_folder<P: AsRef<Path>>(&self, path: P) -> Result<usize, CatalogError> {
        let path = path.as_ref();
        self.set_auto_play(false);
        self.stop();

        let mut state = self.shared.lock_state();
        state.catalog = SongCatalog::empty();

        match self.shared.scanner.scan(path) {
            Ok(catalog) => {
                let songs = catalog.len();
                state.catalog = catalog;
                info!("Opened {} ({} songs)", path.display(), songs);
                self.shared.emit(PlayerEvent::CatalogLoaded { songs });
                Ok(songs)
            }
            Err(e) => {
                warn!("Could not open {}: {}", path.display(), e);
                self.shared.emit(PlayerEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stop, turn auto-play off and forget the catalog.
    pub fn reset(&self) {
        self.set_auto_play(false);
        self.stop();
        self.shared.lock_state().catalog = SongCatalog::empty();
    }

    /// Wait for the current auto-play sequence, if any, to end.
    pub async fn join_auto_play(&self) {
        let handle = lock(&self.shared.worker).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Auto-play task ended abnormally: {}", e);
            }
        }
    }

    fn start_sequence(&self) -> Result<(), PlaybackError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::Output(format!("auto-play needs a tokio runtime: {}", e)))?;

        // the previous sequence, if any, sees the new generation and exits
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        let handle = runtime.spawn(run_sequence(shared, generation));
        *lock(&self.shared.worker) = Some(handle);
        Ok(())
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    fn playback_state(&self) -> PlaybackState {
        self.lock_state().playback
    }

    fn emit(&self, event: PlayerEvent) {
        if let Some(sender) = lock(&self.events).as_ref() {
            let _ = sender.send(event);
        }
    }

    fn cancel_sequence(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn sequence_alive(&self, generation: u64) -> bool {
        self.auto_play.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Select and play song `index` for the sequence `generation`. The
    /// liveness check is repeated under the state lock so a `stop()` that
    /// finished in between is never undone.
    fn start_sequence_song(&self, generation: u64, index: usize) -> SequenceStep {
        let mut state = self.lock_state();
        if !self.sequence_alive(generation) {
            return SequenceStep::Cancelled;
        }
        if index >= state.catalog.len() {
            return SequenceStep::Exhausted;
        }
        self.select_locked(&mut state, index);
        SequenceStep::Started(self.play_locked(&mut state))
    }

    fn select_locked(&self, state: &mut State, index: usize) -> bool {
        let Some(song) = state.catalog.get(index).cloned() else {
            return false;
        };
        if state.loaded {
            self.backend.stop();
            state.loaded = false;
        }
        state.current = Some(index);
        state.playback = PlaybackState::Selected;
        debug!("Selected {}", song.name());
        self.emit(PlayerEvent::SongSelected(song));
        true
    }

    fn play_locked(&self, state: &mut State) -> Result<bool, PlaybackError> {
        let Some(song) = state.current.and_then(|i| state.catalog.get(i)).cloned() else {
            debug!("play ignored: nothing selected");
            return Ok(false);
        };

        if state.loaded {
            self.backend.stop();
            state.loaded = false;
        }

        let path = state.catalog.path_of(&song);
        if let Err(e) = self.backend.load(&path).and_then(|_| self.backend.play()) {
            self.backend.stop();
            state.playback = PlaybackState::Selected;
            warn!("Could not play {}: {}", path.display(), e);
            self.emit(PlayerEvent::Error(e.to_string()));
            return Err(e);
        }

        state.loaded = true;
        state.playback = PlaybackState::Playing;
        info!("Playing {}", song.name());
        self.emit(PlayerEvent::SongStarted(song));
        Ok(true)
    }
}

enum SequenceStep {
    Cancelled,
    Exhausted,
    Started(Result<bool, PlaybackError>),
}

async fn run_sequence(shared: Arc<Shared>, generation: u64) {
    let PlaybackSettings {
        grace_period,
        poll_interval,
    } = shared.settings;
    info!("Auto-play sequence started");

    let mut index = 0;
    loop {
        let started = match shared.start_sequence_song(generation, index) {
            SequenceStep::Cancelled => {
                debug!("Auto-play sequence cancelled at song {}", index);
                return;
            }
            SequenceStep::Exhausted => break,
            SequenceStep::Started(result) => result,
        };

        if started.is_ok() {
            tokio::time::sleep(grace_period).await;

            loop {
                if !shared.sequence_alive(generation) {
                    debug!("Auto-play sequence cancelled during song {}", index);
                    return;
                }
                let paused = shared.playback_state() == PlaybackState::Paused;
                if !paused && !shared.backend.is_busy() {
                    break;
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        index += 1;
    }

    info!("Auto-play sequence finished");
    shared.emit(PlayerEvent::AutoPlayFinished);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::testing::{Call, RecordingBackend};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn song_dir(names: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"fake").unwrap();
        }
        dir
    }

    fn controller(backend: &Arc<RecordingBackend>) -> PlaybackController {
        PlaybackController::new(
            backend.clone(),
            SongScanner::default(),
            PlaybackSettings::default(),
        )
    }

    fn catalog_paths(controller: &PlaybackController) -> Vec<PathBuf> {
        let snapshot = controller.snapshot();
        snapshot
            .songs
            .iter()
            .map(|song| snapshot.base_path.join(song.file_name()))
            .collect()
    }

    #[test]
    fn test_select_moves_the_current_marker() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        assert!(controller.select(0));
        assert!(controller.select(1));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.current, Some(1));
        assert_eq!(snapshot.current_song, Some(snapshot.songs[1].clone()));
        assert_eq!(snapshot.state, PlaybackState::Selected);
    }

    #[test]
    fn test_select_out_of_range_changes_nothing() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        assert!(!controller.select(5));
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.snapshot().current, None);
    }

    #[test]
    fn test_select_by_name() {
        let dir = song_dir(&["intro.wav", "outro.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        assert!(controller.select_by_name("outro"));
        assert_eq!(controller.snapshot().current_song.unwrap().name(), "outro");
        assert!(!controller.select_by_name("missing"));
    }

    #[test]
    fn test_play_without_selection_is_a_no_op() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        backend.clear();

        assert!(!controller.play().unwrap());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(backend.count(&Call::Play), 0);
        assert!(backend.loads().is_empty());
    }

    #[test]
    fn test_play_loads_the_selected_song_from_the_base_path() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        controller.select(0);
        assert!(controller.play().unwrap());

        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(backend.loads(), vec![dir.path().join("a.mp3")]);
    }

    #[test]
    fn test_pause_then_unpause_does_not_reload() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();

        assert!(controller.pause());
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(controller.unpause());
        assert_eq!(controller.state(), PlaybackState::Playing);

        assert_eq!(backend.loads().len(), 1);
        assert_eq!(backend.count(&Call::Pause), 1);
        assert_eq!(backend.count(&Call::Unpause), 1);
    }

    #[test]
    fn test_pause_after_song_ran_out_is_a_no_op() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();

        assert!(!controller.pause());
        assert_eq!(controller.state(), PlaybackState::Selected);
        assert_eq!(backend.count(&Call::Pause), 0);

        // still selected, so it can be started again
        assert!(controller.play().unwrap());
        assert_eq!(backend.loads().len(), 2);
    }

    #[test]
    fn test_sequence_step_after_stop_leaves_backend_alone() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();
        controller.set_auto_play(true);

        // a sequence that passed its last check just before the user hit stop
        let generation = controller.shared.generation.load(Ordering::SeqCst);
        controller.stop();
        backend.clear();

        let step = controller.shared.start_sequence_song(generation, 1);

        assert!(matches!(step, SequenceStep::Cancelled));
        assert!(backend.calls().is_empty());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.snapshot().current, None);
    }

    #[test]
    fn test_sequence_step_runs_when_live() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.set_auto_play(true);
        let generation = controller.shared.generation.load(Ordering::SeqCst);

        let step = controller.shared.start_sequence_song(generation, 1);
        assert!(matches!(step, SequenceStep::Started(Ok(true))));
        assert_eq!(controller.snapshot().current, Some(1));

        let step = controller.shared.start_sequence_song(generation, 2);
        assert!(matches!(step, SequenceStep::Exhausted));
    }

    #[test]
    fn test_pause_and_unpause_are_guarded() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        assert!(!controller.pause());
        assert!(!controller.unpause());

        controller.select(0);
        controller.play().unwrap();
        assert!(!controller.unpause());
        assert_eq!(controller.state(), PlaybackState::Playing);

        assert_eq!(backend.count(&Call::Pause), 0);
        assert_eq!(backend.count(&Call::Unpause), 0);
    }

    #[test]
    fn test_toggle_pause() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        assert!(!controller.toggle_pause());

        controller.select(0);
        controller.play().unwrap();
        assert!(controller.toggle_pause());
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(controller.toggle_pause());
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_selecting_while_playing_stops_the_old_session() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();
        backend.clear();

        controller.select(1);

        assert_eq!(backend.calls(), vec![Call::Stop]);
        assert_eq!(controller.state(), PlaybackState::Selected);
    }

    #[test]
    fn test_play_again_stops_before_loading() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();
        backend.clear();

        controller.play().unwrap();

        let path = dir.path().join("a.mp3");
        assert_eq!(backend.calls(), vec![Call::Stop, Call::Load(path), Call::Play]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();
        backend.clear();

        controller.stop();
        controller.stop();

        assert_eq!(backend.calls(), vec![Call::Stop]);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.current, None);
    }

    #[test]
    fn test_stop_from_fresh_controller_touches_nothing() {
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);

        controller.stop();
        controller.stop();

        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_load_failure_is_reported_and_recoverable() {
        let dir = song_dir(&["broken.mp3", "fine.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0).failing_on("broken"));
        let controller = controller(&backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        controller.set_event_sender(tx);
        controller.select_new_folder(dir.path()).unwrap();

        assert!(controller.select_by_name("broken"));
        let err = controller.play().unwrap_err();

        assert!(matches!(err, PlaybackError::Decode { .. }));
        assert_eq!(controller.state(), PlaybackState::Selected);
        let mut saw_error = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, PlayerEvent::Error(_)) {
                saw_error = true;
            }
        }
        assert!(saw_error);

        assert!(controller.select_by_name("fine"));
        assert!(controller.play().unwrap());
    }

    #[test]
    fn test_new_folder_clears_auto_play_and_selection_even_on_failure() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();
        controller.set_auto_play(true);

        let err = controller.select_new_folder(dir.path().join("missing"));

        assert!(err.is_err());
        let snapshot = controller.snapshot();
        assert!(!snapshot.auto_play);
        assert_eq!(snapshot.current, None);
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert!(snapshot.songs.is_empty());
    }

    #[test]
    fn test_failed_scan_leaves_loaded_catalog_alone() {
        let dir = song_dir(&["a.mp3", "b.wav"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        assert!(SongCatalog::scan(dir.path().join("missing")).is_err());

        assert_eq!(controller.snapshot().songs.len(), 2);
    }

    #[test]
    fn test_reset_forgets_the_catalog() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        controller.set_auto_play(true);

        controller.reset();

        let snapshot = controller.snapshot();
        assert!(snapshot.songs.is_empty());
        assert!(!snapshot.auto_play);
    }

    #[test]
    fn test_events_follow_transport_calls() {
        let dir = song_dir(&["a.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        controller.set_event_sender(tx);

        controller.select_new_folder(dir.path()).unwrap();
        controller.select(0);
        controller.play().unwrap();
        controller.pause();
        controller.unpause();
        controller.stop();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen[0], PlayerEvent::CatalogLoaded { songs: 1 }));
        assert!(matches!(seen[1], PlayerEvent::SongSelected(_)));
        assert!(matches!(seen[2], PlayerEvent::SongStarted(_)));
        assert!(matches!(seen[3], PlayerEvent::Paused));
        assert!(matches!(seen[4], PlayerEvent::Resumed));
        assert!(matches!(seen[5], PlayerEvent::Stopped));
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_play_walks_the_catalog_in_order() {
        let dir = song_dir(&["a.mp3", "b.mp3", "c.mp3"]);
        let backend = Arc::new(RecordingBackend::new(3));
        let controller = controller(&backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        controller.set_event_sender(tx);
        controller.select_new_folder(dir.path()).unwrap();
        let expected = catalog_paths(&controller);

        controller.set_auto_play(true);
        assert!(controller.play().unwrap());
        controller.join_auto_play().await;

        assert_eq!(backend.loads(), expected);
        assert_eq!(backend.count(&Call::Play), 3);
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            finished |= matches!(event, PlayerEvent::AutoPlayFinished);
        }
        assert!(finished);
        assert_eq!(controller.snapshot().current, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_play_with_empty_catalog_ends_at_once() {
        let dir = song_dir(&[]);
        let backend = Arc::new(RecordingBackend::new(3));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        controller.set_auto_play(true);
        controller.play().unwrap();
        controller.join_auto_play().await;

        assert!(backend.calls().is_empty());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_auto_play_mid_song_stops_the_sequence() {
        let dir = song_dir(&["a.mp3", "b.mp3", "c.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        let first = catalog_paths(&controller)[0].clone();

        controller.set_auto_play(true);
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        controller.set_auto_play(false);
        controller.join_auto_play().await;

        assert_eq!(backend.loads(), vec![first]);
        // the song that was on keeps going
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(backend.count(&Call::Stop), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_during_grace_period_prevents_advance() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(0));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        controller.set_auto_play(true);
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        controller.set_auto_play(false);
        controller.join_auto_play().await;

        assert_eq!(backend.loads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_the_sequence_but_keeps_the_flag() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        controller.set_auto_play(true);
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        controller.stop();
        controller.join_auto_play().await;

        assert_eq!(backend.loads().len(), 1);
        assert!(controller.auto_play());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_folder_mid_sequence_cancels_it() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let other = song_dir(&["z.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        controller.set_auto_play(true);
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        controller.select_new_folder(other.path()).unwrap();
        controller.join_auto_play().await;

        assert_eq!(backend.loads().len(), 1);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.songs.len(), 1);
        assert_eq!(snapshot.state, PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_the_sequence_until_unpause() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(2));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();

        controller.set_auto_play(true);
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert!(controller.pause());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.loads().len(), 1);

        assert!(controller.unpause());
        controller.join_auto_play().await;
        assert_eq!(backend.loads().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unplayable_song_is_skipped_by_auto_play() {
        let dir = song_dir(&["broken.mp3"]);
        let backend = Arc::new(RecordingBackend::new(1).failing_on("broken"));
        let controller = controller(&backend);
        let (tx, mut rx) = mpsc::unbounded_channel();
        controller.set_event_sender(tx);
        controller.select_new_folder(dir.path()).unwrap();

        controller.set_auto_play(true);
        controller.play().unwrap();
        controller.join_auto_play().await;

        let mut errors = 0;
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                PlayerEvent::Error(_) => errors += 1,
                PlayerEvent::AutoPlayFinished => finished = true,
                _ => {}
            }
        }
        assert_eq!(errors, 1);
        assert!(finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_play_replaces_running_sequence() {
        let dir = song_dir(&["a.mp3", "b.mp3"]);
        let backend = Arc::new(RecordingBackend::new(usize::MAX));
        let controller = controller(&backend);
        controller.select_new_folder(dir.path()).unwrap();
        let first = catalog_paths(&controller)[0].clone();

        controller.set_auto_play(true);
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;

        // both sequences started from the top; only one is alive
        assert_eq!(backend.loads(), vec![first.clone(), first]);
        controller.set_auto_play(false);
        controller.join_auto_play().await;
        assert!(!controller.is_auto_playing());
    }
}
