use super::components::{self, View};
use super::events::{key_to_app_event, AppEvent, KeyContext};
use super::flash::Flasher;
use super::picker::FolderPicker;
use super::TerminalManager;
use crate::audio::{ControllerSnapshot, PlaybackController, PlayerEvent};
use crate::config::Config;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Songs stacked per column before the grid wraps to the next column.
pub const MIN_GRID_ROWS: usize = 3;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    AutoPlay,
    FlashingBackground,
}

pub const SETTINGS: [Setting; 2] = [Setting::AutoPlay, Setting::FlashingBackground];

#[derive(Debug, Clone)]
pub enum Overlay {
    None,
    Settings { cursor: usize },
    Picker(FolderPicker),
    ConfirmQuit,
}

pub struct App {
    controller: PlaybackController,
    config: Config,
    player_events: mpsc::UnboundedReceiver<PlayerEvent>,

    // State
    pub screen: Screen,
    pub overlay: Overlay,
    pub cursor: usize,
    pub grid_rows: usize,
    pub flasher: Flasher,
    pub status: Option<(String, Instant)>,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: PlaybackController, config: Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        controller.set_event_sender(tx);

        let flasher = Flasher::new(
            Duration::from_millis(config.ui.flash_interval_ms),
            config.ui.flashing_background,
        );

        Self {
            controller,
            config,
            player_events: rx,
            screen: Screen::Menu,
            overlay: Overlay::None,
            cursor: 0,
            grid_rows: MIN_GRID_ROWS,
            flasher,
            status: None,
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Open `path` as the song folder, reporting the outcome on the status line.
    pub fn open_folder<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();
        self.cursor = 0;
        match self.controller.select_new_folder(path) {
            Ok(count) => self.set_status(format!("{} songs in {}", count, path.display())),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub async fn run(&mut self, terminal: &mut TerminalManager) -> Result<()> {
        let tick_rate = Duration::from_millis(self.config.ui.tick_rate_ms.max(10));
        let mut last_tick = Instant::now();

        while !self.should_quit {
            self.render(terminal)?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(app_event) = key_to_app_event(self.key_context(), key) {
                            self.handle_event(app_event);
                        }
                    }
                }
            }

            self.drain_player_events();

            let now = Instant::now();
            self.tick(now.duration_since(last_tick));
            last_tick = now;

            tokio::time::sleep(tick_rate).await;
        }

        Ok(())
    }

    pub fn key_context(&self) -> KeyContext {
        match (&self.overlay, self.screen) {
            (Overlay::ConfirmQuit, _) => KeyContext::ConfirmQuit,
            (Overlay::Settings { .. }, _) => KeyContext::Settings,
            (Overlay::Picker(_), _) => KeyContext::Picker,
            (Overlay::None, Screen::Menu) => KeyContext::Menu,
            (Overlay::None, Screen::Main) => KeyContext::Main,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        debug!("App event {:?}", event);
        match event {
            AppEvent::Start => self.screen = Screen::Main,
            AppEvent::Restart => self.restart(),
            AppEvent::Quit => {
                if !matches!(self.overlay, Overlay::ConfirmQuit) {
                    self.overlay = Overlay::ConfirmQuit;
                }
            }
            AppEvent::ConfirmQuit => self.quit(),
            AppEvent::CancelQuit | AppEvent::CloseOverlay => self.overlay = Overlay::None,

            AppEvent::Up => self.move_vertical(-1),
            AppEvent::Down => self.move_vertical(1),
            AppEvent::Left => self.move_horizontal(-1),
            AppEvent::Right => self.move_horizontal(1),
            AppEvent::Select => {
                if !self.controller.select(self.cursor) {
                    self.set_status("No song under the cursor".to_string());
                }
            }

            AppEvent::PlayCursor => self.play_cursor(),
            AppEvent::Pause => {
                self.controller.pause();
            }
            AppEvent::Unpause => {
                self.controller.unpause();
            }
            AppEvent::Stop => self.controller.stop(),

            AppEvent::OpenPicker => self.open_picker(),
            AppEvent::PickerEnter => self.with_picker(FolderPicker::enter),
            AppEvent::PickerParent => self.with_picker(FolderPicker::parent),
            AppEvent::PickerChoose => {
                if let Overlay::Picker(picker) = &self.overlay {
                    let choice = picker.choice();
                    self.overlay = Overlay::None;
                    self.open_folder(choice);
                }
            }

            AppEvent::OpenSettings => self.overlay = Overlay::Settings { cursor: 0 },
            AppEvent::ToggleSetting => {
                if let Overlay::Settings { cursor } = self.overlay {
                    self.toggle(SETTINGS[cursor]);
                }
            }
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.flasher.tick(dt);
        if let Some((_, at)) = &self.status {
            if at.elapsed() >= STATUS_TIMEOUT {
                self.status = None;
            }
        }
    }

    pub fn drain_player_events(&mut self) {
        while let Ok(event) = self.player_events.try_recv() {
            let message = match event {
                PlayerEvent::SongStarted(song) => Some(format!("Playing {}", song.name())),
                PlayerEvent::AutoPlayFinished => Some("Auto-play finished".to_string()),
                PlayerEvent::Error(message) => Some(message),
                PlayerEvent::Stopped => Some("Stopped".to_string()),
                _ => None,
            };
            if let Some(message) = message {
                self.set_status(message);
            }
        }
    }

    pub fn setting_enabled(&self, setting: Setting) -> bool {
        match setting {
            Setting::AutoPlay => self.controller.auto_play(),
            Setting::FlashingBackground => self.flasher.is_enabled(),
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|(message, _)| message.as_str())
    }

    fn set_status(&mut self, message: String) {
        self.status = Some((message, Instant::now()));
    }

    fn toggle(&mut self, setting: Setting) {
        let enabled = !self.setting_enabled(setting);
        match setting {
            Setting::AutoPlay => self.controller.set_auto_play(enabled),
            Setting::FlashingBackground => self.flasher.set_enabled(enabled),
        }
    }

    /// Select the song under the cursor and play it. With auto-play on the
    /// sequence starts from the top instead.
    fn play_cursor(&mut self) {
        if !self.controller.auto_play() && !self.controller.select(self.cursor) {
            self.set_status("No song under the cursor".to_string());
            return;
        }
        match self.controller.play() {
            Ok(true) => {}
            Ok(false) => self.set_status("Select a song first".to_string()),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    fn restart(&mut self) {
        info!("Restarting main screen");
        self.controller.reset();
        self.cursor = 0;
        self.overlay = Overlay::None;
        self.screen = Screen::Main;
    }

    fn quit(&mut self) {
        self.controller.set_auto_play(false);
        self.controller.stop();
        self.should_quit = true;
    }

    fn song_count(&self) -> usize {
        self.controller.snapshot().songs.len()
    }

    fn move_vertical(&mut self, delta: isize) {
        let count = self.song_count();
        match &mut self.overlay {
            Overlay::Settings { cursor } => {
                *cursor = step(*cursor, delta, SETTINGS.len());
            }
            Overlay::Picker(picker) => {
                if delta < 0 {
                    picker.up();
                } else {
                    picker.down();
                }
            }
            _ => self.cursor = step(self.cursor, delta, count),
        }
    }

    fn move_horizontal(&mut self, delta: isize) {
        let count = self.song_count();
        let rows = self.grid_rows.max(1) as isize;
        self.cursor = step(self.cursor, delta * rows, count);
    }

    fn open_picker(&mut self) {
        let start = self.picker_start();
        match FolderPicker::open(&start) {
            Ok(picker) => self.overlay = Overlay::Picker(picker),
            Err(e) => self.set_status(format!("Cannot browse {}: {}", start.display(), e)),
        }
    }

    fn picker_start(&self) -> PathBuf {
        let base = self.controller.snapshot().base_path;
        if !base.as_os_str().is_empty() && base.is_dir() {
            return base;
        }
        self.config
            .music_directory
            .clone()
            .filter(|dir| dir.is_dir())
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn with_picker(&mut self, action: fn(&mut FolderPicker) -> std::io::Result<()>) {
        let result = match &mut self.overlay {
            Overlay::Picker(picker) => action(picker),
            _ => return,
        };
        if let Err(e) = result {
            self.set_status(e.to_string());
        }
    }

    fn view<'a>(&'a self, snapshot: &'a ControllerSnapshot) -> View<'a> {
        View {
            screen: self.screen,
            overlay: &self.overlay,
            snapshot,
            cursor: self.cursor,
            background: self.flasher.background(),
            status: self.status_text(),
            auto_play: snapshot.auto_play,
            flashing: self.flasher.is_enabled(),
        }
    }

    fn render(&mut self, terminal: &mut TerminalManager) -> Result<()> {
        let snapshot = self.controller.snapshot();
        let mut rows = self.grid_rows;
        {
            let view = self.view(&snapshot);
            terminal.draw(|f| {
                rows = components::render(f, &view);
            })?;
        }
        self.grid_rows = rows;
        Ok(())
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = current as isize + delta;
    if moved < 0 || moved >= len as isize {
        current.min(len - 1)
    } else {
        moved as usize
    }
}
