use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    // Screen flow
    Start,
    Restart,
    Quit,
    ConfirmQuit,
    CancelQuit,

    // Song grid navigation
    Up,
    Down,
    Left,
    Right,
    Select,

    // Transport
    PlayCursor,
    Pause,
    Unpause,
    Stop,

    // Folder picker
    OpenPicker,
    PickerEnter,
    PickerParent,
    PickerChoose,

    // Settings panel
    OpenSettings,
    ToggleSetting,

    CloseOverlay,
}

/// Which key table applies right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Menu,
    Main,
    Settings,
    Picker,
    ConfirmQuit,
}

pub fn key_to_app_event(context: KeyContext, key: KeyEvent) -> Option<AppEvent> {
    // Ctrl+C always asks to quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(AppEvent::Quit);
    }

    match context {
        KeyContext::Menu => match key.code {
            KeyCode::Enter => Some(AppEvent::Start),
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
            _ => None,
        },
        KeyContext::Main => main_keys(key),
        KeyContext::Settings => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(AppEvent::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(AppEvent::Down),
            KeyCode::Char(' ') => Some(AppEvent::ToggleSetting),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char(',') => Some(AppEvent::CloseOverlay),
            _ => None,
        },
        KeyContext::Picker => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(AppEvent::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(AppEvent::Down),
            KeyCode::Enter | KeyCode::Right => Some(AppEvent::PickerEnter),
            KeyCode::Backspace | KeyCode::Left => Some(AppEvent::PickerParent),
            KeyCode::Char('o') | KeyCode::Char(' ') => Some(AppEvent::PickerChoose),
            KeyCode::Esc => Some(AppEvent::CloseOverlay),
            _ => None,
        },
        KeyContext::ConfirmQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(AppEvent::ConfirmQuit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(AppEvent::CancelQuit),
            _ => None,
        },
    }
}

fn main_keys(key: KeyEvent) -> Option<AppEvent> {
    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
        KeyCode::Char('r') => Some(AppEvent::Restart),

        // Playback controls
        KeyCode::Enter => Some(AppEvent::PlayCursor),
        KeyCode::Char('p') => Some(AppEvent::Pause),
        KeyCode::Char('u') => Some(AppEvent::Unpause),
        KeyCode::Char('s') => Some(AppEvent::Stop),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => Some(AppEvent::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(AppEvent::Down),
        KeyCode::Left | KeyCode::Char('h') => Some(AppEvent::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(AppEvent::Right),
        KeyCode::Char(' ') => Some(AppEvent::Select),

        // Folder + settings
        KeyCode::Char('o') => Some(AppEvent::OpenPicker),
        KeyCode::Char(',') => Some(AppEvent::OpenSettings),

        _ => None,
    }
}

/// Shortcut list shown in the settings panel.
pub const SHORTCUTS: &[(&str, &str)] = &[
    ("Quit", "q / Esc"),
    ("Restart", "r"),
    ("Play song under cursor", "Enter"),
    ("Select song", "Space"),
    ("Pause / Unpause", "p / u"),
    ("Stop", "s"),
    ("Open folder", "o"),
    ("Settings", ","),
];
