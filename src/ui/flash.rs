use ratatui::style::Color;
use std::time::Duration;

pub const BASE_BACKGROUND: Color = Color::LightBlue;

/// Colours the background cycles through, base colour first.
pub const FLASH_PALETTE: &[Color] = &[
    BASE_BACKGROUND,
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Yellow,
    Color::Rgb(255, 165, 0),
];

/// Flashing background effect. Advances one palette step per interval
/// while enabled; disabled it always shows the base colour.
#[derive(Debug, Clone)]
pub struct Flasher {
    enabled: bool,
    interval: Duration,
    elapsed: Duration,
    index: usize,
}

impl Flasher {
    pub fn new(interval: Duration, enabled: bool) -> Self {
        Self {
            enabled,
            interval: interval.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            index: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.elapsed = Duration::ZERO;
        if !enabled {
            self.index = 0;
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if !self.enabled {
            return;
        }
        self.elapsed += dt;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.index = (self.index + 1) % FLASH_PALETTE.len();
        }
    }

    pub fn background(&self) -> Color {
        if self.enabled {
            FLASH_PALETTE[self.index]
        } else {
            BASE_BACKGROUND
        }
    }
}
