use super::PlaybackError;
use std::path::Path;

/// The audio capability the controller drives: one stream at a time,
/// addressed by file path. Implementations use interior mutability so a
/// single backend can be shared between the UI and the auto-play task.
pub trait AudioBackend: Send + Sync {
    /// Replace whatever is loaded with the file at `path`, ready to play.
    fn load(&self, path: &Path) -> Result<(), PlaybackError>;

    /// Start the loaded stream from the beginning.
    fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn unpause(&self);

    /// Halt and unload. Harmless when nothing is loaded.
    fn stop(&self);

    /// True while the loaded stream is producing audio.
    fn is_busy(&self) -> bool;
}
