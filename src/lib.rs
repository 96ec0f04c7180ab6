// tunedeck library - folder music player core
// The controller and catalog work without a terminal; the UI sits on top.

pub mod audio;  // catalog scanning, backend trait, playback controller
pub mod config; // settings and preferences
#[cfg(feature = "tui")]
pub mod ui;     // terminal interface

// Export the stuff other modules actually use
pub use audio::{
    AudioBackend, CatalogError, PlaybackController, PlaybackError, PlaybackState, PlayerEvent,
    Song, SongCatalog,
};
pub use config::Config;
