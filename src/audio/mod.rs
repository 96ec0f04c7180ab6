pub mod backend;
pub mod catalog;
pub mod controller;
pub mod error;
#[cfg(feature = "audio")]
pub mod rodio_backend;

pub use backend::AudioBackend;
pub use catalog::{Song, SongCatalog, SongScanner, DEFAULT_EXTENSIONS};
pub use controller::{
    ControllerSnapshot, PlaybackController, PlaybackSettings, PlaybackState, PlayerEvent,
};
pub use error::{CatalogError, PlaybackError};
#[cfg(feature = "audio")]
pub use rodio_backend::RodioBackend;
