use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Folder could not be opened or listed. The catalog is left empty.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to list '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Backend-level failure while starting a song. Recoverable: the controller
/// stays on the selected song and the UI shows the message.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode '{}': {reason}. The file may be corrupted or use an unsupported format", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("audio output unavailable: {0}")]
    Output(String),
}
