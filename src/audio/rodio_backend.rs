use super::{AudioBackend, PlaybackError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// `AudioBackend` over a rodio sink. Each `load` builds a fresh paused sink
/// so there is never more than one stream alive.
pub struct RodioBackend {
    stream_handle: OutputStreamHandle,
    sink: Mutex<Option<Sink>>,
}

impl RodioBackend {
    pub fn new(stream_handle: OutputStreamHandle) -> Self {
        Self {
            stream_handle,
            sink: Mutex::new(None),
        }
    }

    /// Open the default output device. The returned `OutputStream` must
    /// outlive the backend; it is not `Send`, so the caller keeps it on the
    /// main thread.
    pub fn try_default() -> Result<(OutputStream, Self), PlaybackError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Output(e.to_string()))?;
        Ok((stream, Self::new(stream_handle)))
    }

    fn sink(&self) -> MutexGuard<'_, Option<Sink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioBackend for RodioBackend {
    fn load(&self, path: &Path) -> Result<(), PlaybackError> {
        let mut guard = self.sink();
        if let Some(old) = guard.take() {
            old.stop();
        }

        let file = File::open(path).map_err(|source| PlaybackError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let source = Decoder::new(BufReader::new(file)).map_err(|e| {
            warn!("Decoder rejected {}: {}", path.display(), e);
            PlaybackError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::Output(e.to_string()))?;
        sink.pause();
        sink.append(source);
        *guard = Some(sink);

        debug!("Loaded {}", path.display());
        Ok(())
    }

    fn play(&self) -> Result<(), PlaybackError> {
        match self.sink().as_ref() {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(PlaybackError::Output("nothing loaded".to_string())),
        }
    }

    fn pause(&self) {
        if let Some(sink) = self.sink().as_ref() {
            sink.pause();
        }
    }

    fn unpause(&self) {
        if let Some(sink) = self.sink().as_ref() {
            sink.play();
        }
    }

    fn stop(&self) {
        if let Some(sink) = self.sink().take() {
            sink.stop();
        }
    }

    fn is_busy(&self) -> bool {
        self.sink()
            .as_ref()
            .map(|sink| !sink.empty() && !sink.is_paused())
            .unwrap_or(false)
    }
}
