use super::CatalogError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// A playable file in the opened folder, split at its last dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Song {
    name: String,
    extension: String,
}

impl Song {
    /// `my.song.mp3` becomes name `my.song`, extension `mp3`. Names with no
    /// dot, or with nothing on either side of the last dot, are not songs.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (name, extension) = file_name.rsplit_once('.')?;
        if name.is_empty() || extension.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

/// Songs found in one folder, in listing order. Song files resolve against
/// `base_path`; the process working directory is never touched.
#[derive(Debug, Clone, Default)]
pub struct SongCatalog {
    base_path: PathBuf,
    songs: Vec<Song>,
}

impl SongCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan `directory` for the default extensions.
    pub fn scan<P: AsRef<Path>>(directory: P) -> Result<Self, CatalogError> {
        SongScanner::default().scan(directory)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.songs.iter().position(|song| song.name == name)
    }

    pub fn path_of(&self, song: &Song) -> PathBuf {
        self.base_path.join(song.file_name())
    }
}

/// Lists a single folder (no recursion) and keeps files whose extension is
/// in the supported set.
#[derive(Debug, Clone)]
pub struct SongScanner {
    supported_extensions: Vec<String>,
}

impl SongScanner {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            supported_extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn supported_extensions(&self) -> &[String] {
        &self.supported_extensions
    }

    pub fn is_supported(&self, song: &Song) -> bool {
        let normalized = song.extension.to_ascii_lowercase();
        self.supported_extensions.contains(&normalized)
    }

    pub fn scan<P: AsRef<Path>>(&self, directory: P) -> Result<SongCatalog, CatalogError> {
        let directory = directory.as_ref();

        let metadata = fs::metadata(directory).map_err(|source| CatalogError::Unreadable {
            path: directory.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(CatalogError::NotADirectory {
                path: directory.to_path_buf(),
            });
        }

        let mut songs = Vec::new();

        for entry in WalkDir::new(directory).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let message = e.to_string();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
                    return Err(CatalogError::Unreadable {
                        path: directory.to_path_buf(),
                        source,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                warn!("Skipping non UTF-8 file name: {}", entry.path().display());
                continue;
            };

            // Skip hidden files (dotfiles)
            if file_name.starts_with('.') {
                continue;
            }

            match Song::from_file_name(file_name) {
                Some(song) if self.is_supported(&song) => songs.push(song),
                _ => debug!("Ignoring {}", file_name),
            }
        }

        info!("Found {} songs in {}", songs.len(), directory.display());

        Ok(SongCatalog {
            base_path: directory.to_path_buf(),
            songs,
        })
    }
}

impl Default for SongScanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}
