// Folder picker overlay - browse directories and choose the one to open

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FolderPicker {
    current: PathBuf,
    entries: Vec<PathBuf>,
    selected: usize,
}

impl FolderPicker {
    pub fn open<P: AsRef<Path>>(start: P) -> io::Result<Self> {
        let current = start.as_ref().to_path_buf();
        let entries = read_subdirectories(&current)?;
        Ok(Self {
            current,
            entries,
            selected: 0,
        })
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn selected(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    /// Descend into the highlighted folder. On error nothing changes.
    pub fn enter(&mut self) -> io::Result<()> {
        match self.entries.get(self.selected).cloned() {
            Some(target) => self.change_to(target),
            None => Ok(()),
        }
    }

    pub fn parent(&mut self) -> io::Result<()> {
        match self.current.parent() {
            Some(parent) => {
                let previous = self.current.clone();
                self.change_to(parent.to_path_buf())?;
                // keep the folder we came from highlighted
                if let Some(index) = self.entries.iter().position(|p| *p == previous) {
                    self.selected = index;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// The folder that gets opened: the one being browsed.
    pub fn choice(&self) -> PathBuf {
        self.current.clone()
    }

    fn change_to(&mut self, target: PathBuf) -> io::Result<()> {
        let entries = read_subdirectories(&target)?;
        self.current = target;
        self.entries = entries;
        self.selected = 0;
        Ok(())
    }
}

fn read_subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(true, |n| n.starts_with('.'))
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}
