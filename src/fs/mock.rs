// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    read_only: HashSet<PathBuf>,
    /// Every path ever written, in order. Lets tests assert on probe files
    /// that were created and removed again.
    write_log: Vec<PathBuf>,
}

/// In-memory filesystem. Parent directories are created implicitly.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.add_dir("/");
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut state, parent);
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        Self::ensure_dirs(&mut state, path.as_ref());
    }

    /// Reject any write or removal of entries directly inside `dir`.
    pub fn set_read_only(&self, dir: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.read_only.insert(dir.as_ref().to_path_buf());
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().write_log.clone()
    }

    fn ensure_dirs(state: &mut MockState, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            state
                .entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }

    fn check_writable(state: &MockState, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if state.read_only.contains(parent) => {
                Err(anyhow!("Permission denied: {:?}", path))
            }
            Some(parent) if !matches!(state.entries.get(parent), Some(MockEntry::Dir)) => {
                Err(anyhow!("No such directory: {:?}", parent))
            }
            _ => Ok(()),
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state, path)?;
        if state.entries.contains_key(path) {
            return Err(anyhow!("File exists: {:?}", path));
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(contents.to_vec()));
        state.write_log.push(path.to_path_buf());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check_writable(&state, path)?;
        match state.entries.get(path) {
            Some(MockEntry::File(_)) => {
                state.entries.remove(path);
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::Dir))
    }
}
