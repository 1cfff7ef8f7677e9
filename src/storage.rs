use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where uploaded image bytes are staged before analysis
pub trait UploadStore {
    /// Persist `bytes` under `label`, replacing any earlier upload with the same label
    fn store(&self, label: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes `temp_<Label>.jpg` files into one directory per session
#[derive(Debug, Clone)]
pub struct TempDirStore {
    dir: PathBuf,
}

impl TempDirStore {
    /// Session directory under the OS temp dir
    pub fn new() -> Result<Self> {
        let dir = std::env::temp_dir().join(format!("plumbline-{}", std::process::id()));
        Self::at(&dir)
    }

    pub fn at(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating upload dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("temp_{}.jpg", label))
    }
}

impl UploadStore for TempDirStore {
    fn store(&self, label: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file = self.file_for(label);
        std::fs::write(&file, bytes).with_context(|| format!("writing {}", file.display()))?;
        log::debug!("staged {} bytes at {}", bytes.len(), file.display());
        Ok(file)
    }
}

/// Keeps uploads in memory; handles are synthetic paths
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl UploadStore for MemoryStore {
    fn store(&self, label: &str, bytes: &[u8]) -> Result<PathBuf> {
        let handle = PathBuf::from(format!("memory/temp_{}.jpg", label));
        self.files
            .borrow_mut()
            .insert(handle.clone(), bytes.to_vec());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_store_overwrites_label() {
        let dir = std::env::temp_dir().join(format!("plumbline-store-{}", std::process::id()));
        let store = TempDirStore::at(&dir).unwrap();

        let first = store.store("Left", b"one").unwrap();
        let second = store.store("Left", b"two").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.file_name().unwrap(), "temp_Left.jpg");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");

        let right = store.store("Right", b"three").unwrap();
        assert_ne!(right, first);

        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let handle = store.store("Right", b"abc").unwrap();
        assert_eq!(store.get(&handle).unwrap(), b"abc");
        assert_eq!(store.len(), 1);
    }
}
