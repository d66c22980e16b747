use crate::sync;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Durable blob storage addressed by store id.
///
/// Calls are blocking and are not retried.
pub trait StorageBackend: Send + Sync {
    /// The blob stored under `store_id`, or `None` if nothing was stored.
    fn read(&self, store_id: &str) -> io::Result<Option<String>>;

    /// Replace the blob stored under `store_id`.
    fn write(&self, store_id: &str, blob: &str) -> io::Result<()>;
}

/// In-process backend. Clones share the same blobs.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        sync::read(&self.blobs).len()
    }

    pub fn is_empty(&self) -> bool {
        sync::read(&self.blobs).is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, store_id: &str) -> io::Result<Option<String>> {
        Ok(sync::read(&self.blobs).get(store_id).cloned())
    }

    fn write(&self, store_id: &str, blob: &str) -> io::Result<()> {
        sync::write(&self.blobs).insert(store_id.to_string(), blob.to_string());
        Ok(())
    }
}

/// Backend keeping one `<store id>.json` file per store in a directory.
#[derive(Clone, Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Use `dir` for snapshots. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, store_id: &str) -> io::Result<PathBuf> {
        if store_id.is_empty()
            || store_id == "."
            || store_id == ".."
            || store_id.contains(['/', '\\'])
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("store id `{store_id}` cannot be used as a file name"),
            ));
        }
        Ok(self.dir.join(format!("{store_id}.json")))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, store_id: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(store_id)?) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, store_id: &str, blob: &str) -> io::Result<()> {
        let path = self.path_for(store_id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, blob)
    }
}
