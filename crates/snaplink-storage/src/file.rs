use crate::validate_key;
use snaplink_core::kv::{KeyValueStore, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A [`KeyValueStore`] that keeps one `<key>.json` file per key in a directory.
///
/// Writes go to a temporary sibling file first and are then renamed over
/// the target, so a crash mid-write never leaves a truncated value behind.
/// The directory is created on the first write.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the value files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        match fs::read_to_string(&path) {
            Ok(value) => {
                trace!(path = %path.display(), bytes = value.len(), "read value file");
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(key);
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), bytes = value.len(), "wrote value file");
        Ok(())
    }
}
