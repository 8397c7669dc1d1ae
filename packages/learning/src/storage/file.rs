use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{StateStore, StorageError, StorageResult};

/// One `<key>.json` file per key under a data directory. Writes go to a
/// temporary file in the same directory and are renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, json: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let mut temp_file = NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("data")).unwrap();

        assert_eq!(store.load("local.userLevel").unwrap(), None);
        store.save("local.userLevel", "{\"level\":2}").unwrap();
        store.save("local.userLevel", "{\"level\":3}").unwrap();
        assert_eq!(
            store.load("local.userLevel").unwrap().as_deref(),
            Some("{\"level\":3}")
        );

        store.remove("local.userLevel").unwrap();
        store.remove("local.userLevel").unwrap();
        assert_eq!(store.load("local.userLevel").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.save("../escape", "{}"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.load("").is_err());
    }
}
