use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use crate::{Result, Error};
use log::warn;

/// Mirrors [`LocalStorage`](crate::engine::LocalStorage) keys to disk.
///
/// Persistence uses an atomic "write-then-rename" strategy to ensure data integrity.
/// Each storage key is stored in its own `.json` file holding the value as a JSON string.
pub struct Persistence {
    data_dir: PathBuf,
}

impl Persistence {
    /// Initializes a new `Persistence` handler in the specified directory.
    ///
    /// If the directory does not exist, it will be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { data_dir: dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(Error::Internal(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    /// Writes a single key atomically.
    ///
    /// The value goes to a temporary file first and is then renamed over the
    /// final destination, so a crash never leaves a half-written file behind.
    pub fn save_item(&self, key: &str, value: &str) -> Result<()> {
        let file_path = self.path_for(key)?;
        let temp_path = file_path.with_extension("json.tmp");

        let bytes = serde_json::to_vec(value)?;

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }

    /// Removes the file backing a key, if any.
    pub fn remove_item(&self, key: &str) -> Result<()> {
        let file_path = self.path_for(key)?;
        match fs::remove_file(&file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads every key found in the data directory.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load_all(&self) -> Result<HashMap<String, String>> {
        let mut all_data = HashMap::new();

        if !self.data_dir.exists() {
            return Ok(all_data);
        }

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                let key = match path.file_stem().and_then(|s| s.to_str()) {
                    Some(k) => k.to_string(),
                    None => {
                        warn!("Skipping storage file with invalid name {:?}", path);
                        continue;
                    }
                };

                let content = match fs::read(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Could not read storage file {:?}: {}", path, e);
                        continue;
                    }
                };

                let value: String = match serde_json::from_slice(&content) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("Could not unmarshal storage value from {:?}: {}", path, e);
                        continue;
                    }
                };

                all_data.insert(key, value);
            }
        }

        Ok(all_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_all() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();

        persistence.save_item("portfolio_images", "{\"a.jpg\":1}").unwrap();

        let loaded = persistence.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("portfolio_images").unwrap(), "{\"a.jpg\":1}");
    }

    #[test]
    fn test_atomic_rename() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();

        persistence.save_item("auth_token", "abc").unwrap();

        assert!(dir.path().join("auth_token.json").exists());
        assert!(!dir.path().join("auth_token.json.tmp").exists());
    }

    #[test]
    fn test_remove_and_skip_corrupt() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();

        persistence.save_item("k1", "v1").unwrap();
        persistence.remove_item("k1").unwrap();
        persistence.remove_item("k1").unwrap();
        fs::write(dir.path().join("broken.json"), b"{not json").unwrap();

        let loaded = persistence.load_all().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let persistence = Persistence::new(dir.path()).unwrap();
        assert!(persistence.save_item("../escape", "x").is_err());
    }
}
