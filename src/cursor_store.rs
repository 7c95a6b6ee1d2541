use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// JSON-file persistence for the processed match set and per-player offsets.
///
/// Loading never fails: a missing file is a fresh start and a corrupt one is
/// logged and treated the same way.
#[derive(Debug, Clone)]
pub struct CursorStore {
    processed_path: PathBuf,
    cursors_path: PathBuf,
}

impl CursorStore {
    pub fn new(processed_path: impl Into<PathBuf>, cursors_path: impl Into<PathBuf>) -> Self {
        CursorStore {
            processed_path: processed_path.into(),
            cursors_path: cursors_path.into(),
        }
    }

    pub fn load(&self) -> HashSet<String> {
        read_or_default::<Vec<String>>(&self.processed_path)
            .into_iter()
            .collect()
    }

    pub fn save(&self, processed: &HashSet<String>) -> Result<()> {
        let mut ids: Vec<&String> = processed.iter().collect();
        ids.sort();
        write_atomically(&self.processed_path, &ids)
    }

    pub fn load_cursors(&self) -> HashMap<String, u32> {
        read_or_default(&self.cursors_path)
    }

    pub fn save_cursors(&self, cursors: &HashMap<String, u32>) -> Result<()> {
        write_atomically(&self.cursors_path, cursors)
    }
}

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Could not read {}: {}. Starting empty.", path.display(), e);
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("{} is corrupt ({}). Starting empty.", path.display(), e);
            T::default()
        }
    }
}

fn write_atomically<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }
    let json = serde_json::to_string(value).context("Failed to serialize cursor state")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
