//! Persistent bulletin history
//!
//! Bulletins live as one JSON array under [`BULLETIN_STORAGE_KEY`] in a
//! key/value [`StorageBackend`]. Writes operate on the raw array, so entries
//! this build cannot parse are carried through untouched instead of being
//! dropped by an unrelated save.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::model::{Bulletin, GameStatus};
use crate::rendering::export::write_atomic;
use crate::{Error, Result};

pub const BULLETIN_STORAGE_KEY: &str = "betting_bulletins";

/// Bulletins per history page.
pub const HISTORY_PAGE_SIZE: usize = 20;

/// String key/value persistence.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`; path separators and other punctuation become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name.trim_start_matches('.')))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StorageError(format!("reading '{}': {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_atomic(&self.path_for(key), value.as_bytes())
            .map_err(|e| Error::StorageError(format!("writing '{}': {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::StorageError(format!("removing '{}': {}", key, e))),
        }
    }
}

/// In-process storage, mainly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::StorageError("memory storage lock poisoned".into()))
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One page of history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    /// 1-based page number actually served.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub items: Vec<Bulletin>,
}

pub struct BulletinStore<S: StorageBackend> {
    backend: S,
}

impl<S: StorageBackend> BulletinStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Raw entries. Unreadable or non-array data degrades to empty.
    fn load_raw(&self) -> Vec<Value> {
        let stored = match self.backend.get(BULLETIN_STORAGE_KEY) {
            Ok(Some(s)) => s,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("could not read bulletin history: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Value>(&stored) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                log::warn!("bulletin history is not a JSON array; treating as empty");
                Vec::new()
            }
            Err(e) => {
                log::warn!("bulletin history is not valid JSON ({}); treating as empty", e);
                Vec::new()
            }
        }
    }

    fn write_raw(&self, entries: &[Value]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.backend.set(BULLETIN_STORAGE_KEY, &json)
    }

    fn parse(index: usize, entry: Value) -> Option<Bulletin> {
        match serde_json::from_value::<Bulletin>(entry) {
            Ok(mut b) => {
                b.normalize();
                Some(b)
            }
            Err(e) => {
                log::warn!("skipping unreadable bulletin at position {}: {}", index, e);
                None
            }
        }
    }

    fn entry_id(entry: &Value) -> Option<&str> {
        entry.get("id").and_then(Value::as_str)
    }

    /// Insert or replace by id; the saved bulletin goes first.
    pub fn save(&self, bulletin: &Bulletin) -> Result<()> {
        let mut entries = self.load_raw();
        entries.retain(|e| Self::entry_id(e) != Some(bulletin.id.as_str()));
        entries.insert(0, serde_json::to_value(bulletin)?);
        self.write_raw(&entries)?;
        log::info!("saved bulletin {} ({} in history)", bulletin.id, entries.len());
        Ok(())
    }

    /// All readable bulletins in stored order (most recently saved first).
    pub fn list(&self) -> Vec<Bulletin> {
        self.load_raw()
            .into_iter()
            .enumerate()
            .filter_map(|(i, e)| Self::parse(i, e))
            .collect()
    }

    /// Newest `created_at` first.
    pub fn list_by_created(&self) -> Vec<Bulletin> {
        let mut all = self.list();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// 1-based page of [`list_by_created`](Self::list_by_created). Out of
    /// range pages come back empty; `page(0, _)` is page 1.
    pub fn page(&self, page: usize, per_page: usize) -> HistoryPage {
        let per_page = if per_page == 0 { HISTORY_PAGE_SIZE } else { per_page };
        let page = page.max(1);
        let all = self.list_by_created();
        let total = all.len();
        let total_pages = total.div_ceil(per_page).max(1);
        let items = all.into_iter().skip((page - 1) * per_page).take(per_page).collect();
        HistoryPage { page, total_pages, total, items }
    }

    pub fn get(&self, id: &str) -> Option<Bulletin> {
        self.list().into_iter().find(|b| b.id == id)
    }

    /// Remove by id; unknown ids are a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.load_raw();
        let before = entries.len();
        entries.retain(|e| Self::entry_id(e) != Some(id));
        if entries.len() == before {
            log::debug!("delete: no bulletin {}", id);
            return Ok(());
        }
        self.write_raw(&entries)?;
        log::info!("deleted bulletin {}", id);
        Ok(())
    }

    /// Set one game's status in place and recompute the bulletin status.
    /// Returns the updated bulletin, or `None` if either id is unknown.
    pub fn update_game_status(&self, bulletin_id: &str, game_id: &str, status: GameStatus) -> Result<Option<Bulletin>> {
        let mut entries = self.load_raw();
        let Some(pos) = entries.iter().position(|e| Self::entry_id(e) == Some(bulletin_id)) else {
            return Ok(None);
        };
        let Some(mut bulletin) = Self::parse(pos, entries[pos].clone()) else {
            return Ok(None);
        };
        if !bulletin.set_game_status(game_id, status) {
            return Ok(None);
        }
        entries[pos] = serde_json::to_value(&bulletin)?;
        self.write_raw(&entries)?;
        log::info!("bulletin {} game {} -> {:?} (now {:?})", bulletin_id, game_id, status, bulletin.status);
        Ok(Some(bulletin))
    }
}
