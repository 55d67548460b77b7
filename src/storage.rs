//! Namespaced key/value persistence for resume points and playlists.
//!
//! On the device this is NVS; on a host it is a TOML file. Writes are
//! buffered until [`KvStore::commit`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};

pub trait KvStore: Send + Sync {
    fn get_string(&self, namespace: &str, key: &str) -> Option<String>;
    fn get_i32(&self, namespace: &str, key: &str) -> Option<i32>;
    fn get_i64(&self, namespace: &str, key: &str) -> Option<i64>;
    fn set_string(&self, namespace: &str, key: &str, value: &str);
    fn set_i32(&self, namespace: &str, key: &str, value: i32);
    fn set_i64(&self, namespace: &str, key: &str, value: i64);
    fn remove(&self, namespace: &str, key: &str);
    /// Make pending writes durable.
    fn commit(&self) -> Result<()>;
}

type Tables = BTreeMap<String, BTreeMap<String, toml::Value>>;

/// A [`KvStore`] kept as one TOML table per namespace.
///
/// Without a path it lives only in memory and `commit` is a no-op.
#[derive(Debug, Default)]
pub struct TomlStore {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl TomlStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or start) a store backed by `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tables = match fs::read_to_string(&path) {
            Ok(text) => toml::from_str::<Tables>(&text)
                .map_err(|e| Error::Storage(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            tables: Mutex::new(tables),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get(&self, namespace: &str, key: &str) -> Option<toml::Value> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(namespace)?.get(key).cloned()
    }

    fn set(&self, namespace: &str, key: &str, value: toml::Value) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl KvStore for TomlStore {
    fn get_string(&self, namespace: &str, key: &str) -> Option<String> {
        match self.get(namespace, key)? {
            toml::Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn get_i32(&self, namespace: &str, key: &str) -> Option<i32> {
        self.get_i64(namespace, key)
            .and_then(|v| i32::try_from(v).ok())
    }

    fn get_i64(&self, namespace: &str, key: &str) -> Option<i64> {
        match self.get(namespace, key)? {
            toml::Value::Integer(v) => Some(v),
            _ => None,
        }
    }

    fn set_string(&self, namespace: &str, key: &str, value: &str) {
        self.set(namespace, key, toml::Value::String(value.to_string()));
    }

    fn set_i32(&self, namespace: &str, key: &str, value: i32) {
        self.set(namespace, key, toml::Value::Integer(i64::from(value)));
    }

    fn set_i64(&self, namespace: &str, key: &str, value: i64) {
        self.set(namespace, key, toml::Value::Integer(value));
    }

    fn remove(&self, namespace: &str, key: &str) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = tables.get_mut(namespace) {
            t.remove(key);
        }
    }

    fn commit(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = {
            let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
            toml::to_string(&*tables).map_err(|e| Error::Storage(e.to_string()))?
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a power cut never leaves a truncated file.
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "state committed");
        Ok(())
    }
}
