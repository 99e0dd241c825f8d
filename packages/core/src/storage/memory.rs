// In-memory хранилища для тестов и non-WASM платформ

use crate::storage::models::Record;
use crate::storage::{KeyValueStore, SourceConnection, SourceDatabase};
use crate::utils::error::{MigrationError, Result};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

type Collections = HashMap<String, Vec<Record>>;

/// In-memory источник: базы -> коллекции -> записи в порядке вставки
#[derive(Default)]
pub struct MemorySource {
    databases: HashMap<String, Collections>,
    open_connections: Rc<Cell<usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Создать (или заменить) коллекцию с записями
    pub fn insert_collection(&mut self, database: &str, collection: &str, records: Vec<Record>) {
        self.databases
            .entry(database.to_string())
            .or_default()
            .insert(collection.to_string(), records);
    }

    /// Количество ещё не закрытых соединений
    pub fn open_connections(&self) -> usize {
        self.open_connections.get()
    }
}

impl SourceDatabase for MemorySource {
    type Connection = MemoryConnection;

    async fn open(&self, name: &str) -> Result<MemoryConnection> {
        let collections = self
            .databases
            .get(name)
            .cloned()
            .ok_or_else(|| MigrationError::OpenError(format!("database '{}' not found", name)))?;

        self.open_connections.set(self.open_connections.get() + 1);
        Ok(MemoryConnection {
            collections,
            live: Rc::clone(&self.open_connections),
        })
    }
}

/// Соединение со снимком коллекций на момент открытия
pub struct MemoryConnection {
    collections: Collections,
    live: Rc<Cell<usize>>,
}

impl SourceConnection for MemoryConnection {
    async fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        self.collections.get(collection).cloned().ok_or_else(|| {
            MigrationError::TransactionError(format!("object store '{}' not found", collection))
        })
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// In-memory аналог localStorage
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    items: BTreeMap<String, String>,
    /// Максимальное число ключей, имитация квоты
    quota: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            quota: Some(max_entries),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(max) = self.quota {
            if !self.items.contains_key(key) && self.items.len() >= max {
                return Err(MigrationError::WriteError(format!(
                    "quota of {} entries exceeded while writing '{}'",
                    max, key
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }
}
