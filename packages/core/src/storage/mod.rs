// Модуль хранилищ: источник (IndexedDB) и назначение (localStorage)

#![allow(async_fn_in_trait)]

pub mod memory;
pub mod models;

#[cfg(target_arch = "wasm32")]
pub mod indexeddb;
#[cfg(target_arch = "wasm32")]
pub mod local;

use crate::utils::error::Result;
use models::Record;

#[cfg(target_arch = "wasm32")]
pub use indexeddb::{IndexedDbConnection, IndexedDbSource};
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageStore;

pub use memory::{MemoryKeyValueStore, MemorySource};

/// Структурированная база данных, из которой читаются записи
pub trait SourceDatabase {
    type Connection: SourceConnection;

    /// Открыть соединение с базой `name`.
    async fn open(&self, name: &str) -> Result<Self::Connection>;
}

/// Открытое соединение с источником.
///
/// Соединение закрывается при `Drop`, поэтому владелец освобождает его
/// на любом пути выхода.
pub trait SourceConnection {
    /// Прочитать все записи коллекции одной read-only транзакцией.
    async fn read_all(&self, collection: &str) -> Result<Vec<Record>>;
}

/// Плоское key-value хранилище с текстовыми значениями
pub trait KeyValueStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    fn get_item(&self, key: &str) -> Result<Option<String>>;
}
