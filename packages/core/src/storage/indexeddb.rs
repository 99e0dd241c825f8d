//! IndexedDB источник записей.
//!
//! Открывает существующую базу без указания версии: схема принадлежит
//! приложению, которое её создало, мигратор её только читает.
//! Несуществующая база не создаётся: upgrade-транзакция отменяется.

use crate::storage::models::Record;
use crate::storage::{SourceConnection, SourceDatabase};
use crate::utils::error::{describe_js, MigrationError, Result};
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Event, IdbDatabase, IdbFactory, IdbRequest, IdbTransactionMode, IdbVersionChangeEvent,
};

/// Фабрика соединений поверх `window.indexedDB`
#[derive(Debug, Clone)]
pub struct IndexedDbSource {
    factory: IdbFactory,
}

impl IndexedDbSource {
    pub fn new(factory: IdbFactory) -> Self {
        Self { factory }
    }

    /// Взять `IdbFactory` из глобального `window`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::UnavailableError`] outside a window context
    /// or when IndexedDB is disabled.
    pub fn from_window() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| MigrationError::UnavailableError("No window object".to_string()))?;

        let factory = window
            .indexed_db()
            .map_err(|e| MigrationError::UnavailableError(format!("IndexedDB error: {}", describe_js(&e))))?
            .ok_or_else(|| MigrationError::UnavailableError("IndexedDB not available".to_string()))?;

        Ok(Self::new(factory))
    }
}

impl SourceDatabase for IndexedDbSource {
    type Connection = IndexedDbConnection;

    async fn open(&self, name: &str) -> Result<IndexedDbConnection> {
        tracing::debug!("opening IndexedDB database '{}'", name);

        let open_req = self
            .factory
            .open(name)
            .map_err(|e| MigrationError::OpenError(describe_js(&e)))?;

        // oldVersion == 0: базы не было, браузер собирается создать пустую
        let missing = Rc::new(Cell::new(false));
        let onupgradeneeded = {
            let missing = Rc::clone(&missing);
            let req = open_req.clone();
            Closure::once(move |e: IdbVersionChangeEvent| {
                if e.old_version() == 0.0 {
                    missing.set(true);
                    if let Some(tx) = req.transaction() {
                        if let Err(err) = tx.abort() {
                            tracing::error!("failed to abort upgrade transaction: {}", describe_js(&err));
                        }
                    }
                }
            })
        };
        open_req.set_onupgradeneeded(Some(onupgradeneeded.as_ref().unchecked_ref()));

        let opened = await_request(&open_req).await;
        open_req.set_onupgradeneeded(None);
        drop(onupgradeneeded);

        let db_val = opened.map_err(|e| {
            if missing.get() {
                MigrationError::OpenError(format!("database '{}' does not exist", name))
            } else {
                MigrationError::OpenError(e)
            }
        })?;
        if missing.get() {
            // abort() не сработал; не оставляем пустую базу открытой
            if let Ok(db) = db_val.dyn_into::<IdbDatabase>() {
                db.close();
            }
            return Err(MigrationError::OpenError(format!(
                "database '{}' does not exist",
                name
            )));
        }
        let db = db_val.dyn_into::<IdbDatabase>().map_err(|_| {
            MigrationError::OpenError("open returned something other than an IdbDatabase".to_string())
        })?;

        Ok(IndexedDbConnection { db })
    }
}

/// Владеющее соединение с базой; закрывается при `Drop`
#[derive(Debug)]
pub struct IndexedDbConnection {
    db: IdbDatabase,
}

impl IndexedDbConnection {
    pub fn name(&self) -> String {
        self.db.name()
    }
}

impl SourceConnection for IndexedDbConnection {
    async fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        let tx = self
            .db
            .transaction_with_str_and_mode(collection, IdbTransactionMode::Readonly)
            .map_err(|e| MigrationError::TransactionError(describe_js(&e)))?;
        let store = tx
            .object_store(collection)
            .map_err(|e| MigrationError::TransactionError(describe_js(&e)))?;
        let req = store
            .get_all()
            .map_err(|e| MigrationError::ReadError(describe_js(&e)))?;

        let value = await_request(&req).await.map_err(MigrationError::ReadError)?;
        let array = value.dyn_into::<js_sys::Array>().map_err(|v| {
            MigrationError::ReadError(format!("getAll returned a non-array: {}", describe_js(&v)))
        })?;

        let mut records = Vec::with_capacity(array.length() as usize);
        for (index, item) in array.iter().enumerate() {
            records.push(record_from_js(&item).map_err(|e| {
                MigrationError::ReadError(format!("record #{} in '{}': {}", index, collection, e))
            })?);
        }

        tracing::debug!("read {} records from '{}'", records.len(), collection);
        Ok(records)
    }
}

impl Drop for IndexedDbConnection {
    fn drop(&mut self) {
        tracing::debug!("closing IndexedDB database '{}'", self.db.name());
        self.db.close();
    }
}

/// Structured clone -> JSON -> [`Record`], те же правила, что у `JSON.stringify`
fn record_from_js(value: &JsValue) -> Result<Record> {
    // `undefined` под out-of-line ключом: stringify возвращает undefined
    let text = js_sys::JSON::stringify(value)
        .map_err(|e| MigrationError::SerializationError(describe_js(&e)))?
        .as_string()
        .ok_or_else(|| MigrationError::ReadError("value has no JSON form".to_string()))?;
    Record::from_json(&text)
}

/// Дождаться `success`/`error` у IDB-запроса.
async fn await_request(req: &IdbRequest) -> std::result::Result<JsValue, String> {
    let (tx, rx) = oneshot::channel::<std::result::Result<JsValue, String>>();
    let tx = Rc::new(RefCell::new(Some(tx)));

    let tx_ok = Rc::clone(&tx);
    let onsuccess = {
        let req = req.clone();
        Closure::once(move |_e: Event| {
            let result = req.result().map_err(|e| describe_js(&e));
            if let Some(tx) = tx_ok.borrow_mut().take() {
                let _ = tx.send(result);
            }
        })
    };

    let tx_err = tx;
    let onerror = {
        let req = req.clone();
        Closure::once(move |_e: Event| {
            let message = req
                .error()
                .ok()
                .flatten()
                .map(|e| format!("{}: {}", e.name(), e.message()))
                .unwrap_or_else(|| "Unknown IndexedDB error".to_string());
            if let Some(tx) = tx_err.borrow_mut().take() {
                let _ = tx.send(Err(message));
            }
        })
    };

    req.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
    req.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    let outcome = rx
        .await
        .map_err(|_| "request dropped before completion".to_string());

    req.set_onsuccess(None);
    req.set_onerror(None);
    drop(onsuccess);
    drop(onerror);

    outcome?
}
