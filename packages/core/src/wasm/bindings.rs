// Точки входа для JS: запуск миграции и чтение перенесённых записей

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::config::Config;
use crate::migrator::{Migrator, Readiness};
use crate::storage::models::{MigrationReport, Record};
use crate::storage::{IndexedDbSource, KeyValueStore, LocalStorageStore};
use crate::utils::error::{describe_js, MigrationError};
use crate::utils::logging;
use crate::wasm::console;

type JsResult<T> = Result<T, JsValue>;

async fn run(config: Config, readiness: Readiness) -> Result<MigrationReport, MigrationError> {
    let source = IndexedDbSource::from_window()?;
    let mut dest = LocalStorageStore::from_window()?;

    let migrator = Migrator::new(source, config);
    let report = migrator.run(&mut dest, readiness).await?;

    logging::log(&logging::summarize(&report));
    for failure in &report.failures {
        console::error(&format!(
            "[metadata-updater] record #{} ({}) not copied: {}",
            failure.index,
            failure.key.as_deref().unwrap_or("no key"),
            failure.reason
        ));
    }

    Ok(report)
}

// Обычные JS-объекты вместо Map
fn report_to_js(report: &MigrationReport) -> JsResult<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(report.serialize(&serializer).map_err(MigrationError::from)?)
}

/// Миграция с глобальной конфигурацией и задержкой готовности из неё
#[wasm_bindgen]
pub async fn run_migration() -> JsResult<JsValue> {
    console_error_panic_hook::set_once();
    let config = Config::global().clone();
    let readiness = Readiness::from_config(&config);
    report_to_js(&run(config, readiness).await?)
}

/// Миграция с явными именами базы, коллекции и ключевого поля
#[wasm_bindgen]
pub async fn run_migration_with(
    database: String,
    collection: String,
    key_field: String,
    delay_ms: u32,
) -> JsResult<JsValue> {
    console_error_panic_hook::set_once();
    let config = Config {
        database_name: database,
        collection_name: collection,
        key_field,
        ready_delay_ms: u64::from(delay_ms),
        ..Config::global().clone()
    };
    let readiness = Readiness::from_config(&config);
    report_to_js(&run(config, readiness).await?)
}

/// Миграция, которая читает источник только после разрешения `ready`.
///
/// Отклонённый промис прерывает миграцию с ошибкой `NotReady`.
#[wasm_bindgen]
pub async fn run_migration_when_ready(ready: js_sys::Promise) -> JsResult<JsValue> {
    console_error_panic_hook::set_once();
    let (tx, readiness) = Readiness::channel();

    wasm_bindgen_futures::spawn_local(async move {
        match JsFuture::from(ready).await {
            Ok(_) => {
                let _ = tx.send(());
            }
            Err(e) => {
                console::error(&format!(
                    "[metadata-updater] readiness promise rejected: {}",
                    describe_js(&e)
                ));
            }
        }
    });

    report_to_js(&run(Config::global().clone(), readiness).await?)
}

/// Прочитать перенесённую запись из localStorage; `null`, если ключа нет
#[wasm_bindgen]
pub fn migrated_record(key: String) -> JsResult<JsValue> {
    let store = LocalStorageStore::from_window()?;
    match store.get_item(&key)? {
        Some(text) => {
            // Проверяем, что значение действительно запись
            Record::from_json(&text)?;
            js_sys::JSON::parse(&text)
        }
        None => Ok(JsValue::NULL),
    }
}

#[cfg(feature = "autorun")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console::init_logging();

    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = run_migration().await {
            console::error(&format!("[metadata-updater] migration failed: {}", describe_js(&e)));
        }
    });
}
