// Типы ошибок

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Storage unavailable: {0}")]
    UnavailableError(String),

    #[error("Failed to open database: {0}")]
    OpenError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Source not ready: {0}")]
    NotReady(String),

    #[error("WASM serialization error: {0}")]
    SerdeWasmError(String),
}

impl From<serde_json::Error> for MigrationError {
    fn from(error: serde_json::Error) -> Self {
        MigrationError::SerializationError(error.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<serde_wasm_bindgen::Error> for MigrationError {
    fn from(error: serde_wasm_bindgen::Error) -> Self {
        MigrationError::SerdeWasmError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

// Для WASM-биндингов
#[cfg(target_arch = "wasm32")]
impl From<MigrationError> for wasm_bindgen::JsValue {
    fn from(error: MigrationError) -> Self {
        wasm_bindgen::JsValue::from_str(&error.to_string())
    }
}

/// Текст из JsValue для сообщений об ошибках
#[cfg(target_arch = "wasm32")]
pub(crate) fn describe_js(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(dom) = value.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", dom.name(), dom.message());
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
