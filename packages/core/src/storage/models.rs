// Модели данных миграции

use crate::utils::error::{MigrationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Запись из object store.
///
/// Непрозрачный JSON-объект: мигратор читает только ключевое поле,
/// остальные поля переносятся как есть и в исходном порядке.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Разобрать запись из JSON-текста (ожидается объект)
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Сериализовать запись целиком, как это сделал бы `JSON.stringify`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Ключ назначения из поля `field`.
    ///
    /// Строки используются как есть, числа приводятся к десятичному тексту.
    /// Отсутствующее поле, `null`, булевы и составные значения ключом быть
    /// не могут: `true` не превращается в ключ `"true"`, запись уходит в отчёт.
    pub fn key(&self, field: &str) -> Result<String> {
        match self.0.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            None | Some(Value::Null) => Err(MigrationError::InvalidKey(format!(
                "record has no '{}' field",
                field
            ))),
            Some(other) => Err(MigrationError::InvalidKey(format!(
                "'{}' must be a string or a number, got {}",
                field, other
            ))),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Record {
    type Error = MigrationError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(MigrationError::ReadError(format!(
                "expected an object record, got {}",
                other
            ))),
        }
    }
}

/// Запись, которую не удалось перенести
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFailure {
    /// Позиция записи в результате `getAll`
    pub index: usize,
    pub key: Option<String>,
    pub reason: String,
}

/// Итог одного прогона миграции
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub run_id: String,
    pub database: String,
    pub collection: String,
    pub read: usize,
    pub copied: usize,
    /// Записи, перезаписавшие ключ, уже записанный в этом же прогоне
    pub overwritten: usize,
    pub failures: Vec<CopyFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    pub fn new(run_id: String, database: &str, collection: &str) -> Self {
        Self {
            run_id,
            database: database.to_string(),
            collection: collection.to_string(),
            read: 0,
            copied: 0,
            overwritten: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_copy(&mut self, overwrote: bool) {
        self.copied += 1;
        if overwrote {
            self.overwritten += 1;
        }
    }

    pub fn record_failure(&mut self, index: usize, key: Option<String>, error: &MigrationError) {
        self.failures.push(CopyFailure {
            index,
            key,
            reason: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Все прочитанные записи перенесены
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
