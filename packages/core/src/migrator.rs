//! Перенос записей из структурированной базы в плоское key-value хранилище.
//!
//! Конвейер строго последовательный: open -> ready -> read-all -> copy-all -> close.
//! Соединение с источником принадлежит [`Migrator::run`] и закрывается при
//! выходе из него на любом пути, включая ошибки.

use crate::config::{Config, FailurePolicy};
use crate::storage::models::{MigrationReport, Record};
use crate::storage::{KeyValueStore, SourceConnection, SourceDatabase};
use crate::utils::error::{MigrationError, Result};
use crate::utils::timer;
use futures::channel::oneshot;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

/// Когда источник готов к чтению
#[derive(Debug)]
pub enum Readiness {
    /// Читать сразу после открытия
    Immediate,
    /// Подождать фиксированное время (старая эвристика)
    Delay(Duration),
    /// Ждать явного сигнала от кода, инициализирующего базу
    Signal(oneshot::Receiver<()>),
}

impl Readiness {
    /// Задержка из конфигурации; ноль означает [`Readiness::Immediate`]
    pub fn from_config(config: &Config) -> Self {
        if config.ready_delay_ms == 0 {
            Readiness::Immediate
        } else {
            Readiness::Delay(Duration::from_millis(config.ready_delay_ms))
        }
    }

    /// Пара (отправитель, ожидание) для явного handshake
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Readiness::Signal(rx))
    }

    pub async fn wait(self) -> Result<()> {
        match self {
            Readiness::Immediate => Ok(()),
            Readiness::Delay(duration) => {
                debug!("waiting {:?} before reading", duration);
                timer::sleep(duration).await;
                Ok(())
            }
            Readiness::Signal(rx) => rx.await.map_err(|_| {
                MigrationError::NotReady("readiness signal dropped before firing".to_string())
            }),
        }
    }
}

pub struct Migrator<S: SourceDatabase> {
    source: S,
    config: Config,
}

impl<S: SourceDatabase> Migrator<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Выполнить один прогон миграции в `dest`.
    ///
    /// # Errors
    ///
    /// Ошибки открытия, ожидания готовности и чтения прерывают прогон до
    /// первой записи. Ошибки отдельных записей попадают в отчёт при
    /// [`FailurePolicy::Collect`] и прерывают прогон при [`FailurePolicy::Abort`].
    pub async fn run<D: KeyValueStore>(
        &self,
        dest: &mut D,
        readiness: Readiness,
    ) -> Result<MigrationReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "migration",
            run_id = %run_id,
            database = %self.config.database_name,
            collection = %self.config.collection_name,
        );

        self.run_stages(dest, readiness, run_id)
            .instrument(span)
            .await
    }

    async fn run_stages<D: KeyValueStore>(
        &self,
        dest: &mut D,
        readiness: Readiness,
        run_id: String,
    ) -> Result<MigrationReport> {
        let mut report = MigrationReport::new(
            run_id,
            &self.config.database_name,
            &self.config.collection_name,
        );

        let connection = self.source.open(&self.config.database_name).await?;
        info!("source opened");

        readiness.wait().await?;

        let records = connection.read_all(&self.config.collection_name).await?;
        report.read = records.len();
        info!("read {} records", records.len());

        self.copy_all(&records, dest, &mut report)?;

        drop(connection);
        report.finish();
        info!(
            copied = report.copied,
            overwritten = report.overwritten,
            failed = report.failures.len(),
            "migration finished"
        );
        Ok(report)
    }

    fn copy_all<D: KeyValueStore>(
        &self,
        records: &[Record],
        dest: &mut D,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let mut written = HashSet::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            match copy_one(record, &self.config.key_field, dest) {
                Ok(key) => {
                    debug!(key = %key, "record copied");
                    let overwrote = !written.insert(key);
                    report.record_copy(overwrote);
                }
                Err((key, err)) => match self.config.failure_policy {
                    FailurePolicy::Collect => {
                        warn!(index, key = ?key, "record skipped: {}", err);
                        report.record_failure(index, key, &err);
                    }
                    FailurePolicy::Abort => {
                        warn!(index, key = ?key, "aborting migration: {}", err);
                        return Err(err);
                    }
                },
            }
        }

        Ok(())
    }
}

fn copy_one<D: KeyValueStore>(
    record: &Record,
    key_field: &str,
    dest: &mut D,
) -> std::result::Result<String, (Option<String>, MigrationError)> {
    let key = record.key(key_field).map_err(|e| (None, e))?;
    let value = record.to_json().map_err(|e| (Some(key.clone()), e))?;
    dest.set_item(&key, &value).map_err(|e| (Some(key.clone()), e))?;
    Ok(key)
}
