//! Централизованная конфигурация мигратора метаданных
//!
//! Имена базы, коллекции и ключевого поля определяются здесь,
//! чтобы не хардкодить их по всему проекту.

use std::sync::OnceLock;

/// Глобальная конфигурация (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Поведение при ошибке записи отдельной записи
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Записать ошибку в отчёт и продолжить
    #[default]
    Collect,
    /// Прервать миграцию на первой ошибке
    Abort,
}

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // ИСТОЧНИК (IndexedDB)
    // ============================================

    /// Имя базы данных IndexedDB
    pub database_name: String,

    /// Имя object store с записями
    pub collection_name: String,

    /// Поле записи, значение которого становится ключом в localStorage
    pub key_field: String,

    // ============================================
    // ВЫПОЛНЕНИЕ
    // ============================================

    /// Задержка перед чтением, если нет явного сигнала готовности (в миллисекундах)
    pub ready_delay_ms: u64,

    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_name: "video_database".to_string(),
            collection_name: "video_list".to_string(),
            key_field: "ttid".to_string(),
            ready_delay_ms: 1000,
            failure_policy: FailurePolicy::Collect,
        }
    }
}

impl Config {
    /// Получить глобальный экземпляр конфигурации
    ///
    /// При первом вызове инициализирует значения по умолчанию
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию со значениями по умолчанию
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::default())
            .map_err(|_| "Config already initialized")
    }

    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database_name, "video_database");
        assert_eq!(config.collection_name, "video_list");
        assert_eq!(config.key_field, "ttid");
        assert_eq!(config.ready_delay_ms, 1000);
        assert_eq!(config.failure_policy, FailurePolicy::Collect);
    }

    #[test]
    fn test_global_config_is_initialized_once() {
        let first = Config::global();
        assert!(Config::is_initialized());
        assert!(Config::init().is_err());
        assert_eq!(first.key_field, Config::global().key_field);
    }
}
