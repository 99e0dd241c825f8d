// Логирование

#[cfg(target_arch = "wasm32")]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(message: &str) {
    println!("{}", message);
}

/// Однострочная сводка по итогам миграции
pub fn summarize(report: &crate::storage::models::MigrationReport) -> String {
    format!(
        "[metadata-updater] {}/{}: read {}, copied {}, overwritten {}, failed {}",
        report.database,
        report.collection,
        report.read,
        report.copied,
        report.overwritten,
        report.failures.len()
    )
}
