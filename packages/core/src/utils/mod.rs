// Вспомогательные утилиты

pub mod error;
pub mod logging;
pub mod timer;
