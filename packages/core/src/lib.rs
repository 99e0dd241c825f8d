// Impartus metadata updater
// Rust/WASM перенос метаданных лекций из IndexedDB в localStorage

#![warn(clippy::all)]

// Модули
pub mod config;
pub mod migrator;
pub mod storage;
pub mod utils;

// WASM-specific bindings
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-exports для удобства
pub use config::{Config, FailurePolicy};
pub use migrator::{Migrator, Readiness};
pub use storage::models::{CopyFailure, MigrationReport, Record};
pub use utils::error::{MigrationError, Result};
