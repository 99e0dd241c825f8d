// WASM-биндинги для браузера

pub mod bindings;
pub mod console;

pub use bindings::*;
