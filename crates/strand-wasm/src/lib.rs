//! Strand WASM - embedded bindings for strand-engine
//!
//! Exposes the chain engine to JavaScript/TypeScript hosts (browser or
//! Node.js) with camelCase interop casing. Persistent storage configs
//! degrade to in-memory with a console warning; callers should check
//! `hasStorage()` before relying on persistence.

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

mod error;
mod interop;
mod ledger;

pub use ledger::WasmLedger;
