//! WASM bindings for annotate.
//!
//! Lets a page script highlight text, attach comments, and have both come
//! back on the next visit.

mod annotator;
mod types;

pub use annotator::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
