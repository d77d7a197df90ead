//! Console logging for the page script.

use std::sync::Once;

use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

static INIT: Once = Once::new();

/// Install a `tracing` subscriber that writes to the browser console.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init() {
    INIT.call_once(|| {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(console_level)
                .build(),
        );

        let _ = set_global_default(Registry::default().with(wasm_layer));
    });
}
