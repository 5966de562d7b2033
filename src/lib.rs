/// Ticket Archiver - content script that archives rows of the osTicket queue
/// Built with Rust + WASM

pub mod columns;
pub mod config;
pub mod error;
pub mod identity;
pub mod page;
pub mod storage;
pub mod sync;
pub mod timestamp;

pub use config::ArchiverConfig;
pub use error::ArchiveError;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

/// Run the archiver with the default osTicket settings
#[wasm_bindgen]
pub fn start_content_script() {
    start(ArchiverConfig::default());
}

/// Run the archiver with settings from a (possibly partial) JS object
#[wasm_bindgen]
pub fn start_with_config(config: JsValue) -> Result<(), JsValue> {
    let config = if config.is_null() || config.is_undefined() {
        ArchiverConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| ArchiveError::Config {
            reason: e.to_string(),
        })?
    };
    start(config);
    Ok(())
}

fn start(config: ArchiverConfig) {
    wasm_logger::init(wasm_logger::Config::new(config.log_level()));
    page::ContentScript::new(config).start();
}

// Re-export the date normalizer for JavaScript access
#[wasm_bindgen]
pub fn normalize_timestamp(text: &str) -> Result<f64, JsValue> {
    timestamp::normalize_timestamp(text)
        .map(|millis| millis as f64)
        .map_err(JsValue::from)
}
