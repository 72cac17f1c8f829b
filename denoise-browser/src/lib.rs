//! Denoising preview in the browser
//!
//! JavaScript reads the two CSV files the user picked and hands their text
//! to [`DenoiseApp::load`]; previews are drawn into canvases inside the
//! given container elements.

mod app;
mod canvas;

use wasm_bindgen::prelude::*;

pub use app::DenoiseApp;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    Ok(())
}
