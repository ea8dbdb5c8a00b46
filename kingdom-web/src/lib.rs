#![forbid(unsafe_code)]
//! Browser client for Kingdom: yew pages over the platform-agnostic turn
//! machine, backed by `sessionStorage` and `fetch`.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod app;
pub mod components;
pub mod config;
pub mod dom;
pub mod logger;
pub mod pages;
pub mod router;
pub mod storage;
pub mod transport;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);
    yew::Renderer::<app::App>::new().render();
}
