#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

#[cfg(target_arch = "wasm32")]
mod app;
mod app_router;
#[cfg(target_arch = "wasm32")]
mod canvas_surface;
mod console_log;
#[cfg(target_arch = "wasm32")]
mod dom_input;
#[cfg(target_arch = "wasm32")]
mod http_api;
#[cfg(target_arch = "wasm32")]
mod local_store;
#[cfg(target_arch = "wasm32")]
mod socket_host;
#[cfg(target_arch = "wasm32")]
mod ui;

use tracing_subscriber::filter::LevelFilter;

#[cfg(target_arch = "wasm32")]
fn main() {
    console_log::init(LevelFilter::INFO);
    app::start();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    console_log::init(LevelFilter::INFO);
    tracing::error!("the pixel battle page only runs on wasm32; use pixelbattle-cli natively");
}
