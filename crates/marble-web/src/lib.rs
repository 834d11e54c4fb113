//! Marble Race Web Host
//!
//! Browser front end for the race engine: a `<canvas>` 2D renderer, a
//! `requestAnimationFrame` scheduler and the `MarbleRace` controller
//! exported to JavaScript.
//!
//! Everything but the projection math is WASM-only. Use
//! `wasm-pack build crates/marble-web` or
//! `cargo check -p marble-web --target wasm32-unknown-unknown`.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod projection;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod frames;

#[cfg(target_arch = "wasm32")]
pub use app::MarbleRace;
#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasScene;
#[cfg(target_arch = "wasm32")]
pub use frames::AnimationFrames;

/// Module entry: panic messages and tracing go to the browser console.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, Layer};
    use tracing_web::MakeWebConsoleWriter;

    console_error_panic_hook::set_once();

    let filter = EnvFilter::new("info,marble_core=info");

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new())
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}
