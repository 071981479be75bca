//! Editor Bindings
//!
//! Declarative resource bindings for a stateful text-editor host: surfaces,
//! marker layers, markers, decorations and gutters, wired together through
//! single-slot value cells so that mount order never has to match the order
//! in which host objects become available.

#[cfg(target_arch = "wasm32")]
pub mod api;
pub mod bindings;
pub mod cell;
pub mod config;
pub mod error;
pub mod host;
pub mod subscription;

// Re-export commonly used types
pub use bindings::{
    Annotation, AnnotationProps, AnnotationStyle, Context, Decorable, Gutter, GutterProps, Layer,
    LayerProps, Mark, MarkChange, MarkProps, Markable, Ownership, Surface, SurfaceProps,
};
pub use cell::ValueCell;
pub use config::SurfaceConfig;
pub use error::{BindingError, BindingResult, HostError};
pub use subscription::{Subscription, SubscriptionSet};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already initialized: {}", err).into());
    }

    log::info!("Editor bindings WASM module initialized");
}
