//! `tether_display`
//!
//! Display-side resources built on the registry: a window owning a
//! swapchain and per-frame state, all tied together by dependency edges so
//! that one `destroy` call tears the whole tree down in the right order.
//!
//! The crate never talks to a concrete windowing or graphics API. Everything
//! goes through the [`backend::DisplayBackend`] trait; the bundled
//! [`backend::NullBackend`] runs the full lifecycle headlessly.

pub mod backend;
pub mod config;
pub mod swapchain;
pub mod window;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::backend::*;
    pub use crate::config::*;
    pub use crate::swapchain::*;
    pub use crate::window::*;
}
