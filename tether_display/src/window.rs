//! Window resources.
//!
//! A window owns its swapchain and its in-flight frames through registry
//! dependency edges, so destroying the window tears all of them down before
//! the native window handle itself is released.

use std::sync::Arc;

use tracing::{debug, info};

use tether_registry::handle::Handle;
use tether_registry::registry::Registry;

use crate::backend::{DisplayBackend, NativeHandle, WindowEvent};
use crate::config::DisplayConfig;
use crate::swapchain::Swapchain;

bitflags::bitflags! {
    /// Window creation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WindowFlags: u32 {
        const NONE = 0;
        const RESIZABLE  = 1 << 0;
        const HIDDEN     = 1 << 1;
        const BORDERLESS = 1 << 2;
    }
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self::NONE
    }
}

/// Per-frame state, one per frame in flight.
///
/// Owns the backend sync state for its slot; a real backend hangs command
/// recording and fencing off this handle.
pub struct Frame {
    backend: Arc<dyn DisplayBackend>,
    sync: NativeHandle,
}

impl Frame {
    pub fn sync_handle(&self) -> NativeHandle {
        self.sync
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.backend.release(self.sync);
    }
}

/// Top-level display resource.
pub struct Window {
    backend: Arc<dyn DisplayBackend>,
    handle: NativeHandle,
    open: bool,
    width: u32,
    height: u32,
    swapchain: Handle<Swapchain>,
    frames: Vec<Handle<Frame>>,
    frame_number: u64,
}

impl Window {
    /// Creates the window and its whole resource tree.
    ///
    /// The swapchain (with its images) and every in-flight frame are created
    /// first and registered as the window's dependents, swapchain before
    /// frames, so a single `registry.destroy(window)` releases everything in
    /// creation order before the window handle itself.
    pub fn create(
        registry: &mut Registry,
        backend: Arc<dyn DisplayBackend>,
        config: &DisplayConfig,
        flags: WindowFlags,
    ) -> anyhow::Result<Handle<Window>> {
        if config.frames_in_flight == 0 {
            anyhow::bail!("frames_in_flight must be at least 1");
        }
        let native = backend.create_window(&config.title, config.width, config.height, flags)?;
        let swapchain = Swapchain::create(
            registry,
            Arc::clone(&backend),
            native,
            config.width,
            config.height,
        )?;

        let mut frames = Vec::with_capacity(config.frames_in_flight as usize);
        for _ in 0..config.frames_in_flight {
            let sync = backend.create_frame(native)?;
            frames.push(registry.create(|_, _| Frame {
                backend: Arc::clone(&backend),
                sync,
            }));
        }

        let frame_list = frames.clone();
        let width = config.width;
        let height = config.height;
        let window = registry.create(|id, _| {
            debug!(id = %id, title = %config.title, "window created");
            Window {
                backend: Arc::clone(&backend),
                handle: native,
                open: true,
                width,
                height,
                swapchain,
                frames,
                frame_number: 0,
            }
        });
        registry.add_dependency(window, swapchain)?;
        for frame in frame_list {
            registry.add_dependency(window, frame)?;
        }
        info!(window = %window.id(), width, height, "window ready");
        Ok(window)
    }

    pub fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn swapchain(&self) -> Handle<Swapchain> {
        self.swapchain
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Frame to record into this tick, rotating through the in-flight set.
    pub fn current_frame(&self) -> Handle<Frame> {
        self.frames[(self.frame_number as usize) % self.frames.len()]
    }

    /// Drains pending window events, updating open state and size.
    pub fn poll_events(&mut self) -> Vec<WindowEvent> {
        let events = self.backend.poll_events(self.handle);
        for event in &events {
            match *event {
                WindowEvent::CloseRequested => {
                    debug!(window = %self.handle.0, "close requested");
                    self.open = false;
                }
                WindowEvent::Resized { width, height } => {
                    // Swapchain rebuild is the caller's concern.
                    self.width = width;
                    self.height = height;
                }
            }
        }
        events
    }

    /// Presents the current frame and advances the rotation.
    pub fn present(&mut self) -> anyhow::Result<()> {
        self.backend.present(self.handle)?;
        self.frame_number += 1;
        Ok(())
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // By the cascade guarantee the swapchain, images, and frames are
        // already gone when this runs.
        self.backend.release(self.handle);
    }
}
