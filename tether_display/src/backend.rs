//! Backend abstraction.
//!
//! The backend plays the role a windowing/graphics bootstrap layer plays for
//! the registry: it creates and releases the native objects that resource
//! payloads own. Implementations decide what a handle means; payload types
//! never look inside one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::window::WindowFlags;

/// Opaque token for a backend-owned native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Window system events delivered by [`DisplayBackend::poll_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    CloseRequested,
    Resized { width: u32, height: u32 },
}

/// Native objects backing one swapchain.
#[derive(Debug, Clone)]
pub struct SwapchainHandles {
    pub swapchain: NativeHandle,
    /// One (image, view) pair per presentable image.
    pub images: Vec<(NativeHandle, NativeHandle)>,
}

/// A minimal display API.
///
/// Creation methods may fail; release never does. Releasing is the only
/// obligation a payload destructor has toward the backend.
pub trait DisplayBackend: Send + Sync {
    fn create_window(
        &self,
        title: &str,
        width: u32,
        height: u32,
        flags: WindowFlags,
    ) -> anyhow::Result<NativeHandle>;

    fn create_swapchain(
        &self,
        window: NativeHandle,
        width: u32,
        height: u32,
    ) -> anyhow::Result<SwapchainHandles>;

    /// Creates the sync state backing one in-flight frame.
    fn create_frame(&self, window: NativeHandle) -> anyhow::Result<NativeHandle>;

    /// Releases any handle this backend created.
    fn release(&self, handle: NativeHandle);

    fn poll_events(&self, window: NativeHandle) -> Vec<WindowEvent>;

    fn present(&self, window: NativeHandle) -> anyhow::Result<()>;
}

/// Images a [`NullBackend`] swapchain reports.
pub const NULL_SWAPCHAIN_IMAGES: usize = 3;

/// Headless backend that only mints and tracks handles.
///
/// Useful for tests and for running the display lifecycle without a window
/// system: every handle is a counter value, releases are recorded in order,
/// and events are whatever the test scripted via [`NullBackend::push_event`].
pub struct NullBackend {
    next: AtomicU64,
    released: Mutex<Vec<NativeHandle>>,
    events: Mutex<Vec<WindowEvent>>,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NullBackend {
    pub fn new() -> Self {
        NullBackend {
            next: AtomicU64::new(1),
            released: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    fn mint(&self) -> NativeHandle {
        NativeHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Handles created so far.
    pub fn created(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }

    /// Handles created and not yet released.
    pub fn live(&self) -> u64 {
        self.created() - self.released.lock().expect("release log poisoned").len() as u64
    }

    /// Release order observed so far.
    pub fn released(&self) -> Vec<NativeHandle> {
        self.released.lock().expect("release log poisoned").clone()
    }

    /// Queues an event for the next `poll_events` call.
    pub fn push_event(&self, event: WindowEvent) {
        self.events.lock().expect("event queue poisoned").push(event);
    }
}

impl DisplayBackend for NullBackend {
    fn create_window(
        &self,
        _title: &str,
        _width: u32,
        _height: u32,
        _flags: WindowFlags,
    ) -> anyhow::Result<NativeHandle> {
        Ok(self.mint())
    }

    fn create_swapchain(
        &self,
        _window: NativeHandle,
        _width: u32,
        _height: u32,
    ) -> anyhow::Result<SwapchainHandles> {
        Ok(SwapchainHandles {
            swapchain: self.mint(),
            images: (0..NULL_SWAPCHAIN_IMAGES)
                .map(|_| (self.mint(), self.mint()))
                .collect(),
        })
    }

    fn create_frame(&self, _window: NativeHandle) -> anyhow::Result<NativeHandle> {
        Ok(self.mint())
    }

    fn release(&self, handle: NativeHandle) {
        self.released
            .lock()
            .expect("release log poisoned")
            .push(handle);
    }

    fn poll_events(&self, _window: NativeHandle) -> Vec<WindowEvent> {
        std::mem::take(&mut *self.events.lock().expect("event queue poisoned"))
    }

    fn present(&self, _window: NativeHandle) -> anyhow::Result<()> {
        Ok(())
    }
}
