//! Swapchain resources.
//!
//! A swapchain owns its presentable images through registry dependency
//! edges; destroying the swapchain releases every image and view before the
//! swapchain's own native handle goes.

use std::sync::Arc;

use tracing::debug;

use tether_registry::handle::Handle;
use tether_registry::registry::Registry;

use crate::backend::{DisplayBackend, NativeHandle};

/// One presentable image plus its view.
pub struct Image {
    backend: Arc<dyn DisplayBackend>,
    image: NativeHandle,
    view: NativeHandle,
}

impl Image {
    pub fn image_handle(&self) -> NativeHandle {
        self.image
    }

    pub fn view_handle(&self) -> NativeHandle {
        self.view
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        // View first, then the image it was created from.
        self.backend.release(self.view);
        self.backend.release(self.image);
    }
}

/// Presentation image set for one window.
pub struct Swapchain {
    backend: Arc<dyn DisplayBackend>,
    handle: NativeHandle,
    extent: (u32, u32),
    images: Vec<Handle<Image>>,
}

impl Swapchain {
    /// Creates the swapchain and registers every image as its dependent.
    pub(crate) fn create(
        registry: &mut Registry,
        backend: Arc<dyn DisplayBackend>,
        window: NativeHandle,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Handle<Swapchain>> {
        let handles = backend.create_swapchain(window, width, height)?;

        let mut images = Vec::with_capacity(handles.images.len());
        for (image, view) in handles.images {
            images.push(registry.create(|_, _| Image {
                backend: Arc::clone(&backend),
                image,
                view,
            }));
        }

        let image_list = images.clone();
        let swapchain = registry.create(|id, _| {
            debug!(id = %id, images = image_list.len(), "swapchain created");
            Swapchain {
                backend: Arc::clone(&backend),
                handle: handles.swapchain,
                extent: (width, height),
                images,
            }
        });
        for image in image_list {
            registry.add_dependency(swapchain, image)?;
        }
        Ok(swapchain)
    }

    pub fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Image at an acquire index; resolves back through the registry.
    pub fn image(&self, index: usize) -> Option<Handle<Image>> {
        self.images.get(index).copied()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.backend.release(self.handle);
    }
}
