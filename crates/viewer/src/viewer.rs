//! Full-screen viewer state machine.
//!
//! The viewer never performs I/O. Opening or navigating yields a
//! [`LoadRequest`]; the host fetches and decodes the image and reports
//! back through [`ImageViewer::complete_load`]. Each request carries the
//! generation it was issued under, and only a result for the latest
//! generation may change what is on screen.

use std::time::Duration;

use morphgallery_protocol::GalleryItem;
use tracing::{debug, warn};

use crate::buffer::{BufferId, Buffers, SlotState};
use crate::error::{DecodeError, ViewerError};
use crate::input::{Direction, ViewerAction};
use crate::layout::{ContainerSize, ViewerConfig, Viewport, fit_container};
use crate::preloader::Preloader;

/// An image the host must fetch and decode into `buffer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub index: usize,
    pub buffer: BufferId,
    pub url: String,
}

/// Natural dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Crossfade the host should play after a load resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Layer fading out, if one was visible.
    pub from: Option<BufferId>,
    /// Layer fading in; already the active buffer.
    pub to: BufferId,
    pub index: usize,
    /// Container size to apply before the fade starts.
    pub container: ContainerSize,
    pub duration: Duration,
    /// `to` shows the failure placeholder.
    pub failed: bool,
}

/// Result of reporting a finished load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Revealed(Transition),
    /// Superseded by a newer request or by closing; nothing changed.
    Stale,
}

/// Effect of a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Load(LoadRequest),
    Download(GalleryItem),
    Closed,
    Nothing,
}

/// Dual-buffer image viewer.
#[derive(Debug)]
pub struct ImageViewer {
    items: Vec<GalleryItem>,
    config: ViewerConfig,
    viewport: Viewport,
    buffers: Buffers,
    preloader: Preloader,
    open: bool,
    /// Index on screen.
    current_index: Option<usize>,
    /// Index most recently requested.
    target_index: Option<usize>,
    generation: u64,
    container: Option<ContainerSize>,
}

impl ImageViewer {
    pub fn new(items: Vec<GalleryItem>, preloader: Preloader) -> Self {
        Self::with_config(items, preloader, ViewerConfig::default())
    }

    pub fn with_config(items: Vec<GalleryItem>, preloader: Preloader, config: ViewerConfig) -> Self {
        Self {
            items,
            config,
            viewport: Viewport::default(),
            buffers: Buffers::default(),
            preloader,
            open: false,
            current_index: None,
            target_index: None,
            generation: 0,
            container: None,
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    /// Replaces the listing, e.g. after an upload batch finished.
    ///
    /// Closes the viewer if what it was showing no longer exists.
    pub fn set_items(&mut self, items: Vec<GalleryItem>) {
        self.items = items;
        let gone = |i: Option<usize>| i.is_some_and(|i| i >= self.items.len());
        if self.open && (gone(self.current_index) || gone(self.target_index)) {
            self.close();
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Index of the image on screen.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Index the viewer is heading to; equals `current_index` when idle.
    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    /// Container size applied by the last reveal.
    pub fn container(&self) -> Option<ContainerSize> {
        self.container
    }

    /// Opens the viewer on `index`.
    pub fn open(&mut self, index: usize) -> Result<LoadRequest, ViewerError> {
        let count = self.items.len();
        if count == 0 {
            return Err(ViewerError::NoItems);
        }
        if index >= count {
            return Err(ViewerError::IndexOutOfRange { index, count });
        }

        self.open = true;
        let request = self.request_load(index)?;
        self.preloader.warm_neighbors(&self.items, index);
        Ok(request)
    }

    /// Moves one image forward or back, wrapping at both ends.
    ///
    /// Steps from the latest requested index, so repeated calls before a
    /// load resolves keep advancing. The visible image stays until the
    /// new one has loaded.
    pub fn navigate(&mut self, direction: Direction) -> Result<LoadRequest, ViewerError> {
        if !self.open {
            return Err(ViewerError::Closed);
        }
        let count = self.items.len();
        if count == 0 {
            return Err(ViewerError::NoItems);
        }
        let from = self.target_index.unwrap_or(0);
        let index = match direction {
            Direction::Next => (from + 1) % count,
            Direction::Prev => (from + count - 1) % count,
        };
        self.request_load(index)
    }

    pub fn next(&mut self) -> Result<LoadRequest, ViewerError> {
        self.navigate(Direction::Next)
    }

    pub fn prev(&mut self) -> Result<LoadRequest, ViewerError> {
        self.navigate(Direction::Prev)
    }

    /// Reports the result of loading the image of `generation`.
    ///
    /// On success the container is resized first, then the loaded buffer
    /// becomes active. A decode failure reveals the placeholder in the
    /// same way so the displayed index follows the user. Results for a
    /// superseded generation are dropped.
    pub fn complete_load(
        &mut self,
        generation: u64,
        result: Result<ImageSize, DecodeError>,
    ) -> LoadOutcome {
        if !self.open || generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale image load");
            return LoadOutcome::Stale;
        }

        let to = self.buffers.inactive();
        let slot = self.buffers.slot(to);
        let index = match (slot.state(), slot.index()) {
            (SlotState::Loading { generation: g }, Some(index)) if *g == generation => index,
            _ => {
                debug!(generation, "no pending load for generation");
                return LoadOutcome::Stale;
            }
        };
        let from = self.buffers.active();

        let (container, failure) = match result {
            Ok(size) => {
                let container = self.adjust_container(size.width, size.height);
                (container, None)
            }
            Err(e) => {
                warn!(index, error = %e, "image failed to load, showing placeholder");
                let container = match self.container {
                    Some(size) => size,
                    None => self.adjust_container(0, 0),
                };
                (container, Some(e.reason))
            }
        };

        let failed = failure.is_some();
        self.buffers.reveal(to, failure);
        self.current_index = Some(index);
        self.preloader.warm_neighbors(&self.items, index);

        LoadOutcome::Revealed(Transition {
            from,
            to,
            index,
            container,
            duration: self.config.crossfade,
            failed,
        })
    }

    /// Sizes the container for an image of the given natural size and
    /// remembers it.
    pub fn adjust_container(&mut self, natural_width: u32, natural_height: u32) -> ContainerSize {
        let size = fit_container(natural_width, natural_height, self.viewport, &self.config);
        self.container = Some(size);
        size
    }

    /// Closes the viewer and empties both buffers. Loads still in
    /// flight resolve as stale.
    pub fn close(&mut self) {
        self.open = false;
        self.generation = self.generation.wrapping_add(1);
        self.buffers.clear();
        self.current_index = None;
        self.target_index = None;
        self.container = None;
    }

    /// The item on screen, for saving under its original name.
    pub fn download_target(&self) -> Option<&GalleryItem> {
        if !self.open {
            return None;
        }
        self.current_index.and_then(|i| self.items.get(i))
    }

    /// Applies an action produced by the input mapping.
    pub fn handle(&mut self, action: ViewerAction) -> Result<Effect, ViewerError> {
        match action {
            ViewerAction::Close => {
                self.close();
                Ok(Effect::Closed)
            }
            ViewerAction::Navigate(direction) => self.navigate(direction).map(Effect::Load),
            ViewerAction::Download => Ok(self
                .download_target()
                .cloned()
                .map_or(Effect::Nothing, Effect::Download)),
        }
    }

    fn request_load(&mut self, index: usize) -> Result<LoadRequest, ViewerError> {
        let count = self.items.len();
        let item = self
            .items
            .get(index)
            .cloned()
            .ok_or(ViewerError::IndexOutOfRange { index, count })?;

        self.generation = self.generation.wrapping_add(1);
        self.target_index = Some(index);
        let url = item.url.clone();
        let buffer = self.buffers.begin_load(index, item, self.generation);
        debug!(index, generation = self.generation, ?buffer, "loading image");

        Ok(LoadRequest {
            generation: self.generation,
            index,
            buffer,
            url,
        })
    }
}
