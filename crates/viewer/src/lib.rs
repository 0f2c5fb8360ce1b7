//! Dual-buffer image viewer.
//!
//! Two display layers alternate: the next image always loads into the
//! hidden one while the visible one keeps showing, and the roles flip
//! only once the load resolved. Neighbours of the displayed image are
//! warmed through a [`CacheWarmer`].

pub mod buffer;
pub mod error;
pub mod input;
pub mod layout;
pub mod preloader;
pub mod viewer;

pub use buffer::{BufferId, Buffers, Slot, SlotState};
pub use error::{DecodeError, ViewerError};
pub use input::{Direction, Key, ViewerAction, action_for_key, action_for_swipe};
pub use layout::{ContainerSize, ViewerConfig, Viewport, fit_container};
pub use preloader::{CacheWarmer, NoopWarmer, Preloader};
pub use viewer::{Effect, ImageSize, ImageViewer, LoadOutcome, LoadRequest, Transition};
