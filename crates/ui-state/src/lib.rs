//! Presentation state driven by upload events: the progress panel and
//! a queue of transient notifications.

mod toast;
mod upload_panel;

pub use toast::{Toast, ToastKind, ToastQueue};
pub use upload_panel::{PanelSignal, UploadPanel};
