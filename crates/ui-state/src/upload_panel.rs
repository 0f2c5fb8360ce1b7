use morphgallery_upload::{BatchProgress, UploadEvent};

use crate::toast::ToastQueue;

/// What the host should do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSignal {
    None,
    /// The batch finished; reload the listing.
    RefreshListing,
}

/// State of the upload progress panel.
///
/// Fed with the orchestrator's events. Failures become error toasts
/// while the panel keeps showing the batch.
#[derive(Debug, Clone, Default)]
pub struct UploadPanel {
    visible: bool,
    percent: u32,
    status_line: String,
    current_file: Option<String>,
}

impl UploadPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Rounded aggregate percent shown in the progress ring.
    pub fn percent(&self) -> u32 {
        self.percent
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn apply(&mut self, event: &UploadEvent, toasts: &mut ToastQueue) -> PanelSignal {
        match event {
            UploadEvent::Started {
                files_total,
                total_bytes,
            } => {
                self.visible = true;
                self.percent = 0;
                self.current_file = None;
                self.status_line = format!(
                    "0 / {files_total} • 0 B / {}",
                    morphgallery_transfer::format_size(*total_bytes)
                );
                PanelSignal::None
            }
            UploadEvent::Progress(progress) => {
                self.show_progress(progress);
                PanelSignal::None
            }
            UploadEvent::FileCompleted { .. } => PanelSignal::None,
            UploadEvent::FileFailed {
                file_name, error, ..
            } => {
                toasts.error_with("Upload failed", format!("{file_name}: {error}"));
                PanelSignal::None
            }
            UploadEvent::Finished(report) => {
                let total = report.outcomes.len();
                let succeeded = report.succeeded();
                match (succeeded, total) {
                    (0, _) => {
                        toasts.error_with("Upload failed", "No images were uploaded");
                    }
                    (s, t) if s == t => {
                        toasts.success(if t == 1 {
                            "Image uploaded".to_string()
                        } else {
                            format!("{t} images uploaded")
                        });
                    }
                    (s, t) => {
                        toasts.info(format!("{s} of {t} images uploaded"));
                    }
                }
                tracing::debug!(succeeded, total, "upload panel reset");
                *self = Self::default();
                PanelSignal::RefreshListing
            }
        }
    }

    fn show_progress(&mut self, progress: &BatchProgress) {
        self.visible = true;
        self.percent = progress.rounded_percent();
        self.status_line = progress.status_line();
        self.current_file = Some(progress.file_name.clone());
    }
}
