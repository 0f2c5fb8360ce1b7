//! Transport seam and progress reporting.
//!
//! `TransferClient` is implemented by the HTTP client crate to move one
//! file to the gallery. Keeping it a trait leaves the orchestrator
//! testable with in-memory mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use morphgallery_transfer::TransferError;
use tokio::sync::watch;

use crate::types::{FileRef, UploadReceipt};

/// Future returned by [`TransferClient::send`].
pub type TransferFuture<'a> =
    Pin<Box<dyn Future<Output = Result<UploadReceipt, TransferError>> + Send + 'a>>;

/// Performs one file transfer.
///
/// Implementations report incremental bytes-sent through `progress` and
/// must call [`ProgressReporter::finish`] with the full file size right
/// before resolving successfully, so the file always reaches 100% even
/// when the transport under-reports its last tick. A failed transfer
/// leaves nothing persisted.
pub trait TransferClient: Send + Sync {
    fn send<'a>(&'a self, file: &'a FileRef, progress: ProgressReporter) -> TransferFuture<'a>;
}

/// Sending half of a transfer's progress stream.
///
/// Values are cumulative bytes-sent for the current file. The channel
/// keeps only the latest value; the orchestrator reads it whenever it
/// wakes, so nothing reported is lost, only coalesced.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<u64>>,
}

impl ProgressReporter {
    /// Creates a reporter and the receiver the orchestrator watches.
    pub fn channel() -> (Self, watch::Receiver<u64>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Reports cumulative bytes sent without waiting.
    ///
    /// Safe to call from synchronous contexts such as a body stream poll.
    pub fn report(&self, bytes_sent: u64) {
        self.tx.send_replace(bytes_sent);
    }

    /// Reports the full file size. Call right before resolving successfully.
    pub fn finish(&self, file_size: u64) {
        self.report(file_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receiver_sees_latest_value() {
        let (reporter, mut rx) = ProgressReporter::channel();
        reporter.report(10);
        reporter.report(20);
        reporter.finish(30);

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 30);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn many_reports_never_drop_the_last() {
        let (reporter, rx) = ProgressReporter::channel();
        for sent in 1..=1000 {
            reporter.report(sent);
        }
        drop(reporter);
        assert_eq!(*rx.borrow(), 1000);
    }

    #[tokio::test]
    async fn report_after_receiver_dropped_does_not_panic() {
        let (reporter, rx) = ProgressReporter::channel();
        drop(rx);
        reporter.report(5);
        reporter.finish(10);
    }
}
