//! Upload orchestrator for sequential multi-file batches.
//!
//! Drives one transfer at a time in input order, folds every transport
//! tick into the batch's aggregate percent, and keeps going when a single
//! file fails.

use morphgallery_transfer::{Batch, TransferError};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::client::{ProgressReporter, TransferClient};
use crate::error::UploadError;
use crate::types::{BatchProgress, BatchReport, FileOutcome, FileRef, UploadEvent, UploadReceipt};

/// Orchestrates a batch of uploads through a [`TransferClient`].
pub struct UploadOrchestrator {
    events_tx: mpsc::UnboundedSender<UploadEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<UploadEvent>>,
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadOrchestrator {
    /// Creates a new orchestrator.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    ///
    /// Batches submitted before this call emit nothing.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Uploads `files` one after another, in order.
    ///
    /// Rejects an empty selection before anything is sent. A failed file
    /// is recorded and the next one starts; the batch is never aborted.
    /// Once every file is terminal a final progress update at exactly 100
    /// is emitted, followed by [`UploadEvent::Finished`].
    pub async fn submit(
        &self,
        files: &[FileRef],
        client: &dyn TransferClient,
    ) -> Result<BatchReport, UploadError> {
        if files.is_empty() {
            return Err(UploadError::EmptyBatch);
        }

        let mut batch = Batch::new(files.iter().map(|f| (f.name.clone(), f.size)));
        info!(
            files = batch.len(),
            total_bytes = batch.total_bytes(),
            "upload batch started"
        );
        self.emit(UploadEvent::Started {
            files_total: batch.len(),
            total_bytes: batch.total_bytes(),
        });
        self.emit_tick(&mut batch, 0, true);

        let mut outcomes = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            batch.start(index);
            debug!(index, file = %file.name, size = file.size, "transfer started");

            let result = self.run_transfer(&mut batch, index, file, client).await;
            let outcome = match result {
                Ok(receipt) => {
                    batch.complete(index);
                    info!(index, file = %file.name, id = %receipt.id, "transfer completed");
                    self.emit(UploadEvent::FileCompleted {
                        index,
                        file_name: file.name.clone(),
                        receipt: receipt.clone(),
                    });
                    Ok(receipt)
                }
                Err(e) => {
                    let message = e.user_message();
                    batch.fail(index, message.clone());
                    error!(index, file = %file.name, error = %message, "transfer failed");
                    self.emit(UploadEvent::FileFailed {
                        index,
                        file_name: file.name.clone(),
                        error: message.clone(),
                    });
                    Err(message)
                }
            };
            self.emit_tick(&mut batch, index, true);

            outcomes.push(FileOutcome {
                index,
                file_name: file.name.clone(),
                result: outcome,
            });
        }

        let last = files.len() - 1;
        self.emit(UploadEvent::Progress(BatchProgress::snapshot(
            &batch, last, 100.0,
        )));

        let report = BatchReport {
            outcomes,
            total_bytes: batch.total_bytes(),
            completed_bytes: batch.completed_bytes(),
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "upload batch finished"
        );
        self.emit(UploadEvent::Finished(report.clone()));

        Ok(report)
    }

    /// Runs one transfer to a terminal state, applying its progress ticks
    /// to `batch` as they arrive.
    async fn run_transfer(
        &self,
        batch: &mut Batch,
        index: usize,
        file: &FileRef,
        client: &dyn TransferClient,
    ) -> Result<UploadReceipt, TransferError> {
        let (reporter, mut progress_rx) = ProgressReporter::channel();
        let mut send = client.send(file, reporter);
        let mut reporting = true;

        let result = loop {
            tokio::select! {
                biased;
                changed = progress_rx.changed(), if reporting => {
                    if changed.is_err() {
                        reporting = false;
                        continue;
                    }
                    let bytes_sent = *progress_rx.borrow_and_update();
                    batch.record_progress(index, bytes_sent);
                    self.emit_tick(batch, index, false);
                }
                result = &mut send => break result,
            }
        };
        drop(send);

        // Value reported right before the transfer resolved.
        let bytes_sent = *progress_rx.borrow_and_update();
        batch.record_progress(index, bytes_sent);
        self.emit_tick(batch, index, false);

        result
    }

    /// Emits a progress update when the rounded percent changed, or
    /// unconditionally when `force` is set.
    fn emit_tick(&self, batch: &mut Batch, index: usize, force: bool) {
        let percent = batch.observe_percent();
        let changed = batch.take_rounded_change(percent);
        if changed || force {
            self.emit(UploadEvent::Progress(BatchProgress::snapshot(
                batch, index, percent,
            )));
        }
    }

    /// Events go out only once the receiver was taken; until then
    /// nobody listens and they are dropped instead of piling up.
    fn emit(&self, event: UploadEvent) {
        if self.events_rx.is_some() {
            return;
        }
        let _ = self.events_tx.send(event);
    }
}
