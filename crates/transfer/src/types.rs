use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ProgressAggregator;

/// Lifecycle of a single file within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Pending,
    InFlight,
    Done,
    Failed,
}

impl TransferState {
    /// `Done` and `Failed` are final; nothing moves a transfer out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// One file's upload lifecycle from `Pending` to a terminal state.
#[derive(Debug, Clone)]
pub struct Transfer {
    name: String,
    byte_size: u64,
    bytes_sent: u64,
    state: TransferState,
    error: Option<String>,
}

impl Transfer {
    /// Creates a pending transfer.
    pub fn new(name: impl Into<String>, byte_size: u64) -> Self {
        Self {
            name: name.into(),
            byte_size,
            bytes_sent: 0,
            state: TransferState::Pending,
            error: None,
        }
    }

    /// Marks the transfer as in flight. No-op unless pending.
    pub fn start(&mut self) {
        if self.state == TransferState::Pending {
            self.state = TransferState::InFlight;
        }
    }

    /// Records a raw bytes-sent value reported by the transport.
    ///
    /// The stored value never decreases and never exceeds the file size:
    /// a smaller report (transport retry) keeps the previous value.
    /// Returns the clamped bytes-sent.
    pub fn record_progress(&mut self, raw_bytes_sent: u64) -> u64 {
        if self.state != TransferState::InFlight {
            return self.bytes_sent;
        }
        let clamped = raw_bytes_sent.min(self.byte_size);
        if clamped > self.bytes_sent {
            self.bytes_sent = clamped;
        }
        self.bytes_sent
    }

    /// Marks the transfer as done; bytes-sent snaps to the full size.
    pub fn complete(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.bytes_sent = self.byte_size;
        self.state = TransferState::Done;
    }

    /// Marks the transfer as failed and records the error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        self.state = TransferState::Failed;
        self.error = Some(error.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// The set of files submitted together in one upload action.
///
/// Owned by exactly one orchestrator; every mutation goes through it.
/// Besides the transfers and byte totals it remembers the highest
/// aggregate percent observed so far, so a failed file that drops its
/// in-flight bytes makes the aggregate stall instead of going back.
#[derive(Debug, Clone)]
pub struct Batch {
    transfers: Vec<Transfer>,
    total_bytes: u64,
    completed_bytes: u64,
    peak_percent: f64,
    last_rounded: Option<u32>,
}

impl Batch {
    /// Creates a batch from `(file name, byte size)` pairs, in upload order.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let transfers: Vec<Transfer> = files
            .into_iter()
            .map(|(name, size)| Transfer::new(name, size))
            .collect();
        let total_bytes = transfers.iter().map(Transfer::byte_size).sum();
        Self {
            transfers,
            total_bytes,
            completed_bytes: 0,
            peak_percent: 0.0,
            last_rounded: None,
        }
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn transfer(&self, index: usize) -> Option<&Transfer> {
        self.transfers.get(index)
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Sum of the sizes of transfers that reached `Done`.
    pub fn completed_bytes(&self) -> u64 {
        self.completed_bytes
    }

    /// Bytes confirmed for the transfer currently in flight (0 if none).
    pub fn in_flight_bytes(&self) -> u64 {
        self.transfers
            .iter()
            .filter(|t| t.state() == TransferState::InFlight)
            .map(Transfer::bytes_sent)
            .sum()
    }

    /// Starts transfer `index`.
    pub fn start(&mut self, index: usize) {
        if let Some(t) = self.transfers.get_mut(index) {
            t.start();
        }
    }

    /// Records raw progress for transfer `index`; returns the clamped value.
    pub fn record_progress(&mut self, index: usize, raw_bytes_sent: u64) -> u64 {
        self.transfers
            .get_mut(index)
            .map(|t| t.record_progress(raw_bytes_sent))
            .unwrap_or(0)
    }

    /// Marks transfer `index` done and adds its size to the completed bytes.
    pub fn complete(&mut self, index: usize) {
        let Some(t) = self.transfers.get_mut(index) else {
            return;
        };
        if t.is_terminal() {
            return;
        }
        t.complete();
        self.completed_bytes = (self.completed_bytes + t.byte_size()).min(self.total_bytes);
    }

    /// Marks transfer `index` failed. Completed bytes are left untouched.
    pub fn fail(&mut self, index: usize, error: impl Into<String>) {
        if let Some(t) = self.transfers.get_mut(index) {
            t.fail(error);
            debug!(index, file = %t.name(), "transfer marked failed");
        }
    }

    /// Number of transfers in a terminal state.
    pub fn files_completed(&self) -> usize {
        self.transfers.iter().filter(|t| t.is_terminal()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count_state(TransferState::Done)
    }

    pub fn failed(&self) -> usize {
        self.count_state(TransferState::Failed)
    }

    /// Returns `true` once every transfer is `Done` or `Failed`.
    pub fn is_finished(&self) -> bool {
        self.transfers.iter().all(Transfer::is_terminal)
    }

    /// Computes the current aggregate percent and folds it into the
    /// high-water mark. The returned value never decreases over the life
    /// of the batch.
    pub fn observe_percent(&mut self) -> f64 {
        let current = ProgressAggregator::percent(self, self.in_flight_bytes());
        if current > self.peak_percent {
            self.peak_percent = current;
        }
        self.peak_percent
    }

    /// Highest aggregate percent observed so far.
    pub fn peak_percent(&self) -> f64 {
        self.peak_percent
    }

    /// Returns `true` if `percent` rounds to a different whole number than
    /// the last one accepted here, and remembers it.
    pub fn take_rounded_change(&mut self, percent: f64) -> bool {
        let rounded = percent.round() as u32;
        if self.last_rounded == Some(rounded) {
            return false;
        }
        self.last_rounded = Some(rounded);
        true
    }

    fn count_state(&self, state: TransferState) -> usize {
        self.transfers.iter().filter(|t| t.state() == state).count()
    }
}
