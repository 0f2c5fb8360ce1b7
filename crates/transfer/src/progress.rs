use crate::Batch;

/// Folds completed bytes plus the bytes of the transfer in flight into
/// one percentage for the whole batch.
///
/// Stateless: everything it needs lives in the [`Batch`]. Per-file
/// monotonicity is enforced upstream by [`Transfer::record_progress`],
/// cross-file stalling by [`Batch::observe_percent`].
///
/// [`Transfer::record_progress`]: crate::Transfer::record_progress
pub struct ProgressAggregator;

impl ProgressAggregator {
    /// Aggregate percent of `batch` with `in_flight_bytes` sent for the
    /// current file, clamped to `[0, 100]`.
    pub fn percent(batch: &Batch, in_flight_bytes: u64) -> f64 {
        Self::from_bytes(batch.completed_bytes(), in_flight_bytes, batch.total_bytes())
    }

    /// Same computation on raw byte counts.
    ///
    /// A batch with nothing to upload (`total_bytes == 0`) is complete by
    /// definition and yields 100.
    pub fn from_bytes(completed_bytes: u64, in_flight_bytes: u64, total_bytes: u64) -> f64 {
        if total_bytes == 0 {
            return 100.0;
        }
        let done = completed_bytes.saturating_add(in_flight_bytes) as f64;
        (done * 100.0 / total_bytes as f64).clamp(0.0, 100.0)
    }
}
