//! Sequential multi-file upload with one aggregated progress stream.
//!
//! This crate holds the **coordination logic** only. Moving bytes is
//! delegated to a [`TransferClient`] implementation (the HTTP client in
//! `morphgallery-client`, or a mock in tests), so the orchestrator stays
//! independent of any transport.
//!
//! # Flow
//!
//! 1. **Submit**: the caller hands over an ordered list of [`FileRef`]s
//! 2. **Transfer**: files go out one at a time, in input order
//! 3. **Aggregate**: every transport tick is folded into the batch percent
//! 4. **Report**: per-file outcomes plus a final 100% tick and [`BatchReport`]

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod types;

// Re-export primary types for convenience.
pub use client::{ProgressReporter, TransferClient, TransferFuture};
pub use error::UploadError;
pub use orchestrator::UploadOrchestrator;
pub use types::{
    BatchProgress, BatchReport, FileData, FileOutcome, FileRef, UploadEvent, UploadReceipt,
};
