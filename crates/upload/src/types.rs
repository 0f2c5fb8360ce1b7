//! Data types for the upload flow.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use morphgallery_protocol::UploadResponse;
use morphgallery_transfer::{Batch, ProgressAggregator, format_size, path_image_type};

/// Where the content of a file to upload lives.
#[derive(Debug, Clone)]
pub enum FileData {
    /// On disk; streamed by the transport.
    Path(PathBuf),
    /// Already in memory.
    Bytes(Bytes),
}

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub name: String,
    pub size: u64,
    /// Content type announced to the server, when known.
    pub mime: Option<String>,
    pub data: FileData,
}

impl FileRef {
    /// Describes a file on disk. Size comes from the file metadata.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            size: metadata.len(),
            mime: path_image_type(path).map(str::to_string),
            data: FileData::Path(path.to_path_buf()),
        })
    }

    /// Describes an in-memory file.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        Self {
            mime: path_image_type(Path::new(&name)).map(str::to_string),
            name,
            size: data.len() as u64,
            data: FileData::Bytes(data),
        }
    }
}

/// What the server returned for one stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
    pub url: String,
    pub size: u64,
}

impl From<UploadResponse> for UploadReceipt {
    fn from(resp: UploadResponse) -> Self {
        Self {
            id: resp.id,
            url: resp.url,
            size: resp.size,
        }
    }
}

/// One progress update of a running batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// Index of the file this update is about.
    pub index: usize,
    pub file_name: String,
    /// Confirmed bytes of that file.
    pub bytes_done_this_file: u64,
    /// Aggregate percent over the whole batch, 0–100.
    pub aggregate_percent: f64,
    /// Files that reached a terminal state (done or failed).
    pub files_completed: usize,
    pub files_total: usize,
    /// Completed bytes plus the bytes of the file in flight.
    pub bytes_done_total: u64,
    pub total_bytes: u64,
}

impl BatchProgress {
    /// Captures the state of `batch` for file `index` at `aggregate_percent`.
    pub fn snapshot(batch: &Batch, index: usize, aggregate_percent: f64) -> Self {
        let (file_name, bytes_done_this_file) = batch
            .transfer(index)
            .map(|t| (t.name().to_string(), t.bytes_sent()))
            .unwrap_or_default();
        let bytes_done_total =
            (batch.completed_bytes() + batch.in_flight_bytes()).min(batch.total_bytes());

        Self {
            index,
            file_name,
            bytes_done_this_file,
            aggregate_percent,
            files_completed: batch.files_completed(),
            files_total: batch.len(),
            bytes_done_total,
            total_bytes: batch.total_bytes(),
        }
    }

    /// Percent rounded to a whole number, as shown next to a progress ring.
    pub fn rounded_percent(&self) -> u32 {
        self.aggregate_percent.round() as u32
    }

    /// Renders `"<done> / <total> • <sent> / <size>"`.
    pub fn status_line(&self) -> String {
        format!(
            "{} / {} • {} / {}",
            self.files_completed,
            self.files_total,
            format_size(self.bytes_done_total),
            format_size(self.total_bytes)
        )
    }
}

/// Events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The batch was accepted and is about to start.
    Started { files_total: usize, total_bytes: u64 },
    /// Aggregate progress changed (or a file finished).
    Progress(BatchProgress),
    /// A file was stored by the server.
    FileCompleted {
        index: usize,
        file_name: String,
        receipt: UploadReceipt,
    },
    /// A file failed; the batch continues with the next one.
    FileFailed {
        index: usize,
        file_name: String,
        error: String,
    },
    /// Every file reached a terminal state. The caller may refresh the
    /// listing and reset its upload UI.
    Finished(BatchReport),
}

/// Outcome of one file in a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub index: usize,
    pub file_name: String,
    pub result: Result<UploadReceipt, String>,
}

/// Summary of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub total_bytes: u64,
    pub completed_bytes: u64,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// Share of the batch's bytes that actually reached the server.
    pub fn byte_percent(&self) -> f64 {
        ProgressAggregator::from_bytes(self.completed_bytes, 0, self.total_bytes)
    }

    /// Receipts of the stored files, in upload order.
    pub fn receipts(&self) -> impl Iterator<Item = &UploadReceipt> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_reads_size_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cat.PNG");
        std::fs::write(&path, b"12345").unwrap();

        let file = FileRef::from_path(&path).unwrap();
        assert_eq!(file.name, "Cat.PNG");
        assert_eq!(file.size, 5);
        assert_eq!(file.mime.as_deref(), Some("image/png"));
        assert!(matches!(file.data, FileData::Path(_)));
    }

    #[test]
    fn from_path_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileRef::from_path(dir.path()).is_err());
    }

    #[test]
    fn from_bytes_unknown_extension_has_no_mime() {
        let file = FileRef::from_bytes("notes.txt", b"hi".to_vec());
        assert_eq!(file.size, 2);
        assert!(file.mime.is_none());
    }

    #[test]
    fn snapshot_and_status_line() {
        let mut batch = Batch::new([("a.png", 1024u64), ("b.png", 3072)]);
        batch.start(0);
        batch.complete(0);
        batch.start(1);
        batch.record_progress(1, 1024);

        let p = BatchProgress::snapshot(&batch, 1, 50.0);
        assert_eq!(p.file_name, "b.png");
        assert_eq!(p.bytes_done_this_file, 1024);
        assert_eq!(p.files_completed, 1);
        assert_eq!(p.files_total, 2);
        assert_eq!(p.bytes_done_total, 2048);
        assert_eq!(p.rounded_percent(), 50);
        assert_eq!(p.status_line(), "1 / 2 • 2 KB / 4 KB");
    }

    #[test]
    fn report_counts() {
        let report = BatchReport {
            outcomes: vec![
                FileOutcome {
                    index: 0,
                    file_name: "a.png".into(),
                    result: Err("network error".into()),
                },
                FileOutcome {
                    index: 1,
                    file_name: "b.png".into(),
                    result: Ok(UploadReceipt {
                        id: "x_b.png".into(),
                        url: "http://h/uploads/x_b.png".into(),
                        size: 10,
                    }),
                },
            ],
            total_bytes: 20,
            completed_bytes: 10,
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.byte_percent(), 50.0);
        assert_eq!(report.receipts().count(), 1);
    }
}
