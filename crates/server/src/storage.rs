//! Flat-directory image storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use morphgallery_protocol::{GalleryItem, UPLOADS_PATH, has_image_extension};
use morphgallery_transfer::{
    ValidationError, content_image_type, path_image_type, validate_image_type,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::ServerError;

/// Random bytes in the prefix of a stored name (12 hex characters).
const PREFIX_LEN: usize = 6;

/// Bytes kept from the start of an upload for type detection.
const SNIFF_LEN: usize = 16;

/// Characters left as-is in a URL path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builds the public URL of a stored file.
pub fn item_url(base_url: &str, name: &str) -> String {
    format!(
        "{base_url}{UPLOADS_PATH}/{}",
        utf8_percent_encode(name, SEGMENT)
    )
}

/// Generates the random prefix that keeps stored names unique.
pub fn random_prefix() -> String {
    let mut bytes = [0u8; PREFIX_LEN];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Lists the images stored in `dir`, sorted by name.
///
/// Only regular files with an accepted image extension are listed. A
/// missing directory is an empty gallery.
pub async fn scan(dir: &Path, base_url: &str) -> Result<Vec<GalleryItem>, ServerError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut items = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !has_image_extension(&name) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let path = entry.path();
        let mime = detect_type(&path)
            .await
            .or_else(|| path_image_type(&path))
            .unwrap_or("application/octet-stream");

        items.push(GalleryItem {
            id: name.clone(),
            url: item_url(base_url, &name),
            name,
            size: metadata.len(),
            mime: mime.to_string(),
        });
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

async fn detect_type(path: &Path) -> Option<&'static str> {
    let mut file = File::open(path).await.ok()?;
    let mut head = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..]).await {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    content_image_type(&head[..filled])
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Final file name, also the item id.
    pub id: String,
    pub size: u64,
    pub mime: &'static str,
}

/// An upload being written to a temporary `.part` file.
///
/// Becomes visible under its final name only through [`commit`]; any
/// failure path must call [`discard`].
///
/// [`commit`]: PendingFile::commit
/// [`discard`]: PendingFile::discard
#[derive(Debug)]
pub struct PendingFile {
    id: String,
    final_path: PathBuf,
    part_path: PathBuf,
    file: File,
    written: u64,
    max_size: u64,
    head: Vec<u8>,
}

impl PendingFile {
    /// Opens a fresh `.part` file for `name` (already sanitized) in `dir`.
    pub async fn create(dir: &Path, name: &str, max_size: u64) -> Result<Self, ServerError> {
        tokio::fs::create_dir_all(dir).await?;
        let id = format!("{}_{name}", random_prefix());
        let final_path = dir.join(&id);
        let part_path = dir.join(format!(".{id}.part"));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&part_path)
            .await?;

        Ok(Self {
            id,
            final_path,
            part_path,
            file,
            written: 0,
            max_size,
            head: Vec::with_capacity(SNIFF_LEN),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Appends a chunk, failing once the size limit is exceeded.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ServerError> {
        let size = self.written + chunk.len() as u64;
        if size > self.max_size {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_size,
            }
            .into());
        }
        if self.head.len() < SNIFF_LEN {
            let take = (SNIFF_LEN - self.head.len()).min(chunk.len());
            self.head.extend_from_slice(&chunk[..take]);
        }
        self.file.write_all(chunk).await?;
        self.written = size;
        Ok(())
    }

    /// Checks the content type and moves the file to its final name.
    ///
    /// The temporary file is removed when the content is rejected.
    pub async fn commit(mut self) -> Result<StoredFile, ServerError> {
        if self.written == 0 {
            self.discard().await;
            return Err(ValidationError::MissingFile.into());
        }
        let mime = content_image_type(&self.head);
        if let Err(e) = validate_image_type(mime) {
            self.discard().await;
            return Err(e.into());
        }

        if let Err(e) = self.file.flush().await {
            self.discard().await;
            return Err(e.into());
        }
        let Self {
            id,
            final_path,
            part_path,
            file,
            written,
            ..
        } = self;
        drop(file);

        if let Err(e) = tokio::fs::rename(&part_path, &final_path).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(e.into());
        }

        Ok(StoredFile {
            id,
            size: written,
            mime: mime.unwrap_or("application/octet-stream"),
        })
    }

    /// Deletes the temporary file.
    pub async fn discard(self) {
        let Self {
            part_path, file, ..
        } = self;
        drop(file);
        if let Err(e) = tokio::fs::remove_file(&part_path).await {
            tracing::debug!(path = %part_path.display(), error = %e, "failed to remove partial upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn prefix_is_twelve_hex_chars() {
        let prefix = random_prefix();
        assert_eq!(prefix.len(), 12);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(prefix, random_prefix());
    }

    #[test]
    fn url_encodes_name() {
        assert_eq!(
            item_url("http://h", "my pic#1.png"),
            "http://h/uploads/my%20pic%231.png"
        );
        assert_eq!(item_url("http://h", "a-b_c.d~e.png"), "http://h/uploads/a-b_c.d~e.png");
    }

    #[tokio::test]
    async fn scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let items = scan(&dir.path().join("nope"), "http://h").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), PNG).unwrap();
        std::fs::write(dir.path().join("a.JPG"), b"not really a jpeg").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        std::fs::write(dir.path().join(".x_c.png.part"), PNG).unwrap();
        std::fs::create_dir(dir.path().join("folder.png")).unwrap();

        let items = scan(dir.path(), "http://h").await.unwrap();
        let listed: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(listed, vec!["a.JPG", "b.png"]);

        assert_eq!(items[0].mime, "image/jpeg");
        assert_eq!(items[1].mime, "image/png");
        assert_eq!(items[1].id, "b.png");
        assert_eq!(items[1].size, PNG.len() as u64);
        assert_eq!(items[1].url, "http://h/uploads/b.png");
    }

    #[tokio::test]
    async fn commit_renames_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingFile::create(dir.path(), "cat.png", 1024).await.unwrap();
        pending.write_chunk(&PNG[..4]).await.unwrap();
        pending.write_chunk(&PNG[4..]).await.unwrap();

        let stored = pending.commit().await.unwrap();
        assert!(stored.id.ends_with("_cat.png"));
        assert_eq!(stored.size, PNG.len() as u64);
        assert_eq!(stored.mime, "image/png");
        assert_eq!(names(dir.path()), vec![stored.id.clone()]);
        assert_eq!(std::fs::read(dir.path().join(&stored.id)).unwrap(), PNG);
    }

    #[tokio::test]
    async fn content_type_wins_over_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingFile::create(dir.path(), "really.png", 1024).await.unwrap();
        pending.write_chunk(b"GIF89a\x01\x00\x01\x00").await.unwrap();
        let stored = pending.commit().await.unwrap();
        assert_eq!(stored.mime, "image/gif");

        let items = scan(dir.path(), "http://h").await.unwrap();
        assert_eq!(items[0].mime, "image/gif");
    }

    #[tokio::test]
    async fn oversize_chunk_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingFile::create(dir.path(), "big.png", 8).await.unwrap();
        pending.write_chunk(&PNG[..8]).await.unwrap();

        let err = pending.write_chunk(&PNG[8..]).await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Validation(ValidationError::TooLarge { size: 12, max: 8 })
        ));
        pending.discard().await;
        assert!(names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn non_image_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut pending = PendingFile::create(dir.path(), "fake.png", 1024).await.unwrap();
        pending.write_chunk(b"just some text").await.unwrap();

        let err = pending.commit().await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Validation(ValidationError::InvalidType(_))
        ));
        assert!(names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn empty_upload_is_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let pending = PendingFile::create(dir.path(), "empty.png", 1024).await.unwrap();
        let err = pending.commit().await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Validation(ValidationError::MissingFile)
        ));
        assert!(names(dir.path()).is_empty());
    }
}
