use std::path::Path;

/// Reasons the gallery refuses a file before storing it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file is missing")]
    MissingFile,

    #[error("file exceeds the maximum size of {} ({size} bytes)", size_label(.max))]
    TooLarge { size: u64, max: u64 },

    #[error("invalid file type: {0}")]
    InvalidType(String),

    #[error("file name is empty")]
    EmptyName,
}

fn size_label(bytes: &u64) -> String {
    crate::format_size(*bytes)
}

/// Reduces an uploaded file name to a safe basename.
///
/// Strips any directory part (either separator), then replaces every
/// character outside `[A-Za-z0-9._-]` with `_`. Names that end up empty
/// or consisting only of dots are rejected.
pub fn sanitize_file_name(name: &str) -> Result<String, ValidationError> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        return Err(ValidationError::EmptyName);
    }
    Ok(safe)
}

/// Rejects files above `max` bytes.
pub fn validate_size(size: u64, max: u64) -> Result<(), ValidationError> {
    if size > max {
        return Err(ValidationError::TooLarge { size, max });
    }
    Ok(())
}

/// Returns `true` if `mime` names an image type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Rejects content whose detected type is not `image/*`.
pub fn validate_image_type(mime: Option<&str>) -> Result<(), ValidationError> {
    match mime {
        Some(m) if is_image_mime(m) => Ok(()),
        Some(m) => Err(ValidationError::InvalidType(m.to_string())),
        None => Err(ValidationError::InvalidType("unknown".into())),
    }
}

/// Detects the image type from the leading bytes of a file.
///
/// Only content is inspected; the file name plays no part, so a renamed
/// text file is not mistaken for an image.
pub fn content_image_type(head: &[u8]) -> Option<&'static str> {
    image::guess_format(head).ok().map(|format| format.to_mime_type())
}

/// Image type guessed from a file name, for files that cannot be read.
pub fn path_image_type(path: &Path) -> Option<&'static str> {
    mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| is_image_mime(mime))
}
