use serde::{Deserialize, Serialize};

/// One image exposed by the listing endpoint.
///
/// `id` is the stored file name, which is unique within the upload
/// directory thanks to the random prefix assigned at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub mime: String,
}

/// Body returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub id: String,
    pub url: String,
    pub size: u64,
}

impl UploadResponse {
    /// Builds a successful response.
    pub fn ok(id: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        Self {
            success: true,
            id: id.into(),
            url: url.into(),
            size,
        }
    }
}

/// Body returned with a non-2xx status when a request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_item_field_names() {
        let json = r#"{"id":"ab12_cat.png","name":"ab12_cat.png","url":"http://h/uploads/ab12_cat.png","size":2048,"mime":"image/png"}"#;
        let item: GalleryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "ab12_cat.png");
        assert_eq!(item.size, 2048);
        assert_eq!(item.mime, "image/png");
    }

    #[test]
    fn listing_is_a_plain_array() {
        let json = r#"[{"id":"a.png","name":"a.png","url":"u","size":1,"mime":"image/png"}]"#;
        let items: Vec<GalleryItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn upload_response_shape() {
        let resp = UploadResponse::ok("x_a.png", "http://h/uploads/x_a.png", 10);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["id"], "x_a.png");
        assert_eq!(value["size"], 10);
    }

    #[test]
    fn error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse::new("file is missing")).unwrap();
        assert_eq!(json, r#"{"error":"file is missing"}"#);
    }
}
