/// Minimal `multipart/form-data` encoder for file uploads.
///
/// `ureq` 2.x has no form support, so the upload body is assembled here:
/// one part per field, CRLF line endings, closed by the `--boundary--`
/// terminator.
use chrono::Utc;

/// A file attached to a form field.
#[derive(Debug, Clone, PartialEq)]
struct FilePart {
    field: String,
    file_name: String,
    content_type: String,
    contents: Vec<u8>,
}

/// An encodable multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    boundary: String,
    parts: Vec<FilePart>,
}

impl Form {
    pub fn new() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::with_boundary(format!("ktdash-{nanos:x}"))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Attach a file under `field`.
    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        contents: Vec<u8>,
    ) -> Self {
        self.parts.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            contents,
        });
        self
    }

    /// Value for the `Content-Type` request header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the form body.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    escape_quoted(&part.field),
                    escape_quoted(&part.file_name)
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            body.extend_from_slice(&part.contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote-safe header parameter value.
fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}
