use std::path::Path;

use crate::error::{ClientError, ClientResult, ValidationError};

const TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "text", "rtf"];
const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Decoded locally as UTF-8.
    PlainText,
    /// Sent to `/api/upload` for server-side text extraction.
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "failed to read contract file");
            ClientError::Validation(ValidationError::UnreadableFile {
                filename: filename.clone(),
            })
        })?;
        Ok(Self { filename, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn kind(&self) -> ClientResult<FileKind> {
        let unsupported = || {
            ClientError::Validation(ValidationError::UnsupportedFile {
                filename: self.filename.clone(),
            })
        };
        let ext = self.extension().ok_or_else(unsupported)?;
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Ok(FileKind::PlainText)
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            Ok(FileKind::Document)
        } else {
            Err(unsupported())
        }
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// Decodes a plain-text upload. Whitespace-only files count as empty.
    pub fn decode_text(&self) -> ClientResult<String> {
        let text = std::str::from_utf8(&self.bytes).map_err(|_| {
            ValidationError::UnreadableFile {
                filename: self.filename.clone(),
            }
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyFile {
                filename: self.filename.clone(),
            }
            .into());
        }
        Ok(text.to_string())
    }

    pub fn ensure_not_empty(&self) -> ClientResult<()> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                filename: self.filename.clone(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
