//! Upload and edit form state.

use std::path::{Path, PathBuf};

use serde::Serialize;

use cerdas_core::{parse_tags, Document, DocumentUpdate, Error, Result, UploadRequest};

/// Outcome message shown under a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FormStatus {
    Success(String),
    Error(String),
}

/// Pending upload: chosen file plus optional uploader and tag text.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    file: Option<PathBuf>,
    pub uploaded_by: String,
    pub tags: String,
    status: Option<FormStatus>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        self.file = Some(path.into());
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn status(&self) -> Option<&FormStatus> {
        self.status.as_ref()
    }

    /// Read the chosen file into an upload request.
    pub async fn to_request(&self) -> Result<UploadRequest> {
        let path = self
            .file
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("no file selected".to_string()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("invalid file name: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        let uploader = self.uploaded_by.trim();
        Ok(UploadRequest {
            filename,
            bytes,
            uploaded_by: (!uploader.is_empty()).then(|| uploader.to_string()),
            tags: parse_tags(&self.tags),
        })
    }

    /// Clear every field and show the backend's confirmation.
    pub fn succeed(&mut self, message: impl Into<String>) {
        *self = Self {
            status: Some(FormStatus::Success(message.into())),
            ..Self::default()
        };
    }

    /// Keep the fields so the user can retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = Some(FormStatus::Error(message.into()));
    }
}

/// Metadata edit of an existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    id: String,
    filename: String,
    pub uploaded_by: String,
    pub tags: String,
    status: Option<FormStatus>,
}

impl EditForm {
    /// Prefill from the document's current metadata.
    pub fn open(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            filename: document.filename.clone(),
            uploaded_by: document.uploaded_by.clone(),
            tags: document.tags_text(),
            status: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn status(&self) -> Option<&FormStatus> {
        self.status.as_ref()
    }

    /// Validate the fields into an update. The uploader must not be blank.
    pub fn to_update(&self) -> Result<DocumentUpdate> {
        let uploader = self.uploaded_by.trim();
        if uploader.is_empty() {
            return Err(Error::InvalidInput("uploader must not be empty".to_string()));
        }
        Ok(DocumentUpdate {
            uploaded_by: uploader.to_string(),
            tags: parse_tags(&self.tags),
        })
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = Some(FormStatus::Error(message.into()));
    }
}
