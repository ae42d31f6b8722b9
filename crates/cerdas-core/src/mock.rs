//! In-memory mock backend for deterministic testing.
//!
//! Behaves like the real service closely enough for session tests: documents
//! can be switched to, deleted, edited and uploaded; autocomplete and search
//! answer from per-document word lists and canned results. Every call is
//! logged for assertions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cerdas_core::mock::{sample_document, MockBackend};
//!
//! let backend = MockBackend::new()
//!     .with_document(sample_document("1", "a.pdf"))
//!     .with_words("1", &["alpha", "alpine"]);
//! assert_eq!(backend.call_count("list_documents"), 0);
//! ```

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::DocumentBackend;

/// Mock document backend for testing.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Default)]
struct MockState {
    documents: Vec<Document>,
    latest_override: Option<Option<LatestDocument>>,
    words: HashMap<String, Vec<String>>,
    searches: HashMap<String, SearchResult>,
    failing_switches: HashSet<String>,
    unreachable: bool,
    failing_list: bool,
    active: Option<String>,
    next_id: u64,
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

/// Build a document with deterministic dates; later ids sort later when numeric.
pub fn sample_document(id: &str, filename: &str) -> Document {
    let offset = id.parse::<i64>().unwrap_or(0);
    let date = base_date() + Duration::minutes(offset);
    Document {
        id: id.to_string(),
        filename: filename.to_string(),
        upload_date: date,
        last_modified_date: date,
        uploaded_by: defaults::ANONYMOUS_UPLOADER.to_string(),
        tags: BTreeSet::new(),
    }
}

fn base_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl MockBackend {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to the catalog.
    pub fn with_document(self, document: Document) -> Self {
        self.state.lock().unwrap().documents.push(document);
        self
    }

    /// Override what `/document/latest` reports (`None` = no documents).
    pub fn with_latest(self, latest: Option<LatestDocument>) -> Self {
        self.state.lock().unwrap().latest_override = Some(latest);
        self
    }

    /// Words offered by autocomplete while `document_id` is active.
    pub fn with_words(self, document_id: &str, words: &[&str]) -> Self {
        self.state.lock().unwrap().words.insert(
            document_id.to_string(),
            words.iter().map(|w| w.to_string()).collect(),
        );
        self
    }

    /// Canned search result for an exact query.
    pub fn with_search(self, query: &str, result: SearchResult) -> Self {
        self.state
            .lock()
            .unwrap()
            .searches
            .insert(query.to_string(), result);
        self
    }

    /// Make activation of `id` fail with a server error.
    pub fn with_failing_switch(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_switches
            .insert(id.to_string());
        self
    }

    /// Make `/documents` fail with a server error.
    pub fn with_failing_list(self) -> Self {
        self.state.lock().unwrap().failing_list = true;
        self
    }

    /// Toggle simulated network failure for every call.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    /// Id the backend currently has indexed.
    pub fn active_document(&self) -> Option<String> {
        self.state.lock().unwrap().active.clone()
    }

    /// Ids currently stored, in catalog order.
    pub fn document_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .map(|d| d.id.clone())
            .collect()
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    /// Number of calls to `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn record(&self, operation: &str, input: &str) -> Result<()> {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
        if self.state.lock().unwrap().unreachable {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("document {id}"))
}

#[async_trait]
impl DocumentBackend for MockBackend {
    async fn list_documents(&self) -> Result<Vec<Document>> {
        self.record("list_documents", "")?;
        let state = self.state.lock().unwrap();
        if state.failing_list {
            return Err(Error::Backend {
                status: 500,
                message: "failed to list documents".to_string(),
            });
        }
        Ok(state.documents.clone())
    }

    async fn latest_document(&self) -> Result<Option<LatestDocument>> {
        self.record("latest_document", "")?;
        let state = self.state.lock().unwrap();
        if let Some(latest) = &state.latest_override {
            return Ok(latest.clone());
        }
        Ok(state
            .documents
            .iter()
            .max_by_key(|d| d.upload_date)
            .map(|d| LatestDocument {
                id: d.id.clone(),
                filename: d.filename.clone(),
            }))
    }

    async fn switch_document(&self, id: &str) -> Result<Activation> {
        self.record("switch_document", id)?;
        let mut state = self.state.lock().unwrap();
        if state.failing_switches.contains(id) {
            return Err(Error::Backend {
                status: 500,
                message: "failed to switch document".to_string(),
            });
        }
        let filename = state
            .documents
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.filename.clone())
            .ok_or_else(|| not_found(id))?;
        state.active = Some(id.to_string());
        Ok(Activation {
            message: Some(format!("Switched to {filename}")),
            filename,
        })
    }

    async fn delete_document(&self, id: &str) -> Result<String> {
        self.record("delete_document", id)?;
        let mut state = self.state.lock().unwrap();
        let pos = state
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = state.documents.remove(pos);
        if state.active.as_deref() == Some(id) {
            state.active = None;
        }
        Ok(format!("Document {} deleted.", removed.filename))
    }

    async fn update_document(&self, id: &str, update: &DocumentUpdate) -> Result<String> {
        self.record("update_document", id)?;
        if update.uploaded_by.trim().is_empty() {
            return Err(Error::Backend {
                status: 400,
                message: "uploader must not be empty".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let doc = state
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found(id))?;
        doc.uploaded_by = update.uploaded_by.trim().to_string();
        doc.tags = update.tags.clone();
        doc.last_modified_date += Duration::seconds(1);
        Ok("Document updated.".to_string())
    }

    async fn upload(&self, request: UploadRequest) -> Result<String> {
        self.record("upload", &request.filename)?;
        let mut state = self.state.lock().unwrap();
        if state.documents.iter().any(|d| d.filename == request.filename) {
            return Err(Error::Backend {
                status: 409,
                message: format!("{} already exists", request.filename),
            });
        }
        state.next_id += 1;
        let id = format!("up-{}", state.next_id);
        let latest = state
            .documents
            .iter()
            .map(|d| d.upload_date)
            .max()
            .unwrap_or_else(base_date);
        let date = latest + Duration::minutes(1);
        state.documents.push(Document {
            id,
            filename: request.filename.clone(),
            upload_date: date,
            last_modified_date: date,
            uploaded_by: request
                .uploaded_by
                .unwrap_or_else(|| defaults::ANONYMOUS_UPLOADER.to_string()),
            tags: request.tags,
        });
        Ok(format!("File {} stored and indexed.", request.filename))
    }

    async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>> {
        self.record("autocomplete", prefix)?;
        let state = self.state.lock().unwrap();
        let Some(active) = &state.active else {
            return Ok(Vec::new());
        };
        Ok(state
            .words
            .get(active)
            .map(|words| {
                words
                    .iter()
                    .filter(|w| w.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search(&self, query: &str) -> Result<SearchResult> {
        self.record("search", query)?;
        let state = self.state.lock().unwrap();
        if state.active.is_none() {
            return Ok(SearchResult::default());
        }
        Ok(state.searches.get(query).cloned().unwrap_or_default())
    }

    async fn tags(&self) -> Result<Vec<String>> {
        self.record("tags", "")?;
        let state = self.state.lock().unwrap();
        let tags: BTreeSet<String> = state
            .documents
            .iter()
            .flat_map(|d| d.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn stats(&self) -> Result<Stats> {
        self.record("stats", "")?;
        let state = self.state.lock().unwrap();
        let tags: BTreeSet<&String> = state.documents.iter().flat_map(|d| &d.tags).collect();
        Ok(Stats {
            total_documents: state.documents.len() as u64,
            total_tags: tags.len() as u64,
            latest_upload: state
                .documents
                .iter()
                .max_by_key(|d| d.upload_date)
                .map(|d| LatestUpload {
                    filename: d.filename.clone(),
                    upload_date: d.upload_date,
                }),
        })
    }

    async fn status(&self) -> Result<ServerStatus> {
        self.record("status", "")?;
        let state = self.state.lock().unwrap();
        let indexed_file = state
            .active
            .as_ref()
            .and_then(|id| state.documents.iter().find(|d| &d.id == id))
            .map(|d| d.filename.clone())
            .unwrap_or_else(|| defaults::LABEL_NO_DOCUMENT_SELECTED.to_string());
        Ok(ServerStatus { indexed_file })
    }
}
