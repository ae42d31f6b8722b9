//! Core traits for cerdas abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// DOCUMENT BACKEND
// =============================================================================

/// The document search service, as seen by the client.
///
/// Implementations map transport failures to [`crate::Error::Transport`],
/// non-2xx responses to [`crate::Error::Backend`], and unknown ids to
/// [`crate::Error::NotFound`].
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Fetch every known document in backend order.
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// The most recently added document, or `None` when the backend has none.
    async fn latest_document(&self) -> Result<Option<LatestDocument>>;

    /// Make `id` the document the backend searches against.
    async fn switch_document(&self, id: &str) -> Result<Activation>;

    /// Permanently delete a document. Returns the backend's message.
    async fn delete_document(&self, id: &str) -> Result<String>;

    /// Replace a document's uploader and tags. Returns the backend's message.
    async fn update_document(&self, id: &str, update: &DocumentUpdate) -> Result<String>;

    /// Upload and index a new file. Returns the backend's message.
    async fn upload(&self, request: UploadRequest) -> Result<String>;

    /// Words in the active document starting with `prefix`.
    async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>>;

    /// Phrase search over the active document.
    async fn search(&self, query: &str) -> Result<SearchResult>;

    /// All distinct tags, sorted.
    async fn tags(&self) -> Result<Vec<String>>;

    /// Catalog-wide statistics.
    async fn stats(&self) -> Result<Stats>;

    /// Which file the backend currently has indexed.
    async fn status(&self) -> Result<ServerStatus>;
}

// =============================================================================
// PREFERENCE STORE
// =============================================================================

/// Durable key/value storage that survives restarts.
///
/// Only the key/value contract matters to the session logic; any backing
/// (file, embedded database, keychain) may implement it.
pub trait PreferenceStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
