//! Core data models for the cerdas client.
//!
//! These types mirror the backend's JSON payloads. Document identity is the
//! opaque `id`; filenames may be reused after a delete and are never used
//! for matching.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::defaults;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// A document known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    pub id: String,
    pub filename: String,
    #[serde(serialize_with = "timestamp::serialize")]
    pub upload_date: NaiveDateTime,
    #[serde(serialize_with = "timestamp::serialize")]
    pub last_modified_date: NaiveDateTime,
    pub uploaded_by: String,
    pub tags: BTreeSet<String>,
}

impl Document {
    /// Tags as the comma-separated text shown in edit forms.
    pub fn tags_text(&self) -> String {
        format_tags(&self.tags)
    }
}

/// Wire shape of a document; older records lack the modified date and uploader.
#[derive(Deserialize)]
struct DocumentRecord {
    id: String,
    filename: String,
    #[serde(with = "timestamp")]
    upload_date: NaiveDateTime,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    last_modified_date: Option<NaiveDateTime>,
    #[serde(default)]
    uploaded_by: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
}

impl From<DocumentRecord> for Document {
    fn from(r: DocumentRecord) -> Self {
        Self {
            last_modified_date: r.last_modified_date.unwrap_or(r.upload_date),
            uploaded_by: r
                .uploaded_by
                .unwrap_or_else(|| defaults::UNKNOWN_UPLOADER.to_string()),
            id: r.id,
            filename: r.filename,
            upload_date: r.upload_date,
            tags: r.tags,
        }
    }
}

/// The most recently added document, as reported by `/document/latest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestDocument {
    pub id: String,
    pub filename: String,
}

/// Confirmation returned by the activation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// Server-confirmed filename of the now-active document.
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Metadata edit for an existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpdate {
    pub uploaded_by: String,
    pub tags: BTreeSet<String>,
}

/// A file to upload and index.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Uploader name; the backend records an anonymous uploader when absent.
    pub uploaded_by: Option<String>,
    pub tags: BTreeSet<String>,
}

// =============================================================================
// SEARCH TYPES
// =============================================================================

/// Phrase search result for the active document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of phrase matches.
    pub count: usize,
    /// Marked-up context snippets, best first.
    #[serde(default)]
    pub snippets: Vec<String>,
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Filename and date of the newest upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestUpload {
    pub filename: String,
    #[serde(with = "timestamp")]
    pub upload_date: NaiveDateTime,
}

/// Catalog-wide statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_documents: u64,
    pub total_tags: u64,
    #[serde(default)]
    pub latest_upload: Option<LatestUpload>,
}

/// Which document the backend currently has indexed in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub indexed_file: String,
}

// =============================================================================
// TAG TEXT
// =============================================================================

/// Parse comma-separated tag text, trimming entries and dropping empty ones.
pub fn parse_tags(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Join tags into the comma-separated form the backend accepts.
pub fn format_tags(tags: &BTreeSet<String>) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Serde helpers for the backend's `YYYY-MM-DD HH:MM:SS` timestamps.
///
/// RFC 3339 strings are accepted on input as well.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::defaults::TIMESTAMP_FORMAT;

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}
