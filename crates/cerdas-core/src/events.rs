//! Session event types, envelope, and event bus for observers.
//!
//! State transitions in the session controller are explicit function calls;
//! views that need to redraw subscribe to the [`EventBus`] instead of relying
//! on implicit re-rendering. Each subscriber receives an independent stream
//! of [`EventEnvelope`]s.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// Event Envelope
// ============================================================================

/// Versioned wrapper around a [`SessionEvent`].
///
/// `event_type` uses dot-namespaced names (e.g. `"session.changed"`).
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type.
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Id of the document this event relates to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Payload schema version.
    pub payload_version: u32,
    /// Event data.
    pub payload: SessionEvent,
}

impl EventEnvelope {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            document_id: event.document_id().map(String::from),
            payload_version: 1,
            payload: event,
        }
    }
}

// ============================================================================
// Session Event (payloads)
// ============================================================================

/// Something observers of a search session may need to redraw for.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"SessionChanged","active_document_id":"1","label":"a.pdf"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The catalog snapshot was replaced.
    CatalogRefreshed { document_count: usize, ok: bool },
    /// The active document or its label changed.
    SessionChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        active_document_id: Option<String>,
        label: String,
    },
    /// The suggestion list or cursor changed.
    SuggestionsChanged {
        query: String,
        suggestions: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cursor: Option<usize>,
    },
    /// A search request was dispatched.
    SearchStarted { seq: u64, query: String },
    /// The latest search request completed.
    SearchCompleted { seq: u64, query: String, count: usize },
    /// The latest search request failed.
    SearchFailed {
        seq: u64,
        query: String,
        error: String,
    },
    /// A document was uploaded and indexed.
    DocumentUploaded { filename: String },
    /// A document's metadata was edited.
    DocumentUpdated { id: String },
    /// A document was deleted.
    DocumentDeleted { id: String, was_active: bool },
}

impl SessionEvent {
    /// Dot-namespaced event type name.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            SessionEvent::CatalogRefreshed { .. } => "catalog.refreshed",
            SessionEvent::SessionChanged { .. } => "session.changed",
            SessionEvent::SuggestionsChanged { .. } => "suggestions.changed",
            SessionEvent::SearchStarted { .. } => "search.started",
            SessionEvent::SearchCompleted { .. } => "search.completed",
            SessionEvent::SearchFailed { .. } => "search.failed",
            SessionEvent::DocumentUploaded { .. } => "document.uploaded",
            SessionEvent::DocumentUpdated { .. } => "document.updated",
            SessionEvent::DocumentDeleted { .. } => "document.deleted",
        }
    }

    /// Id of the document this event is about, if any.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            SessionEvent::SessionChanged {
                active_document_id, ..
            } => active_document_id.as_deref(),
            SessionEvent::DocumentUpdated { id } | SessionEvent::DocumentDeleted { id, .. } => {
                Some(id)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast bus for session events.
///
/// Cloning the bus shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub fn emit(&self, event: SessionEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
