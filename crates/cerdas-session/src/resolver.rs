//! Active-document resolution.
//!
//! Decides which document searches run against, persists that choice, and
//! reconciles it at startup:
//!
//! 1. Refresh the catalog.
//! 2. If a remembered id exists, try to activate it.
//! 3. Otherwise (or if that failed) activate the backend's latest document,
//!    or settle on an empty session when there is none.
//!
//! An id becomes active only after the backend confirms the activation.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use cerdas_core::defaults::{self, LAST_ACTIVE_DOCUMENT_KEY};
use cerdas_core::{
    Activation, DocumentBackend, Error, EventBus, PreferenceStore, Result, SessionEvent,
};

use crate::catalog::Catalog;

/// Where the resolver is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverState {
    Uninitialized,
    Resolving,
    Active(String),
    Empty,
}

/// Human-readable description of the active document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum SessionLabel {
    Loading,
    /// Server-confirmed filename of the active document.
    Document(String),
    NoDocuments,
    NoDocumentSelected,
    BackendUnreachable,
}

impl fmt::Display for SessionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str(defaults::LABEL_LOADING),
            Self::Document(filename) => f.write_str(filename),
            Self::NoDocuments => f.write_str(defaults::LABEL_NO_DOCUMENTS),
            Self::NoDocumentSelected => f.write_str(defaults::LABEL_NO_DOCUMENT_SELECTED),
            Self::BackendUnreachable => f.write_str(defaults::LABEL_BACKEND_UNREACHABLE),
        }
    }
}

impl From<SessionLabel> for String {
    fn from(label: SessionLabel) -> Self {
        label.to_string()
    }
}

/// Snapshot of the session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub active_document_id: Option<String>,
    pub label: SessionLabel,
}

/// Owns the active-document choice and its persisted copy.
pub struct SessionResolver {
    state: ResolverState,
    label: SessionLabel,
    store: Arc<dyn PreferenceStore>,
    events: EventBus,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn PreferenceStore>, events: EventBus) -> Self {
        Self {
            state: ResolverState::Uninitialized,
            label: SessionLabel::Loading,
            store,
            events,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn label(&self) -> &SessionLabel {
        &self.label
    }

    pub fn active_document_id(&self) -> Option<&str> {
        match &self.state {
            ResolverState::Active(id) => Some(id),
            _ => None,
        }
    }

    pub fn session(&self) -> Session {
        Session {
            active_document_id: self.active_document_id().map(String::from),
            label: self.label.clone(),
        }
    }

    /// Run the startup sequence. May only run once per resolver.
    pub async fn startup(
        &mut self,
        backend: &dyn DocumentBackend,
        catalog: &mut Catalog,
    ) -> Result<Session> {
        if self.state != ResolverState::Uninitialized {
            return Err(Error::InvalidInput(
                "session startup already ran".to_string(),
            ));
        }
        self.state = ResolverState::Resolving;
        self.publish();

        // Transport and backend errors both leave the user without a catalog.
        let catalog_failed = catalog.refresh(backend).await.is_err();

        if let Some(id) = self.remembered() {
            match self.switch_to(backend, &id).await {
                Ok(_) => {
                    info!(document_id = %id, "Restored remembered document");
                    return Ok(self.session());
                }
                Err(e) => {
                    warn!(document_id = %id, error = %e, "Remembered document unavailable, falling back to latest");
                }
            }
        }

        let empty_label = match backend.latest_document().await {
            Ok(Some(latest)) => match self.switch_to(backend, &latest.id).await {
                Ok(_) => {
                    info!(document_id = %latest.id, "Activated latest document");
                    return Ok(self.session());
                }
                Err(e) if e.is_transport() => SessionLabel::BackendUnreachable,
                Err(_) => SessionLabel::NoDocuments,
            },
            Ok(None) if catalog_failed => SessionLabel::BackendUnreachable,
            Ok(None) => SessionLabel::NoDocuments,
            Err(e) => {
                warn!(error = %e, "Latest document lookup failed");
                if e.is_transport() || catalog_failed {
                    SessionLabel::BackendUnreachable
                } else {
                    SessionLabel::NoDocuments
                }
            }
        };

        self.state = ResolverState::Empty;
        self.label = empty_label;
        self.publish();
        Ok(self.session())
    }

    /// Ask the backend to activate `id`.
    ///
    /// Success makes `id` active and remembers it. Any failure forgets the
    /// remembered choice and leaves the session as it was.
    pub async fn switch_to(
        &mut self,
        backend: &dyn DocumentBackend,
        id: &str,
    ) -> Result<Activation> {
        if id.is_empty() {
            self.clear_remembered();
            return Err(Error::InvalidInput("document id is empty".to_string()));
        }

        match backend.switch_document(id).await {
            Ok(activation) => {
                self.state = ResolverState::Active(id.to_string());
                self.label = SessionLabel::Document(activation.filename.clone());
                if let Err(e) = self.store.set(LAST_ACTIVE_DOCUMENT_KEY, id) {
                    warn!(document_id = %id, error = %e, "Failed to remember active document");
                }
                self.publish();
                Ok(activation)
            }
            Err(e) => {
                warn!(document_id = %id, error = %e, "Document activation failed");
                self.clear_remembered();
                Err(e)
            }
        }
    }

    /// Drop the active document, e.g. after it was deleted.
    pub fn reset(&mut self) {
        self.state = ResolverState::Empty;
        self.label = SessionLabel::NoDocumentSelected;
        self.clear_remembered();
        self.publish();
    }

    /// Forget the remembered choice without touching the session.
    pub fn forget(&self) -> Result<()> {
        self.store.remove(LAST_ACTIVE_DOCUMENT_KEY)
    }

    fn remembered(&self) -> Option<String> {
        match self.store.get(LAST_ACTIVE_DOCUMENT_KEY) {
            Ok(value) => value.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read remembered document");
                None
            }
        }
    }

    fn clear_remembered(&self) {
        if let Err(e) = self.store.remove(LAST_ACTIVE_DOCUMENT_KEY) {
            warn!(error = %e, "Failed to clear remembered document");
        }
    }

    fn publish(&self) {
        debug!(label = %self.label, "Session changed");
        self.events.emit(SessionEvent::SessionChanged {
            active_document_id: self.active_document_id().map(String::from),
            label: self.label.to_string(),
        });
    }
}
