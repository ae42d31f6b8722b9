//! The search session: one per search view.
//!
//! Ties the catalog, the active-document resolver, the suggestion list and
//! the search executor to one backend and one preference store, and
//! publishes every visible state change on an [`EventBus`].
//!
//! Suggestion and search requests follow a ticket protocol: a state
//! transition hands out a ticket, the driver awaits `ticket.fetch`/`run`
//! against [`SearchSession::backend`], and feeds the outcome back through
//! `apply_suggestions`/`apply_search`. Tickets may complete in any order.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use cerdas_core::{
    defaults, Delivery, Document, DocumentBackend, DocumentUpdate, Error, EventBus,
    PreferenceStore, Result, SearchResult, ServerStatus, SessionEvent, Stats,
};

use crate::catalog::Catalog;
use crate::forms::{EditForm, UploadForm};
use crate::resolver::{Session, SessionResolver};
use crate::search::{SearchExecutor, SearchTicket};
use crate::suggest::{Key, SuggestionController, SuggestionRequest};

/// Dashboard summary: catalog statistics plus the first few documents.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub stats: Stats,
    pub recent: Vec<Document>,
}

pub struct SearchSession {
    backend: Arc<dyn DocumentBackend>,
    events: EventBus,
    catalog: Catalog,
    resolver: SessionResolver,
    suggestions: SuggestionController,
    search: SearchExecutor,
    upload_form: UploadForm,
    edit_form: Option<EditForm>,
}

impl SearchSession {
    pub fn new(backend: Arc<dyn DocumentBackend>, store: Arc<dyn PreferenceStore>) -> Self {
        Self::with_events(backend, store, EventBus::default())
    }

    pub fn with_events(
        backend: Arc<dyn DocumentBackend>,
        store: Arc<dyn PreferenceStore>,
        events: EventBus,
    ) -> Self {
        Self {
            backend,
            catalog: Catalog::new(events.clone()),
            resolver: SessionResolver::new(store, events.clone()),
            events,
            suggestions: SuggestionController::new(),
            search: SearchExecutor::new(),
            upload_form: UploadForm::new(),
            edit_form: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Shared backend handle for running tickets.
    pub fn backend(&self) -> Arc<dyn DocumentBackend> {
        Arc::clone(&self.backend)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> Session {
        self.resolver.session()
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    pub fn suggestions(&self) -> &SuggestionController {
        &self.suggestions
    }

    pub fn search(&self) -> &SearchExecutor {
        &self.search
    }

    pub fn upload_form(&self) -> &UploadForm {
        &self.upload_form
    }

    pub fn upload_form_mut(&mut self) -> &mut UploadForm {
        &mut self.upload_form
    }

    pub fn edit_form(&self) -> Option<&EditForm> {
        self.edit_form.as_ref()
    }

    pub fn edit_form_mut(&mut self) -> Option<&mut EditForm> {
        self.edit_form.as_mut()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Resolve the active document. Never fails on backend trouble; the
    /// resulting label says what went wrong.
    pub async fn startup(&mut self) -> Result<Session> {
        let session = self
            .resolver
            .startup(self.backend.as_ref(), &mut self.catalog)
            .await?;
        info!(
            active_document_id = session.active_document_id.as_deref().unwrap_or(""),
            label = %session.label,
            "Session started"
        );
        Ok(session)
    }

    /// Make `id` the active document.
    pub async fn switch_document(&mut self, id: &str) -> Result<Session> {
        self.resolver.switch_to(self.backend.as_ref(), id).await?;
        Ok(self.session())
    }

    pub async fn refresh_catalog(&mut self) -> Result<usize> {
        self.catalog.refresh(self.backend.as_ref()).await
    }

    /// Forget the remembered document; the current session stays as it is.
    pub fn forget_remembered(&self) -> Result<()> {
        self.resolver.forget()
    }

    // =========================================================================
    // Catalog mutations
    // =========================================================================

    /// Delete a catalog document. Deleting the active document resets the
    /// session before the catalog is refreshed.
    pub async fn delete_document(&mut self, id: &str) -> Result<String> {
        self.catalog.lookup(id)?;
        let message = self.backend.delete_document(id).await?;

        let was_active = self.resolver.active_document_id() == Some(id);
        if was_active {
            self.resolver.reset();
        }
        info!(document_id = %id, was_active, "Document deleted");
        self.events.emit(SessionEvent::DocumentDeleted {
            id: id.to_string(),
            was_active,
        });

        self.refresh_after_mutation().await;
        Ok(message)
    }

    /// Replace a catalog document's uploader and tags.
    pub async fn update_document(&mut self, id: &str, update: &DocumentUpdate) -> Result<String> {
        self.catalog.lookup(id)?;
        let message = self.backend.update_document(id, update).await?;

        info!(document_id = %id, "Document updated");
        self.events.emit(SessionEvent::DocumentUpdated { id: id.to_string() });

        self.refresh_after_mutation().await;
        Ok(message)
    }

    /// Open the edit form for a catalog document.
    pub fn open_edit(&mut self, id: &str) -> Result<&mut EditForm> {
        let form = EditForm::open(self.catalog.lookup(id)?);
        Ok(self.edit_form.insert(form))
    }

    pub fn close_edit(&mut self) {
        self.edit_form = None;
    }

    /// Save the open edit form. On success the form closes; on failure it
    /// stays open with the error shown.
    pub async fn save_edit(&mut self) -> Result<String> {
        let form = self
            .edit_form
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("no document is being edited".to_string()))?;
        let id = form.id().to_string();

        let outcome = match form.to_update() {
            Ok(update) => self.update_document(&id, &update).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(message) => {
                self.edit_form = None;
                Ok(message)
            }
            Err(e) => {
                if let Some(form) = self.edit_form.as_mut() {
                    form.fail(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Upload the file chosen in the upload form.
    pub async fn upload(&mut self) -> Result<String> {
        let outcome = match self.upload_form.to_request().await {
            Ok(request) => {
                let filename = request.filename.clone();
                self.backend
                    .upload(request)
                    .await
                    .map(|message| (filename, message))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok((filename, message)) => {
                info!(filename = %filename, "Document uploaded");
                self.upload_form.succeed(message.clone());
                self.events
                    .emit(SessionEvent::DocumentUploaded { filename });
                self.refresh_after_mutation().await;
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                self.upload_form.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn refresh_after_mutation(&mut self) {
        // The mutation itself succeeded; a failed refresh only empties the catalog.
        let _ = self.refresh_catalog().await;
    }

    // =========================================================================
    // Query box
    // =========================================================================

    pub fn on_query_change(&mut self, text: impl Into<String>) -> Option<SuggestionRequest> {
        let request = self.suggestions.on_query_change(text);
        if request.is_none() {
            self.publish_suggestions();
        }
        request
    }

    pub fn apply_suggestions(
        &mut self,
        request: &SuggestionRequest,
        result: Result<Vec<String>>,
    ) -> Result<Delivery> {
        let delivery = self.suggestions.apply_suggestions(request, result);
        if !matches!(delivery, Ok(Delivery::Stale)) {
            self.publish_suggestions();
        }
        delivery
    }

    pub fn on_key(&mut self, key: Key) -> bool {
        let handled = self.suggestions.on_key(key);
        if handled {
            self.publish_suggestions();
        }
        handled
    }

    /// Commit the highlighted suggestion or the raw query as a search.
    ///
    /// Returns `None` when there is nothing to search for.
    pub fn commit(&mut self) -> Result<Option<SearchTicket>> {
        let Some(text) = self.suggestions.commit() else {
            return Ok(None);
        };
        self.publish_suggestions();
        self.dispatch(&text).map(Some)
    }

    /// Pointer selection of suggestion `index`.
    pub fn select(&mut self, index: usize) -> Result<Option<SearchTicket>> {
        let Some(text) = self.suggestions.select(index) else {
            return Ok(None);
        };
        self.publish_suggestions();
        self.dispatch(&text).map(Some)
    }

    pub fn apply_search(
        &mut self,
        ticket: &SearchTicket,
        result: Result<SearchResult>,
    ) -> Result<Delivery> {
        let delivery = self
            .search
            .complete(self.resolver.active_document_id(), ticket, result);
        match &delivery {
            Ok(Delivery::Applied) => self.events.emit(SessionEvent::SearchCompleted {
                seq: ticket.seq,
                query: ticket.query.clone(),
                count: self.search.result().count,
            }),
            Ok(Delivery::Stale) => {}
            Err(e) => self.events.emit(SessionEvent::SearchFailed {
                seq: ticket.seq,
                query: ticket.query.clone(),
                error: e.to_string(),
            }),
        }
        delivery
    }

    /// Type `text` and wait for its suggestions.
    pub async fn type_query(&mut self, text: impl Into<String>) -> Result<&[String]> {
        if let Some(request) = self.on_query_change(text) {
            let result = request.fetch(self.backend.as_ref()).await;
            self.apply_suggestions(&request, result)?;
        }
        Ok(self.suggestions.suggestions())
    }

    /// Commit and wait for the search result. `None` when nothing was searched.
    pub async fn submit(&mut self) -> Result<Option<&SearchResult>> {
        let Some(ticket) = self.commit()? else {
            return Ok(None);
        };
        let result = ticket.run(self.backend.as_ref()).await;
        self.apply_search(&ticket, result)?;
        Ok(Some(self.search.result()))
    }

    fn dispatch(&mut self, text: &str) -> Result<SearchTicket> {
        let ticket = self
            .search
            .dispatch(self.resolver.active_document_id(), text)?;
        self.events.emit(SessionEvent::SearchStarted {
            seq: ticket.seq,
            query: ticket.query.clone(),
        });
        Ok(ticket)
    }

    fn publish_suggestions(&self) {
        self.events.emit(SessionEvent::SuggestionsChanged {
            query: self.suggestions.query().to_string(),
            suggestions: self.suggestions.suggestions().to_vec(),
            cursor: self.suggestions.cursor(),
        });
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    pub async fn tags(&self) -> Result<Vec<String>> {
        self.backend.tags().await
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.backend.stats().await
    }

    /// Statistics plus the first few catalog entries, with a fresh catalog.
    pub async fn overview(&mut self) -> Result<Overview> {
        let stats = self.backend.stats().await?;
        self.refresh_catalog().await?;
        Ok(Overview {
            stats,
            recent: self.catalog.recent(defaults::RECENT_DOCUMENTS).to_vec(),
        })
    }

    pub async fn server_status(&self) -> Result<ServerStatus> {
        self.backend.status().await
    }
}
