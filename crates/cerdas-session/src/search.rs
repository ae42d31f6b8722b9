//! Phrase search against the active document.

use tracing::debug;

use cerdas_core::{Delivery, DocumentBackend, Error, Result, SearchResult};

/// A dispatched search awaiting its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
    pub document_id: String,
}

impl SearchTicket {
    pub async fn run(&self, backend: &dyn DocumentBackend) -> Result<SearchResult> {
        backend.search(&self.query).await
    }
}

/// Tracks the newest search and its outcome.
///
/// Only the most recently dispatched ticket may change the displayed result.
#[derive(Debug, Default)]
pub struct SearchExecutor {
    seq: u64,
    loading: bool,
    searched: bool,
    query: Option<String>,
    result: SearchResult,
    last_error: Option<String>,
}

impl SearchExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search for `text` against `active_document`.
    pub fn dispatch(&mut self, active_document: Option<&str>, text: &str) -> Result<SearchTicket> {
        let document_id = active_document.ok_or(Error::NoActiveDocument)?;
        if text.is_empty() {
            return Err(Error::InvalidInput("search text is empty".to_string()));
        }

        self.seq += 1;
        self.loading = true;
        self.searched = true;
        self.query = Some(text.to_string());
        self.result = SearchResult::default();
        self.last_error = None;

        Ok(SearchTicket {
            seq: self.seq,
            query: text.to_string(),
            document_id: document_id.to_string(),
        })
    }

    /// Deliver the outcome of a search. A current failure leaves an empty
    /// result, records the message, and hands the error back.
    ///
    /// A result for a document that is no longer active is dropped and ends
    /// the loading state with an empty result.
    pub fn complete(
        &mut self,
        active_document: Option<&str>,
        ticket: &SearchTicket,
        result: Result<SearchResult>,
    ) -> Result<Delivery> {
        if ticket.seq != self.seq {
            debug!(
                seq = ticket.seq,
                latest_seq = self.seq,
                query = %ticket.query,
                "Dropping stale search result"
            );
            return Ok(Delivery::Stale);
        }

        self.loading = false;
        if active_document != Some(ticket.document_id.as_str()) {
            debug!(
                seq = ticket.seq,
                document_id = %ticket.document_id,
                "Dropping search result for inactive document"
            );
            self.result = SearchResult::default();
            return Ok(Delivery::Stale);
        }

        match result {
            Ok(result) => {
                debug!(seq = ticket.seq, query = %ticket.query, count = result.count, "Search completed");
                self.result = result;
                Ok(Delivery::Applied)
            }
            Err(e) => {
                self.result = SearchResult::default();
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_searched(&self) -> bool {
        self.searched
    }

    /// Text of the newest dispatched search.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
