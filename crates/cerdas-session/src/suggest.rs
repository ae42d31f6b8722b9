//! Search-box suggestions and keyboard navigation.
//!
//! Every query change bumps a request sequence number. A suggestion response
//! is applied only if it answers the newest request and the query has not
//! moved on since, so out-of-order responses can never show suggestions for
//! text the user is no longer typing.

use tracing::debug;

use cerdas_core::{defaults, Delivery, DocumentBackend, Result};

/// Navigation keys understood by the suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Escape,
}

/// An autocomplete request to dispatch for the given prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub seq: u64,
    pub prefix: String,
}

impl SuggestionRequest {
    /// Ask the backend for words starting with the prefix.
    pub async fn fetch(&self, backend: &dyn DocumentBackend) -> Result<Vec<String>> {
        backend.autocomplete(&self.prefix).await
    }
}

#[derive(Debug, Default)]
pub struct SuggestionController {
    query: String,
    suggestions: Vec<String>,
    cursor: Option<usize>,
    seq: u64,
}

impl SuggestionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The suggestion under the cursor.
    pub fn highlighted(&self) -> Option<&str> {
        self.cursor
            .and_then(|i| self.suggestions.get(i))
            .map(String::as_str)
    }

    /// Record new query text.
    ///
    /// Returns a request to dispatch when the text is long enough to fetch
    /// suggestions for; shorter text clears the list immediately.
    pub fn on_query_change(&mut self, text: impl Into<String>) -> Option<SuggestionRequest> {
        self.query = text.into();
        self.cursor = None;
        self.seq += 1;

        if self.query.chars().count() > defaults::SUGGEST_MIN_PREFIX_CHARS {
            Some(SuggestionRequest {
                seq: self.seq,
                prefix: self.query.clone(),
            })
        } else {
            self.suggestions.clear();
            None
        }
    }

    /// Deliver the outcome of a suggestion request.
    ///
    /// A failed fetch for the current query clears the list and hands the
    /// error back. Outdated responses are dropped whether they succeeded or not.
    pub fn apply_suggestions(
        &mut self,
        request: &SuggestionRequest,
        result: Result<Vec<String>>,
    ) -> Result<Delivery> {
        if request.seq != self.seq || request.prefix != self.query {
            debug!(
                seq = request.seq,
                latest_seq = self.seq,
                prefix = %request.prefix,
                "Dropping stale suggestions"
            );
            return Ok(Delivery::Stale);
        }

        self.cursor = None;
        match result {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                Ok(Delivery::Applied)
            }
            Err(e) => {
                self.suggestions.clear();
                Err(e)
            }
        }
    }

    /// Move the cursor or dismiss the list. Returns false when there is
    /// nothing to navigate.
    pub fn on_key(&mut self, key: Key) -> bool {
        let n = self.suggestions.len();
        if n == 0 {
            return false;
        }

        match key {
            Key::ArrowDown => {
                self.cursor = Some(self.cursor.map_or(0, |c| (c + 1) % n));
            }
            Key::ArrowUp => {
                // No highlight counts as position -1.
                let from = self.cursor.map_or(-1, |c| c as isize);
                let n = n as isize;
                self.cursor = Some((from - 1 + n).rem_euclid(n) as usize);
            }
            Key::Escape => {
                self.dismiss();
            }
        }
        true
    }

    /// Turn the highlighted suggestion, or else the raw query, into search text.
    ///
    /// Empty text is rejected and changes nothing. Otherwise the suggestion
    /// list is cleared before the text is returned.
    pub fn commit(&mut self) -> Option<String> {
        let text = match self.highlighted() {
            Some(suggestion) => suggestion.to_string(),
            None => self.query.clone(),
        };
        if text.is_empty() {
            return None;
        }

        self.query = text.clone();
        self.dismiss();
        Some(text)
    }

    /// Pointer selection: highlight `index`, then commit.
    pub fn select(&mut self, index: usize) -> Option<String> {
        if index >= self.suggestions.len() {
            return None;
        }
        self.cursor = Some(index);
        self.commit()
    }

    fn dismiss(&mut self) {
        self.suggestions.clear();
        self.cursor = None;
        self.seq += 1;
    }
}
