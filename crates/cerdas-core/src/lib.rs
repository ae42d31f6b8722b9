//! # cerdas-core
//!
//! Core types, traits, and abstractions for the cerdas document search
//! client.
//!
//! This crate provides the data model shared with the backend, the error
//! taxonomy, the [`DocumentBackend`] and [`PreferenceStore`] seams, and the
//! [`EventBus`] observers use to follow session state.

pub mod defaults;
pub mod error;
pub mod events;
pub mod models;
pub mod traits;

// Mock backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, SessionEvent};
pub use models::*;
pub use traits::*;

/// Outcome of delivering an asynchronous response to its controller.
///
/// A response is stale when a newer request of the same kind was issued
/// after it; stale responses are dropped without touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The response was current and its state change was applied.
    Applied,
    /// The response was superseded and dropped.
    Stale,
}

impl Delivery {
    pub fn is_applied(self) -> bool {
        matches!(self, Delivery::Applied)
    }
}
