//! # cerdas-session
//!
//! Active-document session and query-suggestion controller.
//!
//! [`SearchSession`] decides which document searches run against, remembers
//! that choice in a [`cerdas_core::PreferenceStore`], and drives the search
//! box: incremental suggestions, keyboard navigation and committing text
//! into a search. Out-of-order backend responses are suppressed by request
//! sequence, never by arrival order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cerdas_session::{MemoryStore, SearchSession};
//!
//! # async fn example(backend: Arc<dyn cerdas_core::DocumentBackend>) -> cerdas_core::Result<()> {
//! let mut session = SearchSession::new(backend, Arc::new(MemoryStore::new()));
//! let started = session.startup().await?;
//! println!("Active: {}", started.label);
//!
//! session.type_query("huk").await?;
//! if let Some(result) = session.submit().await? {
//!     println!("{} matches", result.count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod controller;
pub mod forms;
pub mod resolver;
pub mod search;
pub mod store;
pub mod suggest;

pub use catalog::Catalog;
pub use controller::{Overview, SearchSession};
pub use forms::{EditForm, FormStatus, UploadForm};
pub use resolver::{ResolverState, Session, SessionLabel, SessionResolver};
pub use search::{SearchExecutor, SearchTicket};
pub use store::{JsonFileStore, MemoryStore};
pub use suggest::{Key, SuggestionController, SuggestionRequest};
