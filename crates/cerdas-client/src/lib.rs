//! # cerdas-client
//!
//! HTTP access to the cerdas document search backend.
//!
//! [`HttpBackend`] implements [`cerdas_core::DocumentBackend`] over the
//! backend's JSON REST API; [`ClientConfig`] describes where the backend
//! lives and how long to wait for it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cerdas_client::{ClientConfig, HttpBackend};
//! use cerdas_core::DocumentBackend;
//!
//! # async fn example() -> cerdas_core::Result<()> {
//! let backend = HttpBackend::new(ClientConfig::load()?)?;
//! for doc in backend.list_documents().await? {
//!     println!("{} {}", doc.id, doc.filename);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::{ClientConfig, ConfigError, ConfigResult};
pub use http::HttpBackend;
