//! Centralized default constants for the cerdas client.
//!
//! Crates reference these constants instead of defining their own magic
//! values. Organized by domain area.

// =============================================================================
// BACKEND
// =============================================================================

/// Default backend base URL.
pub const API_URL: &str = "http://127.0.0.1:5000";

/// Default request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header sent so tunnelled backends (ngrok) skip their browser interstitial.
pub const TUNNEL_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// Fallback message when a non-2xx response carries no `{error}` body.
pub const UNKNOWN_BACKEND_ERROR: &str = "Unknown error";

// =============================================================================
// SESSION
// =============================================================================

/// Preference key holding the last successfully activated document id.
pub const LAST_ACTIVE_DOCUMENT_KEY: &str = "lastActiveDocumentId";

/// Label shown while the startup sequence is still resolving.
pub const LABEL_LOADING: &str = "Loading...";

/// Label shown when the backend has no documents at all.
pub const LABEL_NO_DOCUMENTS: &str = "No documents in the database.";

/// Label shown after the active document was reset.
pub const LABEL_NO_DOCUMENT_SELECTED: &str = "No document selected.";

/// Label shown when the backend could not be reached.
pub const LABEL_BACKEND_UNREACHABLE: &str = "Cannot reach the backend.";

/// Uploader name the backend records when none is given.
pub const ANONYMOUS_UPLOADER: &str = "Anonim";

/// Uploader shown for documents whose record has no uploader.
pub const UNKNOWN_UPLOADER: &str = "N/A";

// =============================================================================
// SUGGESTIONS & SEARCH
// =============================================================================

/// Queries must be longer than this many characters before suggestions are fetched.
pub const SUGGEST_MIN_PREFIX_CHARS: usize = 1;

/// Number of catalog entries shown as recent activity in the overview.
pub const RECENT_DOCUMENTS: usize = 5;

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// CONFIG & STATE
// =============================================================================

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "cerdas";

/// Client configuration file name.
pub const CONFIG_FILE_NAME: &str = "client.toml";

/// Preference store file name.
pub const STATE_FILE_NAME: &str = "preferences.json";

/// Wire format of document timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
