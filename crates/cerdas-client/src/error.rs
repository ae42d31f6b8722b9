//! Backend error responses.

use reqwest::Response;
use serde::Deserialize;

use cerdas_core::{defaults, Error};

/// Body the backend sends with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendErrorBody {
    pub error: String,
}

/// Map a failed HTTP status and message to a cerdas error.
pub fn to_cerdas_error(status: u16, message: String) -> Error {
    match status {
        404 => Error::NotFound(message),
        _ => Error::Backend { status, message },
    }
}

/// Consume a non-2xx response into an error, falling back to a generic
/// message when the body has no `error` field.
pub async fn from_response(response: Response) -> Error {
    let status = response.status().as_u16();
    let message = response
        .json::<BackendErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| defaults::UNKNOWN_BACKEND_ERROR.to_string());
    to_cerdas_error(status, message)
}
