use serde::Serialize;

/// Error envelope: `{ "error": "<message>" }`
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}
