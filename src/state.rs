use std::sync::Arc;

use crate::pipeline::Pipeline;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Stateless pipeline; each request opens its own workspace
    pub pipeline: Arc<Pipeline>,
}
