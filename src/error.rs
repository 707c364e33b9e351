use std::time::Duration;

use salvo::http::StatusCode;
use salvo::prelude::*;

use crate::params::ValidationError;
use crate::stages::StageError;
use crate::types::ApiError;

/// Why a request failed
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No file uploaded")]
    MissingUpload,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("segmentation failed: {0}")]
    Segmentation(StageError),
    #[error("segmentation timed out after {0:?}")]
    SegmentationTimeout(Duration),
    #[error("effect stage failed: {0}")]
    Effect(StageError),
    #[error("effect stage timed out after {0:?}")]
    EffectTimeout(Duration),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn segmentation(err: StageError) -> Self {
        match err {
            StageError::TimedOut(limit) => Self::SegmentationTimeout(limit),
            other => Self::Segmentation(other),
        }
    }

    pub fn effect(err: StageError) -> Self {
        match err {
            StageError::TimedOut(limit) => Self::EffectTimeout(limit),
            other => Self::Effect(other),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingUpload | Self::Validation(_) => "validation",
            Self::Segmentation(_) => "segmentation",
            Self::SegmentationTimeout(_) => "segmentation_timeout",
            Self::Effect(_) => "effect",
            Self::EffectTimeout(_) => "effect_timeout",
            Self::Io { .. } => "io",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUpload | Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller. Stage diagnostics stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingUpload => "No file uploaded".to_string(),
            Self::Validation(e) => e.to_string(),
            Self::Segmentation(_) => "Failed to remove background".to_string(),
            Self::SegmentationTimeout(_) => "Background removal timed out".to_string(),
            Self::Effect(_) => "Failed to apply effects".to_string(),
            Self::EffectTimeout(_) => "Applying effects timed out".to_string(),
            Self::Io { .. } => "Failed to read output file".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Render the `{ "error": ... }` envelope with the given status code
pub fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(ApiError {
        error: message.to_string(),
    }));
}

/// Log a pipeline failure and render it
pub fn render_pipeline_error(res: &mut Response, err: &PipelineError) {
    if err.status_code().is_server_error() {
        tracing::error!("Request failed ({}): {}", err.kind(), err);
    } else {
        tracing::info!("Request rejected: {}", err);
    }
    render_error(res, err.status_code(), &err.public_message());
}
