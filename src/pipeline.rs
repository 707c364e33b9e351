//! Request pipeline: workspace → segmentation → effects → encoded image
//!
//! One `Pipeline` is shared by all requests. It holds no mutable state; each
//! call to [`Pipeline::run`] owns its own [`Workspace`], so concurrent
//! requests only meet on the filesystem, under disjoint paths.

use std::path::PathBuf;
use std::time::Instant;

use base64::Engine;
use image::ImageFormat;

use crate::config::Config;
use crate::error::PipelineError;
use crate::params::{ParameterSet, ValidationError, ValidationReason};
use crate::stages::{EffectStage, Launcher, SegmentationStage};
use crate::workspace::Workspace;

const ACCEPTED_FORMATS: [ImageFormat; 6] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Gif,
    ImageFormat::Tiff,
];

/// Raw upload as received from the client
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    /// Declared by the client; informational only
    pub content_type: Option<String>,
}

impl UploadedImage {
    /// Detect the image format from the payload itself.
    pub fn sniff(&self) -> Result<ImageFormat, ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::new(
                "file",
                ValidationReason::Rejected("uploaded file is empty".to_string()),
            ));
        }
        match image::guess_format(&self.bytes) {
            Ok(format) if ACCEPTED_FORMATS.contains(&format) => Ok(format),
            Ok(format) => Err(ValidationError::new(
                "file",
                ValidationReason::Rejected(format!("unsupported image format {:?}", format)),
            )),
            Err(_) => Err(ValidationError::new(
                "file",
                ValidationReason::Rejected("not a recognized image".to_string()),
            )),
        }
    }
}

/// Where a request is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Received,
    Validated,
    Segmented,
    Effected,
    Completed,
}

pub struct Pipeline {
    work_dir: PathBuf,
    segmentation: SegmentationStage,
    effects: EffectStage,
}

impl Pipeline {
    pub fn new(work_dir: PathBuf, segmentation: SegmentationStage, effects: EffectStage) -> Self {
        Self {
            work_dir,
            segmentation,
            effects,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let segmentation = SegmentationStage::new(
            Launcher::new(&config.rembg_path),
            config.segment_timeout,
        );
        let effect_launcher = match &config.effect_script {
            Some(script) => Launcher::with_prefix(
                &config.effect_program,
                vec![script.clone().into_os_string()],
            ),
            None => Launcher::new(&config.effect_program),
        };
        let effects = EffectStage::new(effect_launcher, config.effect_timeout);
        Self::new(config.work_dir.clone(), segmentation, effects)
    }

    /// Process a validated upload and return the result as a PNG data URL.
    ///
    /// The workspace is closed before this returns, whatever the outcome. If
    /// the future is dropped mid-flight, the workspace's drop does the same.
    pub async fn run(
        &self,
        upload: &UploadedImage,
        params: &ParameterSet,
    ) -> Result<String, PipelineError> {
        let started = Instant::now();
        let mut workspace = Workspace::open(&self.work_dir);
        tracing::info!(
            "Session {}: processing {} byte upload ({})",
            workspace.token(),
            upload.bytes.len(),
            upload.content_type.as_deref().unwrap_or("no content type")
        );

        let result = self.run_in(&workspace, upload, params).await;
        workspace.close().await;

        match &result {
            Ok(_) => tracing::info!(
                "Session {}: completed in {:?}",
                workspace.token(),
                started.elapsed()
            ),
            Err(e) => tracing::warn!(
                "Session {}: failed ({}) after {:?}",
                workspace.token(),
                e.kind(),
                started.elapsed()
            ),
        }
        result
    }

    async fn run_in(
        &self,
        ws: &Workspace,
        upload: &UploadedImage,
        params: &ParameterSet,
    ) -> Result<String, PipelineError> {
        let mut state = ProcessingState::Received;
        let mut advance = |next: ProcessingState| {
            tracing::debug!("Session {}: {:?} -> {:?}", ws.token(), state, next);
            state = next;
        };
        // upload and parameters were checked before the workspace was opened
        advance(ProcessingState::Validated);

        tokio::fs::write(&ws.input, &upload.bytes)
            .await
            .map_err(|e| PipelineError::io("writing upload to workspace", e))?;

        self.segmentation.run(&ws.input, &ws.segmented).await?;
        tokio::fs::metadata(&ws.segmented)
            .await
            .map_err(|e| PipelineError::io("segmentation reported success without output", e))?;
        advance(ProcessingState::Segmented);

        self.effects.run(&ws.segmented, &ws.output, params).await?;
        advance(ProcessingState::Effected);

        let bytes = tokio::fs::read(&ws.output)
            .await
            .map_err(|e| PipelineError::io("reading effect output", e))?;
        if bytes.is_empty() {
            return Err(PipelineError::io(
                "reading effect output",
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "output image is empty"),
            ));
        }
        if image::guess_format(&bytes).ok() != Some(ImageFormat::Png) {
            tracing::warn!("Session {}: effect output is not a PNG", ws.token());
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        advance(ProcessingState::Completed);
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}
