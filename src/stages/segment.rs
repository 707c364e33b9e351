use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use super::command::{self, Launcher};
use crate::error::PipelineError;

/// rembg model tuned for people
pub const MODEL: &str = "u2net_human_seg";
/// Alpha matting refinement; fixed, not user controlled
pub const FOREGROUND_THRESHOLD: u32 = 240;
pub const BACKGROUND_THRESHOLD: u32 = 80;
pub const ERODE_SIZE: u32 = 20;

/// Background removal via rembg
#[derive(Debug, Clone)]
pub struct SegmentationStage {
    launcher: Launcher,
    timeout: Duration,
}

impl SegmentationStage {
    pub fn new(launcher: Launcher, timeout: Duration) -> Self {
        Self { launcher, timeout }
    }

    pub fn args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "i",
            "--model",
            MODEL,
            "--alpha-matting",
            "--alpha-matting-foreground-threshold",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(FOREGROUND_THRESHOLD.to_string().into());
        args.push("--alpha-matting-background-threshold".into());
        args.push(BACKGROUND_THRESHOLD.to_string().into());
        args.push("--alpha-matting-erode-size".into());
        args.push(ERODE_SIZE.to_string().into());
        args.push(input.into());
        args.push(output.into());
        args
    }

    /// Cut the subject out of `input` into `output`. `output` is only
    /// meaningful when this returns `Ok`.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let out = command::run("segmentation", &self.launcher, Self::args(input, output), self.timeout)
            .await
            .map_err(PipelineError::segmentation)?;
        tracing::info!("Background removed in {:?}", out.elapsed);
        Ok(())
    }
}
