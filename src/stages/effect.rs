use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use super::command::{self, Launcher};
use crate::error::PipelineError;
use crate::params::{ParameterSet, ARGS_VERSION};

/// Retouching/compositing script run on the background-free image
#[derive(Debug, Clone)]
pub struct EffectStage {
    launcher: Launcher,
    timeout: Duration,
}

impl EffectStage {
    pub fn new(launcher: Launcher, timeout: Duration) -> Self {
        Self { launcher, timeout }
    }

    /// `<input> <output> --blackWhiteLevel <v> ... --addGlasses <v>`
    pub fn args(input: &Path, output: &Path, params: &ParameterSet) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into(), output.into()];
        args.extend(params.to_args().into_iter().map(OsString::from));
        args
    }

    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        params: &ParameterSet,
    ) -> Result<(), PipelineError> {
        tracing::debug!("Effect argument contract v{}", ARGS_VERSION);
        let out = command::run("effects", &self.launcher, Self::args(input, output, params), self.timeout)
            .await
            .map_err(PipelineError::effect)?;
        tracing::info!("Effects applied in {:?}", out.elapsed);
        Ok(())
    }
}
