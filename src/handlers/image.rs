use salvo::prelude::*;

use crate::error::{render_pipeline_error, PipelineError};
use crate::params::ParameterSet;
use crate::pipeline::UploadedImage;
use crate::types::RemoveBgResponse;

use super::helpers::get_state;

/// POST /api/remove-bg - Remove the background and apply effects
///
/// Multipart form: `file` (required) plus any effect parameters as text
/// fields. Everything is validated before a workspace is opened or any
/// external stage runs.
#[handler]
pub async fn remove_bg(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) {
    let state = match get_state(depot) {
        Ok(state) => state,
        Err(e) => {
            render_pipeline_error(res, &e);
            return;
        }
    };

    let (upload_path, content_type, params) = {
        let form = match req.form_data().await {
            Ok(form) => form,
            Err(e) => {
                tracing::info!("Failed to parse multipart form: {}", e);
                render_pipeline_error(res, &PipelineError::MissingUpload);
                return;
            }
        };
        let Some(file) = form.files.get("file") else {
            render_pipeline_error(res, &PipelineError::MissingUpload);
            return;
        };
        let params = ParameterSet::from_fields(|name| form.fields.get(name).map(String::as_str));
        (
            file.path().clone(),
            file.content_type().map(|m| m.to_string()),
            params,
        )
    };

    let params = match params {
        Ok(p) => p,
        Err(e) => {
            render_pipeline_error(res, &e.into());
            return;
        }
    };

    // salvo spools file parts to its own temp dir
    let bytes = match tokio::fs::read(&upload_path).await {
        Ok(b) => b,
        Err(e) => {
            render_pipeline_error(res, &PipelineError::io("reading uploaded file", e));
            return;
        }
    };
    let upload = UploadedImage {
        bytes,
        content_type,
    };
    if let Err(e) = upload.sniff() {
        render_pipeline_error(res, &e.into());
        return;
    }

    match state.pipeline.run(&upload, &params).await {
        Ok(base64) => res.render(Json(RemoveBgResponse { base64 })),
        Err(e) => render_pipeline_error(res, &e),
    }
}
