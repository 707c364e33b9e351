use salvo::cors::*;
use salvo::http::StatusCode;
use salvo::prelude::*;
use salvo::size_limiter::max_size;

use crate::error::render_error;
use crate::handlers;
use crate::state::AppState;

/// Re-render the size limiter's bare 413 as the `{error}` envelope
#[handler]
async fn json_payload_too_large(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    ctrl.call_next(req, depot, res).await;
    if res.status_code == Some(StatusCode::PAYLOAD_TOO_LARGE) {
        res.take_body();
        render_error(res, StatusCode::PAYLOAD_TOO_LARGE, "File too large");
    }
}

pub fn build_router(state: AppState, max_upload_bytes: u64) -> Router {
    Router::new()
        .hoop(affix_state::inject(state))
        .hoop(
            Cors::new()
                .allow_origin(AllowOrigin::any())
                .allow_methods(AllowMethods::any())
                .allow_headers(AllowHeaders::any())
                .into_handler(),
        )
        // Health & schema
        .push(Router::with_path("health").get(handlers::health::health))
        .push(Router::with_path("api/effects").get(handlers::health::effect_schema))
        // Background removal + effects
        .push(
            Router::with_path("api/remove-bg")
                .hoop(json_payload_too_large)
                .hoop(max_size(max_upload_bytes))
                .post(handlers::image::remove_bg),
        )
}
