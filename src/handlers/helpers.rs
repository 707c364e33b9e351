use salvo::prelude::*;

use crate::error::PipelineError;
use crate::state::AppState;

pub(crate) fn get_state(depot: &mut Depot) -> Result<&AppState, PipelineError> {
    depot
        .obtain::<AppState>()
        .map_err(|_| PipelineError::Internal("application state not injected".to_string()))
}
