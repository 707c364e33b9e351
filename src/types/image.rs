use serde::Serialize;

use crate::params::FieldSpec;

/// POST /api/remove-bg response
#[derive(Debug, Serialize)]
pub struct RemoveBgResponse {
    /// `data:image/png;base64,...`
    pub base64: String,
}

/// GET /api/effects response
#[derive(Debug, Serialize)]
pub struct EffectSchemaResponse {
    /// Effect-stage argument contract version
    pub version: u32,
    pub fields: &'static [FieldSpec],
}
