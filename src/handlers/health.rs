use salvo::prelude::*;

use crate::params::{ARGS_VERSION, FIELDS};
use crate::types::EffectSchemaResponse;

/// GET /health - Health check
#[handler]
pub async fn health(res: &mut Response) {
    res.render(Json(serde_json::json!({
        "status": "healthy",
        "service": "cutout-api"
    })));
}

/// GET /api/effects - Effect parameters with their types, bounds and defaults
#[handler]
pub async fn effect_schema(res: &mut Response) {
    res.render(Json(EffectSchemaResponse {
        version: ARGS_VERSION,
        fields: &FIELDS,
    }));
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};

    use crate::pipeline::tests::{test_pipeline, EFFECT_COPY, SEGMENT_COPY};
    use crate::router::tests::test_service;
    use crate::workspace::tests::scratch_dir;

    #[tokio::test]
    async fn health_reports_healthy() {
        let dir = scratch_dir("health");
        let service = test_service(test_pipeline(&dir, &dir, SEGMENT_COPY, EFFECT_COPY), 1 << 20);

        let mut res = TestClient::get("http://127.0.0.1:4000/health").send(&service).await;
        let body: serde_json::Value = res.take_json().await.unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn schema_lists_every_field_in_order() {
        let dir = scratch_dir("schema");
        let service = test_service(test_pipeline(&dir, &dir, SEGMENT_COPY, EFFECT_COPY), 1 << 20);

        let mut res = TestClient::get("http://127.0.0.1:4000/api/effects").send(&service).await;
        let body: serde_json::Value = res.take_json().await.unwrap();
        assert_eq!(body["version"], 1);
        let fields = body["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 19);
        assert_eq!(fields[0]["name"], "blackWhiteLevel");
        assert_eq!(fields[0]["type"], "float");
        assert_eq!(fields[10]["name"], "hue");
        assert_eq!(fields[10]["min"], -180.0);
        assert_eq!(fields[18]["name"], "addGlasses");
        assert_eq!(fields[18]["default"], false);
    }
}
