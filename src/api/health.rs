use std::sync::Arc;

use poem_openapi::OpenApi;

use crate::api::models::{HealthDto, HealthResponse};
use crate::api::AppState;

pub struct HealthApi {
    pub state: Arc<AppState>,
}

#[OpenApi]
impl HealthApi {
    #[oai(path = "/health", method = "get")]
    async fn health(&self) -> HealthResponse {
        let _ = &self.state;
        HealthResponse::Ok(poem_openapi::payload::Json(HealthDto {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }))
    }

    #[oai(path = "/health", method = "head")]
    async fn health_head(&self) -> HealthResponse {
        self.health().await
    }
}
