//! EPUB/TXT artifact build-status and download endpoints. Building is always
//! triggered as a side effect of checking status, matching the single
//! "ensure cached" entry point `ArtifactManager` exposes.

use std::sync::Arc;

use poem_openapi::param::Path;
use poem_openapi::OpenApi;
use uuid::Uuid;

use crate::api::models::{ArtifactDownloadResponse, ArtifactStatusDto, ArtifactStatusResponse};
use crate::api::AppState;
use crate::artifacts::{ArtifactKind, ArtifactRequest};

pub struct ArtifactsApi {
    pub state: Arc<AppState>,
}

impl ArtifactsApi {
    async fn status(&self, book_uuid: Uuid, kind: ArtifactKind) -> ArtifactStatusResponse {
        match self.state.reader.ensure_artifact_cached(book_uuid, kind).await {
            Ok(ArtifactRequest::Ready(_)) => ArtifactStatusResponse::Ready(poem_openapi::payload::Json(ArtifactStatusDto {
                status: "ready".to_string(),
                message: None,
            })),
            Ok(ArtifactRequest::Pending) => ArtifactStatusResponse::Pending(poem_openapi::payload::Json(ArtifactStatusDto {
                status: "pending".to_string(),
                message: None,
            })),
            Ok(ArtifactRequest::Failed(message)) => {
                ArtifactStatusResponse::Pending(poem_openapi::payload::Json(ArtifactStatusDto {
                    status: "failed".to_string(),
                    message: Some(message),
                }))
            }
            Err(e) => ArtifactStatusResponse::Pending(poem_openapi::payload::Json(ArtifactStatusDto {
                status: "failed".to_string(),
                message: Some(e.to_string()),
            })),
        }
    }

    async fn download(&self, book_uuid: Uuid, kind: ArtifactKind) -> ArtifactDownloadResponse {
        match self.state.reader.ensure_artifact_cached(book_uuid, kind).await {
            Ok(ArtifactRequest::Ready(path)) => match tokio::fs::read(&path).await {
                Ok(bytes) => ArtifactDownloadResponse::Ok(poem_openapi::payload::Binary(bytes)),
                Err(_) => ArtifactDownloadResponse::NotFound(poem_openapi::payload::Json(
                    crate::api::models::ErrorDto::from("artifact file missing"),
                )),
            },
            Ok(ArtifactRequest::Pending) => {
                ArtifactDownloadResponse::Pending(poem_openapi::payload::Json(ArtifactStatusDto {
                    status: "pending".to_string(),
                    message: None,
                }))
            }
            Ok(ArtifactRequest::Failed(message)) => {
                ArtifactDownloadResponse::Pending(poem_openapi::payload::Json(ArtifactStatusDto {
                    status: "failed".to_string(),
                    message: Some(message),
                }))
            }
            Err(e) => ArtifactDownloadResponse::NotFound(poem_openapi::payload::Json(
                crate::api::models::ErrorDto::from(e.to_string()),
            )),
        }
    }
}

#[OpenApi]
impl ArtifactsApi {
    #[oai(path = "/api/books/:book_uuid/epub", method = "post")]
    async fn build_epub(&self, book_uuid: Path<Uuid>) -> ArtifactStatusResponse {
        self.status(book_uuid.0, ArtifactKind::Epub).await
    }

    #[oai(path = "/api/books/:book_uuid/epub/status", method = "get")]
    async fn epub_status(&self, book_uuid: Path<Uuid>) -> ArtifactStatusResponse {
        self.status(book_uuid.0, ArtifactKind::Epub).await
    }

    #[oai(path = "/api/books/:book_uuid/epub/download", method = "get")]
    async fn epub_download(&self, book_uuid: Path<Uuid>) -> ArtifactDownloadResponse {
        self.download(book_uuid.0, ArtifactKind::Epub).await
    }

    #[oai(path = "/api/books/:book_uuid/txt", method = "post")]
    async fn build_txt(&self, book_uuid: Path<Uuid>) -> ArtifactStatusResponse {
        self.status(book_uuid.0, ArtifactKind::Txt).await
    }

    #[oai(path = "/api/books/:book_uuid/txt/status", method = "get")]
    async fn txt_status(&self, book_uuid: Path<Uuid>) -> ArtifactStatusResponse {
        self.status(book_uuid.0, ArtifactKind::Txt).await
    }

    #[oai(path = "/api/books/:book_uuid/txt/download", method = "get")]
    async fn txt_download(&self, book_uuid: Path<Uuid>) -> ArtifactDownloadResponse {
        self.download(book_uuid.0, ArtifactKind::Txt).await
    }
}
