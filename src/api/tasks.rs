//! Task lifecycle: creating download/update tasks, listing and inspecting
//! them, cancellation, retry-failed, and the provider quota dashboard.
//! Execution always runs in the background; the HTTP response only reflects
//! task creation, not completion.

use std::sync::Arc;

use poem_openapi::param::{Path, Query};
use poem_openapi::OpenApi;
use uuid::Uuid;

use crate::api::models::{ErrorDto, QuotaDto, QuotaResponse, TaskDto, TaskListResponse, TaskResponse};
use crate::api::AppState;
use crate::domain::{Provider, TaskType};
use crate::error::EngineError;

pub struct TasksApi {
    pub state: Arc<AppState>,
}

impl TasksApi {
    fn spawn_execution(&self, task_uuid: Uuid) {
        let engine = Arc::clone(&self.state.engine);
        tokio::spawn(async move {
            if let Err(e) = engine.execute_task(task_uuid).await {
                tracing::warn!(error = %e, %task_uuid, "task execution failed");
            }
        });
    }

    fn task_error_response(e: EngineError) -> TaskResponse {
        match e {
            EngineError::QuotaExhausted(provider, remaining) => {
                TaskResponse::QuotaExhausted(poem_openapi::payload::Json(ErrorDto::from(format!(
                    "daily quota exhausted for {provider}, {remaining} words remaining"
                ))))
            }
            EngineError::BookBusy => TaskResponse::Conflict(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
            EngineError::Catalog(_) => TaskResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from(e.to_string()))),
            other => TaskResponse::Conflict(poem_openapi::payload::Json(ErrorDto::from(other.to_string()))),
        }
    }
}

#[OpenApi]
impl TasksApi {
    #[oai(path = "/api/tasks/:book_uuid/download", method = "post")]
    async fn create_download_task(
        &self,
        book_uuid: Path<Uuid>,
        Query(start_chapter): Query<Option<i32>>,
        Query(end_chapter): Query<Option<i32>>,
        Query(skip_completed): Query<Option<bool>>,
    ) -> TaskResponse {
        match self
            .state
            .engine
            .create_task(book_uuid.0, TaskType::FullDownload, start_chapter, end_chapter, skip_completed.unwrap_or(true))
            .await
        {
            Ok(task) => {
                if task.status == "pending" {
                    self.spawn_execution(task.task_uuid);
                }
                TaskResponse::Ok(poem_openapi::payload::Json(TaskDto::from(task)))
            }
            Err(e) => Self::task_error_response(e),
        }
    }

    #[oai(path = "/api/tasks/:book_uuid/update", method = "post")]
    async fn create_update_task(&self, book_uuid: Path<Uuid>) -> TaskResponse {
        match self.state.engine.create_task(book_uuid.0, TaskType::Update, None, None, false).await {
            Ok(task) => {
                if task.status == "pending" {
                    self.spawn_execution(task.task_uuid);
                }
                TaskResponse::Ok(poem_openapi::payload::Json(TaskDto::from(task)))
            }
            Err(e) => Self::task_error_response(e),
        }
    }

    #[oai(path = "/api/tasks", method = "get")]
    async fn list(&self, Query(book_uuid): Query<Option<Uuid>>) -> TaskListResponse {
        let Some(book_uuid) = book_uuid else {
            return TaskListResponse::Ok(poem_openapi::payload::Json(Vec::new()));
        };
        let tasks = crate::catalog::task::list_for_book(&self.state.db, book_uuid).await.unwrap_or_default();
        TaskListResponse::Ok(poem_openapi::payload::Json(tasks.into_iter().map(TaskDto::from).collect()))
    }

    #[oai(path = "/api/tasks/:task_uuid", method = "get")]
    async fn get(&self, task_uuid: Path<Uuid>) -> TaskResponse {
        match crate::catalog::task::get(&self.state.db, task_uuid.0).await {
            Ok(task) => TaskResponse::Ok(poem_openapi::payload::Json(TaskDto::from(task))),
            Err(_) => TaskResponse::NotFound(poem_openapi::payload::Json(ErrorDto::from("task not found"))),
        }
    }

    #[oai(path = "/api/tasks/:task_uuid/cancel", method = "post")]
    async fn cancel(&self, task_uuid: Path<Uuid>) -> TaskResponse {
        match self.state.engine.cancel_task(task_uuid.0).await {
            Ok(task) => TaskResponse::Ok(poem_openapi::payload::Json(TaskDto::from(task))),
            Err(e) => Self::task_error_response(e),
        }
    }

    #[oai(path = "/api/tasks/:book_uuid/retry", method = "post")]
    async fn retry(&self, book_uuid: Path<Uuid>) -> TaskResponse {
        match self.state.engine.retry_failed(book_uuid.0).await {
            Ok(task) => {
                if task.status == "pending" {
                    self.spawn_execution(task.task_uuid);
                }
                TaskResponse::Ok(poem_openapi::payload::Json(TaskDto::from(task)))
            }
            Err(e) => Self::task_error_response(e),
        }
    }

    #[oai(path = "/api/tasks/quota", method = "get")]
    async fn quota_all(&self) -> QuotaResponse {
        self.quota_for(None).await
    }

    #[oai(path = "/api/tasks/quota/:provider", method = "get")]
    async fn quota_one(&self, provider: Path<String>) -> QuotaResponse {
        self.quota_for(Some(provider.0)).await
    }
}

impl TasksApi {
    async fn quota_for(&self, provider: Option<String>) -> QuotaResponse {
        let providers: Vec<Provider> = match provider {
            Some(p) => p.parse().ok().into_iter().collect(),
            None => vec![Provider::Fanqie, Provider::Qimao, Provider::Biquge],
        };
        let mut entries = Vec::with_capacity(providers.len());
        for provider in providers {
            if let Ok(usage) = self.state.quota.get_usage(provider).await {
                entries.push(QuotaDto {
                    provider: usage.provider,
                    downloaded: usage.downloaded,
                    limit: usage.limit,
                    remaining: usage.remaining,
                    percentage: usage.percentage,
                });
            }
        }
        QuotaResponse::Ok(poem_openapi::payload::Json(entries))
    }
}
