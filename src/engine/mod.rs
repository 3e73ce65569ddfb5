//! The download engine: task scheduling, bounded concurrent chapter fetches,
//! cancellation, and the single-chapter retry path used by the reader.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use sea_orm::DatabaseConnection;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::catalog::chapter::RangePolicy;
use crate::catalog::{self, task::NewTask};
use crate::domain::{Book, Chapter, Provider, Task, TaskStatus, TaskType};
use crate::error::{EngineError, SourceError};
use crate::progress_bus::{ProgressBus, ProgressEvent};
use crate::quota::QuotaLedger;
use crate::reader::sync as chapter_sync;
use crate::source_client::{ChapterContent, SourceClient};
use crate::storage::BlobStore;

enum ChapterOutcome {
    Completed,
    Failed,
}

pub struct DownloadEngine {
    db: DatabaseConnection,
    store: BlobStore,
    quota: QuotaLedger,
    bus: Arc<ProgressBus>,
    clients: HashMap<String, Arc<dyn SourceClient>>,
    cancelled: DashSet<Uuid>,
    running_by_book: DashMap<Uuid, Uuid>,
    concurrent_downloads: usize,
    download_delay: Duration,
}

impl DownloadEngine {
    pub fn new(
        db: DatabaseConnection,
        store: BlobStore,
        quota: QuotaLedger,
        bus: Arc<ProgressBus>,
        clients: HashMap<String, Arc<dyn SourceClient>>,
        concurrent_downloads: usize,
        download_delay: Duration,
    ) -> Self {
        DownloadEngine {
            db,
            store,
            quota,
            bus,
            clients,
            cancelled: DashSet::new(),
            running_by_book: DashMap::new(),
            concurrent_downloads: concurrent_downloads.max(1),
            download_delay,
        }
    }

    fn client_for(&self, provider: &str) -> Result<Arc<dyn SourceClient>, EngineError> {
        self.clients
            .get(provider)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProvider(provider.to_string()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        book_uuid: Uuid,
        task_type: TaskType,
        start_chapter: Option<i32>,
        end_chapter: Option<i32>,
        skip_completed: bool,
    ) -> Result<Task, EngineError> {
        let policy = range_policy(task_type, skip_completed);
        let chapters =
            catalog::chapter::chapters_in_range(&self.db, book_uuid, start_chapter, end_chapter, &policy)
                .await?;
        let total = chapters.len() as i32;

        let task = catalog::task::create(
            &self.db,
            NewTask {
                book_uuid,
                task_type: task_type.as_str().to_string(),
                total,
                start_chapter,
                end_chapter,
                skip_completed,
            },
        )
        .await?;

        if total == 0 {
            let task = catalog::task::finish(&self.db, task.task_uuid, "completed", None).await?;
            return Ok(task);
        }
        Ok(task)
    }

    /// Runs a pending task to completion. Only one execution per book is
    /// allowed at a time; a second call for the same book fails fast.
    pub async fn execute_task(self: &Arc<Self>, task_uuid: Uuid) -> Result<(), EngineError> {
        let task = catalog::task::get(&self.db, task_uuid).await?;
        let book = catalog::book::get(&self.db, task.book_uuid).await?;
        let book_uuid = book.book_uuid;

        match self.running_by_book.entry(book_uuid) {
            Entry::Occupied(_) => return Err(EngineError::BookBusy),
            Entry::Vacant(slot) => {
                slot.insert(task_uuid);
            }
        }
        let result = self.run_task(task, book).await;
        self.running_by_book.remove(&book_uuid);
        result
    }

    async fn run_task(self: &Arc<Self>, task: Task, book: Book) -> Result<(), EngineError> {
        let provider: Provider = book.provider.parse()?;
        let task_type: TaskType = task.task_type.parse()?;
        let client = self.client_for(&book.provider)?;

        if matches!(task_type, TaskType::FullDownload) && !task.skip_completed {
            catalog::chapter::reset_completed_in_range(
                &self.db,
                book.book_uuid,
                task.start_chapter,
                task.end_chapter,
            )
            .await?;
        }

        catalog::book::set_download_status(&self.db, book.book_uuid, "downloading").await?;

        if matches!(task_type, TaskType::Update) {
            let fresh = chapter_sync::check_new_chapters(
                &self.db,
                &client,
                book.book_uuid,
                &book.provider_book_id,
            )
            .await?;
            chapter_sync::add_new_chapters(&self.db, book.book_uuid, fresh).await?;
        }

        // Re-evaluate the chapter set: the create-time total is advisory only.
        let policy = range_policy(task_type, task.skip_completed);
        let chapters = catalog::chapter::chapters_in_range(
            &self.db,
            book.book_uuid,
            task.start_chapter,
            task.end_chapter,
            &policy,
        )
        .await?;
        let total = chapters.len() as i32;
        catalog::task::start(&self.db, task.task_uuid, total).await?;

        if matches!(provider, Provider::Qimao) {
            client.begin_book(&book.provider_book_id).await?;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrent_downloads));
        let mut handles = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            if self.cancelled.contains(&task.task_uuid) {
                break;
            }
            let engine = Arc::clone(self);
            let client = Arc::clone(&client);
            let permit = Arc::clone(&semaphore);
            let task_uuid = task.task_uuid;
            let book_uuid = book.book_uuid;
            let book_title = book.title.clone();
            let delay = self.download_delay;
            handles.push(tokio::spawn(async move {
                let _permit = permit
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed while its owning task runs");
                if engine.cancelled.contains(&task_uuid) {
                    return;
                }
                engine
                    .run_chapter_step(task_uuid, book_uuid, &book_title, provider, &client, &chapter)
                    .await;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }

        self.finish_task(task.task_uuid, book.book_uuid, &book.title).await
    }

    async fn run_chapter_step(
        &self,
        task_uuid: Uuid,
        book_uuid: Uuid,
        book_title: &str,
        provider: Provider,
        client: &Arc<dyn SourceClient>,
        chapter: &Chapter,
    ) {
        let outcome = self.fetch_and_store_chapter(provider, client, book_uuid, chapter).await;
        let (downloaded_delta, failed_delta) = match outcome {
            Ok(ChapterOutcome::Completed) => (1, 0),
            _ => (0, 1),
        };

        let updated = match catalog::task::record_progress(&self.db, task_uuid, downloaded_delta, failed_delta).await
        {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "failed to record task progress");
                return;
            }
        };
        self.bus.publish(
            task_uuid,
            ProgressEvent::progress(
                task_uuid,
                "running",
                updated.total,
                updated.downloaded,
                updated.failed,
                updated.progress_percent(),
                None,
                Some(book_title.to_string()),
            ),
        );
    }

    async fn finish_task(&self, task_uuid: Uuid, book_uuid: Uuid, book_title: &str) -> Result<(), EngineError> {
        let cancelled = self.cancelled.remove(&task_uuid).is_some();
        let final_task = catalog::task::get(&self.db, task_uuid).await?;
        let completed_count = catalog::book::recompute_downloaded_chapters(&self.db, book_uuid).await?;

        let (task_status, book_status, message) = if cancelled {
            let book_status = if completed_count > 0 { "partial" } else { "pending" };
            (TaskStatus::Cancelled, book_status, "任务已取消".to_string())
        } else if final_task.failed > 0 {
            (
                TaskStatus::Failed,
                "failed",
                format!("{}个章节下载失败", final_task.failed),
            )
        } else {
            (TaskStatus::Completed, "completed", "下载完成".to_string())
        };

        catalog::book::set_download_status(&self.db, book_uuid, book_status).await?;
        let error_message = matches!(task_status, TaskStatus::Failed).then(|| message.clone());
        catalog::task::finish(&self.db, task_uuid, task_status.as_str(), error_message).await?;

        self.bus.publish(
            task_uuid,
            ProgressEvent::completed(
                task_uuid,
                matches!(task_status, TaskStatus::Completed),
                message,
                Some(book_title.to_string()),
            ),
        );
        Ok(())
    }

    /// Adds `task_uuid` to the cancelled set (observed cooperatively between
    /// chapters by any running worker) and marks the task cancelled now.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_task(&self, task_uuid: Uuid) -> Result<Task, EngineError> {
        self.cancelled.insert(task_uuid);
        let task = catalog::task::cancel(&self.db, task_uuid).await?;
        Ok(task)
    }

    /// Resets every `failed` chapter of a book back to `pending` and creates
    /// a fresh `full_download` task over the updated set.
    pub async fn retry_failed(&self, book_uuid: Uuid) -> Result<Task, EngineError> {
        let failed = catalog::chapter::failed_chapters(&self.db, book_uuid).await?;
        for chapter in &failed {
            catalog::chapter::reset_to_pending(&self.db, chapter.chapter_uuid, false).await?;
        }
        self.create_task(book_uuid, TaskType::FullDownload, None, None, true).await
    }

    async fn fetch_chapter_body(
        &self,
        client: &Arc<dyn SourceClient>,
        item_id: &str,
    ) -> Result<(String, i32), EngineError> {
        match client.get_chapter_content(item_id).await? {
            ChapterContent::Text { content, word_count } => Ok((content, word_count)),
            ChapterContent::Audio => Err(EngineError::Source(SourceError::AudioOnly)),
        }
    }

    async fn fetch_and_store_chapter(
        &self,
        provider: Provider,
        client: &Arc<dyn SourceClient>,
        book_uuid: Uuid,
        chapter: &Chapter,
    ) -> Result<ChapterOutcome, EngineError> {
        if !self.quota.can_download(provider).await? {
            catalog::chapter::set_failed(&self.db, chapter.chapter_uuid).await?;
            return Ok(ChapterOutcome::Failed);
        }
        match self.fetch_chapter_body(client, &chapter.item_id).await {
            Ok((content, word_count)) => {
                let content_ref = self
                    .store
                    .write_chapter(book_uuid, chapter.chapter_index, &content)
                    .await?;
                catalog::chapter::set_completed(&self.db, chapter.chapter_uuid, &content_ref, word_count).await?;
                self.quota.record(provider, word_count as i64).await?;
                Ok(ChapterOutcome::Completed)
            }
            Err(_) => {
                catalog::chapter::set_failed(&self.db, chapter.chapter_uuid).await?;
                Ok(ChapterOutcome::Failed)
            }
        }
    }

    /// Single-chapter fetch used by the reader's fetch-on-demand path. Resets
    /// a `completed` chapter whose blob has gone missing before retrying.
    #[tracing::instrument(skip(self))]
    pub async fn download_chapter_with_retry(
        &self,
        book_uuid: Uuid,
        chapter_uuid: Uuid,
        retries: u32,
    ) -> Result<(), EngineError> {
        let chapter = catalog::chapter::get(&self.db, chapter_uuid).await?;
        let book = catalog::book::get(&self.db, book_uuid).await?;
        let provider: Provider = book.provider.parse()?;
        let client = self.client_for(&book.provider)?;

        if matches!(provider, Provider::Qimao) {
            client.begin_book(&book.provider_book_id).await?;
        }

        if chapter.download_status == "completed" {
            if let Some(content_ref) = chapter.content_ref.as_deref() {
                if self.store.read_chapter(content_ref).await?.is_some() {
                    return Ok(());
                }
            }
            catalog::chapter::reset_to_pending(&self.db, chapter_uuid, true).await?;
        }

        if !self.quota.can_download(provider).await? {
            let usage = self.quota.get_usage(provider).await?;
            return Err(EngineError::QuotaExhausted(provider.as_str().to_string(), usage.remaining));
        }

        let mut last_err = None;
        for _ in 0..retries.max(1) {
            match self.fetch_chapter_body(&client, &chapter.item_id).await {
                Ok((content, word_count)) => {
                    let content_ref = self
                        .store
                        .write_chapter(book_uuid, chapter.chapter_index, &content)
                        .await?;
                    catalog::chapter::set_completed(&self.db, chapter_uuid, &content_ref, word_count).await?;
                    self.quota.record(provider, word_count as i64).await?;
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }
        catalog::chapter::set_failed(&self.db, chapter_uuid).await?;
        Err(last_err.unwrap_or(EngineError::UnknownProvider(provider.as_str().to_string())))
    }
}

fn range_policy(task_type: TaskType, skip_completed: bool) -> RangePolicy {
    match task_type {
        TaskType::FullDownload => RangePolicy::FullDownload { skip_completed },
        TaskType::Update => RangePolicy::Update,
    }
}
