//! Background artifact builder. A repeated request for the same book/kind
//! while a build is in flight reuses the in-progress build instead of
//! queuing another one; a request for a stale artifact (chapter count grew
//! since the last build) triggers a rebuild.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::{epub, txt, ArtifactKind};
use crate::catalog;
use crate::domain::Book;
use crate::error::ArtifactError;
use crate::storage::BlobStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Pending,
    Ready,
    Failed,
}

/// What `ensure_cached` found: either the artifact is ready at `path`, or a
/// build was just started (or was already running) and the caller should
/// poll again.
pub enum ArtifactRequest {
    Ready(PathBuf),
    Pending,
    Failed(String),
}

pub struct ArtifactManager {
    db: DatabaseConnection,
    store: BlobStore,
    epub_language: String,
    epub_publisher: String,
    status: DashMap<(Uuid, ArtifactKind), (ArtifactStatus, usize, Option<String>)>,
}

impl ArtifactManager {
    pub fn new(db: DatabaseConnection, store: BlobStore, epub_language: String, epub_publisher: String) -> Self {
        ArtifactManager {
            db,
            store,
            epub_language,
            epub_publisher,
            status: DashMap::new(),
        }
    }

    fn path_for(&self, book: &Book, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::Epub => self.store.epub_path(&book.title, book.book_uuid),
            ArtifactKind::Txt => self.store.txt_path(&book.title, book.book_uuid),
        }
    }

    /// Returns the current artifact path if it's built from the book's present
    /// completed-chapter count, otherwise kicks off a background rebuild
    /// (coalescing with any rebuild already in flight) and reports `Pending`.
    pub async fn ensure_cached(self: &Arc<Self>, book_uuid: Uuid, kind: ArtifactKind) -> Result<ArtifactRequest, ArtifactError> {
        let book = catalog::book::get(&self.db, book_uuid).await?;
        let current_count = catalog::chapter::completed_ordered(&self.db, book_uuid).await?.len();
        let path = self.path_for(&book, kind);
        let key = (book_uuid, kind);

        if let Some(entry) = self.status.get(&key) {
            match &*entry {
                (ArtifactStatus::Ready, built_count, _) if *built_count == current_count && self.store.artifact_exists(&path).await => {
                    return Ok(ArtifactRequest::Ready(path));
                }
                (ArtifactStatus::Pending, _, _) => return Ok(ArtifactRequest::Pending),
                (ArtifactStatus::Failed, built_count, message) if *built_count == current_count => {
                    return Ok(ArtifactRequest::Failed(message.clone().unwrap_or_default()));
                }
                _ => {}
            }
        }

        let mut should_spawn = false;
        self.status
            .entry(key)
            .and_modify(|entry| {
                if entry.0 != ArtifactStatus::Pending {
                    *entry = (ArtifactStatus::Pending, current_count, None);
                    should_spawn = true;
                }
            })
            .or_insert_with(|| {
                should_spawn = true;
                (ArtifactStatus::Pending, current_count, None)
            });

        if should_spawn {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                manager.rebuild(book_uuid, kind, current_count).await;
            });
        }
        Ok(ArtifactRequest::Pending)
    }

    async fn rebuild(self: Arc<Self>, book_uuid: Uuid, kind: ArtifactKind, expected_count: usize) {
        match self.build(book_uuid, kind).await {
            Ok(built_count) => {
                self.status.insert((book_uuid, kind), (ArtifactStatus::Ready, built_count, None));
            }
            Err(e) => {
                tracing::warn!(error = %e, book_uuid = %book_uuid, kind = kind.as_str(), "artifact build failed");
                self.status
                    .insert((book_uuid, kind), (ArtifactStatus::Failed, expected_count, Some(e.to_string())));
            }
        }
    }

    async fn build(&self, book_uuid: Uuid, kind: ArtifactKind) -> Result<usize, ArtifactError> {
        let book = catalog::book::get(&self.db, book_uuid).await?;
        let chapters = catalog::chapter::completed_ordered(&self.db, book_uuid).await?;
        let bytes = match kind {
            ArtifactKind::Epub => epub::build_epub(&self.store, &book, &chapters, &self.epub_language, &self.epub_publisher).await?,
            ArtifactKind::Txt => txt::build_txt(&self.store, &book, &chapters).await?,
        };
        let path = self.path_for(&book, kind);
        self.store.write_artifact(&path, &bytes).await.map_err(ArtifactError::Blob)?;
        Ok(chapters.len())
    }

    /// Invalidates a cached artifact so the next `ensure_cached` call rebuilds
    /// it, used after a chapter range is re-downloaded.
    pub fn invalidate(&self, book_uuid: Uuid, kind: ArtifactKind) {
        self.status.remove(&(book_uuid, kind));
    }
}
