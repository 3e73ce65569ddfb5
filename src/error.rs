//! Shared error taxonomy. Source-client and quota errors are typed so the
//! download engine can branch on retryability; everything above that
//! boundary collapses into `anyhow` context the way the rest of the
//! service already does.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
    #[error("rate limited, retry after {retry_after:?}s")]
    RateLimit { retry_after: Option<u64> },
    #[error("daily quota exceeded for provider {0}")]
    QuotaExceeded(String),
    #[error("book not found upstream")]
    BookNotFound,
    #[error("chapter not found upstream")]
    ChapterNotFound,
    #[error("chapter is audio-only, text content unavailable")]
    AudioOnly,
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Network(_) | SourceError::InvalidResponse(_) | SourceError::RateLimit { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("daily word quota exceeded for provider {provider}, remaining {remaining}")]
    Exhausted { provider: String, remaining: i64 },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("book not found: {0}")]
    BookNotFound(uuid::Uuid),
    #[error("chapter not found: {0}")]
    ChapterNotFound(uuid::Uuid),
    #[error("task not found: {0}")]
    TaskNotFound(uuid::Uuid),
    #[error("book already exists for provider {provider}/{provider_book_id}")]
    DuplicateBook {
        provider: String,
        provider_book_id: String,
    },
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a task is already running for this book")]
    BookBusy,
    #[error("no source client configured for provider {0}")]
    UnknownProvider(String),
    #[error("daily quota exhausted for provider {0}, {1} words remaining")]
    QuotaExhausted(String, i64),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("book has no completed chapters to assemble")]
    NoContent,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("epub assembly failed: {0}")]
    Epub(String),
    #[error(transparent)]
    Blob(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_source_errors_are_retryable() {
        assert!(SourceError::Network("timeout".into()).is_retryable());
        assert!(SourceError::InvalidResponse("bad json".into()).is_retryable());
        assert!(SourceError::RateLimit { retry_after: Some(5) }.is_retryable());
        assert!(!SourceError::BookNotFound.is_retryable());
        assert!(!SourceError::ChapterNotFound.is_retryable());
        assert!(!SourceError::AudioOnly.is_retryable());
        assert!(!SourceError::QuotaExceeded("fanqie".into()).is_retryable());
    }

    #[test]
    fn engine_error_wraps_catalog_and_source_errors() {
        let catalog_err: EngineError = CatalogError::BookNotFound(uuid::Uuid::nil()).into();
        assert!(matches!(catalog_err, EngineError::Catalog(_)));

        let source_err: EngineError = SourceError::BookNotFound.into();
        assert!(matches!(source_err, EngineError::Source(_)));
    }
}
