pub mod models;

pub use models::{
    Book, BookDownloadStatus, Bookmark, Chapter, ChapterStatus, HistoryEntry, Progress, Provider,
    QuotaUsage, Task, TaskStatus, TaskType, User,
};
