//! Plain domain types shared across the catalog, engine, and reader layers.
//!
//! These are deliberately decoupled from the sea-orm entity structs in `entities`;
//! repository functions translate between the two at the storage boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Fanqie,
    Qimao,
    Biquge,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Fanqie => "fanqie",
            Provider::Qimao => "qimao",
            Provider::Biquge => "biquge",
        }
    }

    pub fn is_unmetered(&self) -> bool {
        matches!(self, Provider::Biquge)
    }
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fanqie" => Ok(Provider::Fanqie),
            "qimao" => Ok(Provider::Qimao),
            "biquge" => Ok(Provider::Biquge),
            other => Err(anyhow::anyhow!("unknown provider: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookDownloadStatus {
    Pending,
    Downloading,
    Partial,
    Completed,
    Failed,
}

impl BookDownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookDownloadStatus::Pending => "pending",
            BookDownloadStatus::Downloading => "downloading",
            BookDownloadStatus::Partial => "partial",
            BookDownloadStatus::Completed => "completed",
            BookDownloadStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for BookDownloadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "downloading" => Ok(Self::Downloading),
            "partial" => Ok(Self::Partial),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(anyhow::anyhow!("unknown book download status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStatus::Pending => "pending",
            ChapterStatus::Downloading => "downloading",
            ChapterStatus::Completed => "completed",
            ChapterStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ChapterStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "downloading" => Ok(Self::Downloading),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(anyhow::anyhow!("unknown chapter status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    FullDownload,
    Update,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::FullDownload => "full_download",
            TaskType::Update => "update",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_download" => Ok(Self::FullDownload),
            "update" => Ok(Self::Update),
            other => Err(anyhow::anyhow!("unknown task type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(anyhow::anyhow!("unknown task status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub book_uuid: Uuid,
    pub provider: String,
    pub provider_book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub cover_path: Option<String>,
    pub abstract_text: Option<String>,
    pub status_text: Option<String>,
    pub total_chapters: i32,
    pub downloaded_chapters: i32,
    pub download_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_uuid: Uuid,
    pub book_uuid: Uuid,
    pub item_id: String,
    pub chapter_index: i32,
    pub title: String,
    pub volume_name: Option<String>,
    pub word_count: i32,
    pub download_status: String,
    pub content_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_uuid: Uuid,
    pub book_uuid: Uuid,
    pub task_type: String,
    pub status: String,
    pub total: i32,
    pub downloaded: i32,
    pub failed: i32,
    pub start_chapter: Option<i32>,
    pub end_chapter: Option<i32>,
    pub skip_completed: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn progress_percent(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        let done = (self.downloaded + self.failed) as f64;
        ((done / self.total as f64) * 10000.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub date: chrono::NaiveDate,
    pub provider: String,
    pub downloaded: i64,
    pub limit: i64,
    pub remaining: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: Uuid,
    pub user_uuid: Uuid,
    pub book_uuid: Uuid,
    pub chapter_uuid: Uuid,
    pub device_id: String,
    pub offset_px: i32,
    pub percent: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub bookmark_uuid: Uuid,
    pub user_uuid: Uuid,
    pub book_uuid: Uuid,
    pub chapter_uuid: Uuid,
    pub percent: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_uuid: Uuid,
    pub book_uuid: Uuid,
    pub chapter_uuid: Uuid,
    pub percent: f64,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_uuid: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biquge_is_the_only_unmetered_provider() {
        assert!(Provider::Biquge.is_unmetered());
        assert!(!Provider::Fanqie.is_unmetered());
        assert!(!Provider::Qimao.is_unmetered());
    }

    #[test]
    fn provider_str_round_trips() {
        for p in [Provider::Fanqie, Provider::Qimao, Provider::Biquge] {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert!("unknown".parse::<Provider>().is_err());
    }

    #[test]
    fn task_status_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    fn task_with(total: i32, downloaded: i32, failed: i32) -> Task {
        Task {
            task_uuid: Uuid::nil(),
            book_uuid: Uuid::nil(),
            task_type: "full_download".to_string(),
            status: "running".to_string(),
            total,
            downloaded,
            failed,
            start_chapter: None,
            end_chapter: None,
            skip_completed: true,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn progress_percent_rounds_to_two_decimals() {
        let task = task_with(3, 1, 0);
        assert_eq!(task.progress_percent(), 33.33);
    }

    #[test]
    fn progress_percent_counts_failed_as_done() {
        let task = task_with(10, 3, 2);
        assert_eq!(task.progress_percent(), 50.0);
    }

    #[test]
    fn progress_percent_zero_total_is_zero_not_nan() {
        let task = task_with(0, 0, 0);
        assert_eq!(task.progress_percent(), 0.0);
    }
}
