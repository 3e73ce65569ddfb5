//! Filesystem-backed blob store for chapter bodies, covers, and generated artifacts.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Replaces characters that are invalid across common filesystems, trims
/// leading/trailing dots and spaces, and caps length at 100 codepoints.
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| {
            if "<>:\"/\\|?*".contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned = cleaned.trim_matches(|c: char| c == '.' || c == ' ').to_string();
    if cleaned.chars().count() > 100 {
        cleaned = cleaned.chars().take(100).collect();
    }
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BlobStore { root: root.into() }
    }

    fn book_dir(&self, book_uuid: Uuid) -> PathBuf {
        self.root.join("books").join(book_uuid.to_string())
    }

    fn chapters_dir(&self, book_uuid: Uuid) -> PathBuf {
        self.book_dir(book_uuid).join("chapters")
    }

    pub fn chapter_path(&self, book_uuid: Uuid, chapter_index: i32) -> PathBuf {
        self.chapters_dir(book_uuid)
            .join(format!("{:04}.txt", chapter_index))
    }

    pub fn cover_path(&self, book_uuid: Uuid) -> PathBuf {
        self.book_dir(book_uuid).join("cover.jpg")
    }

    pub fn epub_path(&self, title: &str, book_uuid: Uuid) -> PathBuf {
        let short = &book_uuid.to_string()[..8];
        self.root
            .join("epubs")
            .join(format!("{}_{}.epub", sanitize_filename(title), short))
    }

    pub fn txt_path(&self, title: &str, book_uuid: Uuid) -> PathBuf {
        let short = &book_uuid.to_string()[..8];
        self.root
            .join("txts")
            .join(format!("{}_{}.txt", sanitize_filename(title), short))
    }

    /// Writes a chapter body and returns its store-relative path (the `content_ref`).
    pub async fn write_chapter(
        &self,
        book_uuid: Uuid,
        chapter_index: i32,
        text: &str,
    ) -> anyhow::Result<String> {
        let path = self.chapter_path(book_uuid, chapter_index);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(self.relative(&path))
    }

    /// Reads a chapter body by its stored `content_ref`. Returns `Ok(None)` if the
    /// blob is missing, signalling the caller to re-fetch rather than erroring.
    pub async fn read_chapter(&self, content_ref: &str) -> anyhow::Result<Option<String>> {
        let path = self.root.join(content_ref);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write_cover(&self, book_uuid: Uuid, bytes: &[u8]) -> anyhow::Result<String> {
        let path = self.cover_path(book_uuid);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(self.relative(&path))
    }

    pub async fn read_cover(&self, book_uuid: Uuid) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.cover_path(book_uuid);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write_artifact(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    pub async fn artifact_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    /// Removes the book's entire directory subtree (chapters + cover).
    pub async fn delete_book(&self, book_uuid: Uuid) -> anyhow::Result<()> {
        let dir = self.book_dir(book_uuid);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_artifact(&self, path: &Path) -> anyhow::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a/b:c*d"), "a_b_c_d");
    }

    #[test]
    fn sanitize_trims_dots_and_spaces() {
        assert_eq!(sanitize_filename("  ..hello..  "), "hello");
    }

    #[test]
    fn sanitize_falls_back_to_untitled() {
        assert_eq!(sanitize_filename("..."), "untitled");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(150);
        assert_eq!(sanitize_filename(&long).chars().count(), 100);
    }

    #[tokio::test]
    async fn write_then_read_chapter_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let book = Uuid::new_v4();
        let content_ref = store.write_chapter(book, 3, "hello world").await.unwrap();
        let read_back = store.read_chapter(&content_ref).await.unwrap();
        assert_eq!(read_back.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn read_missing_chapter_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let missing = store.read_chapter("books/does-not-exist/chapters/0000.txt").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_book_removes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let book = Uuid::new_v4();
        store.write_chapter(book, 0, "x").await.unwrap();
        store.delete_book(book).await.unwrap();
        assert!(store.read_chapter(&store.chapter_path(book, 0).to_string_lossy()).await.unwrap().is_none());
    }
}
