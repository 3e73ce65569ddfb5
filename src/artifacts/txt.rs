//! Plain-text artifact assembly: chapter titles and volume separators with no
//! markup, concatenated in reading order.

use crate::domain::{Book, Chapter};
use crate::error::ArtifactError;
use crate::storage::BlobStore;

pub async fn build_txt(store: &BlobStore, _book: &Book, chapters: &[Chapter]) -> Result<Vec<u8>, ArtifactError> {
    if chapters.is_empty() {
        return Err(ArtifactError::NoContent);
    }

    let mut out = String::new();
    let mut current_volume: Option<&str> = None;
    for chapter in chapters {
        if chapter.volume_name.as_deref() != current_volume {
            current_volume = chapter.volume_name.as_deref();
            if let Some(volume_name) = current_volume {
                out.push_str("\n\n");
                out.push_str(volume_name);
                out.push_str("\n\n");
            }
        }

        out.push_str(&chapter.title);
        out.push('\n');
        let body = match &chapter.content_ref {
            Some(content_ref) => store.read_chapter(content_ref).await.map_err(ArtifactError::Blob)?.unwrap_or_default(),
            None => String::new(),
        };
        out.push_str(&body);
        out.push_str("\n\n");
    }
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn book() -> Book {
        Book {
            book_uuid: Uuid::new_v4(),
            provider: "fanqie".to_string(),
            provider_book_id: "1".to_string(),
            title: "Sample".to_string(),
            author: None,
            cover_path: None,
            abstract_text: None,
            status_text: None,
            total_chapters: 0,
            downloaded_chapters: 0,
            download_status: "completed".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn chapter(book_uuid: Uuid, index: i32, volume_name: Option<&str>, content_ref: Option<String>) -> Chapter {
        Chapter {
            chapter_uuid: Uuid::new_v4(),
            book_uuid,
            item_id: index.to_string(),
            chapter_index: index,
            title: format!("Chapter {index}"),
            volume_name: volume_name.map(str::to_string),
            word_count: 10,
            download_status: "completed".to_string(),
            content_ref,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_chapter_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let err = build_txt(&store, &book(), &[]).await.unwrap_err();
        assert!(matches!(err, ArtifactError::NoContent));
    }

    #[tokio::test]
    async fn volume_names_are_inserted_as_separators() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let b = book();
        let ref1 = store.write_chapter(b.book_uuid, 0, "first body").await.unwrap();
        let ref2 = store.write_chapter(b.book_uuid, 1, "second body").await.unwrap();
        let chapters = vec![
            chapter(b.book_uuid, 0, Some("Volume One"), Some(ref1)),
            chapter(b.book_uuid, 1, Some("Volume One"), Some(ref2)),
        ];

        let bytes = build_txt(&store, &b, &chapters).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.matches("Volume One").count(), 1);
        assert!(text.contains("first body"));
        assert!(text.contains("second body"));
    }

    #[tokio::test]
    async fn missing_blob_renders_as_empty_body_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let b = book();
        let chapters = vec![chapter(b.book_uuid, 0, None, Some("books/missing.txt".to_string()))];
        let bytes = build_txt(&store, &b, &chapters).await.unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("Chapter 0"));
    }
}
