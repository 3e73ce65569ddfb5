//! EPUB assembly via `epub-builder`, following the flat content-list + per-item
//! title/reftype pattern used for chaptered fiction exports. Volumes are not
//! nested in the crate's own nav tree (its `EpubContent` only takes a single
//! title); instead a divider page is inserted ahead of each volume's first
//! chapter, giving the generated nav a volume heading followed by its chapters
//! in reading order.

use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};

use crate::domain::{Book, Chapter};
use crate::error::ArtifactError;
use crate::html::to_paragraphs;
use crate::storage::BlobStore;

fn epub_err(e: impl std::fmt::Display) -> ArtifactError {
    ArtifactError::Epub(e.to_string())
}

pub async fn build_epub(
    store: &BlobStore,
    book: &Book,
    chapters: &[Chapter],
    language: &str,
    generator: &str,
) -> Result<Vec<u8>, ArtifactError> {
    if chapters.is_empty() {
        return Err(ArtifactError::NoContent);
    }

    let zip = ZipLibrary::new().map_err(epub_err)?;
    let mut builder = EpubBuilder::new(zip).map_err(epub_err)?;

    builder
        .set_title(&book.title)
        .set_authors(vec![book.author.clone().unwrap_or_else(|| "佚名".to_string())])
        .set_lang(language)
        .inline_toc();
    if let Some(abstract_text) = &book.abstract_text {
        builder.add_description(abstract_text);
    }
    builder.metadata("generator", generator).map_err(epub_err)?;
    builder.metadata("source", format!("{}:{}", book.provider, book.provider_book_id)).map_err(epub_err)?;

    if let Some(cover) = store.read_cover(book.book_uuid).await.map_err(ArtifactError::Blob)? {
        builder.add_cover_image("cover.jpg", cover.as_slice(), "image/jpeg").map_err(epub_err)?;
    }

    builder.stylesheet(DEFAULT_CSS.as_bytes()).map_err(epub_err)?;

    let mut current_volume: Option<&str> = None;
    for chapter in chapters {
        if chapter.volume_name.as_deref() != current_volume {
            current_volume = chapter.volume_name.as_deref();
            if let Some(volume_name) = current_volume {
                let page = format!("volume_{:04}.xhtml", chapter.chapter_index);
                let xhtml = volume_divider_xhtml(volume_name);
                builder
                    .add_content(
                        EpubContent::new(page, xhtml.as_bytes())
                            .title(volume_name)
                            .reftype(ReferenceType::Text),
                    )
                    .map_err(epub_err)?;
            }
        }

        let body = chapter
            .content_ref
            .as_deref()
            .map(|content_ref| store.read_chapter(content_ref))
            .ok_or_else(|| ArtifactError::Epub(format!("chapter {} has no content_ref", chapter.chapter_uuid)))?
            .await
            .map_err(ArtifactError::Blob)?
            .unwrap_or_default();

        let page = format!("chapter_{:04}.xhtml", chapter.chapter_index);
        let xhtml = chapter_xhtml(&chapter.title, &body);
        builder
            .add_content(
                EpubContent::new(page, xhtml.as_bytes())
                    .title(&chapter.title)
                    .reftype(ReferenceType::Text),
            )
            .map_err(epub_err)?;
    }

    let mut out = Vec::new();
    builder.generate(&mut out).map_err(epub_err)?;
    Ok(out)
}

const DEFAULT_CSS: &str = r#"
body { font-family: serif; line-height: 1.6; margin: 1em; }
h1 { font-size: 1.4em; text-align: center; margin-bottom: 1em; }
p { margin: 0 0 0.8em 0; text-indent: 2em; }
"#;

fn volume_divider_xhtml(volume_name: &str) -> String {
    let title = html_escape::encode_text(volume_name);
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head><title>{title}</title></head>\n\
         <body><h1>{title}</h1></body>\n\
         </html>"
    )
}

fn chapter_xhtml(title: &str, body: &str) -> String {
    let title = html_escape::encode_text(title);
    let paragraphs = to_paragraphs(body);
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{paragraphs}\n</body>\n\
         </html>"
    )
}
