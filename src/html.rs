//! Plain-text-to-XHTML paragraph formatting shared by the reader's on-demand
//! chapter view and the EPUB artifact builder.

/// Each non-empty line becomes `<p>escaped</p>`; empty lines become `<p>&nbsp;</p>`.
pub fn to_paragraphs(body: &str) -> String {
    body.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                "<p>&nbsp;</p>".to_string()
            } else {
                format!("<p>{}</p>", html_escape::encode_text(trimmed))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_become_nbsp_paragraphs() {
        let html = to_paragraphs("hello\n\nworld");
        assert_eq!(html, "<p>hello</p>\n<p>&nbsp;</p>\n<p>world</p>");
    }

    #[test]
    fn escapes_html_special_characters() {
        let html = to_paragraphs("A & B < C");
        assert_eq!(html, "<p>A &amp; B &lt; C</p>");
    }
}
