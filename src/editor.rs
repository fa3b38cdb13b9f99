//! Rich-text editor adapter.
//!
//! The document is opaque HTML produced by whatever editor the front end
//! embeds. The adapter only needs to know whether it is blank, how to show a
//! short preview, and whether user edits are currently allowed.

use crate::error::ClientError;

/// Tags that separate words when markup is stripped.
const BLOCK_TAGS: &[&str] = &["p", "br", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "tr", "td"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    html: String,
}

impl Document {
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Visible text with tags removed, entities decoded and whitespace
    /// collapsed.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let stripped = strip_tags(&self.html);
        let decoded = decode_entities(&stripped);
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// `true` for empty input and for markup with no visible text, such as
    /// `<p><br></p>`.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.html.trim().is_empty() || self.plain_text().is_empty()
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }

    /// First `max_chars` characters of the plain text, with an ellipsis when
    /// truncated.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let text = self.plain_text();
        if text.chars().count() <= max_chars {
            return text;
        }
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.truncate(cut.trim_end().len());
        cut.push_str("...");
        cut
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars();
    while let Some(c) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }
        let mut tag = String::new();
        for inner in chars.by_ref() {
            if inner == '>' {
                break;
            }
            tag.push(inner);
        }
        let name = tag
            .trim_start_matches('/')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if BLOCK_TAGS.contains(&name.as_str()) {
            out.push(' ');
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Editor state: the document plus the read-only flag.
#[derive(Clone, Debug, Default)]
pub struct Editor {
    doc: Document,
    read_only: bool,
    revision: u64,
}

impl Editor {
    #[must_use]
    pub fn new(html: impl Into<String>, read_only: bool) -> Self {
        Self { doc: Document::new(html), read_only, revision: 0 }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn html(&self) -> &str {
        self.doc.html()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Count of accepted user edits.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply a user edit.
    ///
    /// # Errors
    ///
    /// [`ClientError::ReadOnly`] while the editor is read-only.
    pub fn replace(&mut self, html: impl Into<String>) -> Result<u64, ClientError> {
        if self.read_only {
            return Err(ClientError::ReadOnly);
        }
        self.doc = Document::new(html);
        self.revision += 1;
        Ok(self.revision)
    }

    /// Load content from the server. Not a user edit, so the read-only flag
    /// does not apply and the revision is unchanged.
    pub fn load(&mut self, html: impl Into<String>) {
        self.doc = Document::new(html);
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
