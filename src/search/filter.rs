use serde::{Deserialize, Serialize};

use crate::db::models::Document;
use crate::export::text::plain_text;

const PREVIEW_LEN: usize = 200;

/// A search result returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: String,
    pub title: String,
    /// First ~200 characters of content, stripped of markup.
    pub content_preview: String,
}

/// Keep the documents whose title or content contains `query`, ignoring case.
///
/// An empty (or all-whitespace) query matches nothing.
pub fn filter_documents<'a>(docs: &'a [Document], query: &str) -> Vec<&'a Document> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    docs.iter()
        .filter(|d| {
            d.title.to_lowercase().contains(&needle) || d.content.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Build a SearchHit from a matching document.
pub fn build_search_hit(doc: &Document) -> SearchHit {
    SearchHit {
        document_id: doc.document_id.clone(),
        title: doc.title.clone(),
        content_preview: preview(&doc.content, PREVIEW_LEN),
    }
}

fn preview(html: &str, max_chars: usize) -> String {
    let text = plain_text(html).replace('\n', " ");
    text.chars().take(max_chars).collect()
}
