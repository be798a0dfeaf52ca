use serde::{Deserialize, Serialize};

use crate::db::models::Document;

/// Local mirror of a document for disconnected viewing.
///
/// Carries no owner or permission data; the only link to the remote record is
/// the shared `document_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineDocument {
    pub document_id: String,
    pub title: String,
    pub content: String,
    /// Epoch milliseconds, copied from the remote record at save time.
    pub timestamp: i64,
}

impl From<&Document> for OfflineDocument {
    fn from(doc: &Document) -> Self {
        Self {
            document_id: doc.document_id.clone(),
            title: doc.title.clone(),
            content: doc.content.clone(),
            timestamp: doc.timestamp.timestamp_millis(),
        }
    }
}
