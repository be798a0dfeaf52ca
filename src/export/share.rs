use std::path::PathBuf;

use serde::Serialize;

use crate::db::models::Document;
use crate::export::format::ExportFormat;

pub const LINK_SCHEME: &str = "docshare";

/// What gets handed to the platform's share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub subject: Option<String>,
    pub text: Option<String>,
    pub attachment: Option<PathBuf>,
    pub mime: &'static str,
}

/// Deep link that opens a document in the app.
pub fn share_link(document_id: &str) -> String {
    format!("{}://document/{}", LINK_SCHEME, document_id)
}

/// Share a document as a link.
pub fn link_payload(doc: &Document) -> SharePayload {
    SharePayload {
        subject: Some(doc.title.clone()),
        text: Some(format!(
            "Check out this document: {}",
            share_link(&doc.document_id)
        )),
        attachment: None,
        mime: "text/plain",
    }
}

/// Share an exported file.
pub fn file_payload(doc: &Document, path: PathBuf, format: ExportFormat) -> SharePayload {
    SharePayload {
        subject: Some(doc.title.clone()),
        text: None,
        attachment: Some(path),
        mime: format.mime(),
    }
}

/// Extract the document id from a deep link produced by [`share_link`].
pub fn parse_share_link(link: &str) -> Option<&str> {
    let rest = link.strip_prefix(LINK_SCHEME)?.strip_prefix("://document/")?;
    let id = rest.trim_end_matches('/');
    (!id.is_empty() && !id.contains('/')).then_some(id)
}
