use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::models::Document;
use crate::error::AppError;
use crate::export::{pdf, word};

/// File formats a document can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Word,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "pdf"),
            ExportFormat::Word => write!(f, "word"),
        }
    }
}

impl ExportFormat {
    /// Parse a format name (case-insensitive). Accepts `pdf`, `word`, `docx` and `doc`.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "word" | "docx" | "doc" => Some(ExportFormat::Word),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Render `doc` in the requested format.
pub fn render(doc: &Document, format: ExportFormat) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Pdf => Ok(pdf::render(&doc.title, &doc.content)),
        ExportFormat::Word => word::render(&doc.content),
    }
}

/// File name for an export: the document title plus the format's extension.
///
/// Path separators and control characters are replaced so the title cannot
/// escape the target directory.
pub fn export_file_name(title: &str, format: ExportFormat) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = cleaned.trim_start_matches('.');
    let stem = if stem.is_empty() { "Untitled" } else { stem };
    format!("{}.{}", stem, format.extension())
}

/// Render `doc` and write it into `dir`, returning the written path.
pub fn write_export(dir: &Path, doc: &Document, format: ExportFormat) -> Result<PathBuf, AppError> {
    let bytes = render(doc, format)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(&doc.title, format));
    std::fs::write(&path, bytes)?;
    tracing::info!(
        "Exported document '{}' as {} to {}",
        doc.document_id,
        format,
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Principal;

    #[test]
    fn test_from_str_ci() {
        assert_eq!(ExportFormat::from_str_ci("PDF"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_str_ci("word"), Some(ExportFormat::Word));
        assert_eq!(ExportFormat::from_str_ci("DOCX"), Some(ExportFormat::Word));
        assert_eq!(ExportFormat::from_str_ci("doc"), Some(ExportFormat::Word));
        assert_eq!(ExportFormat::from_str_ci("odt"), None);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Notes", ExportFormat::Pdf), "Notes.pdf");
        assert_eq!(export_file_name("Q1/Q2 plan", ExportFormat::Word), "Q1_Q2 plan.docx");
        assert_eq!(export_file_name("../secret", ExportFormat::Pdf), "_secret.pdf");
        assert_eq!(export_file_name("   ", ExportFormat::Pdf), "Untitled.pdf");
    }

    #[test]
    fn test_write_export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new_owned(
            "doc-1".into(),
            "Notes",
            "<p>hi</p>",
            &Principal::new("uid-1", "a@x.com"),
        );

        let path = write_export(dir.path(), &doc, ExportFormat::Pdf).unwrap();
        assert_eq!(path, dir.path().join("Notes.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let path = write_export(dir.path(), &doc, ExportFormat::Word).unwrap();
        assert_eq!(path, dir.path().join("Notes.docx"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
