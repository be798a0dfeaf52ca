use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run};

use crate::error::AppError;
use crate::export::text::plain_text;

/// Render document content as a Word (`.docx`) file.
///
/// The body is a single paragraph with line breaks between the text blocks
/// of the HTML content.
pub fn render(content: &str) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    build(content)
        .build()
        .pack(&mut buf)
        .map_err(|e| AppError::Export(e.to_string()))?;
    Ok(buf.into_inner())
}

fn build(content: &str) -> Docx {
    let mut run = Run::new();
    for (i, line) in plain_text(content).lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Docx::new().add_paragraph(Paragraph::new().add_run(run))
}
