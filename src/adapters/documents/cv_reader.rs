//! CV text extraction with pdf-extract.

use crate::domain::DomainError;
use crate::ports::CvReader;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PdfTextReader;

impl PdfTextReader {
    pub fn new() -> Self {
        Self
    }
}

impl CvReader for PdfTextReader {
    fn extract_text(&self, pdf: &[u8]) -> Result<String, DomainError> {
        let raw = pdf_extract::extract_text_from_mem(pdf)
            .map_err(|e| DomainError::Document(format!("CV text extraction failed: {}", e)))?;
        // pdf-extract emits one line per text run; keep paragraphs, drop blank runs
        let text = raw
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(DomainError::Document(
                "CV contains no extractable text (scanned PDF?)".into(),
            ));
        }
        debug!(chars = text.len(), "extracted CV text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::documents::LopdfRenderer;
    use crate::domain::LetterLayout;
    use crate::ports::PdfRenderer;

    #[test]
    fn reads_text_back_from_rendered_pdf() {
        let layout = LetterLayout {
            title: "cv".into(),
            sender: "Ada Lovelace".into(),
            recipient: String::new(),
            date_line: "2026".into(),
            subject: "Curriculum".into(),
            body: "Rust Tokio Postgres".into(),
            signature: "Ada".into(),
        };
        let pdf = LopdfRenderer::new().render(&layout, 12.0).unwrap();
        let text = PdfTextReader::new().extract_text(&pdf.bytes).unwrap();
        assert!(text.contains("Tokio"), "got {:?}", text);
    }

    #[test]
    fn garbage_is_a_document_error() {
        assert!(matches!(
            PdfTextReader::new().extract_text(b"not a pdf"),
            Err(DomainError::Document(_))
        ));
    }
}
