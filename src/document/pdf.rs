//! PDF extraction backed by `lopdf`.

use std::path::Path;

use lopdf::Document;

use super::{detect_tables, DocumentContent, DocumentError, DocumentSource};

/// Extracts page text and tables from PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    fn parse_error(path: &Path, e: impl std::fmt::Display) -> DocumentError {
        DocumentError::Parse { path: path.to_path_buf(), message: e.to_string() }
    }
}

impl DocumentSource for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<DocumentContent, DocumentError> {
        if !path.is_file() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let document = Document::load_mem(&bytes).map_err(|e| Self::parse_error(path, e))?;

        let mut pages_text = Vec::new();
        let mut tables = Vec::new();

        for page_number in document.get_pages().keys().copied() {
            // Undecodable pages are skipped.
            let text = match document.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(page = page_number, error = %e, "Failed to extract page text");
                    continue;
                }
            };

            tables.extend(detect_tables(page_number, &text));

            let text = text.trim();
            if !text.is_empty() {
                pages_text.push(text.to_string());
            }
        }

        let content = DocumentContent::new(pages_text.join("\n\n"), tables);
        tracing::info!(
            path = %path.display(),
            chars = content.text.chars().count(),
            tables = content.tables.len(),
            "Extracted document"
        );

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = PdfExtractor::new().extract(Path::new("/no/such/spec.pdf"));
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }

    /// Write a one-page PDF with each line drawn as its own text run.
    fn write_pdf(path: &Path, lines: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_extracts_page_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.pdf");
        write_pdf(&path, &["Login requirements", "Users sign in with email"]);

        let content = PdfExtractor::new().extract(&path).unwrap();
        assert!(content.text.contains("Login requirements"));
        assert!(content.text.contains("Users sign in with email"));
        assert!(!content.is_empty());
    }

    #[test]
    fn test_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.pdf");
        std::fs::write(&path, b"plain text, not a pdf").unwrap();

        let result = PdfExtractor::new().extract(&path);
        assert!(matches!(result, Err(DocumentError::Parse { .. })));
    }
}
