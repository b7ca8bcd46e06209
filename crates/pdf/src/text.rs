use lopdf::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfTextError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
    #[error("PDF has no pages")]
    NoPages,
}

/// Reads the embedded text layer of a PDF without rasterizing it.
pub trait TextLayerExtractor: Send + Sync {
    /// Page texts in page order, joined with `\n` and trimmed.
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, PdfTextError>;
}

impl<T: TextLayerExtractor + ?Sized> TextLayerExtractor for Box<T> {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, PdfTextError> {
        (**self).extract(pdf_bytes)
    }
}

/// Text layer extraction backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfTextLayer;

impl TextLayerExtractor for LopdfTextLayer {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, PdfTextError> {
        let doc = Document::load_mem(pdf_bytes).map_err(|e| PdfTextError::Parse(e.to_string()))?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(PdfTextError::NoPages);
        }

        let mut parts: Vec<String> = Vec::with_capacity(pages.len());
        // `get_pages` is a BTreeMap keyed by 1-based page number.
        for &number in pages.keys() {
            match doc.extract_text(&[number]) {
                Ok(text) if !text.trim().is_empty() => parts.push(text),
                Ok(_) => {}
                // Skip the page, keep the rest.
                Err(e) => tracing::debug!(page = number, error = %e, "Page text unreadable"),
            }
        }

        Ok(parts.join("\n").trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a PDF with one Courier text line per page.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
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

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                vec![]
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn extracts_single_page_text() {
        let pdf = pdf_with_pages(&["IMEI 490154203237518"]);
        let text = LopdfTextLayer.extract(&pdf).unwrap();
        assert!(text.contains("490154203237518"), "got {text:?}");
        assert_eq!(text, text.trim());
    }

    #[test]
    fn pages_are_joined_in_order() {
        let pdf = pdf_with_pages(&["first 490154203237518", "second 356938035643809"]);
        let text = LopdfTextLayer.extract(&pdf).unwrap();
        let a = text.find("490154203237518").unwrap();
        let b = text.find("356938035643809").unwrap();
        assert!(a < b);
        assert!(text[a..b].contains('\n'));
    }

    #[test]
    fn image_only_pdf_yields_empty_text() {
        let pdf = pdf_with_pages(&["", ""]);
        assert_eq!(LopdfTextLayer.extract(&pdf).unwrap(), "");
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = LopdfTextLayer.extract(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PdfTextError::Parse(_)));
    }
}
