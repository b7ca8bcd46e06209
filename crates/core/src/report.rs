use serde::{Deserialize, Serialize};
use std::fmt;

use crate::imei::Imei;
use crate::scan;

/// How the text fed to the scanner was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// PDF text layer. The wire label predates the current extractor and is
    /// kept for existing clients.
    #[serde(rename = "pdfplumber")]
    TextLayer,
    #[serde(rename = "ocr")]
    Ocr,
}

impl ExtractionMethod {
    pub fn label(self) -> &'static str {
        match self {
            ExtractionMethod::TextLayer => "pdfplumber",
            ExtractionMethod::Ocr => "ocr",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub method_used: ExtractionMethod,
    pub extracted_text: String,
    pub num_chars_extracted: usize,
}

impl ExtractionResult {
    pub fn new(method_used: ExtractionMethod, extracted_text: String) -> Self {
        let num_chars_extracted = extracted_text.chars().count();
        Self { method_used, extracted_text, num_chars_extracted }
    }
}

/// Response body of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImeiReport {
    pub filename: String,
    pub method_used: ExtractionMethod,
    pub imeis: Vec<Imei>,
    pub num_chars_extracted: usize,
    pub num_imeis_found: usize,
}

impl ImeiReport {
    /// Scan the extracted text and build the report. `num_imeis_found` is
    /// always derived from `imeis`.
    pub fn assemble(filename: impl Into<String>, result: &ExtractionResult) -> Self {
        let imeis = scan::valid_imeis(&result.extracted_text);
        Self {
            filename: filename.into(),
            method_used: result.method_used,
            num_imeis_found: imeis.len(),
            imeis,
            num_chars_extracted: result.num_chars_extracted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_wire_labels() {
        assert_eq!(serde_json::to_value(ExtractionMethod::TextLayer).unwrap(), json!("pdfplumber"));
        assert_eq!(serde_json::to_value(ExtractionMethod::Ocr).unwrap(), json!("ocr"));
        assert_eq!(ExtractionMethod::Ocr.to_string(), "ocr");
    }

    #[test]
    fn char_count_is_unicode_scalars() {
        let r = ExtractionResult::new(ExtractionMethod::Ocr, "IMEI № 1".into());
        assert_eq!(r.num_chars_extracted, 8);
    }

    #[test]
    fn assemble_dedups_and_counts() {
        let text = "IMEI 490154203237518\nIMEI 490154203237518".to_string();
        let result = ExtractionResult::new(ExtractionMethod::TextLayer, text);
        let report = ImeiReport::assemble("invoice.pdf", &result);
        assert_eq!(report.imeis.len(), 1);
        assert_eq!(report.num_imeis_found, 1);
        assert_eq!(report.num_chars_extracted, result.num_chars_extracted);
    }

    #[test]
    fn report_json_shape() {
        let result = ExtractionResult::new(ExtractionMethod::Ocr, "490154203237518".into());
        let report = ImeiReport::assemble("label.png", &result);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "filename": "label.png",
                "method_used": "ocr",
                "imeis": ["490154203237518"],
                "num_chars_extracted": 15,
                "num_imeis_found": 1
            })
        );
    }
}
