use async_trait::async_trait;
use lopdf::{Document, Object};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, warn};

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument, ExtractedPage,
};

pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn extract_from_bytes(
        data: &[u8],
        password: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(password).map_err(|_e| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }

        let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
        let page_count = page_numbers.len() as i32;

        let mut pages: Vec<ExtractedPage> = page_numbers
            .into_par_iter()
            .map(|page_num| {
                let text = match doc.extract_text(&[page_num]) {
                    Ok(text) => normalize_page_text(&text),
                    Err(e) => {
                        warn!("Failed to extract text from page {}: {}", page_num, e);
                        String::new()
                    }
                };
                ExtractedPage {
                    number: page_num as i32,
                    text,
                }
            })
            .collect();
        pages.sort_by_key(|page| page.number);

        let title = info_string(&doc, b"Title");
        let author = info_string(&doc, b"Author");
        debug!(
            "Extracted {} pages (title: {:?}, author: {:?})",
            page_count, title, author
        );

        Ok(ExtractedDocument {
            pages,
            title,
            author,
            page_count,
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops trailing whitespace and surrounding blank lines while keeping
/// indentation, which code detection relies on.
fn normalize_page_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

/// Reads a string entry of the trailer's Info dictionary, following a reference.
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let value = info.as_dict().ok()?.get(key).ok()?;
    let value = match value {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    match value {
        Object::String(bytes, _) => {
            let decoded = decode_pdf_string(bytes);
            let trimmed = decoded.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// PDF text strings are UTF-16BE with a byte-order mark, or a single-byte
/// encoding otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|b| *b as char).collect(),
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(&self, data: Vec<u8>) -> Result<ExtractedDocument, DocumentExtractionError> {
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || Self::extract_from_bytes(&data, &password))
            .await
            .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?
    }

    fn can_extract(&self, content_type: Option<&str>, file_name: &str) -> bool {
        let by_type = content_type
            .map(|t| t.eq_ignore_ascii_case("application/pdf"))
            .unwrap_or(false);
        let by_name = file_name.to_ascii_lowercase().ends_with(".pdf");
        by_type || by_name
    }
}
