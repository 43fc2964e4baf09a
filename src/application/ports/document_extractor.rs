use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DocumentExtractionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("No text could be extracted; the PDF may be image-only and need OCR")]
    NoText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// 1-based page number.
    pub number: i32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedDocument {
    pub pages: Vec<ExtractedPage>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: i32,
}

impl ExtractedDocument {
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|page| !page.text.trim().is_empty())
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, data: Vec<u8>) -> Result<ExtractedDocument, DocumentExtractionError>;

    fn can_extract(&self, content_type: Option<&str>, file_name: &str) -> bool;
}
