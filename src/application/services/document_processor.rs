use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::ports::{DocumentExtractionError, DocumentExtractor, ExtractedDocument};
use crate::application::services::code_detector::CodeDetector;
use crate::application::services::embedding_service::EmbeddingService;
use crate::application::services::text_splitter::{RTSplitter, RecursiveTextSplitter};
use crate::domain::entities::{DocumentChunk, NewBook};
use crate::domain::repositories::{
    AuthorRepository, AuthorRepositoryError, BookRepository, BookRepositoryError, VectorIndex,
    VectorIndexError,
};
use crate::domain::value_objects::{ChunkMetadata, DocumentType, join_authors, parse_authors};

#[derive(Debug, thiserror::Error)]
pub enum DocumentProcessingError {
    #[error("Document already ingested: {0}")]
    Duplicate(String),
    #[error("Extraction error: {0}")]
    ExtractionError(#[from] DocumentExtractionError),
    #[error("Storage error: {0}")]
    StorageError(#[from] VectorIndexError),
    #[error("Catalog error: {0}")]
    CatalogError(String),
}

impl From<BookRepositoryError> for DocumentProcessingError {
    fn from(error: BookRepositoryError) -> Self {
        DocumentProcessingError::CatalogError(error.to_string())
    }
}

impl From<AuthorRepositoryError> for DocumentProcessingError {
    fn from(error: AuthorRepositoryError) -> Self {
        DocumentProcessingError::CatalogError(error.to_string())
    }
}

/// Catalog fields supplied alongside an upload. Anything left empty falls
/// back to what the PDF itself declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub document_type: Option<DocumentType>,
    pub mc_press_url: Option<String>,
    pub article_url: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionSummary {
    pub filename: String,
    pub book_id: i32,
    pub title: String,
    pub authors: Vec<String>,
    pub pages: i32,
    pub text_chunks: usize,
    pub code_chunks: usize,
    pub embedded: usize,
    pub missing_embeddings: usize,
    pub processing_time_ms: u64,
}

/// Runs one PDF through extraction, chunking, embedding and storage, then
/// records its catalog entry and author links.
pub struct DocumentProcessorService {
    document_extractor: Arc<dyn DocumentExtractor>,
    embedding_service: Arc<EmbeddingService>,
    vector_index: Arc<dyn VectorIndex>,
    book_repository: Arc<dyn BookRepository>,
    author_repository: Arc<dyn AuthorRepository>,
    splitter: RTSplitter,
    code_detector: CodeDetector,
}

impl DocumentProcessorService {
    pub fn new(
        document_extractor: Arc<dyn DocumentExtractor>,
        embedding_service: Arc<EmbeddingService>,
        vector_index: Arc<dyn VectorIndex>,
        book_repository: Arc<dyn BookRepository>,
        author_repository: Arc<dyn AuthorRepository>,
        splitter: RTSplitter,
    ) -> Self {
        Self {
            document_extractor,
            embedding_service,
            vector_index,
            book_repository,
            author_repository,
            splitter,
            code_detector: CodeDetector::new(),
        }
    }

    pub fn can_extract(&self, content_type: Option<&str>, filename: &str) -> bool {
        self.document_extractor.can_extract(content_type, filename)
    }

    pub async fn ingest(
        &self,
        filename: &str,
        data: Vec<u8>,
        details: &DocumentDetails,
    ) -> Result<IngestionSummary, DocumentProcessingError> {
        let started = Instant::now();

        if self.vector_index.has_document(filename).await? {
            return Err(DocumentProcessingError::Duplicate(filename.to_string()));
        }

        let document = self.document_extractor.extract(data).await?;
        if !document.has_text() {
            return Err(DocumentProcessingError::ExtractionError(
                DocumentExtractionError::NoText,
            ));
        }

        let mut chunks = self.build_chunks(filename, &document);
        let code_chunks = chunks.iter().filter(|c| c.is_code()).count();
        let text_chunks = chunks.len() - code_chunks;
        info!(
            "Split {} into {} text chunks and {} code blocks across {} pages",
            filename, text_chunks, code_chunks, document.page_count
        );

        let report = self.embedding_service.embed_chunks(&mut chunks).await;
        if report.missing > 0 {
            warn!(
                "{} of {} chunks of {} stored without embeddings",
                report.missing,
                chunks.len(),
                filename
            );
        }

        let author_names = details
            .author
            .as_deref()
            .map(parse_authors)
            .filter(|names| !names.is_empty())
            .or_else(|| document.author.as_deref().map(parse_authors))
            .unwrap_or_default();

        let title = details
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| document.title.clone().filter(|t| !t.trim().is_empty()))
            .unwrap_or_else(|| crate::domain::entities::book::title_from_filename(filename));

        self.vector_index.add_chunks(&chunks).await?;

        let catalog_entry = NewBook {
            filename: filename.to_string(),
            title: title.clone(),
            author: join_authors(&author_names),
            category: details.category.clone(),
            document_type: details.document_type.unwrap_or_default(),
            mc_press_url: details.mc_press_url.clone(),
            article_url: details.article_url.clone(),
            total_pages: Some(document.page_count),
            tags: Vec::new(),
            year: details.year,
        };
        let book_id = match self.record_catalog(&catalog_entry, &author_names).await {
            Ok(book_id) => book_id,
            Err(e) => {
                // Stored chunks must not outlive a failed catalog write.
                warn!("Catalog update for {} failed, removing its chunks: {}", filename, e);
                if let Err(cleanup) = self.vector_index.delete_by_filename(filename).await {
                    warn!("Could not remove chunks of {}: {}", filename, cleanup);
                }
                return Err(e);
            }
        };

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!("Ingested {} in {} ms", filename, processing_time_ms);

        Ok(IngestionSummary {
            filename: filename.to_string(),
            book_id,
            title,
            authors: author_names,
            pages: document.page_count,
            text_chunks,
            code_chunks,
            embedded: report.embedded,
            missing_embeddings: report.missing,
            processing_time_ms,
        })
    }

    async fn record_catalog(
        &self,
        entry: &NewBook,
        author_names: &[String],
    ) -> Result<i32, DocumentProcessingError> {
        let book = self.book_repository.upsert(entry).await?;

        if author_names.is_empty() {
            warn!(
                "No author known for {}; catalog entry has no author links",
                entry.filename
            );
            return Ok(book.id);
        }

        let mut author_ids = Vec::with_capacity(author_names.len());
        for name in author_names {
            author_ids.push(self.author_repository.get_or_create(name).await?.id);
        }
        self.author_repository
            .replace_book_authors(book.id, &author_ids)
            .await?;
        Ok(book.id)
    }

    /// Text chunks over the whole document first, then one chunk per code block.
    pub fn build_chunks(&self, filename: &str, document: &ExtractedDocument) -> Vec<DocumentChunk> {
        let total_pages = Some(document.page_count);

        let mut assembled = String::new();
        let mut page_starts: Vec<(usize, i32)> = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            if page.text.trim().is_empty() {
                continue;
            }
            if !assembled.is_empty() {
                assembled.push_str("\n\n");
            }
            page_starts.push((assembled.len(), page.number));
            assembled.push_str(&page.text);
        }

        let mut chunks = Vec::new();
        let mut cursor = 0usize;
        for content in self.splitter.split_text(&assembled) {
            let page_number = match assembled[cursor..].find(&content) {
                Some(offset) => {
                    let position = cursor + offset;
                    cursor = next_char_boundary(&assembled, position);
                    page_at(&page_starts, position)
                }
                None => page_at(&page_starts, cursor),
            };

            let metadata = ChunkMetadata::text(&content, total_pages);
            chunks.push(DocumentChunk::new(
                filename.to_string(),
                content,
                page_number,
                chunks.len() as i32,
                metadata,
            ));
        }

        for page in &document.pages {
            for block in self.code_detector.detect(&page.text) {
                let metadata = ChunkMetadata::code(block.language, &block.content, total_pages);
                chunks.push(DocumentChunk::new(
                    filename.to_string(),
                    block.content,
                    Some(page.number),
                    chunks.len() as i32,
                    metadata,
                ));
            }
        }

        chunks
    }
}

fn page_at(page_starts: &[(usize, i32)], position: usize) -> Option<i32> {
    page_starts
        .iter()
        .take_while(|(start, _)| *start <= position)
        .last()
        .map(|(_, number)| *number)
}

fn next_char_boundary(text: &str, position: usize) -> usize {
    text[position..]
        .chars()
        .next()
        .map_or(text.len(), |c| position + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ExtractedPage;
    use crate::domain::value_objects::CodeLanguage;
    use crate::test_support::{
        FakeEmbeddingProvider, FakeExtractor, InMemoryAuthorRepository, InMemoryBookRepository,
        InMemoryVectorIndex,
    };

    const DDS_SOURCE: &str = "     A                                      DSPSIZ(24 80 *DS3)
     A          R SFLREC                    SFL
     A            CUSTNO         7S 0O  5  2
     A          R SFLCTL                    SFLCTL(SFLREC)
     A                                      SFLSIZ(0050)
     A                                      SFLPAG(0010)
     A                                      CF06(06 'Add customer')";

    struct Fixture {
        service: DocumentProcessorService,
        index: Arc<InMemoryVectorIndex>,
        books: Arc<InMemoryBookRepository>,
        authors: Arc<InMemoryAuthorRepository>,
    }

    fn fixture(document: ExtractedDocument, splitter: RTSplitter) -> Fixture {
        let index = Arc::new(InMemoryVectorIndex::new());
        let books = Arc::new(InMemoryBookRepository::new());
        let authors = Arc::new(InMemoryAuthorRepository::new());
        let embedding_service = Arc::new(EmbeddingService::new(Arc::new(
            FakeEmbeddingProvider::new(),
        )));

        let service = DocumentProcessorService::new(
            Arc::new(FakeExtractor::new(document)),
            embedding_service,
            index.clone(),
            books.clone(),
            authors.clone(),
            splitter,
        );

        Fixture {
            service,
            index,
            books,
            authors,
        }
    }

    fn document(pages: &[&str]) -> ExtractedDocument {
        ExtractedDocument {
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, text)| ExtractedPage {
                    number: i as i32 + 1,
                    text: text.to_string(),
                })
                .collect(),
            title: Some("Subfile Programming".to_string()),
            author: Some("Kevin Vandever; Jim Buck".to_string()),
            page_count: pages.len() as i32,
        }
    }

    #[tokio::test]
    async fn test_dds_page_yields_verbatim_code_chunk() {
        let page = format!(
            "Define the display file first.\n{}\nThen compile it with CRTDSPF.",
            DDS_SOURCE
        );
        let fx = fixture(document(&[&page]), RTSplitter::new(200, 40));

        fx.service
            .ingest("subfiles.pdf", vec![1, 2, 3], &DocumentDetails::default())
            .await
            .unwrap();

        let stored = fx.index.all_chunks();
        let dds: Vec<_> = stored
            .iter()
            .filter(|c| c.language() == Some(CodeLanguage::Dds))
            .collect();
        assert!(!dds.is_empty());
        for line in DDS_SOURCE.lines() {
            assert!(dds[0].content().contains(line));
        }
        assert!(dds[0].content().contains("SFLSIZ"));
        assert!(dds[0].content().contains("CF06"));
        assert_eq!(dds[0].page_number(), Some(1));
    }

    #[tokio::test]
    async fn test_code_chunk_indexes_follow_text_chunks() {
        let prose = "Subfiles present lists of records. ".repeat(20);
        let page = format!("{}\n{}\n", prose, DDS_SOURCE);
        let fx = fixture(document(&[&page]), RTSplitter::new(150, 30));

        let chunks = fx
            .service
            .build_chunks("subfiles.pdf", &document(&[&page]));

        let first_code = chunks.iter().position(|c| c.is_code()).unwrap();
        assert!(chunks[..first_code].iter().all(|c| !c.is_code()));
        assert!(chunks[first_code..].iter().all(|c| c.is_code()));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index(), i as i32);
        }
    }

    #[tokio::test]
    async fn test_text_chunks_attributed_to_starting_page() {
        let page_one = "Chapter one covers physical files. ".repeat(6);
        let page_two = "Chapter two covers logical files. ".repeat(6);
        let fx = fixture(document(&[&page_one, &page_two]), RTSplitter::new(120, 0));

        let chunks = fx
            .service
            .build_chunks("files.pdf", &document(&[&page_one, &page_two]));

        for chunk in chunks.iter().filter(|c| !c.is_code()) {
            if chunk.content().starts_with("Chapter one") {
                assert_eq!(chunk.page_number(), Some(1));
            }
            if chunk.content().starts_with("Chapter two") {
                assert_eq!(chunk.page_number(), Some(2));
            }
        }
        assert!(chunks.iter().any(|c| c.page_number() == Some(2)));
    }

    #[tokio::test]
    async fn test_ingest_records_book_and_ordered_authors() {
        let fx = fixture(document(&["Some prose about RPG."]), RTSplitter::default());

        let summary = fx
            .service
            .ingest("subfiles.pdf", vec![], &DocumentDetails::default())
            .await
            .unwrap();

        assert_eq!(summary.authors, vec!["Kevin Vandever", "Jim Buck"]);
        let book = fx.books.get("subfiles.pdf").unwrap();
        assert_eq!(book.title, "Subfile Programming");
        assert_eq!(book.author.as_deref(), Some("Kevin Vandever, Jim Buck"));

        let links = fx.authors.links_for(book.id);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "Kevin Vandever");
        assert_eq!(links[0].author_order, 0);
        assert_eq!(links[1].author_order, 1);
    }

    #[tokio::test]
    async fn test_upload_fields_override_pdf_metadata() {
        let fx = fixture(document(&["Some prose about CL."]), RTSplitter::default());
        let details = DocumentDetails {
            title: Some("Control Language Programming".to_string()),
            author: Some("Bryan Meyers and Dan Riehl".to_string()),
            document_type: Some(DocumentType::Article),
            ..Default::default()
        };

        fx.service.ingest("cl.pdf", vec![], &details).await.unwrap();

        let book = fx.books.get("cl.pdf").unwrap();
        assert_eq!(book.title, "Control Language Programming");
        assert_eq!(book.document_type, DocumentType::Article);
        assert_eq!(fx.authors.links_for(book.id)[1].name, "Dan Riehl");
    }

    #[tokio::test]
    async fn test_duplicate_filename_rejected() {
        let fx = fixture(document(&["Some prose."]), RTSplitter::default());
        let details = DocumentDetails::default();

        fx.service.ingest("dup.pdf", vec![], &details).await.unwrap();
        let second = fx.service.ingest("dup.pdf", vec![], &details).await;

        assert!(matches!(second, Err(DocumentProcessingError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_image_only_pdf_rejected() {
        let fx = fixture(document(&["", "   "]), RTSplitter::default());

        let result = fx
            .service
            .ingest("scan.pdf", vec![], &DocumentDetails::default())
            .await;

        assert!(matches!(
            result,
            Err(DocumentProcessingError::ExtractionError(
                DocumentExtractionError::NoText
            ))
        ));
        assert!(fx.index.all_chunks().is_empty());
    }

    #[tokio::test]
    async fn test_failed_catalog_write_removes_stored_chunks() {
        let page = "Journaling records every change to a physical file. ".repeat(10);
        let fx = fixture(document(&[&page]), RTSplitter::new(200, 40));
        fx.books.fail_upserts(true);

        let result = fx
            .service
            .ingest("journals.pdf", vec![1], &DocumentDetails::default())
            .await;

        assert!(matches!(result, Err(DocumentProcessingError::CatalogError(_))));
        assert!(fx.index.all_chunks().is_empty());

        fx.books.fail_upserts(false);
        let summary = fx
            .service
            .ingest("journals.pdf", vec![1], &DocumentDetails::default())
            .await
            .unwrap();
        assert!(summary.text_chunks > 0);
        assert!(fx.books.get("journals.pdf").is_some());
    }
}
