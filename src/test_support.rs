//! In-memory fakes of the repository and port traits, shared by unit tests.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::application::ports::chat_provider::CompletionStream;
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingRequest, EmbeddingResponse,
};
use crate::application::ports::{
    ChatCompletionProvider, ChatMessage, ChatProviderError, DocumentExtractionError,
    DocumentExtractor, EmbeddingProvider, EmbeddingProviderError, ExtractedDocument,
};
use crate::domain::entities::{Author, AuthorWithCount, Book, BookAuthor, DocumentChunk, NewBook};
use crate::domain::repositories::{
    AuthorRepository, AuthorRepositoryError, BookQuery, BookRepository, BookRepositoryError,
    BookSortField, ChunkHit, MatchKind, VectorIndex, VectorIndexError, sort_hits,
};
use crate::domain::value_objects::cosine_distance;

pub const FAKE_DIMENSION: usize = 16;

/// Hashed bag-of-words vectors: texts sharing words land close together.
pub fn fake_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; FAKE_DIMENSION];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
        vector[hash as usize % FAKE_DIMENSION] += 1.0;
    }
    if vector.iter().all(|v| *v == 0.0) {
        vector[0] = 1.0;
    }
    vector
}

#[derive(Default)]
pub struct FakeEmbeddingProvider {
    failing_on: Option<String>,
    unavailable: bool,
    batch_calls: AtomicUsize,
}

impl FakeEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any request containing `marker`; a batch fails as a whole.
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.failing_on = Some(marker.to_string());
        self
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn check(&self, text: &str) -> Result<(), EmbeddingProviderError> {
        if self.unavailable {
            return Err(EmbeddingProviderError::ServiceUnavailable(
                "embedding service down".to_string(),
            ));
        }
        match &self.failing_on {
            Some(marker) if text.contains(marker.as_str()) => Err(
                EmbeddingProviderError::ApiError(format!("refused: {}", marker)),
            ),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        self.check(&request.text)?;
        Ok(EmbeddingResponse {
            embedding: fake_embedding(&request.text),
            model_name: "fake".to_string(),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        for text in &request.texts {
            self.check(text)?;
        }
        Ok(BatchEmbeddingResponse {
            embeddings: request.texts.iter().map(|t| fake_embedding(t)).collect(),
            model_name: "fake".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "fake"
    }

    fn embedding_dimension(&self) -> usize {
        FAKE_DIMENSION
    }
}

pub struct FakeExtractor {
    document: ExtractedDocument,
}

impl FakeExtractor {
    pub fn new(document: ExtractedDocument) -> Self {
        Self { document }
    }
}

#[async_trait]
impl DocumentExtractor for FakeExtractor {
    async fn extract(&self, data: Vec<u8>) -> Result<ExtractedDocument, DocumentExtractionError> {
        if data.starts_with(b"corrupt") {
            return Err(DocumentExtractionError::CorruptedFile(
                "not a PDF".to_string(),
            ));
        }
        Ok(self.document.clone())
    }

    fn can_extract(&self, _content_type: Option<&str>, file_name: &str) -> bool {
        file_name.to_lowercase().ends_with(".pdf")
    }
}

#[derive(Default)]
pub struct InMemoryVectorIndex {
    chunks: Mutex<Vec<DocumentChunk>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent search returns a database error.
    pub fn fail_searches(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn all_chunks(&self) -> Vec<DocumentChunk> {
        self.chunks.lock().unwrap().clone()
    }

    fn check_failing(&self) -> Result<(), VectorIndexError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VectorIndexError::DatabaseError(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_schema(&self) -> Result<(), VectorIndexError> {
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize, VectorIndexError> {
        let mut stored = self.chunks.lock().unwrap();
        for chunk in chunks {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            stored.push(DocumentChunk::from_database(
                id,
                chunk.filename().to_string(),
                chunk.content().to_string(),
                chunk.page_number(),
                chunk.chunk_index(),
                chunk.embedding().map(|e| e.to_vec()),
                chunk.metadata().clone(),
                chunk.created_at(),
            ));
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<ChunkHit>, VectorIndexError> {
        self.check_failing()?;
        let stored = self.chunks.lock().unwrap();
        let mut hits: Vec<ChunkHit> = stored
            .iter()
            .filter_map(|chunk| {
                let distance = cosine_distance(embedding, chunk.embedding()?)?;
                Some(ChunkHit {
                    chunk: chunk.clone(),
                    distance,
                    match_kind: MatchKind::Vector,
                })
            })
            .collect();
        sort_hits(&mut hits);
        hits.truncate(limit.max(0) as usize);
        Ok(hits)
    }

    async fn text_search(&self, query: &str, limit: i64) -> Result<Vec<ChunkHit>, VectorIndexError> {
        self.check_failing()?;
        let words: Vec<String> = query.split_whitespace().map(|w| w.to_lowercase()).collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self.chunks.lock().unwrap();
        let mut hits: Vec<ChunkHit> = stored
            .iter()
            .filter_map(|chunk| {
                let content = chunk.content().to_lowercase();
                let matched = words.iter().filter(|w| content.contains(w.as_str())).count();
                (matched > 0).then(|| ChunkHit {
                    chunk: chunk.clone(),
                    distance: 1.0 - matched as f32 / words.len() as f32,
                    match_kind: MatchKind::FullText,
                })
            })
            .collect();
        sort_hits(&mut hits);
        hits.truncate(limit.max(0) as usize);
        Ok(hits)
    }

    async fn chunks_missing_embeddings(
        &self,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<DocumentChunk>, VectorIndexError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.has_embedding() && c.id().is_some_and(|id| id > after_id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn set_embedding(&self, chunk_id: i64, embedding: &[f32]) -> Result<(), VectorIndexError> {
        let mut stored = self.chunks.lock().unwrap();
        if let Some(chunk) = stored.iter_mut().find(|c| c.id() == Some(chunk_id)) {
            chunk.set_embedding(embedding.to_vec());
        }
        Ok(())
    }

    async fn count_by_filenames(
        &self,
        filenames: &[String],
    ) -> Result<HashMap<String, i64>, VectorIndexError> {
        let stored = self.chunks.lock().unwrap();
        let mut counts = HashMap::new();
        for chunk in stored.iter() {
            if filenames.iter().any(|f| f == chunk.filename()) {
                *counts.entry(chunk.filename().to_string()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn has_document(&self, filename: &str) -> Result<bool, VectorIndexError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.filename() == filename))
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<usize, VectorIndexError> {
        let mut stored = self.chunks.lock().unwrap();
        let before = stored.len();
        stored.retain(|c| c.filename() != filename);
        Ok(before - stored.len())
    }
}

#[derive(Default)]
pub struct InMemoryBookRepository {
    books: Mutex<Vec<Book>>,
    failing_upserts: AtomicBool,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, `upsert` returns a database error.
    pub fn fail_upserts(&self, failing: bool) {
        self.failing_upserts.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, filename: &str) -> Option<Book> {
        self.books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.filename == filename)
            .cloned()
    }

    fn matching(&self, query: &BookQuery) -> Vec<Book> {
        let contains = |haystack: Option<&str>, needle: &str| {
            haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        };

        let mut books: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                query.search.as_deref().is_none_or(|s| {
                    contains(Some(&b.title), s) || contains(b.author.as_deref(), s)
                })
            })
            .filter(|b| query.category.as_deref().is_none_or(|c| b.category.as_deref() == Some(c)))
            .filter(|b| query.document_type.is_none_or(|t| b.document_type == t))
            .filter(|b| query.author.as_deref().is_none_or(|a| contains(b.author.as_deref(), a)))
            .cloned()
            .collect();

        books.sort_by(|a, b| {
            let ordering = match query.sort_by {
                BookSortField::Title => a.title.cmp(&b.title),
                BookSortField::Year => a.year.cmp(&b.year),
                BookSortField::ProcessedAt => a.processed_at.cmp(&b.processed_at),
                BookSortField::TotalPages => a.total_pages.cmp(&b.total_pages),
            };
            let ordering = if query.descending {
                ordering.reverse()
            } else {
                ordering
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });
        books
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn upsert(&self, book: &NewBook) -> Result<Book, BookRepositoryError> {
        if self.failing_upserts.load(Ordering::SeqCst) {
            return Err(BookRepositoryError::DatabaseError(
                "books table is locked".to_string(),
            ));
        }
        let mut books = self.books.lock().unwrap();
        let id = match books.iter().position(|b| b.filename == book.filename) {
            Some(index) => books.remove(index).id,
            None => books.iter().map(|b| b.id).max().unwrap_or(0) + 1,
        };
        let stored = Book {
            id,
            filename: book.filename.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            document_type: book.document_type,
            mc_press_url: book.mc_press_url.clone(),
            article_url: book.article_url.clone(),
            total_pages: book.total_pages,
            tags: book.tags.clone(),
            year: book.year,
            processed_at: Utc::now(),
        };
        books.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.get(filename))
    }

    async fn find_by_filenames(&self, filenames: &[String]) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| filenames.contains(&b.filename))
            .cloned()
            .collect())
    }

    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, BookRepositoryError> {
        Ok(self
            .matching(query)
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, query: &BookQuery) -> Result<i64, BookRepositoryError> {
        Ok(self.matching(query).len() as i64)
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<bool, BookRepositoryError> {
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.filename != filename);
        Ok(books.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryAuthorRepository {
    authors: Mutex<Vec<Author>>,
    links: Mutex<HashMap<i32, Vec<i32>>>,
}

impl InMemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links_for(&self, book_id: i32) -> Vec<BookAuthor> {
        let authors = self.authors.lock().unwrap();
        self.links
            .lock()
            .unwrap()
            .get(&book_id)
            .map(|ids| {
                ids.iter()
                    .enumerate()
                    .filter_map(|(order, id)| {
                        authors
                            .iter()
                            .find(|a| a.id == *id)
                            .map(|a| BookAuthor::from_author(a, order as i32))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {
    async fn get_or_create(&self, name: &str) -> Result<Author, AuthorRepositoryError> {
        let mut authors = self.authors.lock().unwrap();
        if let Some(existing) = authors.iter().find(|a| a.name == name) {
            return Ok(existing.clone());
        }
        let author = Author {
            id: authors.len() as i32 + 1,
            name: name.to_string(),
            site_url: None,
        };
        authors.push(author.clone());
        Ok(author)
    }

    async fn find_by_id(&self, author_id: i32) -> Result<Option<Author>, AuthorRepositoryError> {
        Ok(self
            .authors
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == author_id)
            .cloned())
    }

    async fn search(
        &self,
        name_fragment: &str,
        limit: i64,
    ) -> Result<Vec<AuthorWithCount>, AuthorRepositoryError> {
        let needle = name_fragment.to_lowercase();
        let links = self.links.lock().unwrap();
        let mut found: Vec<AuthorWithCount> = self
            .authors
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .map(|a| AuthorWithCount {
                author: a.clone(),
                document_count: links.values().filter(|ids| ids.contains(&a.id)).count() as i64,
            })
            .collect();
        found.sort_by(|a, b| a.author.name.cmp(&b.author.name));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn update_site_url(
        &self,
        author_id: i32,
        site_url: Option<&str>,
    ) -> Result<Option<Author>, AuthorRepositoryError> {
        let mut authors = self.authors.lock().unwrap();
        Ok(authors.iter_mut().find(|a| a.id == author_id).map(|a| {
            a.site_url = site_url.map(str::to_string);
            a.clone()
        }))
    }

    async fn authors_for_books(
        &self,
        book_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<BookAuthor>>, AuthorRepositoryError> {
        Ok(book_ids
            .iter()
            .map(|id| (*id, self.links_for(*id)))
            .filter(|(_, authors)| !authors.is_empty())
            .collect())
    }

    async fn replace_book_authors(
        &self,
        book_id: i32,
        author_ids: &[i32],
    ) -> Result<(), AuthorRepositoryError> {
        self.links
            .lock()
            .unwrap()
            .insert(book_id, author_ids.to_vec());
        Ok(())
    }
}

/// Streams a fixed reply split on spaces and records the prompts it was sent.
#[derive(Default)]
pub struct FakeChatProvider {
    reply: String,
    fail: bool,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChatProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletionProvider for FakeChatProvider {
    async fn stream_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionStream, ChatProviderError> {
        self.prompts.lock().unwrap().push(messages);
        if self.fail {
            return Err(ChatProviderError::ApiError {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }

        let deltas: Vec<Result<String, ChatProviderError>> = self
            .reply
            .split_inclusive(' ')
            .map(|piece| Ok(piece.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(deltas)))
    }

    fn model_name(&self) -> &str {
        "fake-chat"
    }
}
