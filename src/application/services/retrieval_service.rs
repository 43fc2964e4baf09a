use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::services::embedding_service::EmbeddingService;
use crate::domain::entities::{BookAuthor, EnrichedSource};
use crate::domain::repositories::{
    AuthorRepository, BookRepository, ChunkHit, MatchKind, VectorIndex, VectorIndexError,
};

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Query cannot be empty")]
    EmptyQuery,
    #[error("Storage error: {0}")]
    StorageError(#[from] VectorIndexError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    pub top_n: i64,
    pub distance_threshold: f32,
    pub max_sources: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: 30,
            distance_threshold: 0.55,
            max_sources: 12,
        }
    }
}

/// Chunks that survived filtering, limited to the returned sources, in rank order.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunks: Vec<ChunkHit>,
    pub sources: Vec<EnrichedSource>,
    /// True when the query could not be embedded and full-text ranking was used.
    pub used_full_text: bool,
}

/// One cited file before catalog enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGroup {
    pub filename: String,
    pub best_distance: f32,
    pub pages: Vec<i32>,
}

pub struct RetrievalService {
    embedding_service: Arc<EmbeddingService>,
    vector_index: Arc<dyn VectorIndex>,
    book_repository: Arc<dyn BookRepository>,
    author_repository: Arc<dyn AuthorRepository>,
    config: RetrievalConfig,
}

impl RetrievalService {
    pub fn new(
        embedding_service: Arc<EmbeddingService>,
        vector_index: Arc<dyn VectorIndex>,
        book_repository: Arc<dyn BookRepository>,
        author_repository: Arc<dyn AuthorRepository>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedding_service,
            vector_index,
            book_repository,
            author_repository,
            config,
        }
    }

    pub fn config(&self) -> RetrievalConfig {
        self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.vector_index.backend_name()
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult, RetrievalError> {
        self.retrieve_with_limit(query, self.config.top_n).await
    }

    pub async fn retrieve_with_limit(
        &self,
        query: &str,
        top_n: i64,
    ) -> Result<RetrievalResult, RetrievalError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }

        let (hits, used_full_text) = match self.embedding_service.embed_query(query).await {
            Ok(embedding) => (self.vector_index.search(&embedding, top_n).await?, false),
            Err(e) => {
                warn!("Query embedding failed ({}), falling back to full-text search", e);
                (self.vector_index.text_search(query, top_n).await?, true)
            }
        };

        let fetched = hits.len();
        let hits = filter_by_distance(hits, self.config.distance_threshold);
        let groups = group_by_source(&hits, self.config.max_sources);
        debug!(
            "Retrieved {} hits, {} within threshold, {} sources",
            fetched,
            hits.len(),
            groups.len()
        );

        let chunks: Vec<ChunkHit> = hits
            .into_iter()
            .filter(|hit| groups.iter().any(|g| g.filename == hit.chunk.filename()))
            .collect();
        let sources = self.enrich(groups).await;

        Ok(RetrievalResult {
            chunks,
            sources,
            used_full_text,
        })
    }

    /// Attaches catalog data to each group. Lookup failures degrade to
    /// sources without metadata rather than failing the query.
    pub async fn enrich(&self, groups: Vec<SourceGroup>) -> Vec<EnrichedSource> {
        if groups.is_empty() {
            return Vec::new();
        }

        let filenames: Vec<String> = groups.iter().map(|g| g.filename.clone()).collect();
        let books = match self.book_repository.find_by_filenames(&filenames).await {
            Ok(books) => books,
            Err(e) => {
                warn!("Source metadata lookup failed: {}", e);
                Vec::new()
            }
        };

        let book_ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let authors: HashMap<i32, Vec<BookAuthor>> = if book_ids.is_empty() {
            HashMap::new()
        } else {
            match self.author_repository.authors_for_books(&book_ids).await {
                Ok(authors) => authors,
                Err(e) => {
                    warn!("Author lookup failed: {}", e);
                    HashMap::new()
                }
            }
        };

        groups
            .into_iter()
            .map(|group| match books.iter().find(|b| b.filename == group.filename) {
                Some(book) => EnrichedSource::from_book(
                    book,
                    authors.get(&book.id).map(Vec::as_slice).unwrap_or(&[]),
                    group.best_distance,
                    group.pages,
                ),
                None => EnrichedSource::without_metadata(
                    &group.filename,
                    group.best_distance,
                    group.pages,
                ),
            })
            .collect()
    }
}

/// Drops vector hits farther than `threshold`. Full-text hits are kept.
pub fn filter_by_distance(hits: Vec<ChunkHit>, threshold: f32) -> Vec<ChunkHit> {
    hits.into_iter()
        .filter(|hit| hit.match_kind == MatchKind::FullText || hit.distance <= threshold)
        .collect()
}

/// Groups ranked hits by filename in order of first appearance.
pub fn group_by_source(hits: &[ChunkHit], max_sources: usize) -> Vec<SourceGroup> {
    let mut groups: Vec<SourceGroup> = Vec::new();

    for hit in hits {
        let filename = hit.chunk.filename();
        let index = match groups.iter().position(|g| g.filename == filename) {
            Some(index) => index,
            None => {
                if groups.len() >= max_sources {
                    continue;
                }
                groups.push(SourceGroup {
                    filename: filename.to_string(),
                    best_distance: hit.distance,
                    pages: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[index];
        group.best_distance = group.best_distance.min(hit.distance);
        if let Some(page) = hit.chunk.page_number() {
            if !group.pages.contains(&page) {
                group.pages.push(page);
            }
        }
    }

    for group in &mut groups {
        group.pages.sort_unstable();
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DocumentChunk, NewBook};
    use crate::domain::value_objects::ChunkMetadata;
    use crate::test_support::{
        FakeEmbeddingProvider, InMemoryAuthorRepository, InMemoryBookRepository,
        InMemoryVectorIndex, fake_embedding,
    };

    fn hit(filename: &str, index: i32, page: i32, distance: f32) -> ChunkHit {
        ChunkHit {
            chunk: DocumentChunk::new(
                filename.to_string(),
                format!("chunk {}", index),
                Some(page),
                index,
                ChunkMetadata::default(),
            ),
            distance,
            match_kind: MatchKind::Vector,
        }
    }

    fn stored_chunk(filename: &str, index: i32, content: &str) -> DocumentChunk {
        let mut chunk = DocumentChunk::new(
            filename.to_string(),
            content.to_string(),
            Some(index + 1),
            index,
            ChunkMetadata::text(content, None),
        );
        chunk.set_embedding(fake_embedding(content));
        chunk
    }

    async fn service_with(
        provider: FakeEmbeddingProvider,
        index: Arc<InMemoryVectorIndex>,
        books: Arc<InMemoryBookRepository>,
        authors: Arc<InMemoryAuthorRepository>,
        config: RetrievalConfig,
    ) -> RetrievalService {
        RetrievalService::new(
            Arc::new(EmbeddingService::new(Arc::new(provider))),
            index,
            books,
            authors,
            config,
        )
    }

    #[test]
    fn test_filter_by_distance_is_idempotent() {
        let hits = vec![
            hit("a.pdf", 0, 1, 0.2),
            hit("b.pdf", 0, 1, 0.55),
            hit("c.pdf", 0, 1, 0.7),
        ];

        let once = filter_by_distance(hits, 0.55);
        let twice = filter_by_distance(once.clone(), 0.55);

        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_full_text_hits_are_not_thresholded() {
        let mut far = hit("a.pdf", 0, 1, 0.95);
        far.match_kind = MatchKind::FullText;

        assert_eq!(filter_by_distance(vec![far], 0.55).len(), 1);
    }

    #[test]
    fn test_group_by_source_keeps_rank_order_and_pages() {
        let hits = vec![
            hit("b.pdf", 4, 9, 0.1),
            hit("a.pdf", 1, 2, 0.2),
            hit("b.pdf", 2, 3, 0.3),
            hit("c.pdf", 0, 1, 0.4),
        ];

        let groups = group_by_source(&hits, 2);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].filename, "b.pdf");
        assert_eq!(groups[0].pages, vec![3, 9]);
        assert!((groups[0].best_distance - 0.1).abs() < f32::EPSILON);
        assert_eq!(groups[1].filename, "a.pdf");
    }

    #[tokio::test]
    async fn test_retrieve_enriches_sources_and_flags_missing_metadata() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let books = Arc::new(InMemoryBookRepository::new());
        let authors = Arc::new(InMemoryAuthorRepository::new());

        index
            .add_chunks(&[
                stored_chunk("subfiles.pdf", 0, "subfile paging with SFLSIZ and SFLPAG"),
                stored_chunk("orphan.pdf", 0, "subfile paging explained again"),
            ])
            .await
            .unwrap();
        let book = books
            .upsert(&NewBook {
                filename: "subfiles.pdf".to_string(),
                title: "Subfiles".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let author = authors.get_or_create("Kevin Vandever").await.unwrap();
        authors.replace_book_authors(book.id, &[author.id]).await.unwrap();

        let config = RetrievalConfig {
            distance_threshold: 1.0,
            ..Default::default()
        };
        let service =
            service_with(FakeEmbeddingProvider::new(), index, books, authors, config).await;

        let result = service.retrieve("subfile paging").await.unwrap();

        assert!(!result.used_full_text);
        assert_eq!(result.sources.len(), 2);
        let known = result
            .sources
            .iter()
            .find(|s| s.filename == "subfiles.pdf")
            .unwrap();
        assert!(known.metadata_found);
        assert_eq!(known.author.as_deref(), Some("Kevin Vandever"));
        let orphan = result
            .sources
            .iter()
            .find(|s| s.filename == "orphan.pdf")
            .unwrap();
        assert!(!orphan.metadata_found);
        assert_eq!(orphan.title, None);
        assert_eq!(orphan.display_title, "orphan");
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let same = "identical text in both files";
        index
            .add_chunks(&[stored_chunk("b.pdf", 0, same), stored_chunk("a.pdf", 0, same)])
            .await
            .unwrap();
        let service = service_with(
            FakeEmbeddingProvider::new(),
            index,
            Arc::new(InMemoryBookRepository::new()),
            Arc::new(InMemoryAuthorRepository::new()),
            RetrievalConfig::default(),
        )
        .await;

        let first = service.retrieve(same).await.unwrap();
        let second = service.retrieve(same).await.unwrap();

        assert_eq!(first.chunks, second.chunks);
        assert_eq!(first.sources[0].filename, "a.pdf");
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_full_text() {
        let index = Arc::new(InMemoryVectorIndex::new());
        index
            .add_chunks(&[stored_chunk("cl.pdf", 0, "MONMSG catches escape messages")])
            .await
            .unwrap();
        let service = service_with(
            FakeEmbeddingProvider::unavailable(),
            index,
            Arc::new(InMemoryBookRepository::new()),
            Arc::new(InMemoryAuthorRepository::new()),
            RetrievalConfig::default(),
        )
        .await;

        let result = service.retrieve("monmsg").await.unwrap();

        assert!(result.used_full_text);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].match_kind, MatchKind::FullText);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let service = service_with(
            FakeEmbeddingProvider::new(),
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(InMemoryBookRepository::new()),
            Arc::new(InMemoryAuthorRepository::new()),
            RetrievalConfig::default(),
        )
        .await;

        assert!(matches!(
            service.retrieve("   ").await,
            Err(RetrievalError::EmptyQuery)
        ));
    }
}
