use serde::{Deserialize, Serialize};

use crate::application::use_cases::SearchContentResponse;
use crate::domain::entities::EnrichedSource;
use crate::domain::repositories::{ChunkHit, MatchKind};
use crate::domain::value_objects::{ChunkKind, CodeLanguage};

#[derive(Debug, Deserialize)]
pub struct SearchRequestDto {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponseDto {
    pub query: String,
    pub results: Vec<SearchResultDto>,
    pub sources: Vec<EnrichedSource>,
    pub total_results: usize,
    pub used_full_text: bool,
    pub search_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResultDto {
    pub chunk_id: Option<i64>,
    pub filename: String,
    pub content: String,
    pub page_number: Option<i32>,
    pub chunk_index: i32,
    pub chunk_type: ChunkKind,
    pub language: Option<CodeLanguage>,
    pub distance: f32,
    pub match_kind: MatchKind,
}

impl From<SearchContentResponse> for SearchResponseDto {
    fn from(response: SearchContentResponse) -> Self {
        let results: Vec<SearchResultDto> = response
            .chunks
            .into_iter()
            .map(SearchResultDto::from)
            .collect();

        Self {
            query: response.query,
            total_results: results.len(),
            results,
            sources: response.sources,
            used_full_text: response.used_full_text,
            search_time_ms: response.search_time_ms,
        }
    }
}

impl From<ChunkHit> for SearchResultDto {
    fn from(hit: ChunkHit) -> Self {
        let chunk = hit.chunk;
        Self {
            chunk_id: chunk.id(),
            filename: chunk.filename().to_string(),
            content: chunk.content().to_string(),
            page_number: chunk.page_number(),
            chunk_index: chunk.chunk_index(),
            chunk_type: chunk.metadata().chunk_type,
            language: chunk.language(),
            distance: hit.distance,
            match_kind: hit.match_kind,
        }
    }
}
