pub mod backfill_embeddings;
pub mod delete_document;
pub mod document_authors;
pub mod get_job_status;
pub mod list_documents;
pub mod manage_authors;
pub mod queue_upload;
pub mod search_content;
pub mod upload_document;

pub use backfill_embeddings::{BackfillEmbeddingsError, BackfillEmbeddingsUseCase, BackfillReport};
pub use delete_document::{DeleteDocumentError, DeleteDocumentResponse, DeleteDocumentUseCase};
pub use document_authors::{DocumentAuthorsError, DocumentAuthorsUseCase};
pub use get_job_status::{GetJobStatusError, GetJobStatusResponse, GetJobStatusUseCase};
pub use list_documents::{
    DocumentSummary, ListDocumentsError, ListDocumentsRequest, ListDocumentsResponse,
    ListDocumentsUseCase,
};
pub use manage_authors::{ManageAuthorsError, ManageAuthorsUseCase};
pub use queue_upload::{QueueUploadError, QueueUploadResponse, QueueUploadUseCase};
pub use search_content::{
    SearchContentError, SearchContentRequest, SearchContentResponse, SearchContentUseCase,
};
pub use upload_document::{
    UploadDocumentError, UploadDocumentRequest, UploadDocumentUseCase, UploadedFile,
};
