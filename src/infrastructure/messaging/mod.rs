pub mod in_memory_job_repository;
pub mod mpsc_job_queue;
pub mod upload_worker;

pub use in_memory_job_repository::InMemoryJobRepository;
pub use mpsc_job_queue::{MpscJobQueue, MpscJobQueueReceiver};
pub use upload_worker::UploadWorker;
