use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

use crate::application::ports::job_queue::{JobQueue, JobQueueError, UploadTask};

pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<UploadTask>,
    pending: Arc<AtomicUsize>,
}

impl MpscJobQueue {
    /// The queue handed to use cases and the receiving end for the upload worker.
    pub fn create_pair() -> (Self, MpscJobQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let queue = Self {
            sender,
            pending: pending.clone(),
        };
        let worker_end = MpscJobQueueReceiver {
            receiver: Mutex::new(receiver),
            pending,
        };

        (queue, worker_end)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, task: UploadTask) -> Result<(), JobQueueError> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(JobQueueError::Closed);
        }
        Ok(())
    }

    async fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

pub struct MpscJobQueueReceiver {
    receiver: Mutex<mpsc::UnboundedReceiver<UploadTask>>,
    pending: Arc<AtomicUsize>,
}

impl MpscJobQueueReceiver {
    /// Next task, or `None` once every queue handle is dropped.
    pub async fn recv(&self) -> Option<UploadTask> {
        let task = self.receiver.lock().await.recv().await;
        if task.is_some() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        task
    }
}
