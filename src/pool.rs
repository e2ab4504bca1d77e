//! Extraction Worker Pool
//!
//! A bounded pool of worker threads, each handling one request at a time.
//! Concurrency is across requests, never within one request's merge.
//! Submission is non-blocking: a full queue is reported to the caller
//! rather than queued without bound.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::config::ExtractionRequest;
use crate::error::{Result, VaultError};
use crate::extract::{ExtractionResult, Extractor};

/// Default bound on queued, not-yet-started requests
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

struct Job {
    request: ExtractionRequest,
    deadline: Instant,
    reply: Sender<Result<ExtractionResult>>,
}

pub struct ExtractionPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    queue_depth: usize,
    stats: Arc<Mutex<PoolStats>>,
}

impl ExtractionPool {
    /// Spawn `workers` threads sharing one extractor. Worker count 0 falls
    /// back to the machine's available parallelism.
    pub fn new(workers: usize, queue_depth: usize, extractor: Extractor) -> Self {
        let workers = if workers == 0 {
            std::thread::available_parallelism().map_or(4, |n| n.get())
        } else {
            workers
        };
        let extractor = Arc::new(extractor);
        let stats = Arc::new(Mutex::new(PoolStats::default()));
        let (tx, rx) = bounded::<Job>(queue_depth);

        let handles = (0..workers)
            .map(|id| {
                let rx = rx.clone();
                let extractor = Arc::clone(&extractor);
                let stats = Arc::clone(&stats);
                std::thread::Builder::new()
                    .name(format!("extract-{id}"))
                    .spawn(move || worker_loop(id, rx, extractor, stats))
                    .expect("spawn extraction worker")
            })
            .collect();

        tracing::info!(workers, queue_depth, "extraction pool started");
        ExtractionPool {
            tx: Some(tx),
            workers: handles,
            queue_depth,
            stats,
        }
    }

    /// Queue a request; the returned channel yields its result once a
    /// worker finishes it. The deadline clock starts now, not at dequeue.
    pub fn submit(
        &self,
        request: ExtractionRequest,
    ) -> Result<Receiver<Result<ExtractionResult>>> {
        let tx = self.tx.as_ref().ok_or(VaultError::PoolShutdown)?;
        let (reply_tx, reply_rx) = bounded(1);
        let job = Job {
            deadline: Instant::now() + request.timeout,
            request,
            reply: reply_tx,
        };
        match tx.try_send(job) {
            Ok(()) => {
                self.stats.lock().submitted += 1;
                Ok(reply_rx)
            }
            Err(TrySendError::Full(_)) => Err(VaultError::QueueFull {
                capacity: self.queue_depth,
            }),
            Err(TrySendError::Disconnected(_)) => Err(VaultError::PoolShutdown),
        }
    }

    pub fn stats(&self) -> PoolStats {
        *self.stats.lock()
    }

    /// Stop accepting work and wait for in-flight requests to finish
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if self.tx.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        tracing::info!("extraction pool stopped");
    }
}

impl Drop for ExtractionPool {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

fn worker_loop(
    id: usize,
    rx: Receiver<Job>,
    extractor: Arc<Extractor>,
    stats: Arc<Mutex<PoolStats>>,
) {
    while let Ok(job) = rx.recv() {
        let result = extractor.extract_with_deadline(&job.request, Some(job.deadline));
        {
            let mut stats = stats.lock();
            match &result {
                Ok(_) => stats.completed += 1,
                Err(_) => stats.failed += 1,
            }
        }
        if let Err(e) = &result {
            tracing::warn!(worker = id, error = %e, "extraction failed");
        }
        // The caller may have dropped its receiver
        let _ = job.reply.send(result);
    }
}

// ============================================================================
// Tests
// ============================================================================
