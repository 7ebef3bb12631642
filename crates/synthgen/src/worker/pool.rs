use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::orchestrator::Orchestrator;
use crate::worker::request::{GenerationRequest, JobOutcome};

struct Ticketed {
    ticket: u64,
    request: GenerationRequest,
}

/// Fixed set of threads running queued generation jobs.
///
/// Each worker runs one job at a time through the shared orchestrator.
/// Outcomes arrive on the result channel in completion order, not
/// submission order.
pub struct JobPool {
    job_sender: Sender<Ticketed>,
    result_receiver: Receiver<JobOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    next_ticket: AtomicU64,
}

impl JobPool {
    pub fn new(orchestrator: Arc<Orchestrator>, worker_count: usize) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }

        let (job_sender, job_receiver) = bounded::<Ticketed>(worker_count * 2);
        let (result_sender, result_receiver) = unbounded::<JobOutcome>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let worker_orchestrator = Arc::clone(&orchestrator);

            let handle = thread::Builder::new()
                .name(format!("synthgen-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, job_rx, result_tx, worker_orchestrator))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
            next_ticket: AtomicU64::new(1),
        })
    }

    /// Queues a job and returns the ticket its outcome will carry. Blocks
    /// while the queue is full.
    pub fn submit(&self, request: GenerationRequest) -> Result<u64, WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.job_sender
            .send(Ticketed { ticket, request })
            .map_err(|_| WorkerError::ChannelClosed)?;
        Ok(ticket)
    }

    pub fn try_recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.try_recv().ok()
    }

    /// Blocks until an outcome arrives. `None` once every worker is gone.
    pub fn recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.recv().ok()
    }

    /// Stops accepting jobs. Already queued jobs still run.
    pub fn shutdown(&self) {
        info!("Shutting down job pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Waits for queued jobs to finish and joins every worker. Outcomes not
    /// yet received are returned.
    pub fn wait(self) -> Vec<JobOutcome> {
        // Drop sender to signal workers to exit once the queue is drained
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
        self.result_receiver.try_iter().collect()
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Ticketed>,
    result_sender: Sender<JobOutcome>,
    orchestrator: Arc<Orchestrator>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(Ticketed { ticket, request }) => {
                debug!("Worker {} running ticket {}", worker_id, ticket);

                let result =
                    orchestrator.submit(&request.label, request.noise_level, request.output_size);

                let outcome = JobOutcome {
                    ticket,
                    request,
                    result,
                };
                if let Err(e) = result_sender.send(outcome) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
