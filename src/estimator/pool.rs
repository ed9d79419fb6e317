//! A small fixed-size thread pool for background jobs.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted jobs on named worker threads. Dropping the pool lets the
/// queued jobs finish and joins every worker.
pub struct WorkerPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(name: &str, size: usize) -> io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(size.max(1));
        for n in 0..size.max(1) {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("{name}-{n}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                })?;
            workers.push(handle);
        }
        debug!(name, workers = workers.len(), "worker pool started");
        Ok(Self { tx: Some(tx), workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job. Returns `false` if the pool is shutting down.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.tx {
            Some(tx) => tx.send(Box::new(job)).is_ok(),
            None => false,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue ends each worker's loop once it is drained.
        self.tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}
