use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::{AlignerError, Aligner, AlignmentResult, Sequence};

/// Fixed set of alignment threads fed from one bounded queue.
///
/// At most `threads + queue_depth` jobs exist at once, which caps the number
/// of live DP matrices.
pub struct WorkerPool {
    work_tx: Option<Sender<WorkItem>>,
    result_rx: Receiver<WorkResult>,
    workers: Vec<thread::JoinHandle<()>>,
}

struct WorkItem {
    index: usize,
    aligner: Aligner,
    seq1: Arc<Sequence>,
    seq2: Arc<Sequence>,
}

struct WorkResult {
    index: usize,
    worker_id: usize,
    result: Result<AlignmentResult, AlignerError>,
}

impl WorkerPool {
    pub fn new(threads: usize, queue_depth: usize) -> Result<Self, AlignerError> {
        if threads == 0 {
            return Err(AlignerError::InvalidParameter(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let (work_tx, work_rx) = bounded::<WorkItem>(queue_depth);
        let (result_tx, result_rx) = unbounded::<WorkResult>();
        let mut workers = Vec::with_capacity(threads);

        for worker_id in 0..threads {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let worker = thread::Builder::new()
                .name(format!("align-worker-{}", worker_id))
                .spawn(move || Self::worker(worker_id, work_rx, result_tx))?;
            workers.push(worker);
        }
        log::debug!("started {} alignment workers (queue depth {})", threads, queue_depth);

        Ok(Self {
            work_tx: Some(work_tx),
            result_rx,
            workers,
        })
    }

    /// Pool sized to the machine, with a queue twice the thread count.
    pub fn with_default_size() -> Result<Self, AlignerError> {
        let threads = num_cpus::get().max(1);
        Self::new(threads, threads * 2)
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    fn worker(worker_id: usize, work_rx: Receiver<WorkItem>, result_tx: Sender<WorkResult>) {
        while let Ok(work) = work_rx.recv() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                work.aligner.align_sequences(&work.seq1, &work.seq2)
            }));
            let result = outcome.map_err(|_| {
                AlignerError::WorkerPool(format!("alignment job {} panicked", work.index))
            });

            if result_tx
                .send(WorkResult {
                    index: work.index,
                    worker_id,
                    result,
                })
                .is_err()
            {
                break;
            }
        }
        log::trace!("worker {} exiting", worker_id);
    }

    /// Align every pair and return results in submission order.
    pub fn align_all<I>(&mut self, aligner: &Aligner, pairs: I) -> Result<Vec<AlignmentResult>, AlignerError>
    where
        I: IntoIterator<Item = (Arc<Sequence>, Arc<Sequence>)>,
    {
        let work_tx = self
            .work_tx
            .as_ref()
            .ok_or_else(|| AlignerError::WorkerPool("pool is shut down".to_string()))?;

        let mut submitted = 0;
        for (index, (seq1, seq2)) in pairs.into_iter().enumerate() {
            // Blocks while the queue is full
            work_tx
                .send(WorkItem {
                    index,
                    aligner: *aligner,
                    seq1,
                    seq2,
                })
                .map_err(|e| AlignerError::WorkerPool(e.to_string()))?;
            submitted += 1;
        }

        // Drain every submitted job even after a failure so no stale result
        // is left behind for the next batch.
        let mut slots: Vec<Option<AlignmentResult>> = vec![None; submitted];
        let mut first_error = None;
        for _ in 0..submitted {
            let work_result = self
                .result_rx
                .recv()
                .map_err(|e| AlignerError::WorkerPool(e.to_string()))?;
            log::trace!("job {} finished on worker {}", work_result.index, work_result.worker_id);
            match work_result.result {
                Ok(result) => slots[work_result.index] = Some(result),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| AlignerError::WorkerPool(format!("missing result for job {}", index)))
            })
            .collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue stops the workers
        self.work_tx.take();

        while let Some(worker) = self.workers.pop() {
            let _ = worker.join();
        }
    }
}
