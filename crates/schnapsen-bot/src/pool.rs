//! Fixed-size thread pool with static batch assignment.
//!
//! Each worker owns a bounded job queue. A call to [`WorkerPool::run_batches`]
//! deals its tasks round-robin into one batch per worker, sends every batch
//! up front and blocks until all results are back. There is no work
//! stealing and no cancellation of a running task.

use crate::error::SearchError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};
use tracing::{Level, event};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Jobs queued per worker beyond the one it is running.
const QUEUE_DEPTH: usize = 1;

type TaskResult<R> = (usize, usize, Result<R, String>);

#[derive(Debug)]
pub struct WorkerPool {
    senders: Vec<SyncSender<Job>>,
    handles: Vec<JoinHandle<()>>,
    shut_down: bool,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, SearchError> {
        if workers == 0 {
            return Err(SearchError::InvalidConfig {
                field: "num_workers",
                message: "must be at least 1".into(),
            });
        }
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let (tx, rx) = mpsc::sync_channel::<Job>(QUEUE_DEPTH);
            let handle = thread::Builder::new()
                .name(format!("schnapsen-worker-{worker}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                })
                .map_err(|err| SearchError::WorkerFailed {
                    worker,
                    message: err.to_string(),
                })?;
            senders.push(tx);
            handles.push(handle);
        }
        Ok(Self {
            senders,
            handles,
            shut_down: false,
        })
    }

    pub fn size(&self) -> usize {
        self.senders.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Applies `work` to every task and returns the results in task order.
    ///
    /// Task `i` runs on worker `i % size`. A panic inside `work` ends that
    /// worker's batch and fails the whole call with
    /// [`SearchError::WorkerFailed`]; nothing is retried.
    pub fn run_batches<T, R, F>(&self, tasks: Vec<T>, work: F) -> Result<Vec<R>, SearchError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        if self.shut_down {
            return Err(SearchError::PoolShutdown);
        }
        let total = tasks.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let workers = self.size();
        let mut batches: Vec<Vec<(usize, T)>> = (0..workers).map(|_| Vec::new()).collect();
        for (index, task) in tasks.into_iter().enumerate() {
            batches[index % workers].push((index, task));
        }

        let work = Arc::new(work);
        let (result_tx, result_rx) = mpsc::sync_channel::<TaskResult<R>>(total);
        for (worker, batch) in batches.into_iter().enumerate() {
            if batch.is_empty() {
                continue;
            }
            if tracing::enabled!(Level::TRACE) {
                event!(
                    target: "schnapsen_bot::pool",
                    Level::TRACE,
                    worker,
                    batch = batch.len(),
                );
            }
            let work = Arc::clone(&work);
            let results = result_tx.clone();
            let job: Job = Box::new(move || {
                for (index, task) in batch {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (*work)(task)))
                        .map_err(panic_message);
                    let failed = outcome.is_err();
                    if results.send((worker, index, outcome)).is_err() || failed {
                        break;
                    }
                }
            });
            self.senders[worker]
                .send(job)
                .map_err(|_| SearchError::WorkerFailed {
                    worker,
                    message: "worker thread is gone".into(),
                })?;
        }
        drop(result_tx);

        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut failure = None;
        for (worker, index, outcome) in result_rx.iter() {
            match outcome {
                Ok(result) => slots[index] = Some(result),
                Err(message) => {
                    event!(
                        target: "schnapsen_bot::pool",
                        Level::WARN,
                        worker,
                        task = index,
                        message = message.as_str(),
                        "worker task panicked"
                    );
                    failure.get_or_insert(SearchError::WorkerFailed { worker, message });
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| SearchError::WorkerFailed {
                    worker: index % workers,
                    message: format!("no result for task {index}"),
                })
            })
            .collect()
    }

    /// Closes every job queue and joins the threads. Later calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.senders.clear();
        for (worker, handle) in self.handles.drain(..).enumerate() {
            if handle.join().is_err() {
                event!(
                    target: "schnapsen_bot::pool",
                    Level::WARN,
                    worker,
                    "worker thread panicked outside a task"
                );
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_come_back_in_task_order() {
        let pool = WorkerPool::new(3).unwrap();
        let squares = pool.run_batches((0..10u64).collect(), |x| x * x).unwrap();
        assert_eq!(squares, (0..10u64).map(|x| x * x).collect::<Vec<_>>());
    }

    #[test]
    fn tasks_are_dealt_round_robin() {
        let pool = WorkerPool::new(2).unwrap();
        let names = pool
            .run_batches((0..4).collect(), |_: usize| {
                thread::current().name().map(str::to_string)
            })
            .unwrap();
        assert_eq!(names[0], names[2]);
        assert_eq!(names[1], names[3]);
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn panics_fail_the_request_but_not_the_pool() {
        let pool = WorkerPool::new(2).unwrap();
        let result = pool.run_batches((0..4).collect(), |x: u32| {
            if x == 3 {
                panic!("boom at {x}");
            }
            x
        });
        assert_eq!(
            result,
            Err(SearchError::WorkerFailed {
                worker: 1,
                message: "boom at 3".into()
            })
        );
        assert_eq!(pool.run_batches(vec![1u32, 2], |x| x + 1).unwrap(), vec![2, 3]);
    }

    #[test]
    fn shutdown_is_enforced() {
        let mut pool = WorkerPool::new(2).unwrap();
        pool.shutdown();
        assert!(pool.is_shut_down());
        assert_eq!(pool.run_batches(vec![1u8], |x| x), Err(SearchError::PoolShutdown));
        pool.shutdown();
    }

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(SearchError::InvalidConfig { field: "num_workers", .. })
        ));
    }
}
