//! Bounded fan-out with result aggregation.
//!
//! A [`Collector`] spawns worker tasks that each report zero or more
//! outcomes into a bounded queue. Draining waits until every worker is done
//! (the queue closes once the last sender is gone) and splits the outcomes
//! into values and a joined [`MultiError`].
//!
//! Dropping a collector before draining aborts all of its workers.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::debug;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::error::MultiError;

/// Values and errors gathered from a fan-out. Either side may be empty.
#[derive(Debug)]
pub struct Gathered<T> {
    pub values: Vec<T>,
    pub errors: MultiError,
}

impl<T> Gathered<T> {
    pub fn new(values: Vec<T>, errors: MultiError) -> Self {
        Self { values, errors }
    }

    /// Only values, no errors.
    pub fn ok(values: Vec<T>) -> Self {
        Self::new(values, MultiError::new())
    }

    /// No values, a single error.
    pub fn failed(error: anyhow::Error) -> Self {
        Self::new(Vec::new(), MultiError::from(error))
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Keep the values for which `keep` returns true.
    pub fn retain(mut self, keep: impl FnMut(&T) -> bool) -> Self {
        self.values.retain(keep);
        self
    }
}

impl<T> Default for Gathered<T> {
    fn default() -> Self {
        Self::ok(Vec::new())
    }
}

/// Handle a worker uses to report outcomes.
pub struct Sink<T> {
    tx: mpsc::Sender<Result<T>>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send + 'static> Sink<T> {
    /// Report one outcome. Waits while the queue is full.
    pub async fn send(&self, outcome: Result<T>) {
        // The receiver only disappears when the collector was dropped, in
        // which case this worker is being aborted anyway.
        let _ = self.tx.send(outcome).await;
    }

    pub async fn value(&self, value: T) {
        self.send(Ok(value)).await
    }

    pub async fn error(&self, error: anyhow::Error) {
        self.send(Err(error)).await
    }
}

/// A group of worker tasks feeding one bounded queue.
pub struct Collector<T> {
    tasks: JoinSet<()>,
    tx: mpsc::Sender<Result<T>>,
    rx: mpsc::Receiver<Result<T>>,
    limit: Option<Arc<Semaphore>>,
}

impl<T: Send + 'static> Collector<T> {
    /// Create a collector whose queue holds `capacity` outcomes.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tasks: JoinSet::new(),
            tx,
            rx,
            limit: None,
        }
    }

    /// Run at most `jobs` workers at the same time.
    pub fn with_limit(mut self, jobs: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(jobs.max(1))));
        self
    }

    /// Spawn a worker. It receives a [`Sink`] and may report any number of
    /// outcomes through it.
    pub fn spawn<F, Fut>(&mut self, worker: F)
    where
        F: FnOnce(Sink<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let sink = Sink {
            tx: self.tx.clone(),
        };
        let limit = self.limit.clone();
        self.tasks.spawn(async move {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            worker(sink).await;
        });
    }

    /// Spawn a worker that reports exactly one outcome.
    pub fn spawn_one<Fut>(&mut self, work: Fut)
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.spawn(|sink| async move { sink.send(work.await).await });
    }

    /// Wait for every worker and gather what they reported.
    pub async fn drain(self) -> Gathered<T> {
        let Collector {
            mut tasks,
            tx,
            mut rx,
            limit: _,
        } = self;
        // Only worker sinks keep the queue open from here on.
        drop(tx);

        let mut gathered = Gathered::default();
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Ok(value) => gathered.values.push(value),
                Err(error) => gathered.errors.push(error),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(join_error) = joined {
                debug!("Worker task did not complete: {}", join_error);
                gathered
                    .errors
                    .push(anyhow!("Worker task failed: {}", join_error));
            }
        }

        gathered
    }
}
