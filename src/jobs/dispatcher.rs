use anyhow::{bail, Result};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A unit of background work: one job's pipeline execution
pub type PipelineTask = BoxFuture<'static, ()>;

/// Fixed-size worker pool for pipeline executions.
///
/// Submissions are queued FIFO and picked up by the first idle worker. Each task
/// runs in its own tokio task so a panic only takes down that job.
pub struct Dispatcher {
    width: usize,
    tx: Mutex<Option<mpsc::UnboundedSender<PipelineTask>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    queued: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
}

impl Dispatcher {
    /// Spawn `width` workers on the current tokio runtime
    pub fn start(width: usize) -> Self {
        let width = width.max(1);
        let (tx, rx) = mpsc::unbounded_channel::<PipelineTask>();
        let rx = Arc::new(Mutex::new(rx));
        let queued = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));

        let workers = (0..width)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let queued = Arc::clone(&queued);
                let active = Arc::clone(&active);
                tokio::spawn(worker_loop(id, rx, queued, active))
            })
            .collect();

        info!("Dispatcher started with {} workers", width);

        Self {
            width,
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            queued,
            active,
        }
    }

    /// Queue a task without waiting for it to start
    pub async fn submit(&self, task: PipelineTask) -> Result<()> {
        let tx = self.tx.lock().await;
        let Some(tx) = tx.as_ref() else {
            bail!("Dispatcher is shut down");
        };

        self.queued.fetch_add(1, Ordering::SeqCst);
        if tx.send(task).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            bail!("Dispatcher workers have exited");
        }

        Ok(())
    }

    /// Stop accepting work and wait for queued and running tasks to finish
    pub async fn shutdown(&self) {
        info!("Dispatcher draining ({} queued, {} running)", self.queued(), self.active());

        // Dropping the sender lets workers exit once the queue is empty
        self.tx.lock().await.take();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for (id, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("Dispatcher worker {} panicked: {}", id, e);
            }
        }

        info!("Dispatcher stopped");
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Tasks submitted but not yet picked up
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Tasks currently executing
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

async fn worker_loop(
    id: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<PipelineTask>>>,
    queued: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
) {
    loop {
        // The receiver lock is fair, so idle workers take tasks in turn
        let task = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(task) = task else {
            break;
        };

        queued.fetch_sub(1, Ordering::SeqCst);
        active.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = tokio::spawn(task).await {
            error!("Dispatcher worker {} task panicked: {}", id, e);
        }

        active.fetch_sub(1, Ordering::SeqCst);
    }
}
