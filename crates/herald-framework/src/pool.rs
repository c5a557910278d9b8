//! Bounded worker pool.
//!
//! Gateways push events into an [`EventSink`]; a fixed number of worker tasks
//! pull them off a bounded queue and run each through the [`Dispatcher`].
//!
//! ```text
//!             ┌──────────── bounded mpsc ────────────┐
//! gateway ──▶ │ EventSink ─▶ [ev][ev][ev] ─▶ receiver │ ──▶ worker 0..N ──▶ Dispatcher
//!             └──────────────────────────────────────┘
//! ```
//!
//! Whichever worker is idle takes the next event, so events may finish out of
//! order. Within one event the router runs before the bus, on one worker.
//!
//! [`shutdown`](WorkerPool::shutdown) lets every worker finish the event it is
//! on, then closes the queue and dispatches what is still buffered before
//! returning.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::dispatcher::Dispatcher;
use herald_core::{BoxedEvent, EventSink, SinkResult};

/// Sizing of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker tasks.
    pub workers: usize,
    /// Events the queue holds before senders have to wait.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<BoxedEvent>>>;

/// A fixed set of dispatch workers fed by a bounded queue.
pub struct WorkerPool {
    dispatcher: Arc<Dispatcher>,
    sender: mpsc::Sender<BoxedEvent>,
    receiver: SharedReceiver,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    token: CancellationToken,
    processed: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawns the workers onto the current tokio runtime.
    ///
    /// Zero workers or zero capacity are raised to one.
    pub fn spawn(dispatcher: Arc<Dispatcher>, config: PoolConfig) -> Self {
        let workers = config.workers.max(1);
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let token = CancellationToken::new();
        let processed = Arc::new(AtomicUsize::new(0));

        let handles = (0..workers)
            .map(|id| {
                let worker = run_worker(
                    Arc::clone(&dispatcher),
                    Arc::clone(&receiver),
                    token.clone(),
                    Arc::clone(&processed),
                );
                tokio::spawn(worker.instrument(info_span!("worker", id)))
            })
            .collect();

        info!(workers, queue_capacity = config.queue_capacity, "Worker pool started");

        Self {
            dispatcher,
            sender,
            receiver,
            workers: parking_lot::Mutex::new(handles),
            token,
            processed,
        }
    }

    /// A sink feeding this pool's queue.
    pub fn sink(&self) -> EventSink {
        EventSink::new(self.sender.clone())
    }

    /// Queues an event, waiting for capacity.
    pub async fn submit(&self, event: impl Into<BoxedEvent>) -> SinkResult<()> {
        self.sink().send(event).await
    }

    /// Number of events dispatched so far.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Stops the workers and drains the queue.
    ///
    /// Sinks report [`SinkError::Closed`](herald_core::SinkError::Closed)
    /// once this returns. Calling it again is a no-op.
    ///
    /// May be called from a handler running on one of this pool's workers.
    /// That worker is not joined; it exits on its own once the handler
    /// returns.
    pub async fn shutdown(&self) {
        self.token.cancel();

        let current = tokio::task::try_id();
        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if current == Some(handle.id()) {
                debug!("Shutdown called from a worker, detaching it");
                continue;
            }
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }

        let mut receiver = self.receiver.lock().await;
        receiver.close();

        let mut drained = 0usize;
        while let Ok(event) = receiver.try_recv() {
            self.dispatcher.dispatch(event).await;
            self.processed.fetch_add(1, Ordering::SeqCst);
            drained += 1;
        }

        info!(drained, processed = self.processed(), "Worker pool stopped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.lock().len())
            .field("running", &self.is_running())
            .field("processed", &self.processed())
            .finish()
    }
}

async fn run_worker(
    dispatcher: Arc<Dispatcher>,
    receiver: SharedReceiver,
    token: CancellationToken,
    processed: Arc<AtomicUsize>,
) {
    debug!("Worker started");

    loop {
        let event = tokio::select! {
            biased;
            () = token.cancelled() => break,
            event = async { receiver.lock().await.recv().await } => match event {
                Some(event) => event,
                None => break,
            },
        };

        dispatcher.dispatch(event).await;
        processed.fetch_add(1, Ordering::SeqCst);
    }

    debug!("Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::listener::Listener;
    use herald_core::{Ready, SinkError};
    use std::time::Duration;

    fn counting_dispatcher(counter: &Arc<AtomicUsize>, delay: Duration) -> Arc<Dispatcher> {
        let dispatcher = Arc::new(Dispatcher::new());
        let c = Arc::clone(counter);
        dispatcher.register_listener(
            Listener::builder("count")
                .on_any(move |_| {
                    let c = Arc::clone(&c);
                    async move {
                        tokio::time::sleep(delay).await;
                        c.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .build()
                .unwrap(),
        );
        dispatcher
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_submitted_event_is_processed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::spawn(
            counting_dispatcher(&counter, Duration::ZERO),
            PoolConfig {
                workers: 3,
                queue_capacity: 8,
            },
        );

        for _ in 0..100 {
            pool.submit(Ready::default()).await.unwrap();
        }
        pool.shutdown().await;

        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(pool.processed(), 100);
        assert!(!pool.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_events() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::spawn(
            counting_dispatcher(&counter, Duration::from_millis(5)),
            PoolConfig {
                workers: 1,
                queue_capacity: 16,
            },
        );

        let sink = pool.sink();
        for _ in 0..10 {
            sink.try_send(Ready::default()).unwrap();
        }
        pool.shutdown().await;

        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert!(matches!(sink.try_send(Ready::default()), Err(SinkError::Closed)));
    }

    #[tokio::test]
    async fn test_failing_handlers_do_not_kill_workers() {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.register_listener(
            Listener::builder("flaky")
                .on_any(|event: BoxedEvent| async move {
                    if event.is::<Ready>() {
                        panic!("not ready");
                    }
                    Err(HandlerError::msg("always failing"))
                })
                .build()
                .unwrap(),
        );
        let pool = WorkerPool::spawn(Arc::clone(&dispatcher), PoolConfig::default());

        for _ in 0..20 {
            pool.submit(Ready::default()).await.unwrap();
        }
        pool.shutdown().await;

        assert_eq!(pool.processed(), 20);
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_harmless() {
        let pool = WorkerPool::spawn(Arc::new(Dispatcher::new()), PoolConfig::default());
        pool.shutdown().await;
        pool.shutdown().await;
        assert!(pool.sink().is_closed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_from_a_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = counting_dispatcher(&counter, Duration::from_millis(2));
        let pool = Arc::new(WorkerPool::spawn(
            Arc::clone(&dispatcher),
            PoolConfig {
                workers: 2,
                queue_capacity: 32,
            },
        ));

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let done_tx = Arc::new(parking_lot::Mutex::new(Some(done_tx)));
        let weak = Arc::downgrade(&pool);
        dispatcher.register_listener(
            Listener::builder("stopper")
                .on(move |_: herald_core::EventContext<herald_core::MemberLeft>| {
                    let weak = weak.clone();
                    let done_tx = Arc::clone(&done_tx);
                    async move {
                        if let Some(pool) = weak.upgrade() {
                            pool.shutdown().await;
                        }
                        if let Some(tx) = done_tx.lock().take() {
                            let _ = tx.send(());
                        }
                        Ok(())
                    }
                })
                .build()
                .unwrap(),
        );

        let sink = pool.sink();
        sink.send(herald_core::MemberLeft {
            guild: herald_core::Guild::new(1, "home"),
            user: herald_core::User::new(2, "bye"),
        })
        .await
        .unwrap();
        let mut accepted = 0;
        for _ in 0..10 {
            if sink.try_send(Ready::default()).is_ok() {
                accepted += 1;
            }
        }

        tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("shutdown from a handler returned")
            .unwrap();

        assert!(!pool.is_running());
        assert!(sink.is_closed());
        // the member event plus every queued event was dispatched
        assert_eq!(counter.load(Ordering::SeqCst), accepted + 1);
    }

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 1024);
    }
}
