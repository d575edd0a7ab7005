use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::DispatcherConfig;
use crate::interfaces::worker::Worker;

type WorkerMap = Arc<RwLock<HashMap<String, Arc<dyn Worker>>>>;

/// Fires every registered worker once immediately, then again on a fixed
/// wall-clock interval until stopped. Each worker gets an independent
/// jitter delay per cycle and is skipped while its own `is_running` flag
/// is set, so a slow run never overlaps itself.
pub struct Dispatcher {
    workers: WorkerMap,
    config: DispatcherConfig,
    timer: Option<JoinHandle<()>>,
    stop: Option<watch::Sender<bool>>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            workers: Arc::new(RwLock::new(HashMap::new())),
            config,
            timer: None,
            stop: None,
        }
    }

    pub fn with_workers(config: DispatcherConfig, workers: Vec<Arc<dyn Worker>>) -> Self {
        let dispatcher = Self::new(config);
        for worker in workers {
            dispatcher.register(worker);
        }
        dispatcher
    }

    /// Inserts or replaces the entry for the worker's key. Workers
    /// registered while the dispatcher is running join from the next
    /// cycle.
    pub fn register(&self, worker: Arc<dyn Worker>) {
        let key = worker.key().to_string();
        tracing::debug!("registering worker {}", key);
        write_map(&self.workers).insert(key, worker);
    }

    pub fn worker_count(&self) -> usize {
        read_map(&self.workers).len()
    }

    /// True iff the repeating timer is installed. Says nothing about
    /// individual worker run state.
    pub fn is_running(&self) -> bool {
        self.stop.is_some()
    }

    pub fn start(&mut self) {
        if self.stop.is_some() {
            return;
        }
        let (tx, rx) = watch::channel(false);
        self.stop = Some(tx);

        let interval = self.config.interval();
        let config = self.config.clone();
        let workers = Arc::clone(&self.workers);

        // Initial cycle, detached on purpose; failures are logged inside
        // the cycle and the join result is discarded.
        tokio::spawn(run_cycle(snapshot(&workers), config.clone()));

        let handle = tokio::spawn(async move {
            let mut rx = rx;
            let first = tokio::time::Instant::now() + interval;
            let mut tick = tokio::time::interval_at(first, interval);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        // Cycles are spawned, not awaited, so the timer
                        // keeps wall-clock cadence even when a cycle
                        // outlives the interval.
                        tokio::spawn(run_cycle(snapshot(&workers), config.clone()));
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        self.timer = Some(handle);
    }

    /// Cancels future cycles and awaits the timer loop. Cycles already
    /// in flight, including their jitter delays, run to completion.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.timer.take() {
            let _ = handle.await;
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

fn read_map(workers: &WorkerMap) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn Worker>>> {
    workers.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_map(workers: &WorkerMap) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn Worker>>> {
    workers.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn snapshot(workers: &WorkerMap) -> Vec<Arc<dyn Worker>> {
    read_map(workers).values().cloned().collect()
}

/// One pass over the worker snapshot. Per worker: wait the jitter delay,
/// skip if the worker reports itself running, otherwise run it and log
/// any failure at warn. Completes only after every worker's sequence has
/// completed.
async fn run_cycle(workers: Vec<Arc<dyn Worker>>, config: DispatcherConfig) {
    let tasks = workers.into_iter().map(|worker| {
        let config = config.clone();
        async move {
            tokio::time::sleep(config.jitter_delay()).await;
            if worker.is_running() {
                tracing::debug!("worker {} still running, skipping this cycle", worker.key());
                return;
            }
            if let Err(err) = worker.run().await {
                tracing::warn!("worker {} failed: {}", worker.key(), err);
            }
        }
    });
    join_all(tasks).await;
}
