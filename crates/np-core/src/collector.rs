//! Collection session lifecycle.
//!
//! A `NetworkCollector` owns the aggregation window and the two background
//! tasks of a session: the capture producer and the stats consumer. There
//! is no ambient global state; the collector instance is the session.
//!
//! Shutdown is cooperative and best-effort: `stop()` sets the shared signal
//! and joins both tasks against one bounded deadline. A task that fails to
//! exit in time is abandoned with a warning rather than forcibly killed.

use crate::aggregate::{self, AggregationWindow};
use crate::capture;
use crate::ingest::{self, EventReceiver, PopResult};
use crate::snapshot::build_snapshot;
use chrono::Utc;
use ipnet::IpNet;
use np_common::{Error, MetricsSnapshot, MonitorConfig, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

struct CollectionTasks {
    producer: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

impl CollectionTasks {
    fn alive(&self) -> bool {
        !self.producer.is_finished() || !self.consumer.is_finished()
    }
}

/// Owns one collection session: window, stop signal, and task handles.
pub struct NetworkCollector {
    config: MonitorConfig,
    window: Arc<RwLock<AggregationWindow>>,
    stop: Arc<AtomicBool>,
    tasks: Mutex<Option<CollectionTasks>>,
}

impl NetworkCollector {
    /// Build a collector from validated configuration.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        let window = Arc::new(RwLock::new(AggregationWindow::new(
            config.latency_reservoir_capacity,
        )));
        Ok(NetworkCollector {
            config,
            window,
            stop: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(None),
        })
    }

    /// Start the collection session. A second start while running is a
    /// no-op with a warning; a stale (finished) session is replaced.
    pub fn start(&self) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if tasks.as_ref().is_some_and(|t| t.alive()) {
            warn!("collection already running; ignoring start");
            return Ok(());
        }

        self.stop.store(false, Ordering::Relaxed);
        self.window
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .reset();

        let provider = capture::select_provider(&self.config);
        info!(provider = provider.kind(), "collection session starting");

        let (tx, rx) = ingest::channel();

        let stop = Arc::clone(&self.stop);
        let producer = thread::Builder::new()
            .name("np-capture".into())
            .spawn(move || provider.run(tx, &stop))
            .map_err(|e| Error::Collection(format!("failed to spawn producer: {e}")))?;

        let stop = Arc::clone(&self.stop);
        let window = Arc::clone(&self.window);
        let local_ranges = self.config.local_ranges.clone();
        let pop_timeout = self.config.queue_pop_timeout;
        let consumer = thread::Builder::new()
            .name("np-aggregate".into())
            .spawn(move || consume_events(rx, window, local_ranges, pop_timeout, &stop))
            .map_err(|e| {
                // Wind the producer down instead of leaking it.
                self.stop.store(true, Ordering::Relaxed);
                Error::Collection(format!("failed to spawn consumer: {e}"))
            })?;

        *tasks = Some(CollectionTasks { producer, consumer });
        Ok(())
    }

    /// Stop the collection session. Stop before start is a no-op. Returns
    /// within roughly the configured shutdown timeout regardless of task
    /// cooperation.
    pub fn stop(&self) {
        let taken = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(tasks) = taken else {
            debug!("stop requested but collection is not running");
            return;
        };

        self.stop.store(true, Ordering::Relaxed);
        let deadline = Instant::now() + self.config.shutdown_timeout;
        join_until(tasks.producer, deadline, "np-capture");
        join_until(tasks.consumer, deadline, "np-aggregate");
        info!("collection session stopped");
    }

    /// Whether a session is currently running.
    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| t.alive())
    }

    /// Project the current window into a snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let window = self.window.read().unwrap_or_else(|e| e.into_inner());
        build_snapshot(&window, Utc::now(), self.config.top_n)
    }

    /// The active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Drop for NetworkCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Consumer task: fold events into the window until the queue closes or
/// the stop signal is observed on an idle wake. Buffered events drain
/// before the producer hangup is reported, so stopping never truncates an
/// event mid-application.
fn consume_events(
    rx: EventReceiver,
    window: Arc<RwLock<AggregationWindow>>,
    local_ranges: Vec<IpNet>,
    pop_timeout: Duration,
    stop: &AtomicBool,
) {
    let mut rng = rand::rng();
    loop {
        match rx.pop(pop_timeout) {
            PopResult::Event(event) => {
                let mut guard = window.write().unwrap_or_else(|e| e.into_inner());
                aggregate::apply_event(&mut guard, &event, &local_ranges, &mut rng);
            }
            PopResult::Empty => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            PopResult::Closed => break,
        }
    }
    debug!("aggregation consumer exiting");
}

/// Join a task against a shared deadline; abandon it if the deadline
/// passes.
fn join_until(handle: JoinHandle<()>, deadline: Instant, name: &str) {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(task = name, "task did not exit before deadline; abandoning");
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    if handle.join().is_err() {
        warn!(task = name, "task panicked during session");
    }
}
