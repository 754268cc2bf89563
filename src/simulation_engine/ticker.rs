use crate::control_system::SignalActor;
use crate::monitoring::recorder::Recorder;
use crate::shared_data::SimulationEvent;
use crate::simulation_engine::lock_actor;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A full tick interval passed.
    Elapsed,
    /// Shutdown was requested while waiting.
    Shutdown,
}

/// Paces one actor task: waits out the tick interval unless shutdown is signalled first.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Ticker {
    pub fn new(interval: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self { interval, shutdown }
    }

    // A dropped sender counts as shutdown.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow() || self.shutdown.has_changed().is_err()
    }

    pub async fn wait(&mut self) -> TickOutcome {
        if self.is_shutdown() {
            return TickOutcome::Shutdown;
        }
        tokio::select! {
            _ = sleep(self.interval) => TickOutcome::Elapsed,
            _ = self.shutdown.wait_for(|stop| *stop) => TickOutcome::Shutdown,
        }
    }
}

/// The loop each actor task runs: emit a snapshot, wait one tick, advance.
///
/// Shutdown is only observed at the loop top and during the wait, so an
/// advance that has started always completes under the actor's lock.
pub async fn drive_actor<A: SignalActor>(
    actor: Arc<Mutex<A>>,
    mut ticker: Ticker,
    recorder: Arc<dyn Recorder>,
) {
    let location = lock_actor(&actor).location().to_string();
    log::debug!("Actor task for {} started", location);
    loop {
        if ticker.is_shutdown() {
            break;
        }
        let snapshot = lock_actor(&actor).actor_snapshot();
        record_blocking(&recorder, &location, vec![SimulationEvent::Snapshot(snapshot)]).await;

        if ticker.wait().await == TickOutcome::Shutdown {
            break;
        }

        let events = lock_actor(&actor).advance();
        if !events.is_empty() {
            record_blocking(&recorder, &location, events).await;
        }
    }
    log::debug!("Actor task for {} stopped", location);
}

// Recorders may append to files, so they run on the blocking pool. Awaiting
// the handle keeps this actor's events in order.
async fn record_blocking(
    recorder: &Arc<dyn Recorder>,
    location: &str,
    events: Vec<SimulationEvent>,
) {
    let recorder = Arc::clone(recorder);
    let result = tokio::task::spawn_blocking(move || {
        for event in &events {
            recorder.record(event);
        }
    })
    .await;
    if let Err(e) = result {
        log::error!("Recording events for {} failed: {}", location, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_system::PedestrianCrossing;
    use std::thread;

    #[tokio::test(start_paused = true)]
    async fn wait_elapses_after_interval() {
        let (_tx, rx) = watch::channel(false);
        let mut ticker = Ticker::new(Duration::from_secs(1), rx);
        let start = tokio::time::Instant::now();
        assert_eq!(ticker.wait().await, TickOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_early_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let mut ticker = Ticker::new(Duration::from_secs(60), rx);
        let waiter = tokio::spawn(async move { ticker.wait().await });
        tokio::task::yield_now().await;
        tx.send_replace(true);
        assert_eq!(waiter.await.unwrap(), TickOutcome::Shutdown);
    }

    #[derive(Default)]
    struct ThreadTrackingRecorder {
        threads: Mutex<Vec<thread::ThreadId>>,
    }

    impl Recorder for ThreadTrackingRecorder {
        fn record(&self, _event: &SimulationEvent) {
            self.threads.lock().unwrap().push(thread::current().id());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recording_runs_off_the_runtime_thread() {
        let recorder = Arc::new(ThreadTrackingRecorder::default());
        let crossing = Arc::new(Mutex::new(PedestrianCrossing::new("Oak Crosswalk")));
        let (tx, rx) = watch::channel(false);
        let ticker = Ticker::new(Duration::from_secs(1), rx);
        let task = tokio::spawn(drive_actor(
            crossing,
            ticker,
            recorder.clone() as Arc<dyn Recorder>,
        ));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        tx.send_replace(true);
        task.await.unwrap();

        let runtime_thread = thread::current().id();
        let threads = recorder.threads.lock().unwrap();
        // one snapshot before each of the three waits
        assert_eq!(threads.len(), 3);
        assert!(threads.iter().all(|id| *id != runtime_thread));
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_shutdown() {
        let (tx, rx) = watch::channel(false);
        let mut ticker = Ticker::new(Duration::from_secs(60), rx);
        drop(tx);
        assert!(ticker.is_shutdown());
        assert_eq!(ticker.wait().await, TickOutcome::Shutdown);
    }
}
