//! Timer-driven logistics simulation.
//!
//! Two repeating tokio tasks drive the store through a `SharedSession`:
//! dispatch (after an initial delay, then every `dispatch_interval`) and
//! advance (every `advance_interval`). Each tick is one synchronous
//! read-modify-write under the session lock, run on the blocking pool: a
//! file-backed session fsyncs its slots before the lock is released.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use bridge_core::domain::LogisticsEventKind;
use bridge_core::logistics::SimulationConfig;
use bridge_core::BridgeError;

use crate::session::SharedSession;

/// Start/stop handle over the two simulation tasks. Dropping it stops them.
pub struct SimulationController {
    session: SharedSession,
    config: SimulationConfig,
    seed: Option<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl SimulationController {
    /// `seed` makes the dispatch choices reproducible; `None` draws from entropy.
    pub fn new(session: SharedSession, config: SimulationConfig, seed: Option<u64>) -> Self {
        Self {
            session,
            config,
            seed,
            tasks: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawn both tasks. Must be called from within a tokio runtime.
    /// Starting a running controller is a no-op.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if self.is_running() {
            return Ok(());
        }
        self.config.validate().map_err(BridgeError::Validation)?;

        self.session
            .lock()
            .record_logistics_event("Logistics simulation started.", LogisticsEventKind::Info)?;

        let rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        self.tasks.push(tokio::spawn(dispatch_loop(
            self.session.clone(),
            self.config.clone(),
            rng,
        )));
        self.tasks.push(tokio::spawn(advance_loop(
            self.session.clone(),
            self.config.advance_interval,
        )));

        info!(
            dispatch_secs = self.config.dispatch_interval.as_secs_f64(),
            advance_secs = self.config.advance_interval.as_secs_f64(),
            max_in_transit = self.config.max_in_transit,
            "simulation started"
        );
        Ok(())
    }

    /// Abort both tasks. Idempotent.
    pub fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("simulation stopped");
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn dispatch_loop(session: SharedSession, config: SimulationConfig, mut rng: SmallRng) {
    let first = Instant::now() + config.initial_dispatch_delay;
    let mut ticker = time::interval_at(first, config.dispatch_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let (session, config) = (session.clone(), config.clone());
        let tick = task::spawn_blocking(move || {
            dispatch_tick(&session, &mut rng, &config);
            rng
        });
        match tick.await {
            Ok(returned) => rng = returned,
            Err(err) => {
                error!(error = %err, "dispatch tick aborted, stopping dispatch loop");
                return;
            }
        }
    }
}

async fn advance_loop(session: SharedSession, period: std::time::Duration) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let session = session.clone();
        if let Err(err) = task::spawn_blocking(move || advance_tick(&session)).await {
            error!(error = %err, "advance tick aborted, stopping advance loop");
            return;
        }
    }
}

fn dispatch_tick(session: &SharedSession, rng: &mut SmallRng, config: &SimulationConfig) {
    let mut guard = session.lock();
    match guard.dispatch_vehicle(rng, config) {
        Ok(Some(_)) => {}
        Ok(None) => debug!("dispatch tick: fleet at capacity"),
        Err(err) => warn!(error = %err, "dispatch tick failed"),
    }
}

fn advance_tick(session: &SharedSession) {
    let mut guard = session.lock();
    if let Err(err) = guard.advance_vehicles() {
        warn!(error = %err, "advance tick failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistError;
    use crate::session::Session;
    use crate::storage::{MemorySlotStore, SlotStore};
    use bridge_core::clock::ManualClock;
    use bridge_core::commands::SequentialIds;
    use bridge_core::domain::VehicleStatus;
    use bridge_core::seed::create_seed_state;
    use bridge_core::BridgeStore;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread::{self, ThreadId};
    use std::time::Duration;

    fn shared() -> SharedSession {
        SharedSession::new(Session::in_memory(BridgeStore::seeded()))
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    /// Memory slots that note which thread performed each write.
    #[derive(Default)]
    struct ThreadRecordingSlots {
        inner: MemorySlotStore,
        writers: Arc<Mutex<Vec<ThreadId>>>,
    }

    impl SlotStore for ThreadRecordingSlots {
        fn read(&self, slot: &str) -> Result<Option<String>, PersistError> {
            self.inner.read(slot)
        }
        fn write(&self, slot: &str, contents: &str) -> Result<(), PersistError> {
            self.writers.lock().push(thread::current().id());
            self.inner.write(slot, contents)
        }
        fn remove(&self, slot: &str) -> Result<(), PersistError> {
            self.inner.remove(slot)
        }
        fn name(&self) -> &str {
            "thread-recording"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_loop_delivers_each_vehicle_once() {
        let clock = ManualClock::new(start_time());
        let store = BridgeStore::with_state(
            create_seed_state(start_time()),
            Box::new(clock.clone()),
            Box::new(SequentialIds::new()),
        )
        .unwrap();
        let session = SharedSession::new(Session::in_memory(store));
        let mut sim = SimulationController::new(session.clone(), SimulationConfig::default(), Some(9));
        sim.start().unwrap();

        time::sleep(Duration::from_millis(2_500)).await;
        let dispatched = session.snapshot();
        assert_eq!(dispatched.in_transit_count(), 1);
        let vehicle_id = dispatched
            .vehicles
            .iter()
            .find(|v| v.status == VehicleStatus::InTransit)
            .map(|v| v.id.clone())
            .unwrap();

        // past the longest possible transit
        clock.advance(chrono::Duration::milliseconds(300_001));
        time::sleep(Duration::from_secs(1)).await;

        let delivered = session.snapshot();
        assert_eq!(delivered.in_transit_count(), 0);
        let vehicle = delivered.vehicles.iter().find(|v| v.id == vehicle_id).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Delivered);
        assert_eq!(vehicle.current_position, vehicle.destination.point());

        let deliveries = |events: &std::collections::VecDeque<bridge_core::domain::LogisticsEvent>| {
            events.iter().filter(|e| e.kind == LogisticsEventKind::Delivery).count()
        };
        assert_eq!(deliveries(&delivered.logistics_events), 1);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(deliveries(&session.snapshot().logistics_events), 1);
        sim.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn slot_writes_happen_off_the_async_thread() {
        let slots = ThreadRecordingSlots::default();
        let writers = slots.writers.clone();
        let session = Session::open(
            Box::new(slots),
            Box::new(ManualClock::new(start_time())),
            Box::new(SequentialIds::new()),
        )
        .unwrap();
        let session = SharedSession::new(session);
        let mut sim = SimulationController::new(session.clone(), SimulationConfig::default(), Some(2));
        sim.start().unwrap();
        writers.lock().clear();

        time::sleep(Duration::from_millis(3_500)).await;
        sim.stop();
        assert_eq!(session.snapshot().in_transit_count(), 1);

        let async_thread = thread::current().id();
        let recorded = writers.lock().clone();
        assert!(!recorded.is_empty());
        assert!(recorded.iter().all(|id| *id != async_thread));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatches_after_initial_delay_then_on_cadence() {
        let session = shared();
        let mut sim = SimulationController::new(session.clone(), SimulationConfig::default(), Some(1));
        sim.start().unwrap();
        assert!(sim.is_running());

        let events = session.snapshot().logistics_events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LogisticsEventKind::Info);

        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(session.snapshot().in_transit_count(), 0);

        time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(session.snapshot().in_transit_count(), 1);

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(session.snapshot().in_transit_count(), 2);

        sim.stop();
        assert!(!sim.is_running());
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(session.snapshot().in_transit_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent_and_drop_stops() {
        let session = shared();
        {
            let mut sim = SimulationController::new(session.clone(), SimulationConfig::default(), Some(5));
            sim.start().unwrap();
            sim.start().unwrap();
            assert_eq!(session.snapshot().logistics_events.len(), 1);
        }
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(session.snapshot().in_transit_count(), 0);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = SimulationConfig {
            advance_interval: Duration::ZERO,
            ..SimulationConfig::default()
        };
        let mut sim = SimulationController::new(shared(), config, None);
        assert!(matches!(sim.start(), Err(BridgeError::Validation(_))));
        assert!(!sim.is_running());
    }
}
