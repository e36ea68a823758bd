//! Session manager: the domain store plus its durable slot mirror.
//!
//! Apply-before-persist order:
//!   1. store mutation (may be rejected; nothing is written then)
//!   2. encode and write the collections the mutation touched
//!
//! A storage failure never fails the mutation. The session logs it, drops
//! the slot store and carries on in memory for the rest of its life.
//! Concurrency: `SharedSession` serializes every read-modify-write cycle
//! behind one mutex.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use tracing::{debug, info, warn};

use bridge_core::clock::Clock;
use bridge_core::commands::{Command, IdGenerator, TransitionResult};
use bridge_core::domain::{
    BloodInventoryItem, BridgeState, CampRegistrant, Collection, DeliveryVehicle, LogisticsEvent,
    LogisticsEventKind, NewCampRegistration, NewUrgentRequest, Notification, UrgentRequest,
};
use bridge_core::hashing::canonical_hash;
use bridge_core::invariants::validate_invariants;
use bridge_core::logistics::SimulationConfig;
use bridge_core::seed::create_seed_state;
use bridge_core::{BridgeError, BridgeStore};

use crate::error::PersistError;
use crate::slot_codec::{decode_into, encode_state};
use crate::storage::{slot_name, SlotStore};

const SIMULATION_SLOTS: [Collection; 2] = [Collection::Vehicles, Collection::LogisticsEvents];

/// Store plus optional durable mirror.
pub struct Session {
    store: BridgeStore,
    slots: Option<Box<dyn SlotStore>>,
}

impl Session {
    /// Session with no durable mirror.
    pub fn in_memory(store: BridgeStore) -> Self {
        Self { store, slots: None }
    }

    /// Hydrate from `slots`.
    ///
    /// Each missing or unreadable slot falls back to its seed collection and
    /// is rewritten. If the assembled state fails the invariant checks the
    /// whole seed is used instead. A read failure of the backend itself
    /// switches to memory-only.
    pub fn open(
        slots: Box<dyn SlotStore>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> Result<Self, PersistError> {
        let seed = create_seed_state(clock.now());
        let mut state = seed.clone();
        let mut stale: Vec<Collection> = Vec::new();
        let mut slots = Some(slots);

        for collection in Collection::ALL {
            let Some(backend) = slots.as_deref() else {
                break;
            };
            let slot = slot_name(collection);
            match backend.read(slot) {
                Ok(Some(text)) => {
                    if let Err(err) = decode_into(&mut state, collection, &text) {
                        warn!(slot, error = %err, "discarding unreadable slot, using seed data");
                        stale.push(collection);
                    }
                }
                Ok(None) => {
                    debug!(slot, "slot empty, using seed data");
                    stale.push(collection);
                }
                Err(err) => {
                    warn!(
                        backend = backend.name(),
                        error = %err,
                        "slot store unavailable, continuing in memory"
                    );
                    slots = None;
                    state = seed.clone();
                }
            }
        }

        if let Err(violation) = validate_invariants(&state) {
            warn!(%violation, "persisted state rejected, reverting to seed data");
            state = seed;
            stale = Collection::ALL.to_vec();
        }

        let store = BridgeStore::with_state(state, clock, ids)
            .map_err(|e| PersistError::InvariantViolation(e.to_string()))?;
        let mut session = Self { store, slots };
        if session.slots.is_some() {
            info!(
                restored = Collection::ALL.len() - stale.len(),
                seeded = stale.len(),
                "session hydrated"
            );
            session.persist(&stale);
        }
        Ok(session)
    }

    pub fn store(&self) -> &BridgeStore {
        &self.store
    }

    pub fn state(&self) -> &BridgeState {
        self.store.state()
    }

    /// False once the session has fallen back to memory-only.
    pub fn is_persistent(&self) -> bool {
        self.slots.is_some()
    }

    pub fn current_hash(&self) -> Result<String, PersistError> {
        canonical_hash(self.store.state()).map_err(|e| PersistError::Serialization {
            slot: "state".to_string(),
            message: e.to_string(),
        })
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.store.take_notifications()
    }

    // -- Mutations --

    /// Apply a raw command, then persist what it touched.
    pub fn apply(&mut self, command: Command) -> Result<TransitionResult, BridgeError> {
        let affected = command.affects();
        let result = self.store.apply(command)?;
        self.persist(affected);
        Ok(result)
    }

    pub fn set_inventory_quantity(
        &mut self,
        item_id: &str,
        quantity: u32,
    ) -> Result<Option<BloodInventoryItem>, BridgeError> {
        let item = self.store.set_inventory_quantity(item_id, quantity)?;
        if item.is_some() {
            self.persist(&[Collection::Inventory]);
        }
        Ok(item)
    }

    pub fn create_urgent_request(
        &mut self,
        fields: NewUrgentRequest,
    ) -> Result<UrgentRequest, BridgeError> {
        let request = self.store.create_urgent_request(fields)?;
        self.persist(&[Collection::Requests]);
        Ok(request)
    }

    pub fn fulfill_request(
        &mut self,
        request_id: &str,
        donor_name: &str,
    ) -> Result<UrgentRequest, BridgeError> {
        let request = self.store.fulfill_request(request_id, donor_name)?;
        self.persist(&[Collection::Requests]);
        Ok(request)
    }

    pub fn register_for_camp(
        &mut self,
        fields: NewCampRegistration,
    ) -> Result<CampRegistrant, BridgeError> {
        let registrant = self.store.register_for_camp(fields)?;
        self.persist(&[Collection::Registrants]);
        Ok(registrant)
    }

    pub fn record_logistics_event(
        &mut self,
        message: &str,
        kind: LogisticsEventKind,
    ) -> Result<LogisticsEvent, BridgeError> {
        let event = self.store.record_logistics_event(message, kind)?;
        self.persist(&[Collection::LogisticsEvents]);
        Ok(event)
    }

    pub fn dispatch_vehicle<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &SimulationConfig,
    ) -> Result<Option<DeliveryVehicle>, BridgeError> {
        let vehicle = self.store.dispatch_vehicle(rng, config)?;
        if vehicle.is_some() {
            self.persist(&SIMULATION_SLOTS);
        }
        Ok(vehicle)
    }

    /// Persists only when some vehicle was on the road.
    pub fn advance_vehicles(&mut self) -> Result<Vec<DeliveryVehicle>, BridgeError> {
        let was_moving = self.store.state().in_transit_count() > 0;
        let delivered = self.store.advance_vehicles()?;
        if was_moving {
            self.persist(&SIMULATION_SLOTS);
        }
        Ok(delivered)
    }

    // -- Persistence --

    fn persist(&mut self, collections: &[Collection]) {
        let Some(backend) = self.slots.as_deref() else {
            return;
        };
        let outcome = collections.iter().try_for_each(|c| {
            let text = encode_state(self.store.state(), *c)?;
            backend.write(slot_name(*c), &text)
        });
        if let Err(err) = outcome {
            warn!(
                backend = backend.name(),
                error = %err,
                "slot write failed, continuing in memory"
            );
            self.slots = None;
        }
    }
}

/// Thread-safe session handle. Clones share the same session.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Exclusive access for a read-modify-write cycle.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    pub fn snapshot(&self) -> BridgeState {
        self.inner.lock().state().clone()
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        self.inner.lock().take_notifications()
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.lock().is_persistent()
    }
}
