//! Domain state store.
//!
//! Stateful wrapper over the pure transition layer. Owns the state, the
//! clock, the id source and the notification outbox. Every mutation goes
//! through `apply`, which swaps in the new state only when the transition
//! and its invariant check succeed.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::commands::{Command, CommandContext, IdGenerator, Outcome, TransitionResult, UuidIds};
use crate::domain::{
    BloodInventoryItem, BridgeState, CampRegistrant, DeliveryVehicle, DonationCamp, Donor,
    Hospital, LogisticsEvent, LogisticsEventKind, NewCampRegistration, NewUrgentRequest,
    Notification, UrgentRequest,
};
use crate::error::{BridgeError, Result};
use crate::invariants::validate_invariants;
use crate::logistics::{plan_dispatch, SimulationConfig};
use crate::seed::create_seed_state;
use crate::transitions::apply_command;

/// Single source of truth for every collection during a session.
pub struct BridgeStore {
    state: BridgeState,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    outbox: Vec<Notification>,
}

impl BridgeStore {
    /// Store over the seed dataset, real time and UUID ids.
    pub fn seeded() -> Self {
        let clock = SystemClock;
        let state = create_seed_state(clock.now());
        Self {
            state,
            clock: Box::new(clock),
            ids: Box::new(UuidIds),
            outbox: Vec::new(),
        }
    }

    /// Store over an existing state. The state must pass the invariant checks.
    /// `ids` resumes past every identifier the state already holds.
    pub fn with_state(
        state: BridgeState,
        clock: Box<dyn Clock>,
        mut ids: Box<dyn IdGenerator>,
    ) -> Result<Self> {
        validate_invariants(&state).map_err(BridgeError::InvariantViolation)?;
        ids.resume_after(&state);
        Ok(Self {
            state,
            clock,
            ids,
            outbox: Vec::new(),
        })
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // -- Read accessors --

    pub fn hospitals(&self) -> &[Hospital] {
        &self.state.hospitals
    }

    pub fn inventory(&self) -> &[BloodInventoryItem] {
        &self.state.inventory
    }

    pub fn requests(&self) -> &[UrgentRequest] {
        &self.state.requests
    }

    pub fn camps(&self) -> &[DonationCamp] {
        &self.state.camps
    }

    pub fn donors(&self) -> &[Donor] {
        &self.state.donors
    }

    pub fn registrants(&self) -> &[CampRegistrant] {
        &self.state.registrants
    }

    pub fn vehicles(&self) -> &[DeliveryVehicle] {
        &self.state.vehicles
    }

    /// Newest first.
    pub fn logistics_events(&self) -> impl Iterator<Item = &LogisticsEvent> + '_ {
        self.state.logistics_events.iter()
    }

    /// Drain pending user-facing notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // -- Mutations --

    /// Apply one command:
    ///   1. Stamp it with the clock and id source
    ///   2. Delegate to `transitions::apply_command` (clone, mutate, validate)
    ///   3. Swap the new state in and queue its notification
    pub fn apply(&mut self, command: Command) -> Result<TransitionResult> {
        let mut ctx = CommandContext {
            now: self.clock.now(),
            ids: self.ids.as_mut(),
        };
        match apply_command(&self.state, &command, &mut ctx) {
            Ok((next, result)) => {
                self.state = next;
                if let Some(n) = &result.notification {
                    self.outbox.push(n.clone());
                }
                Ok(result)
            }
            Err(err) => {
                warn!(command = command.name(), error = %err, "command rejected");
                Err(err)
            }
        }
    }

    /// Returns the updated item, or `None` when no item has that id.
    pub fn set_inventory_quantity(
        &mut self,
        item_id: &str,
        quantity: u32,
    ) -> Result<Option<BloodInventoryItem>> {
        let result = self.apply(Command::SetInventoryQuantity {
            item_id: item_id.to_string(),
            quantity,
        })?;
        match result.outcome {
            Outcome::InventoryUpdated(Some(item)) => {
                info!(item = %item.id, quantity, status = ?item.status, "inventory updated");
                Ok(Some(item))
            }
            _ => {
                debug!(item = item_id, "set quantity on unknown item ignored");
                Ok(None)
            }
        }
    }

    pub fn create_urgent_request(&mut self, fields: NewUrgentRequest) -> Result<UrgentRequest> {
        let result = self.apply(Command::CreateUrgentRequest(fields))?;
        match result.outcome {
            Outcome::RequestCreated(request) => {
                info!(
                    request = %request.id,
                    blood_type = %request.blood_type,
                    urgency = %request.urgency,
                    "urgent request created"
                );
                Ok(request)
            }
            other => Err(unexpected(result.command, &other)),
        }
    }

    pub fn fulfill_request(&mut self, request_id: &str, donor_name: &str) -> Result<UrgentRequest> {
        let result = self.apply(Command::FulfillRequest {
            request_id: request_id.to_string(),
            donor_name: donor_name.to_string(),
        })?;
        match result.outcome {
            Outcome::RequestFulfilled(request) => {
                info!(request = %request.id, "request fulfilled");
                Ok(request)
            }
            other => Err(unexpected(result.command, &other)),
        }
    }

    pub fn register_for_camp(&mut self, fields: NewCampRegistration) -> Result<CampRegistrant> {
        let result = self.apply(Command::RegisterForCamp(fields))?;
        match result.outcome {
            Outcome::Registered(registrant) => {
                info!(
                    registrant = %registrant.id,
                    camp = %registrant.camp_id,
                    ticket = %registrant.ticket_id,
                    "camp registration"
                );
                Ok(registrant)
            }
            other => Err(unexpected(result.command, &other)),
        }
    }

    pub fn record_logistics_event(
        &mut self,
        message: &str,
        kind: LogisticsEventKind,
    ) -> Result<LogisticsEvent> {
        let result = self.apply(Command::RecordLogisticsEvent {
            message: message.to_string(),
            kind,
        })?;
        match result.outcome {
            Outcome::EventRecorded(event) => Ok(event),
            other => Err(unexpected(result.command, &other)),
        }
    }

    /// One dispatch tick. `Ok(None)` when the fleet is at capacity.
    /// An inconsistent `config` is a `Validation` error.
    pub fn dispatch_vehicle<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        config: &SimulationConfig,
    ) -> Result<Option<DeliveryVehicle>> {
        config.validate().map_err(BridgeError::Validation)?;
        let Some(plan) = plan_dispatch(&self.state, rng, config) else {
            debug!(
                in_transit = self.state.in_transit_count(),
                cap = config.max_in_transit,
                "dispatch skipped"
            );
            return Ok(None);
        };
        let result = self.apply(Command::DispatchVehicle(plan))?;
        match result.outcome {
            Outcome::Dispatched(vehicle) => {
                info!(
                    vehicle = %vehicle.vehicle_id,
                    from = %vehicle.origin.name,
                    to = %vehicle.destination.name,
                    "vehicle dispatched"
                );
                Ok(Some(vehicle))
            }
            other => Err(unexpected(result.command, &other)),
        }
    }

    /// One advance tick. Returns the vehicles that arrived during it.
    pub fn advance_vehicles(&mut self) -> Result<Vec<DeliveryVehicle>> {
        let result = self.apply(Command::AdvanceVehicles)?;
        match result.outcome {
            Outcome::Advanced { moved, delivered } => {
                debug!(moved, "vehicles advanced");
                for v in &delivered {
                    info!(vehicle = %v.vehicle_id, to = %v.destination.name, "vehicle delivered");
                }
                Ok(delivered)
            }
            other => Err(unexpected(result.command, &other)),
        }
    }
}

impl Default for BridgeStore {
    fn default() -> Self {
        Self::seeded()
    }
}

fn unexpected(command: &str, outcome: &Outcome) -> BridgeError {
    BridgeError::InvariantViolation(format!(
        "{} produced unexpected outcome {:?}",
        command, outcome
    ))
}
