//! Store commands.
//!
//! Commands are pure data: the intent of one mutation plus its payload.
//! They carry no transition logic. Timestamps and fresh identifiers are
//! supplied separately through `CommandContext` so transitions stay pure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    BloodInventoryItem, BridgeState, CampRegistrant, Collection, DeliveryVehicle, LogisticsEvent,
    LogisticsEventKind, NewCampRegistration, NewUrgentRequest, Notification, UrgentRequest,
};
use crate::logistics::DispatchPlan;

/// One sanctioned mutation of the domain state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SetInventoryQuantity { item_id: String, quantity: u32 },
    CreateUrgentRequest(NewUrgentRequest),
    FulfillRequest { request_id: String, donor_name: String },
    RegisterForCamp(NewCampRegistration),
    RecordLogisticsEvent { message: String, kind: LogisticsEventKind },
    DispatchVehicle(DispatchPlan),
    AdvanceVehicles,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetInventoryQuantity { .. } => "set_inventory_quantity",
            Command::CreateUrgentRequest(_) => "create_urgent_request",
            Command::FulfillRequest { .. } => "fulfill_request",
            Command::RegisterForCamp(_) => "register_for_camp",
            Command::RecordLogisticsEvent { .. } => "record_logistics_event",
            Command::DispatchVehicle(_) => "dispatch_vehicle",
            Command::AdvanceVehicles => "advance_vehicles",
        }
    }

    /// Collections this command may rewrite. Everything else is untouched.
    pub fn affects(&self) -> &'static [Collection] {
        match self {
            Command::SetInventoryQuantity { .. } => &[Collection::Inventory],
            Command::CreateUrgentRequest(_) | Command::FulfillRequest { .. } => {
                &[Collection::Requests]
            }
            Command::RegisterForCamp(_) => &[Collection::Registrants],
            Command::RecordLogisticsEvent { .. } => &[Collection::LogisticsEvents],
            Command::DispatchVehicle(_) | Command::AdvanceVehicles => {
                &[Collection::Vehicles, Collection::LogisticsEvents]
            }
        }
    }
}

/// Source of fresh identifiers. Identifiers are never reused.
pub trait IdGenerator: Send {
    /// A new identifier of the form `<prefix>-<unique>`.
    fn next_id(&mut self, prefix: &str) -> String;

    /// A new camp ticket identifier.
    fn next_ticket(&mut self) -> String;

    /// Called once with the state the generator will extend, so that it
    /// never hands out an identifier that state already holds.
    fn resume_after(&mut self, _state: &BridgeState) {}
}

/// UUID v4 identifiers. Unique across sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4().simple())
    }

    fn next_ticket(&mut self) -> String {
        let raw = Uuid::new_v4().simple().to_string();
        format!("TICKET-{}", raw[..8].to_ascii_uppercase())
    }
}

/// Counter-based identifiers for reproducible runs.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}-{:06}", prefix, self.counter)
    }

    fn next_ticket(&mut self) -> String {
        self.counter += 1;
        format!("TICKET-{:08}", self.counter)
    }

    /// Continue past the highest numeric suffix present in `state`.
    fn resume_after(&mut self, state: &BridgeState) {
        let highest = existing_ids(state).filter_map(numeric_suffix).max().unwrap_or(0);
        self.counter = self.counter.max(highest);
    }
}

fn existing_ids(state: &BridgeState) -> impl Iterator<Item = &str> + '_ {
    state
        .hospitals
        .iter()
        .map(|h| h.id.as_str())
        .chain(state.inventory.iter().map(|i| i.id.as_str()))
        .chain(state.requests.iter().map(|r| r.id.as_str()))
        .chain(state.camps.iter().map(|c| c.id.as_str()))
        .chain(state.donors.iter().map(|d| d.id.as_str()))
        .chain(state.registrants.iter().map(|r| r.id.as_str()))
        .chain(state.registrants.iter().map(|r| r.ticket_id.as_str()))
        .chain(state.vehicles.iter().map(|v| v.id.as_str()))
        .chain(state.logistics_events.iter().map(|e| e.id.as_str()))
}

/// `req-000042` → 42. Identifiers without a numeric tail yield `None`.
fn numeric_suffix(id: &str) -> Option<u64> {
    id.rsplit_once('-')?.1.parse().ok()
}

/// Ambient inputs of a transition.
pub struct CommandContext<'a> {
    pub now: DateTime<Utc>,
    pub ids: &'a mut dyn IdGenerator,
}

/// What a transition produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `None` when no item matched the id.
    InventoryUpdated(Option<BloodInventoryItem>),
    RequestCreated(UrgentRequest),
    RequestFulfilled(UrgentRequest),
    Registered(CampRegistrant),
    EventRecorded(LogisticsEvent),
    Dispatched(DeliveryVehicle),
    /// Vehicles that reached their destination during this step.
    Advanced { moved: usize, delivered: Vec<DeliveryVehicle> },
}

/// Structured result of one applied command.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub command: &'static str,
    pub outcome: Outcome,
    pub notification: Option<Notification>,
}
