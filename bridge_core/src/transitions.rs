//! Centralized transition logic.
//!
//! Every state mutation lives here. `apply_command` clones the state,
//! mutates the clone, validates invariants on it and hands it back. The
//! input state is never touched, so a rejected command leaves nothing
//! half-applied.

use crate::commands::{Command, CommandContext, Outcome, TransitionResult};
use crate::domain::{
    BridgeState, CampRegistrant, DeliveryVehicle, GeoPoint, LogisticsEvent, LogisticsEventKind,
    NewCampRegistration, NewUrgentRequest, Notification, RequestStatus, TransitWindow,
    UrgentRequest, VehicleStatus,
};
use crate::error::{BridgeError, Result};
use crate::invariants::validate_invariants;
use crate::logistics::{delivery_message, dispatch_message, DispatchPlan, DispatchTarget};
use crate::rules::{
    derive_status, require_text, validate_age, validate_broadcast_radius, validate_photo,
    MAX_LOGISTICS_EVENTS, MIN_FULL_NAME_LEN,
};

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `command` to `state` and return `(new_state, result)`.
pub fn apply_command(
    state: &BridgeState,
    command: &Command,
    ctx: &mut CommandContext<'_>,
) -> Result<(BridgeState, TransitionResult)> {
    let mut next = state.clone();

    let (outcome, notification) = match command {
        Command::SetInventoryQuantity { item_id, quantity } => {
            apply_set_inventory_quantity(&mut next, item_id, *quantity)
        }
        Command::CreateUrgentRequest(fields) => apply_create_urgent_request(&mut next, fields, ctx)?,
        Command::FulfillRequest {
            request_id,
            donor_name,
        } => apply_fulfill_request(&mut next, request_id, donor_name)?,
        Command::RegisterForCamp(fields) => apply_register_for_camp(&mut next, fields, ctx)?,
        Command::RecordLogisticsEvent { message, kind } => {
            let message = require_text("message", message)?;
            let event = push_event(&mut next, message.to_string(), *kind, ctx);
            (Outcome::EventRecorded(event), None)
        }
        Command::DispatchVehicle(plan) => apply_dispatch_vehicle(&mut next, plan, ctx)?,
        Command::AdvanceVehicles => apply_advance_vehicles(&mut next, ctx),
    };

    validate_invariants(&next).map_err(BridgeError::InvariantViolation)?;

    Ok((
        next,
        TransitionResult {
            command: command.name(),
            outcome,
            notification,
        },
    ))
}

type Applied = (Outcome, Option<Notification>);

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

/// Unknown ids are a silent no-op.
fn apply_set_inventory_quantity(state: &mut BridgeState, item_id: &str, quantity: u32) -> Applied {
    let Some(item) = state.inventory.iter_mut().find(|i| i.id == item_id) else {
        return (Outcome::InventoryUpdated(None), None);
    };

    item.quantity = quantity;
    item.status = derive_status(quantity);

    let notification = Notification::new(
        "Inventory Updated",
        format!("Quantity for item {} has been set to {}.", item_id, quantity),
    );
    (Outcome::InventoryUpdated(Some(item.clone())), Some(notification))
}

fn apply_create_urgent_request(
    state: &mut BridgeState,
    fields: &NewUrgentRequest,
    ctx: &mut CommandContext<'_>,
) -> Result<Applied> {
    if fields.quantity == 0 {
        return Err(BridgeError::validation("quantity must be at least 1"));
    }
    let hospital_name = require_text("hospitalName", &fields.hospital_name)?;
    let hospital_location = require_text("hospitalLocation", &fields.hospital_location)?;
    validate_broadcast_radius(fields.broadcast_radius)?;

    let request = UrgentRequest {
        id: ctx.ids.next_id("req"),
        blood_type: fields.blood_type,
        quantity: fields.quantity,
        urgency: fields.urgency,
        hospital_name: hospital_name.to_string(),
        hospital_location: hospital_location.to_string(),
        broadcast_radius: fields.broadcast_radius,
        created_at: ctx.now,
        status: RequestStatus::Active,
        fulfilled_by: None,
    };
    state.requests.insert(0, request.clone());

    let notification = Notification::new(
        "Urgent Request Sent",
        format!("Request for {} has been broadcasted.", request.blood_type),
    );
    Ok((Outcome::RequestCreated(request), Some(notification)))
}

/// Active -> Fulfilled, exactly once.
fn apply_fulfill_request(
    state: &mut BridgeState,
    request_id: &str,
    donor_name: &str,
) -> Result<Applied> {
    let donor_name = require_text("donorName", donor_name)?;

    let request = state
        .requests
        .iter_mut()
        .find(|r| r.id == request_id)
        .ok_or_else(|| BridgeError::UnknownRequest(request_id.to_string()))?;

    if request.status != RequestStatus::Active {
        return Err(BridgeError::InvalidTransition {
            id: request.id.clone(),
            status: request.status,
        });
    }

    request.status = RequestStatus::Fulfilled;
    request.fulfilled_by = Some(donor_name.to_string());

    let notification = Notification::new(
        "Donation Confirmed",
        "Thank you for your commitment to donate!",
    );
    Ok((Outcome::RequestFulfilled(request.clone()), Some(notification)))
}

fn apply_register_for_camp(
    state: &mut BridgeState,
    fields: &NewCampRegistration,
    ctx: &mut CommandContext<'_>,
) -> Result<Applied> {
    let full_name = require_text("fullName", &fields.full_name)?;
    if full_name.chars().count() < MIN_FULL_NAME_LEN {
        return Err(BridgeError::validation(format!(
            "fullName must be at least {} characters",
            MIN_FULL_NAME_LEN
        )));
    }
    validate_age(fields.age)?;
    let id_proof = require_text("idProof", &fields.id_proof)?;
    validate_photo(&fields.photo)?;
    let camp_id = require_text("campId", &fields.camp_id)?;
    if state.camp(camp_id).is_none() {
        return Err(BridgeError::UnknownCamp(camp_id.to_string()));
    }

    let registrant = CampRegistrant {
        id: ctx.ids.next_id("reg"),
        full_name: full_name.to_string(),
        age: fields.age,
        id_proof: id_proof.to_string(),
        photo: fields.photo.trim().to_string(),
        camp_id: camp_id.to_string(),
        ticket_id: ctx.ids.next_ticket(),
    };
    state.registrants.push(registrant.clone());

    let notification = Notification::new(
        "Registration Successful!",
        "Your participation ticket has been generated.",
    );
    Ok((Outcome::Registered(registrant), Some(notification)))
}

/// Put a vehicle on the road. Re-dispatched vehicles restart from their origin.
fn apply_dispatch_vehicle(
    state: &mut BridgeState,
    plan: &DispatchPlan,
    ctx: &mut CommandContext<'_>,
) -> Result<Applied> {
    if plan.duration_ms == 0 {
        return Err(BridgeError::validation("transit duration must be positive"));
    }
    let transit = TransitWindow {
        departed_at: ctx.now,
        duration_ms: plan.duration_ms,
    };

    let vehicle = match &plan.target {
        DispatchTarget::Idle { id } => {
            let vehicle = state
                .vehicles
                .iter_mut()
                .find(|v| &v.id == id)
                .ok_or_else(|| BridgeError::validation(format!("unknown vehicle {:?}", id)))?;
            if vehicle.status != VehicleStatus::Delivered {
                return Err(BridgeError::validation(format!(
                    "vehicle {:?} is not idle",
                    id
                )));
            }
            vehicle.status = VehicleStatus::InTransit;
            vehicle.current_position = vehicle.origin.point();
            vehicle.transit = Some(transit);
            vehicle.clone()
        }
        DispatchTarget::Synthesized(draft) => {
            if draft.origin.name == draft.destination.name {
                return Err(BridgeError::validation(
                    "origin and destination must differ",
                ));
            }
            let vehicle = DeliveryVehicle {
                id: ctx.ids.next_id("veh"),
                vehicle_id: draft.vehicle_id.clone(),
                driver_name: draft.driver_name.clone(),
                blood_type: draft.blood_type,
                units: draft.units,
                current_position: draft.origin.point(),
                origin: draft.origin.clone(),
                destination: draft.destination.clone(),
                status: VehicleStatus::InTransit,
                transit: Some(transit),
            };
            state.vehicles.push(vehicle.clone());
            vehicle
        }
    };

    push_event(state, dispatch_message(&vehicle), LogisticsEventKind::Dispatch, ctx);
    Ok((Outcome::Dispatched(vehicle), None))
}

/// Interpolate every vehicle on the road; arrivals snap to the destination.
fn apply_advance_vehicles(state: &mut BridgeState, ctx: &mut CommandContext<'_>) -> Applied {
    let now = ctx.now;
    let mut moved = 0usize;
    let mut delivered: Vec<DeliveryVehicle> = Vec::new();

    for vehicle in state.vehicles.iter_mut() {
        if vehicle.status != VehicleStatus::InTransit {
            continue;
        }
        let Some(window) = vehicle.transit else {
            continue;
        };

        if window.is_complete(now) {
            vehicle.current_position = vehicle.destination.point();
            vehicle.status = VehicleStatus::Delivered;
            delivered.push(vehicle.clone());
        } else {
            let t = window.progress(now);
            vehicle.current_position =
                GeoPoint::lerp(vehicle.origin.point(), vehicle.destination.point(), t);
        }
        moved += 1;
    }

    for vehicle in &delivered {
        push_event(state, delivery_message(vehicle), LogisticsEventKind::Delivery, ctx);
    }

    (Outcome::Advanced { moved, delivered }, None)
}

// ---------------------------------------------------------------------------
// Helper: bounded event log
// ---------------------------------------------------------------------------

/// Newest first; the oldest entries fall off past capacity.
fn push_event(
    state: &mut BridgeState,
    message: String,
    kind: LogisticsEventKind,
    ctx: &mut CommandContext<'_>,
) -> LogisticsEvent {
    let event = LogisticsEvent {
        id: ctx.ids.next_id("evt"),
        message,
        kind,
        timestamp: ctx.now,
    };
    state.logistics_events.push_front(event.clone());
    state.logistics_events.truncate(MAX_LOGISTICS_EVENTS);
    event
}
