//! Invariant checks over the whole state.
//!
//! Run after every transition and when hydrating persisted state.
//! Returns the first failure as a tagged message.

use std::collections::BTreeSet;

use crate::domain::{BridgeState, RequestStatus, VehicleStatus};
use crate::rules::{derive_status, MAX_DONOR_AGE, MAX_LOGISTICS_EVENTS, MIN_DONOR_AGE};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. `Err(message)` on the first failure.
pub fn validate_invariants(state: &BridgeState) -> Result<(), String> {
    check_unique_ids(state)?;
    check_inventory_status(state)?;
    check_inventory_hospital_refs(state)?;
    check_request_lifecycle(state)?;
    check_registrants(state)?;
    check_vehicle_transit(state)?;
    check_event_log_capacity(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_unique_ids(state: &BridgeState) -> Result<(), String> {
    unique("hospitals", state.hospitals.iter().map(|h| h.id.as_str()))?;
    unique("inventory", state.inventory.iter().map(|i| i.id.as_str()))?;
    unique("requests", state.requests.iter().map(|r| r.id.as_str()))?;
    unique("camps", state.camps.iter().map(|c| c.id.as_str()))?;
    unique("donors", state.donors.iter().map(|d| d.id.as_str()))?;
    unique("registrants", state.registrants.iter().map(|r| r.id.as_str()))?;
    unique("vehicles", state.vehicles.iter().map(|v| v.id.as_str()))?;
    unique(
        "logistics_events",
        state.logistics_events.iter().map(|e| e.id.as_str()),
    )?;
    Ok(())
}

fn unique<'a>(collection: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(format!(
                "[INVARIANT:unique_ids] empty identifier in {}",
                collection
            ));
        }
        if !seen.insert(id) {
            return Err(format!(
                "[INVARIANT:unique_ids] duplicate identifier {:?} in {}",
                id, collection
            ));
        }
    }
    Ok(())
}

/// Status is a pure function of quantity.
fn check_inventory_status(state: &BridgeState) -> Result<(), String> {
    for item in &state.inventory {
        let expected = derive_status(item.quantity);
        if item.status != expected {
            return Err(format!(
                "[INVARIANT:inventory_status] item {:?} has quantity {} but status {:?}, expected {:?}",
                item.id, item.quantity, item.status, expected
            ));
        }
    }
    Ok(())
}

fn check_inventory_hospital_refs(state: &BridgeState) -> Result<(), String> {
    for item in &state.inventory {
        if state.hospital(&item.hospital_id).is_none() {
            return Err(format!(
                "[INVARIANT:inventory_hospital_refs] item {:?} references unknown hospital {:?}",
                item.id, item.hospital_id
            ));
        }
    }
    Ok(())
}

/// Only Fulfilled requests carry a fulfiller.
fn check_request_lifecycle(state: &BridgeState) -> Result<(), String> {
    for req in &state.requests {
        let has_fulfiller = req
            .fulfilled_by
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false);
        match req.status {
            RequestStatus::Fulfilled if !has_fulfiller => {
                return Err(format!(
                    "[INVARIANT:request_lifecycle] request {:?} is Fulfilled without fulfilledBy",
                    req.id
                ));
            }
            RequestStatus::Active | RequestStatus::Expired if req.fulfilled_by.is_some() => {
                return Err(format!(
                    "[INVARIANT:request_lifecycle] request {:?} is {} but records fulfilledBy",
                    req.id, req.status
                ));
            }
            _ => {}
        }
        if req.quantity == 0 {
            return Err(format!(
                "[INVARIANT:request_lifecycle] request {:?} has zero quantity",
                req.id
            ));
        }
    }
    Ok(())
}

fn check_registrants(state: &BridgeState) -> Result<(), String> {
    let mut tickets: BTreeSet<&str> = BTreeSet::new();
    for reg in &state.registrants {
        if !(MIN_DONOR_AGE..=MAX_DONOR_AGE).contains(&reg.age) {
            return Err(format!(
                "[INVARIANT:registrants] registrant {:?} has age {} outside {}-{}",
                reg.id, reg.age, MIN_DONOR_AGE, MAX_DONOR_AGE
            ));
        }
        if state.camp(&reg.camp_id).is_none() {
            return Err(format!(
                "[INVARIANT:registrants] registrant {:?} references unknown camp {:?}",
                reg.id, reg.camp_id
            ));
        }
        if reg.ticket_id.is_empty() || !tickets.insert(reg.ticket_id.as_str()) {
            return Err(format!(
                "[INVARIANT:registrants] registrant {:?} has missing or duplicate ticket {:?}",
                reg.id, reg.ticket_id
            ));
        }
    }
    Ok(())
}

/// A vehicle on the road always knows when it left and how long it has.
fn check_vehicle_transit(state: &BridgeState) -> Result<(), String> {
    for v in &state.vehicles {
        if v.status != VehicleStatus::InTransit {
            continue;
        }
        match v.transit {
            Some(window) if window.duration_ms > 0 => {}
            _ => {
                return Err(format!(
                    "[INVARIANT:vehicle_transit] vehicle {:?} is In Transit without a valid transit window",
                    v.id
                ));
            }
        }
    }
    Ok(())
}

fn check_event_log_capacity(state: &BridgeState) -> Result<(), String> {
    if state.logistics_events.len() > MAX_LOGISTICS_EVENTS {
        return Err(format!(
            "[INVARIANT:event_log_capacity] {} events exceed capacity {}",
            state.logistics_events.len(),
            MAX_LOGISTICS_EVENTS
        ));
    }
    Ok(())
}
