//! Integration tests for bridge_runtime.
//!
//! File-backed tests use temporary directories for isolation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use bridge_core::analytics::suggestion_candidates;
use bridge_core::clock::ManualClock;
use bridge_core::commands::{Command, SequentialIds};
use bridge_core::domain::{
    BloodType, NewUrgentRequest, RequestStatus, ResourceStatus, UrgencyLevel, VehicleStatus,
};
use bridge_core::logistics::SimulationConfig;
use bridge_core::seed::create_seed_state;

use bridge_runtime::advisory::{AdvisoryService, RetryPolicy, StubModel};
use bridge_runtime::error::AdvisoryError;
use bridge_runtime::session::{Session, SharedSession};
use bridge_runtime::simulation::SimulationController;
use bridge_runtime::slot_codec::encode_slot;
use bridge_runtime::storage::FileSlotStore;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

fn open(dir: &Path) -> Session {
    Session::open(
        Box::new(FileSlotStore::open(dir).unwrap()),
        Box::new(ManualClock::new(start())),
        Box::new(SequentialIds::new()),
    )
    .unwrap()
}

fn request() -> NewUrgentRequest {
    NewUrgentRequest {
        blood_type: BloodType::ONeg,
        quantity: 4,
        urgency: UrgencyLevel::Critical,
        hospital_name: "Apollo Hospital".into(),
        hospital_location: "Belapur".into(),
        broadcast_radius: 5,
    }
}

// ── Persistence ────────────────────────────────────────────────────

#[test]
fn first_open_writes_every_slot() {
    let dir = TempDir::new().unwrap();
    let session = open(dir.path());
    assert!(session.is_persistent());
    for slot in [
        "hospitals",
        "blood-inventory",
        "urgent-requests",
        "donation-camps",
        "donors",
        "camp-registrants",
        "delivery-vehicles",
        "logistics-events",
    ] {
        assert!(dir.path().join(format!("{}.json", slot)).exists(), "{} missing", slot);
    }
}

#[test]
fn mutations_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (hash, request_id) = {
        let mut session = open(dir.path());
        session.set_inventory_quantity("inv-3", 20).unwrap();
        let req = session.create_urgent_request(request()).unwrap();
        (session.current_hash().unwrap(), req.id)
    };

    let session = open(dir.path());
    let item = session.state().inventory.iter().find(|i| i.id == "inv-3").unwrap();
    assert_eq!(item.quantity, 20);
    assert_eq!(item.status, ResourceStatus::Available);
    assert_eq!(session.state().requests[0].id, request_id);
    assert_eq!(session.current_hash().unwrap(), hash);
}

#[test]
fn reopened_session_keeps_issuing_fresh_ids() {
    let dir = TempDir::new().unwrap();
    let first = {
        let mut session = open(dir.path());
        session.create_urgent_request(request()).unwrap()
    };

    let mut session = open(dir.path());
    let second = session.create_urgent_request(request()).unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(session.state().requests[0].id, second.id);
    assert_eq!(session.state().requests[1].id, first.id);
}

#[test]
fn raw_command_persists_its_collection() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = open(dir.path());
        session
            .apply(Command::FulfillRequest {
                request_id: "req-seed-1".into(),
                donor_name: "Asha Verma".into(),
            })
            .unwrap();
    }
    let session = open(dir.path());
    let req = session.state().request("req-seed-1").unwrap();
    assert_eq!(req.status, RequestStatus::Fulfilled);
    assert_eq!(req.fulfilled_by.as_deref(), Some("Asha Verma"));
}

#[test]
fn corrupted_slot_falls_back_to_seed_for_that_slot_only() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = open(dir.path());
        session.set_inventory_quantity("inv-1", 1).unwrap();
    }
    fs::write(dir.path().join("donors.json"), "{ not json").unwrap();

    let session = open(dir.path());
    assert_eq!(session.state().donors, create_seed_state(start()).donors);
    assert_eq!(session.state().inventory[0].quantity, 1);

    // the bad slot was rewritten
    let text = fs::read_to_string(dir.path().join("donors.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["version"], 1);
}

#[test]
fn invariant_breaking_slot_reverts_everything_to_seed() {
    let dir = TempDir::new().unwrap();
    {
        let mut session = open(dir.path());
        session.create_urgent_request(request()).unwrap();
    }

    let mut inventory = create_seed_state(start()).inventory;
    inventory[0].quantity = 2; // status stays Available: inconsistent
    let text = encode_slot("blood-inventory", &inventory).unwrap();
    fs::write(dir.path().join("blood-inventory.json"), text).unwrap();

    let session = open(dir.path());
    let seed = create_seed_state(start());
    assert_eq!(session.state().inventory, seed.inventory);
    assert_eq!(session.state().requests, seed.requests);
}

#[tokio::test(start_paused = true)]
async fn simulated_vehicles_are_persisted() {
    let dir = TempDir::new().unwrap();
    let shared = SharedSession::new(open(dir.path()));
    let mut sim = SimulationController::new(shared.clone(), SimulationConfig::default(), Some(11));
    sim.start().unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    sim.stop();

    let live = shared.snapshot();
    assert_eq!(live.in_transit_count(), 1);
    drop(shared);

    let session = open(dir.path());
    assert_eq!(session.state().vehicles, live.vehicles);
    assert_eq!(session.state().logistics_events, live.logistics_events);
    assert!(session
        .state()
        .vehicles
        .iter()
        .any(|v| v.status == VehicleStatus::InTransit));
}

// ── Advisory ───────────────────────────────────────────────────────

#[tokio::test]
async fn suggestions_use_active_requests_from_the_session() {
    let session = Session::in_memory(bridge_core::BridgeStore::seeded());
    let candidates = suggestion_candidates(&session.state().requests);
    assert_eq!(candidates.len(), 2);

    let model = StubModel::new();
    model.push_reply(
        "```json\n[{\"hospitalName\":\"City General Hospital\",\"hospitalLocation\":\"Mumbai\",\
         \"priorityScore\":92,\"reason\":\"Critical need for your type\"}]\n```",
    );
    let service = AdvisoryService::new(model);
    let out = service
        .suggest_donation_locations(BloodType::ONeg, &candidates)
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].hospital_name, "City General Hospital");

    let sent = service.model().requests();
    assert!(sent[0].prompt.contains("Hospital: City General Hospital"));
    assert!(sent[0].prompt.contains("Hospital: Metro Health Center"));
    assert!(!sent[0].prompt.contains("Sunshine Medical"));
}

#[tokio::test(start_paused = true)]
async fn advisory_failures_surface_after_retries_are_spent() {
    let model = StubModel::new();
    model.push_error(AdvisoryError::Status { status: 500, body: "boom".into() });
    model.push_error(AdvisoryError::Status { status: 500, body: "boom".into() });
    let service = AdvisoryService::new(model).with_retry(RetryPolicy::with_retries(1));

    let inventory = create_seed_state(start()).inventory;
    let out = service.forecast_supply(BloodType::ONeg, &inventory).await;
    assert_eq!(out, Err(AdvisoryError::Status { status: 500, body: "boom".into() }));
    assert_eq!(service.model().requests().len(), 2);
}
