//! Logistics simulation planning.
//!
//! Chooses what the next dispatch should be. The state changes themselves
//! (departure, interpolation, arrival) live in `transitions`. Randomness is
//! always injected so seeded runs are reproducible.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{BloodType, BridgeState, DeliveryVehicle, NamedPoint, VehicleStatus};

/// Cadences and bounds of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// No dispatch happens while this many vehicles are in transit.
    pub max_in_transit: usize,
    pub min_transit_ms: u64,
    pub max_transit_ms: u64,
    pub dispatch_interval: Duration,
    pub advance_interval: Duration,
    /// Delay before the first dispatch after start.
    pub initial_dispatch_delay: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_in_transit: 8,
            min_transit_ms: 60_000,
            max_transit_ms: 300_000,
            dispatch_interval: Duration::from_secs(20),
            advance_interval: Duration::from_secs(1),
            initial_dispatch_delay: Duration::from_secs(2),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_transit_ms == 0 {
            return Err("min_transit_ms must be positive".to_string());
        }
        if self.min_transit_ms > self.max_transit_ms {
            return Err(format!(
                "min_transit_ms={} exceeds max_transit_ms={}",
                self.min_transit_ms, self.max_transit_ms
            ));
        }
        if self.dispatch_interval.is_zero() || self.advance_interval.is_zero() {
            return Err("simulation intervals must be non-zero".to_string());
        }
        Ok(())
    }
}

/// A vehicle to put on the road for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub vehicle_id: String,
    pub driver_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub origin: NamedPoint,
    pub destination: NamedPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchTarget {
    /// Re-dispatch an idle (`Delivered`) vehicle by its store id.
    Idle { id: String },
    /// Add a new vehicle between two registry hospitals.
    Synthesized(VehicleDraft),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPlan {
    pub target: DispatchTarget,
    pub duration_ms: u64,
}

const DRIVER_NAMES: [&str; 6] = [
    "Ravi Kumar",
    "Suresh Patil",
    "Anil Deshmukh",
    "Meera Joshi",
    "Farhan Shaikh",
    "Kavita Rao",
];

/// Decide the next dispatch, or `None` when the fleet is at capacity,
/// there is nothing to send or `config` fails validation.
pub fn plan_dispatch<R: Rng + ?Sized>(
    state: &BridgeState,
    rng: &mut R,
    config: &SimulationConfig,
) -> Option<DispatchPlan> {
    if config.validate().is_err() || state.in_transit_count() >= config.max_in_transit {
        return None;
    }

    let idle: Vec<&DeliveryVehicle> = state
        .vehicles
        .iter()
        .filter(|v| v.status == VehicleStatus::Delivered)
        .collect();

    let target = match idle.choose(rng) {
        Some(vehicle) => DispatchTarget::Idle {
            id: vehicle.id.clone(),
        },
        None => DispatchTarget::Synthesized(draft_vehicle(state, rng)?),
    };

    let duration_ms = rng.gen_range(config.min_transit_ms..=config.max_transit_ms);
    Some(DispatchPlan {
        target,
        duration_ms,
    })
}

/// New vehicle between two distinct random hospitals.
fn draft_vehicle<R: Rng + ?Sized>(state: &BridgeState, rng: &mut R) -> Option<VehicleDraft> {
    if state.hospitals.len() < 2 {
        return None;
    }
    let mut ends = state.hospitals.choose_multiple(rng, 2);
    let origin = ends.next()?.named_point();
    let destination = ends.next()?.named_point();

    let blood_type = *BloodType::ALL.choose(rng)?;
    let driver_name = DRIVER_NAMES.choose(rng)?.to_string();

    Some(VehicleDraft {
        vehicle_id: format!("MH-43-{:04}", rng.gen_range(1000..10_000)),
        driver_name,
        blood_type,
        units: rng.gen_range(2..=12),
        origin,
        destination,
    })
}

pub fn dispatch_message(vehicle: &DeliveryVehicle) -> String {
    format!(
        "Dispatched {} from {} to {} with {} units of {}.",
        vehicle.vehicle_id,
        vehicle.origin.name,
        vehicle.destination.name,
        vehicle.units,
        vehicle.blood_type
    )
}

pub fn delivery_message(vehicle: &DeliveryVehicle) -> String {
    format!(
        "Delivered {} units of {} to {} ({}).",
        vehicle.units, vehicle.blood_type, vehicle.destination.name, vehicle.vehicle_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::create_seed_state;
    use chrono::{TimeZone, Utc};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn seeded() -> BridgeState {
        create_seed_state(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn plan_picks_idle_vehicle_within_bounds() {
        let state = seeded();
        let config = SimulationConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let plan = plan_dispatch(&state, &mut rng, &config).unwrap();
            assert!(plan.duration_ms >= 60_000 && plan.duration_ms <= 300_000);
            match plan.target {
                DispatchTarget::Idle { id } => {
                    let v = state.vehicles.iter().find(|v| v.id == id).unwrap();
                    assert_eq!(v.status, VehicleStatus::Delivered);
                }
                DispatchTarget::Synthesized(_) => panic!("idle vehicles exist"),
            }
        }
    }

    #[test]
    fn plan_refuses_inverted_duration_bounds() {
        let config = SimulationConfig {
            min_transit_ms: 300_000,
            max_transit_ms: 60_000,
            ..SimulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(plan_dispatch(&seeded(), &mut rng, &config).is_none());
    }

    #[test]
    fn plan_synthesizes_between_distinct_hospitals_when_fleet_busy() {
        let mut state = seeded();
        for v in &mut state.vehicles {
            v.status = VehicleStatus::Delayed;
        }
        let mut rng = SmallRng::seed_from_u64(11);
        let plan = plan_dispatch(&state, &mut rng, &SimulationConfig::default()).unwrap();
        match plan.target {
            DispatchTarget::Synthesized(draft) => {
                assert_ne!(draft.origin.name, draft.destination.name);
                assert!(draft.units >= 2 && draft.units <= 12);
            }
            other => panic!("expected synthesized vehicle, got {:?}", other),
        }
    }

    #[test]
    fn plan_respects_in_transit_cap() {
        let mut state = seeded();
        for v in &mut state.vehicles {
            v.status = VehicleStatus::InTransit;
        }
        let config = SimulationConfig {
            max_in_transit: state.vehicles.len(),
            ..SimulationConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(plan_dispatch(&state, &mut rng, &config).is_none());
    }

    #[test]
    fn plan_is_none_without_vehicles_or_hospitals() {
        let state = BridgeState::default();
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(plan_dispatch(&state, &mut rng, &SimulationConfig::default()).is_none());
    }

    #[test]
    fn config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        let bad = SimulationConfig {
            min_transit_ms: 10,
            max_transit_ms: 5,
            ..SimulationConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
