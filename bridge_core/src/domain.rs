//! Blood Bridge core domain types.
//!
//! Pure data. No transition logic lives here.
//! Field names serialize in camelCase to match the persisted slot layout.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Enumerations ───────────────────────────────────────────────────

/// The eight ABO/Rh combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodType {
    /// Display order used by every per-type breakdown.
    pub const ALL: [BloodType; 8] = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::AbPos,
        BloodType::AbNeg,
        BloodType::OPos,
        BloodType::ONeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APos => "A+",
            BloodType::ANeg => "A-",
            BloodType::BPos => "B+",
            BloodType::BNeg => "B-",
            BloodType::AbPos => "AB+",
            BloodType::AbNeg => "AB-",
            BloodType::OPos => "O+",
            BloodType::ONeg => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .iter()
            .copied()
            .find(|bt| bt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown blood type {:?}", s))
    }
}

/// Stock level derived from an inventory quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceStatus {
    Available,
    Low,
    Critical,
}

impl ResourceStatus {
    pub const ALL: [ResourceStatus; 3] = [
        ResourceStatus::Available,
        ResourceStatus::Low,
        ResourceStatus::Critical,
    ];
}

/// Urgency of a blood request. Ordered by rank: Critical > High > Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    Critical,
    High,
    Moderate,
}

impl UrgencyLevel {
    pub fn rank(&self) -> u8 {
        match self {
            UrgencyLevel::Critical => 3,
            UrgencyLevel::High => 2,
            UrgencyLevel::Moderate => 1,
        }
    }
}

impl PartialOrd for UrgencyLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UrgencyLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrgencyLevel::Critical => "Critical",
            UrgencyLevel::High => "High",
            UrgencyLevel::Moderate => "Moderate",
        };
        f.write_str(s)
    }
}

/// Request lifecycle. `Fulfilled` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    Active,
    Fulfilled,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Active)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Active => "Active",
            RequestStatus::Fulfilled => "Fulfilled",
            RequestStatus::Expired => "Expired",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Delayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogisticsEventKind {
    Dispatch,
    Delivery,
    Info,
}

impl fmt::Display for LogisticsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogisticsEventKind::Dispatch => "DISPATCH",
            LogisticsEventKind::Delivery => "DELIVERY",
            LogisticsEventKind::Info => "INFO",
        };
        f.pad(s)
    }
}

// ── Geometry ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Straight-line interpolation; `t` is clamped to [0, 1].
    pub fn lerp(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
        let t = t.clamp(0.0, 1.0);
        GeoPoint {
            lat: a.lat + (b.lat - a.lat) * t,
            lng: a.lng + (b.lng - a.lng) * t,
        }
    }
}

/// A named map location: a vehicle's origin or destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedPoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl NamedPoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

// ── Entities ───────────────────────────────────────────────────────

/// Registry entry. Immutable after seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub location: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub contact: String,
    pub rating: f32,
}

impl Hospital {
    pub fn named_point(&self) -> NamedPoint {
        NamedPoint {
            name: self.name.clone(),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Stock of one blood type at one hospital.
///
/// `status` is always `rules::derive_status(quantity)`; only the store's
/// set-quantity transition writes either field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodInventoryItem {
    pub id: String,
    pub blood_type: BloodType,
    pub quantity: u32,
    pub hospital_id: String,
    /// Display label, denormalized from the owning hospital.
    pub location: String,
    pub status: ResourceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentRequest {
    pub id: String,
    pub blood_type: BloodType,
    pub quantity: u32,
    pub urgency: UrgencyLevel,
    /// Loose reference: requests may name hospitals outside the registry.
    pub hospital_name: String,
    pub hospital_location: String,
    pub broadcast_radius: u32,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfilled_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationCamp {
    pub id: String,
    pub name: String,
    pub organizer: String,
    pub location: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub date: DateTime<Utc>,
    pub timings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: String,
    pub name: String,
    pub blood_type: BloodType,
    pub location: String,
    pub last_donation_date: DateTime<Utc>,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampRegistrant {
    pub id: String,
    pub full_name: String,
    pub age: u8,
    /// Reference to the uploaded identity document (file name or storage key).
    pub id_proof: String,
    /// Data-URI encoded image.
    pub photo: String,
    pub camp_id: String,
    pub ticket_id: String,
}

/// Departure time and allotted duration of one transit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitWindow {
    pub departed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TransitWindow {
    /// Fraction of the transit completed at `now`, clamped to [0, 1].
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = (now - self.departed_at).num_milliseconds().max(0) as f64;
        (elapsed / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, now: DateTime<Utc>) -> bool {
        let elapsed = (now - self.departed_at).num_milliseconds();
        elapsed >= 0 && elapsed as u64 >= self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryVehicle {
    pub id: String,
    pub vehicle_id: String,
    pub driver_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub origin: NamedPoint,
    pub destination: NamedPoint,
    pub current_position: GeoPoint,
    pub status: VehicleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsEvent {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogisticsEventKind,
    pub timestamp: DateTime<Utc>,
}

// ── Inputs ─────────────────────────────────────────────────────────

/// Caller-supplied fields of a new urgent request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUrgentRequest {
    pub blood_type: BloodType,
    pub quantity: u32,
    pub urgency: UrgencyLevel,
    pub hospital_name: String,
    pub hospital_location: String,
    pub broadcast_radius: u32,
}

/// Caller-supplied fields of a camp registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampRegistration {
    pub full_name: String,
    pub age: u8,
    pub id_proof: String,
    pub photo: String,
    pub camp_id: String,
}

/// User-facing message produced as a side effect of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

// ── Aggregate ──────────────────────────────────────────────────────

/// Every collection the store owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    pub hospitals: Vec<Hospital>,
    pub inventory: Vec<BloodInventoryItem>,
    /// Most recent first.
    pub requests: Vec<UrgentRequest>,
    pub camps: Vec<DonationCamp>,
    pub donors: Vec<Donor>,
    pub registrants: Vec<CampRegistrant>,
    pub vehicles: Vec<DeliveryVehicle>,
    /// Most recent first, bounded by `rules::MAX_LOGISTICS_EVENTS`.
    pub logistics_events: VecDeque<LogisticsEvent>,
}

impl BridgeState {
    pub fn hospital(&self, id: &str) -> Option<&Hospital> {
        self.hospitals.iter().find(|h| h.id == id)
    }

    pub fn request(&self, id: &str) -> Option<&UrgentRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn camp(&self, id: &str) -> Option<&DonationCamp> {
        self.camps.iter().find(|c| c.id == id)
    }

    pub fn in_transit_count(&self) -> usize {
        self.vehicles
            .iter()
            .filter(|v| v.status == VehicleStatus::InTransit)
            .count()
    }
}

/// Names one top-level collection of `BridgeState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Hospitals,
    Inventory,
    Requests,
    Camps,
    Donors,
    Registrants,
    Vehicles,
    LogisticsEvents,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Hospitals,
        Collection::Inventory,
        Collection::Requests,
        Collection::Camps,
        Collection::Donors,
        Collection::Registrants,
        Collection::Vehicles,
        Collection::LogisticsEvents,
    ];
}
