//! Derived read-only views over the store's collections.
//!
//! Nothing here mutates state; every view is recomputed from the slices it
//! is given.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BloodInventoryItem, BloodType, RequestStatus, ResourceStatus, UrgencyLevel, UrgentRequest,
};

// ── Inventory ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    pub critical_count: usize,
    pub low_count: usize,
    pub total_units: u64,
}

pub fn inventory_overview(items: &[BloodInventoryItem]) -> InventoryOverview {
    items.iter().fold(InventoryOverview::default(), |mut acc, item| {
        match item.status {
            ResourceStatus::Critical => acc.critical_count += 1,
            ResourceStatus::Low => acc.low_count += 1,
            ResourceStatus::Available => {}
        }
        acc.total_units += u64::from(item.quantity);
        acc
    })
}

/// Units per blood type, every type present, in `BloodType::ALL` order.
pub fn units_by_blood_type(items: &[BloodInventoryItem]) -> Vec<(BloodType, u64)> {
    let mut totals: BTreeMap<BloodType, u64> = BTreeMap::new();
    for item in items {
        *totals.entry(item.blood_type).or_insert(0) += u64::from(item.quantity);
    }
    BloodType::ALL
        .iter()
        .map(|bt| (*bt, totals.get(bt).copied().unwrap_or(0)))
        .collect()
}

/// Item count per status, in `ResourceStatus::ALL` order.
pub fn items_by_status(items: &[BloodInventoryItem]) -> Vec<(ResourceStatus, usize)> {
    ResourceStatus::ALL
        .iter()
        .map(|status| (*status, items.iter().filter(|i| i.status == *status).count()))
        .collect()
}

/// Case-insensitive substring match on blood type label or location,
/// optionally narrowed to one status. An empty search matches everything.
pub fn filter_inventory<'a>(
    items: &'a [BloodInventoryItem],
    search: &str,
    status: Option<ResourceStatus>,
) -> Vec<&'a BloodInventoryItem> {
    let needle = search.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item.blood_type.as_str().to_lowercase().contains(&needle)
                || item.location.to_lowercase().contains(&needle)
        })
        .filter(|item| status.map_or(true, |s| item.status == s))
        .collect()
}

// ── Requests ───────────────────────────────────────────────────────

pub fn active_requests(requests: &[UrgentRequest]) -> Vec<&UrgentRequest> {
    requests
        .iter()
        .filter(|r| r.status == RequestStatus::Active)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub requests: usize,
}

/// Longest trailing window `requests_per_day` will produce.
pub const MAX_TREND_DAYS: u32 = 3_660;

/// Requests created on each UTC calendar day of the trailing `days`-day
/// window ending today, oldest day first. `days` is capped at
/// `MAX_TREND_DAYS`; days before the calendar's start are left out.
pub fn requests_per_day(requests: &[UrgentRequest], now: DateTime<Utc>, days: u32) -> Vec<DailyCount> {
    let today = now.date_naive();
    (0..i64::from(days.min(MAX_TREND_DAYS)))
        .rev()
        .filter_map(|back| today.checked_sub_signed(Duration::days(back)))
        .map(|date| {
            let requests = requests
                .iter()
                .filter(|r| r.created_at.date_naive() == date)
                .count();
            DailyCount { date, requests }
        })
        .collect()
}

/// One open request as handed to the donation-location advisory flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    pub hospital_name: String,
    pub hospital_location: String,
    pub blood_type_needed: BloodType,
    pub quantity_requested: u32,
    pub urgency: UrgencyLevel,
}

/// Snapshot of every Active request, collection order preserved.
pub fn suggestion_candidates(requests: &[UrgentRequest]) -> Vec<RequestSnapshot> {
    active_requests(requests)
        .into_iter()
        .map(|r| RequestSnapshot {
            hospital_name: r.hospital_name.clone(),
            hospital_location: r.hospital_location.clone(),
            blood_type_needed: r.blood_type,
            quantity_requested: r.quantity,
            urgency: r.urgency,
        })
        .collect()
}
