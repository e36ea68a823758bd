//! Business-rule primitives shared by transitions and invariants.
//!
//! Thresholds are inclusive upper bounds in units.

use crate::domain::ResourceStatus;
use crate::error::{BridgeError, Result};

/// Quantities at or below this are Critical.
pub const CRITICAL_MAX_UNITS: u32 = 5;

/// Quantities above `CRITICAL_MAX_UNITS` and at or below this are Low.
pub const LOW_MAX_UNITS: u32 = 10;

pub const MIN_DONOR_AGE: u8 = 18;
pub const MAX_DONOR_AGE: u8 = 65;

pub const MIN_FULL_NAME_LEN: usize = 2;

/// Broadcast radii offered by the request form, in kilometres.
pub const ALLOWED_BROADCAST_RADII_KM: [u32; 3] = [5, 10, 15];

/// Capacity of the logistics event log.
pub const MAX_LOGISTICS_EVENTS: usize = 50;

/// Stock status as a pure function of quantity.
pub fn derive_status(quantity: u32) -> ResourceStatus {
    if quantity <= CRITICAL_MAX_UNITS {
        ResourceStatus::Critical
    } else if quantity <= LOW_MAX_UNITS {
        ResourceStatus::Low
    } else {
        ResourceStatus::Available
    }
}

/// Reject blank text fields. Returns the trimmed value.
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

pub fn validate_age(age: u8) -> Result<()> {
    if !(MIN_DONOR_AGE..=MAX_DONOR_AGE).contains(&age) {
        return Err(BridgeError::validation(format!(
            "age {} outside allowed range {}-{}",
            age, MIN_DONOR_AGE, MAX_DONOR_AGE
        )));
    }
    Ok(())
}

pub fn validate_broadcast_radius(radius_km: u32) -> Result<()> {
    if !ALLOWED_BROADCAST_RADII_KM.contains(&radius_km) {
        return Err(BridgeError::validation(format!(
            "broadcast radius {} km not one of {:?}",
            radius_km, ALLOWED_BROADCAST_RADII_KM
        )));
    }
    Ok(())
}

/// Photos arrive from the capture step as `data:image/...` URIs.
pub fn validate_photo(photo: &str) -> Result<()> {
    let photo = require_text("photo", photo)?;
    if !photo.starts_with("data:image/") {
        return Err(BridgeError::validation(
            "photo must be a data:image/ URI",
        ));
    }
    Ok(())
}
