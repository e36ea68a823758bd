//! Initial dataset used when no persisted state exists.
//!
//! Dates are relative to `now` so a fresh session always shows recent
//! requests and upcoming camps.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    BloodInventoryItem, BloodType, BridgeState, ContactInfo, DeliveryVehicle, DonationCamp,
    Donor, Hospital, RequestStatus, UrgencyLevel, UrgentRequest, VehicleStatus,
};
use crate::rules::derive_status;

/// Build the full seed state.
pub fn create_seed_state(now: DateTime<Utc>) -> BridgeState {
    let hospitals = seed_hospitals();
    let inventory = seed_inventory(&hospitals);
    let vehicles = seed_vehicles(&hospitals);

    BridgeState {
        inventory,
        requests: seed_requests(now),
        camps: seed_camps(now),
        donors: seed_donors(now),
        registrants: Vec::new(),
        vehicles,
        logistics_events: VecDeque::new(),
        hospitals,
    }
}

pub fn seed_hospitals() -> Vec<Hospital> {
    let rows: [(&str, &str, &str, &str, f64, f64, &str, f32); 6] = [
        (
            "hosp-1",
            "D Y Patil Hospital",
            "Nerul, Navi Mumbai",
            "Sector 5, Nerul, Navi Mumbai, Maharashtra 400706",
            19.0433,
            73.0237,
            "+91 22 3942 3942",
            4.5,
        ),
        (
            "hosp-2",
            "Apollo Hospital",
            "Belapur, Navi Mumbai",
            "Plot 13, Sector 23, CBD Belapur, Navi Mumbai, Maharashtra 400614",
            19.0176,
            73.0394,
            "+91 22 6280 6280",
            4.6,
        ),
        (
            "hosp-3",
            "MGM Hospital",
            "Vashi, Navi Mumbai",
            "Plot 35, Sector 3, Vashi, Navi Mumbai, Maharashtra 400703",
            19.0771,
            72.9986,
            "+91 22 6152 6666",
            4.2,
        ),
        (
            "hosp-4",
            "Fortis Hiranandani Hospital",
            "Vashi, Navi Mumbai",
            "Mini Sea Shore Road, Sector 10A, Vashi, Navi Mumbai, Maharashtra 400703",
            19.0830,
            73.0020,
            "+91 22 3919 9222",
            4.4,
        ),
        (
            "hosp-5",
            "Lilavati Hospital",
            "Bandra, Mumbai",
            "A-791, Bandra Reclamation, Bandra West, Mumbai, Maharashtra 400050",
            19.0510,
            72.8290,
            "+91 22 6931 8000",
            4.5,
        ),
        (
            "hosp-6",
            "Ruby Hall Clinic",
            "Pune",
            "40, Sassoon Road, Sangamvadi, Pune, Maharashtra 411001",
            18.5314,
            73.8768,
            "+91 20 6645 5100",
            4.3,
        ),
    ];

    rows.iter()
        .map(|(id, name, location, address, lat, lng, contact, rating)| Hospital {
            id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            address: address.to_string(),
            lat: *lat,
            lng: *lng,
            contact: contact.to_string(),
            rating: *rating,
        })
        .collect()
}

fn seed_inventory(hospitals: &[Hospital]) -> Vec<BloodInventoryItem> {
    let rows: [(&str, BloodType, u32, usize); 8] = [
        ("inv-1", BloodType::APos, 25, 0),
        ("inv-2", BloodType::ONeg, 8, 1),
        ("inv-3", BloodType::BPos, 3, 2),
        ("inv-4", BloodType::AbPos, 15, 3),
        ("inv-5", BloodType::ANeg, 12, 0),
        ("inv-6", BloodType::OPos, 50, 1),
        ("inv-7", BloodType::BNeg, 5, 2),
        ("inv-8", BloodType::AbNeg, 9, 3),
    ];

    rows.iter()
        .filter_map(|(id, blood_type, quantity, hospital_idx)| {
            let hospital = hospitals.get(*hospital_idx)?;
            Some(BloodInventoryItem {
                id: id.to_string(),
                blood_type: *blood_type,
                quantity: *quantity,
                hospital_id: hospital.id.clone(),
                location: format!("{}, {}", hospital.name, short_area(&hospital.location)),
                status: derive_status(*quantity),
            })
        })
        .collect()
}

/// "Nerul, Navi Mumbai" -> "Nerul".
fn short_area(location: &str) -> &str {
    location.split(',').next().unwrap_or(location).trim()
}

fn seed_requests(now: DateTime<Utc>) -> Vec<UrgentRequest> {
    vec![
        UrgentRequest {
            id: "req-seed-1".to_string(),
            blood_type: BloodType::ONeg,
            quantity: 5,
            urgency: UrgencyLevel::Critical,
            hospital_name: "City General Hospital".to_string(),
            hospital_location: "Mumbai".to_string(),
            broadcast_radius: 10,
            created_at: now - Duration::hours(2),
            status: RequestStatus::Active,
            fulfilled_by: None,
        },
        UrgentRequest {
            id: "req-seed-2".to_string(),
            blood_type: BloodType::APos,
            quantity: 10,
            urgency: UrgencyLevel::High,
            hospital_name: "Metro Health Center".to_string(),
            hospital_location: "Pune".to_string(),
            broadcast_radius: 5,
            created_at: now - Duration::hours(15),
            status: RequestStatus::Active,
            fulfilled_by: None,
        },
        UrgentRequest {
            id: "req-seed-3".to_string(),
            blood_type: BloodType::BPos,
            quantity: 8,
            urgency: UrgencyLevel::Moderate,
            hospital_name: "Sunshine Medical".to_string(),
            hospital_location: "Nagpur".to_string(),
            broadcast_radius: 10,
            created_at: now - Duration::days(2),
            status: RequestStatus::Fulfilled,
            fulfilled_by: Some("Anjali Sharma".to_string()),
        },
        UrgentRequest {
            id: "req-seed-4".to_string(),
            blood_type: BloodType::AbNeg,
            quantity: 3,
            urgency: UrgencyLevel::Critical,
            hospital_name: "Hope County Hospital".to_string(),
            hospital_location: "Mumbai".to_string(),
            broadcast_radius: 5,
            created_at: now - Duration::days(5),
            status: RequestStatus::Expired,
            fulfilled_by: None,
        },
    ]
}

fn seed_camps(now: DateTime<Utc>) -> Vec<DonationCamp> {
    vec![
        DonationCamp {
            id: "camp1".to_string(),
            name: "Annual Blood Drive".to_string(),
            organizer: "Red Cross Society".to_string(),
            location: "Shivaji Park, Mumbai".to_string(),
            address: "Shivaji Park, Dadar, Mumbai, Maharashtra 400028".to_string(),
            lat: 19.0232,
            lng: 72.8421,
            date: now + Duration::days(10),
            timings: "9:00 AM - 5:00 PM".to_string(),
        },
        DonationCamp {
            id: "camp2".to_string(),
            name: "Tech Park Donation Day".to_string(),
            organizer: "Infosys Foundation".to_string(),
            location: "Hinjewadi IT Park, Pune".to_string(),
            address: "Rajiv Gandhi Infotech Park, Hinjawadi, Pune, Maharashtra 411057".to_string(),
            lat: 18.5842,
            lng: 73.7360,
            date: now + Duration::days(25),
            timings: "10:00 AM - 4:00 PM".to_string(),
        },
        DonationCamp {
            id: "camp3".to_string(),
            name: "Community Health Camp".to_string(),
            organizer: "Lions Club".to_string(),
            location: "Gandhibagh, Nagpur".to_string(),
            address: "Gandhibagh, Nagpur, Maharashtra 440002".to_string(),
            lat: 21.1466,
            lng: 79.0882,
            date: now + Duration::days(40),
            timings: "11:00 AM - 6:00 PM".to_string(),
        },
    ]
}

fn seed_donors(now: DateTime<Utc>) -> Vec<Donor> {
    let rows: [(&str, &str, BloodType, &str, i64, &str, &str); 5] = [
        ("don1", "Rohan Sharma", BloodType::OPos, "Mumbai, MH", 90, "+919876543210", "rohan.s@example.com"),
        ("don2", "Priya Mehta", BloodType::APos, "Pune, MH", 120, "+919123456789", "priya.m@example.com"),
        ("don3", "Amit Singh", BloodType::BNeg, "Nagpur, MH", 50, "+919988776655", "amit.s@example.com"),
        ("don4", "Sunita Patel", BloodType::AbPos, "Mumbai, MH", 200, "+919654321098", "sunita.p@example.com"),
        ("don5", "Vikram Reddy", BloodType::ONeg, "Pune, MH", 75, "+919000011111", "vikram.r@example.com"),
    ];

    rows.iter()
        .map(|(id, name, blood_type, location, days_ago, phone, email)| Donor {
            id: id.to_string(),
            name: name.to_string(),
            blood_type: *blood_type,
            location: location.to_string(),
            last_donation_date: now - Duration::days(*days_ago),
            contact: ContactInfo {
                phone: phone.to_string(),
                email: email.to_string(),
            },
        })
        .collect()
}

/// Idle fleet parked at each route's destination.
fn seed_vehicles(hospitals: &[Hospital]) -> Vec<DeliveryVehicle> {
    let routes: [(&str, &str, &str, BloodType, u32, usize, usize); 4] = [
        ("veh-1", "MH-43-1021", "Ravi Kumar", BloodType::OPos, 6, 1, 0),
        ("veh-2", "MH-43-2147", "Suresh Patil", BloodType::APos, 4, 0, 2),
        ("veh-3", "MH-43-3318", "Meera Joshi", BloodType::ONeg, 3, 3, 4),
        ("veh-4", "MH-12-4490", "Farhan Shaikh", BloodType::BPos, 8, 5, 1),
    ];

    routes
        .iter()
        .filter_map(|(id, plate, driver, blood_type, units, from, to)| {
            let origin = hospitals.get(*from)?.named_point();
            let destination = hospitals.get(*to)?.named_point();
            Some(DeliveryVehicle {
                id: id.to_string(),
                vehicle_id: plate.to_string(),
                driver_name: driver.to_string(),
                blood_type: *blood_type,
                units: *units,
                current_position: destination.point(),
                origin,
                destination,
                status: VehicleStatus::Delivered,
                transit: None,
            })
        })
        .collect()
}
