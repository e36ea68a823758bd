//! Prompt text and response schemas for the three advisory flows.

use serde_json::{json, Value};

use bridge_core::analytics::RequestSnapshot;
use bridge_core::domain::{BloodInventoryItem, BloodType, DonationCamp, Hospital};

use super::{ChatRole, ChatTurn, ModelRequest};

pub const ASSISTANT_NAME: &str = "Pulse";

const APP_FEATURES: &str = "\
- Real-Time Dashboard: Overview of blood inventory levels.
- Send Urgent Requests: Broadcast needs to donors and banks.
- Active Alerts: View and respond to high-priority requests.
- Smart Logistics: Track blood deliveries in real-time.
- AI Supply Forecasting: Predict potential shortages.
- Donation Camps: Find and register for donation camps.
- Donor Database: Manage and contact registered donors.
- Analytics: View trends in requests and donations.";

const DONATION_FACTS: &str = "\
- Common blood types are A, B, AB, and O, each with a positive or negative Rh factor.
- O- is the universal donor for red blood cells. AB+ is the universal recipient.
- A person can typically donate whole blood every 56 days (8 weeks).
- The donation process takes about an hour, but the actual blood draw is only about 10 minutes.
- Donors should be well-hydrated and have eaten a healthy meal before donating.";

// ── Forecast ───────────────────────────────────────────────────────

/// `items` are already narrowed to `blood_type`.
pub fn forecast_request(blood_type: BloodType, items: &[&BloodInventoryItem]) -> ModelRequest {
    let mut prompt = format!(
        "Assess the shortage risk for blood type {} across the hospital network.\n\
         Consider the current stock at each location and how close each is to the \
         critical threshold (5 units or fewer) and the low threshold (10 units or fewer).\n\n\
         Inventory for {}:",
        blood_type, blood_type
    );
    if items.is_empty() {
        prompt.push_str("\n- No stock recorded at any location.");
    }
    for item in items {
        prompt.push_str(&format!(
            "\n- Location: {}, Quantity: {} units, Status: {:?}",
            item.location, item.quantity, item.status
        ));
    }
    prompt.push_str("\n\nRespond with the shortage risk (Low, Medium or High) and a short reason.");

    ModelRequest {
        system: "You are a blood supply analyst for a network of hospitals. \
                 Base your assessment only on the inventory provided."
            .to_string(),
        prompt,
        response_schema: Some(json!({
            "type": "OBJECT",
            "properties": {
                "shortageRisk": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
                "reason": { "type": "STRING" }
            },
            "required": ["shortageRisk", "reason"]
        })),
    }
}

// ── Donation locations ─────────────────────────────────────────────

pub fn suggestion_request(donor_blood_type: BloodType, requests: &[RequestSnapshot]) -> ModelRequest {
    let mut prompt = format!(
        "Given the donor's blood type and a list of active blood requests from hospitals, \
         rank the hospitals based on donation priority.\n\n\
         Prioritize hospitals that:\n\
         1. Need the donor's blood type.\n\
         2. Have a higher urgency level (Critical > High > Moderate).\n\
         3. Have a larger quantity requested.\n\n\
         Provide a priority score (higher is better) and a reason for each hospital.\n\n\
         Donor Blood Type: {}\n\
         Active Requests:",
        donor_blood_type
    );
    for r in requests {
        prompt.push_str(&format!(
            "\n- Hospital: {}, Location: {}, Blood Type Needed: {}, Quantity: {}, Urgency: {}",
            r.hospital_name, r.hospital_location, r.blood_type_needed, r.quantity_requested, r.urgency
        ));
    }

    ModelRequest {
        system: "You are an AI assistant designed to help blood donors find the optimal \
                 location to donate blood."
            .to_string(),
        prompt,
        response_schema: Some(json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "hospitalName": { "type": "STRING" },
                    "hospitalLocation": { "type": "STRING" },
                    "priorityScore": { "type": "NUMBER" },
                    "reason": { "type": "STRING" }
                },
                "required": ["hospitalName", "hospitalLocation", "priorityScore", "reason"]
            }
        })),
    }
}

// ── Chat ───────────────────────────────────────────────────────────

pub fn chat_request(
    question: &str,
    history: &[ChatTurn],
    hospitals: &[Hospital],
    camps: &[DonationCamp],
) -> ModelRequest {
    let hospital_list = hospitals
        .iter()
        .map(|h| format!("{} in {}", h.name, h.location))
        .collect::<Vec<_>>()
        .join(", ");
    let camp_list = camps
        .iter()
        .map(|c| format!("{} in {} on {}", c.name, c.location, c.date.format("%Y-%m-%d")))
        .collect::<Vec<_>>()
        .join(", ");

    let system = format!(
        "You are an expert AI assistant for the \"Blood Bridge\" application. Your name is \"{}\".\n\
         Your purpose is to answer questions about the application and provide general, helpful \
         information about blood donation.\n\
         Be friendly, concise, and helpful. Do not make up information.\n\n\
         Here is some context about the Blood Bridge application:\n\
         - App Name: Blood Bridge\n\
         - Mission: To connect donors, hospitals, and communities to save lives.\n\
         - Key Features:\n{}\n\n\
         Here is some context about the hospitals and camps in the system:\n\
         - Hospitals: {}\n\
         - Upcoming Camps: {}\n\n\
         General Blood Donation Facts (for questions not about the app):\n{}",
        ASSISTANT_NAME, APP_FEATURES, hospital_list, camp_list, DONATION_FACTS
    );

    let mut prompt = String::from("Chat History:");
    for turn in history {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        prompt.push_str(&format!("\n- {}: {}", role, turn.content));
    }
    prompt.push_str(&format!("\n\nUser's new question:\n{}\n\nYour Answer:", question.trim()));

    ModelRequest {
        system,
        prompt,
        response_schema: None,
    }
}

// ── Reply parsing ──────────────────────────────────────────────────

/// Strip a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json", "JSON", ...) up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a JSON reply, leniently unwrapping code fences.
pub fn parse_json_reply(text: &str) -> Result<Value, String> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::domain::UrgencyLevel;
    use bridge_core::seed::{create_seed_state, seed_hospitals};
    use chrono::{TimeZone, Utc};

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn fenced_json_parses() {
        let v = parse_json_reply("```JSON\n{\"shortageRisk\":\"High\"}\n```").unwrap();
        assert_eq!(v["shortageRisk"], "High");
        assert!(parse_json_reply("The risk is high.").is_err());
    }

    #[test]
    fn suggestion_prompt_lists_every_request() {
        let requests = vec![
            RequestSnapshot {
                hospital_name: "Apollo Hospital".into(),
                hospital_location: "Belapur".into(),
                blood_type_needed: BloodType::ONeg,
                quantity_requested: 4,
                urgency: UrgencyLevel::Critical,
            },
            RequestSnapshot {
                hospital_name: "MGM Hospital".into(),
                hospital_location: "Vashi".into(),
                blood_type_needed: BloodType::APos,
                quantity_requested: 2,
                urgency: UrgencyLevel::Moderate,
            },
        ];
        let req = suggestion_request(BloodType::ONeg, &requests);
        assert!(req.prompt.contains("Donor Blood Type: O-"));
        assert!(req.prompt.contains("Hospital: Apollo Hospital, Location: Belapur, Blood Type Needed: O-, Quantity: 4, Urgency: Critical"));
        assert!(req.prompt.contains("Urgency: Moderate"));
        assert_eq!(req.response_schema.unwrap()["type"], "ARRAY");
    }

    #[test]
    fn chat_prompt_carries_context_and_history() {
        let state = create_seed_state(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
        let history = vec![
            ChatTurn { role: ChatRole::User, content: "Hi".into() },
            ChatTurn { role: ChatRole::Model, content: "Hello! How can I help?".into() },
        ];
        let req = chat_request("  Who can donate?  ", &history, &seed_hospitals(), &state.camps);
        assert!(req.system.contains("Your name is \"Pulse\""));
        assert!(req.system.contains("Ruby Hall Clinic in Pune"));
        assert!(req.system.contains("Annual Blood Drive in Shivaji Park, Mumbai on 2024-06-11"));
        assert!(req.prompt.contains("- user: Hi\n- model: Hello! How can I help?"));
        assert!(req.prompt.contains("User's new question:\nWho can donate?\n"));
        assert!(req.response_schema.is_none());
    }
}
