//! Scheduler: availability lookup and meeting booking
//!
//! Availability is derived from a stable hash of (date, slot, meeting type)
//! so the same request always sees the same calendar.

use super::simulated::{SimulatedTool, string_list, usize_param};
use bizeval_domain::core::string::fnv1a64;
use bizeval_domain::{ToolDefinition, ToolError, ToolErrorKind, ToolOutcome, ToolParameter};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde_json::{Map, Value, json};

pub const SCHEDULER: &str = "scheduler";

const DEFAULT_TIME_RANGE: &str = "09:00-17:00";
const DEFAULT_DURATION_MINUTES: usize = 60;
const SLOT_STEP_MINUTES: i64 = 30;
const MAX_SLOTS: usize = 6;
const MEETING_FORMAT: &str = "Virtual (Zoom or Microsoft Teams)";

/// Get the tool definition for scheduler
pub fn scheduler_definition() -> ToolDefinition {
    ToolDefinition::new(
        SCHEDULER,
        "Check availability and schedule appointments with sales representatives, technical specialists, or support staff",
    )
    .with_parameter(
        ToolParameter::new(
            "meeting_type",
            "Type of meeting (e.g., 'product_demo', 'sales_call', 'technical_consultation', 'support_session')",
            true,
        )
        .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("date", "Preferred date (YYYY-MM-DD)", false).with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("time_range", "Preferred time range (e.g., '09:00-17:00')", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new("duration", "Duration in minutes (default: 60)", false)
            .with_type("integer"),
    )
    .with_parameter(
        ToolParameter::new(
            "participants",
            "Staff needed (e.g., ['sales_rep', 'technical_specialist'])",
            false,
        )
        .with_type("array"),
    )
    .with_parameter(
        ToolParameter::new("product_id", "Product the meeting is about", false)
            .with_type("string"),
    )
    .with_parameter(
        ToolParameter::new(
            "book",
            "Book the first available slot instead of only checking availability",
            false,
        )
        .with_type("boolean"),
    )
}

/// Simulated calendar
pub struct Scheduler {
    today: NaiveDate,
}

impl Scheduler {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    fn next_business_day(&self) -> NaiveDate {
        skip_weekend(self.today + Duration::days(1))
    }

    fn available_slots(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        duration: i64,
        meeting_type: &str,
    ) -> Vec<(NaiveTime, NaiveTime)> {
        let mut slots = Vec::new();
        let mut slot = start;
        while slots.len() < MAX_SLOTS {
            let (slot_end, wrapped) = slot.overflowing_add_signed(Duration::minutes(duration));
            if wrapped != 0 || slot_end > end {
                break;
            }
            let key = format!("{}|{}|{}", date, slot.format("%H:%M"), meeting_type);
            // Roughly two in three slots are free
            if fnv1a64(key.as_bytes()) % 3 != 0 {
                slots.push((slot, slot_end));
            }
            let (next, wrapped) = slot.overflowing_add_signed(Duration::minutes(SLOT_STEP_MINUTES));
            if wrapped != 0 {
                break;
            }
            slot = next;
        }
        slots
    }
}

impl SimulatedTool for Scheduler {
    fn definition(&self) -> ToolDefinition {
        scheduler_definition()
    }

    fn execute(&self, parameters: &Map<String, Value>) -> ToolOutcome {
        let meeting_type = parameters
            .get("meeting_type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("meeting_type must be a string"))?;

        let requested = match parameters.get("date").and_then(Value::as_str) {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| invalid(format!("Invalid date '{}'. Use YYYY-MM-DD", s)))?,
            None => self.next_business_day(),
        };
        let date = skip_weekend(requested);

        let time_range = parameters
            .get("time_range")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TIME_RANGE);
        let (start, end) = parse_time_range(time_range)?;
        let duration = usize_param(parameters, "duration", DEFAULT_DURATION_MINUTES)?;
        if duration == 0 {
            return Err(invalid("duration must be positive"));
        }
        let participants = string_list(parameters, "participants");
        let book = parameters
            .get("book")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let slots = self.available_slots(date, start, end, duration as i64, meeting_type);
        let mut result = json!({
            "meeting_type": meeting_type,
            "date": date.format("%Y-%m-%d").to_string(),
            "weekday": weekday_name(date.weekday()),
            "duration_minutes": duration,
            "format": MEETING_FORMAT,
        });
        if date != requested {
            result["note"] = json!("The requested date falls on a weekend; showing the next business day");
        }
        if let Some(product) = parameters.get("product_id").and_then(Value::as_str) {
            result["product_id"] = json!(product);
        }
        if !participants.is_empty() {
            result["participants"] = json!(participants);
        }

        match (book, slots.first()) {
            (_, None) => {
                result["available_slots"] = json!([]);
                result["message"] = json!(format!(
                    "No availability in {} on {}. Try another date or time range",
                    time_range, date
                ));
            }
            (true, Some((from, to))) => {
                let key = format!("{}|{}|{}", meeting_type, date, from);
                result["status"] = json!("booked");
                result["confirmation_id"] =
                    json!(format!("MTG-{:06X}", fnv1a64(key.as_bytes()) & 0xFF_FFFF));
                result["start"] = json!(from.format("%H:%M").to_string());
                result["end"] = json!(to.format("%H:%M").to_string());
            }
            (false, Some(_)) => {
                result["available_slots"] = slots
                    .iter()
                    .map(|(from, to)| {
                        json!({
                            "start": from.format("%H:%M").to_string(),
                            "end": to.format("%H:%M").to_string(),
                        })
                    })
                    .collect();
            }
        }
        Ok(result)
    }
}

fn invalid(message: impl Into<String>) -> ToolError {
    ToolError::new(ToolErrorKind::InvalidParameters, message)
}

fn skip_weekend(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn parse_time_range(range: &str) -> Result<(NaiveTime, NaiveTime), ToolError> {
    let parse = |s: &str| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok();
    range
        .split_once('-')
        .and_then(|(a, b)| Some((parse(a)?, parse(b)?)))
        .filter(|(start, end)| start < end)
        .ok_or_else(|| {
            invalid(format!(
                "Invalid time range '{}'. Use format '09:00-17:00'",
                range
            ))
        })
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
