use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

/// First bookable hour of the studio day.
pub const OPENING_HOUR: u32 = 9;
/// Last bookable hour (inclusive). Slots are one hour wide.
pub const LAST_SLOT_HOUR: u32 = 17;

/// The fixed daily template: 09:00, 10:00, ... 17:00.
pub fn daily_slots() -> Vec<NaiveTime> {
    (OPENING_HOUR..=LAST_SLOT_HOUR)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .collect()
}

pub fn is_template_slot(time: &NaiveTime) -> bool {
    time.minute() == 0
        && time.second() == 0
        && (OPENING_HOUR..=LAST_SLOT_HOUR).contains(&time.hour())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySlots {
    pub available_times: Vec<String>,
    pub booked_times: Vec<String>,
}

impl DaySlots {
    /// Splits the template into free and reserved slots. Reserved times that
    /// fall outside the template are ignored.
    pub fn partition(reserved: &[NaiveTime]) -> Self {
        let (booked, available): (Vec<NaiveTime>, Vec<NaiveTime>) = daily_slots()
            .into_iter()
            .partition(|slot| reserved.contains(slot));

        Self {
            available_times: available.iter().map(format_slot).collect(),
            booked_times: booked.iter().map(format_slot).collect(),
        }
    }
}

pub fn format_slot(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid date (expected YYYY-MM-DD): {s}"))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| anyhow::anyhow!("invalid time (expected HH:MM): {s}"))
}

/// Serde adapter storing slot times as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_slot(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}
