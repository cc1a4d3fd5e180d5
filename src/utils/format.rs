use chrono::{Local, TimeZone};

use crate::models::Profile;

/// "Istanbul (41.01, 28.98)", "41.01, 28.98" or "not set"
pub fn format_location(profile: &Profile) -> String {
    match (profile.coordinates(), profile.location_name.as_deref()) {
        (Some((lat, lng)), Some(name)) => format!("{} ({:.2}, {:.2})", name, lat, lng),
        (Some((lat, lng)), None) => format!("{:.2}, {:.2}", lat, lng),
        (None, Some(name)) => format!("{} (no coordinates)", name),
        (None, None) => "not set".to_string(),
    }
}

/// Epoch milliseconds as local "HH:MM", or "--:--" when there is no instant.
pub fn format_instant(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}
