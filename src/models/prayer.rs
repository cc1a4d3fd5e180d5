use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerName {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    /// Canonical daily order. Lookups scan in this order and never re-sort.
    pub const ALL: [PrayerName; 5] = [
        PrayerName::Fajr,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One day's schedule as handed over by the timing provider.
///
/// Times are kept as the provider's `HH:MM` strings; nothing here checks that
/// they are well formed or increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPrayerTimes {
    /// `YYYY-MM-DD`
    pub date: String,
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
    #[serde(default)]
    pub sunrise: Option<String>,
    #[serde(default)]
    pub sunset: Option<String>,
}

impl DailyPrayerTimes {
    pub fn time_of(&self, name: PrayerName) -> &str {
        match name {
            PrayerName::Fajr => &self.fajr,
            PrayerName::Dhuhr => &self.dhuhr,
            PrayerName::Asr => &self.asr,
            PrayerName::Maghrib => &self.maghrib,
            PrayerName::Isha => &self.isha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTime {
    pub name: PrayerName,
    /// Display string, e.g. `04:32`
    pub time: String,
    /// Milliseconds since the Unix epoch. `None` when the time string could
    /// not be anchored to a real local instant.
    pub timestamp: Option<i64>,
}

impl PrayerTime {
    /// `timestamp > now`; an invalid instant is never after anything.
    pub fn is_after(&self, now_ms: i64) -> bool {
        matches!(self.timestamp, Some(ts) if ts > now_ms)
    }

    /// `timestamp <= now`; an invalid instant has never started either.
    pub fn has_started(&self, now_ms: i64) -> bool {
        matches!(self.timestamp, Some(ts) if ts <= now_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_honours_width() {
        assert_eq!(format!("{:<6}|", PrayerName::Asr), "Asr   |");
        assert_eq!(PrayerName::Dhuhr.to_string(), "Dhuhr");
    }

    #[test]
    fn invalid_instant_is_neither_started_nor_upcoming() {
        let p = PrayerTime {
            name: PrayerName::Asr,
            time: "xx".to_string(),
            timestamp: None,
        };
        assert!(!p.is_after(0));
        assert!(!p.has_started(0));
    }
}
