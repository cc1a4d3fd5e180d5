pub mod prayer;
pub mod profile;

pub use prayer::{Countdown, DailyPrayerTimes, PrayerName, PrayerTime};
pub use profile::Profile;
