pub mod methods;
pub mod provider;
pub mod retry;
pub mod schedule;
pub mod service;

pub use schedule::{ScheduleCalculator, format_countdown, now_ms, time_until};
pub use service::PrayerTimesService;
