use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::repository::{CacheKey, CacheRepo};
use crate::models::DailyPrayerTimes;
use crate::prayer_times::provider::{AladhanClient, TimingsSource};
use crate::prayer_times::retry::RetryPolicy;
use crate::session::Session;

/// Gets a day's schedule for the signed-in user: local cache first, then the
/// provider. Never fails; "no data" is `None`.
pub struct PrayerTimesService<S: TimingsSource> {
    source: S,
    retry: RetryPolicy,
    ttl: Duration,
    coord_precision: u32,
}

impl PrayerTimesService<AladhanClient> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = AladhanClient::new(&config.provider.base_url, config.provider.timeout())?;
        Ok(Self::new(
            client,
            config.provider.retry_policy(),
            config.cache.ttl(),
            config.cache.precision(),
        ))
    }
}

impl<S: TimingsSource> PrayerTimesService<S> {
    pub fn new(source: S, retry: RetryPolicy, ttl: Duration, coord_precision: u32) -> Self {
        Self {
            source,
            retry,
            ttl,
            coord_precision,
        }
    }

    pub fn load(&self, conn: &Connection, session: &Session, date: NaiveDate) -> Option<DailyPrayerTimes> {
        self.load_at(conn, session, date, Utc::now())
    }

    pub fn load_at(
        &self,
        conn: &Connection,
        session: &Session,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Option<DailyPrayerTimes> {
        let Some((lat, lng)) = session.profile.coordinates() else {
            log::debug!("{} has no location set, skipping prayer times fetch", session.user);
            return None;
        };
        let method = session.profile.calc_method.as_str();
        let key = CacheKey::new(lat, lng, method, date, self.coord_precision);

        match CacheRepo::get_fresh(conn, &key, self.ttl, now) {
            Ok(Some(times)) => {
                log::debug!("cache hit for {:?}", key);
                return Some(times);
            }
            Ok(None) => {}
            Err(e) => log::warn!("prayer times cache read failed: {:#}", e),
        }

        match self.retry.run(|| self.source.fetch(lat, lng, method, date)) {
            Ok(times) => {
                if let Err(e) = CacheRepo::store(conn, &key, &times, now) {
                    log::warn!("could not cache prayer times for {}: {:#}", key.date, e);
                }
                Some(times)
            }
            Err(e) => {
                log::warn!("Error fetching prayer times: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::Profile;
    use crate::prayer_times::provider::ProviderError;
    use chrono::{Local, TimeZone};
    use std::cell::Cell;
    use std::time::Duration as StdDuration;

    /// Fails `failures` times, then serves a fixed schedule.
    struct FakeSource {
        calls: Cell<u32>,
        failures: u32,
    }

    impl FakeSource {
        fn new(failures: u32) -> Self {
            Self {
                calls: Cell::new(0),
                failures,
            }
        }
    }

    impl TimingsSource for FakeSource {
        fn fetch(
            &self,
            _lat: f64,
            _lng: f64,
            _method: &str,
            date: NaiveDate,
        ) -> Result<DailyPrayerTimes, ProviderError> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n <= self.failures {
                return Err(ProviderError::Status(503));
            }
            Ok(DailyPrayerTimes {
                date: date.format("%Y-%m-%d").to_string(),
                fajr: "05:00".to_string(),
                dhuhr: "12:15".to_string(),
                asr: "15:40".to_string(),
                maghrib: "18:05".to_string(),
                isha: "19:30".to_string(),
                sunrise: None,
                sunset: None,
            })
        }
    }

    fn retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            initial_backoff: StdDuration::ZERO,
            multiplier: 2,
            max_backoff: StdDuration::ZERO,
        }
    }

    fn service(failures: u32, attempts: u32) -> PrayerTimesService<FakeSource> {
        PrayerTimesService::new(FakeSource::new(failures), retry(attempts), Duration::hours(24), 2)
    }

    fn session(lat: Option<f64>, lng: Option<f64>) -> Session {
        Session {
            user: "tester".to_string(),
            profile: Profile {
                full_name: "Tester".to_string(),
                location_name: None,
                latitude: lat,
                longitude: lng,
                calc_method: "MWL".to_string(),
            },
            signed_in_at: Local.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
        }
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn missing_location_skips_fetch() {
        let svc = service(0, 3);
        let conn = conn();
        assert!(svc.load_at(&conn, &session(None, None), day(), t0()).is_none());
        assert!(svc.load_at(&conn, &session(Some(1.0), None), day(), t0()).is_none());
        assert_eq!(svc.source.calls.get(), 0);
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let svc = service(0, 3);
        let conn = conn();
        let s = session(Some(21.42), Some(39.83));

        let first = svc.load_at(&conn, &s, day(), t0()).unwrap();
        let second = svc.load_at(&conn, &s, day(), t0() + Duration::hours(1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(svc.source.calls.get(), 1);
    }

    #[test]
    fn expired_cache_refetches() {
        let svc = service(0, 3);
        let conn = conn();
        let s = session(Some(21.42), Some(39.83));

        svc.load_at(&conn, &s, day(), t0()).unwrap();
        svc.load_at(&conn, &s, day(), t0() + Duration::hours(25)).unwrap();
        assert_eq!(svc.source.calls.get(), 2);
    }

    #[test]
    fn transient_failure_is_retried() {
        let svc = service(2, 3);
        let conn = conn();
        let times = svc.load_at(&conn, &session(Some(1.0), Some(2.0)), day(), t0());
        assert_eq!(times.unwrap().fajr, "05:00");
        assert_eq!(svc.source.calls.get(), 3);
    }

    #[test]
    fn persistent_failure_yields_no_data() {
        let svc = service(10, 1);
        let conn = conn();
        assert!(svc.load_at(&conn, &session(Some(1.0), Some(2.0)), day(), t0()).is_none());
        assert_eq!(svc.source.calls.get(), 1);
        assert_eq!(CacheRepo::count(&conn).unwrap(), 0);
    }
}
