use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::DailyPrayerTimes;

// ─── Cached prayer times ────────────────────────────────────────────────────

/// Identifies one fetched schedule. Coordinates are rounded so that small GPS
/// jitter still hits the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub lat_key: String,
    pub lng_key: String,
    pub method: String,
    pub date: String,
}

impl CacheKey {
    pub fn new(lat: f64, lng: f64, method: &str, date: NaiveDate, precision: u32) -> Self {
        Self {
            lat_key: round_coord(lat, precision),
            lng_key: round_coord(lng, precision),
            method: method.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Keys never carry more decimals than this.
const MAX_KEY_PRECISION: u32 = 8;

fn round_coord(value: f64, precision: u32) -> String {
    let s = format!("{:.*}", precision.min(MAX_KEY_PRECISION) as usize, value);
    // "-0.00" and "0.00" are the same place
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => s,
    }
}

/// Unix seconds of the oldest `fetched_at` still inside `ttl`. A TTL reaching
/// past the representable range keeps everything.
fn freshness_cutoff(ttl: Duration, now: DateTime<Utc>) -> i64 {
    now.checked_sub_signed(ttl)
        .map_or(i64::MIN, |oldest| oldest.timestamp())
}

pub struct CacheRepo;

impl CacheRepo {
    /// The cached schedule for `key`, unless it is older than `ttl`.
    pub fn get_fresh(
        conn: &Connection,
        key: &CacheKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<DailyPrayerTimes>> {
        let oldest = freshness_cutoff(ttl, now);
        let row = conn
            .query_row(
                "SELECT date, fajr, dhuhr, asr, maghrib, isha, sunrise, sunset
                 FROM prayer_times_cache
                 WHERE lat_key = ?1 AND lng_key = ?2 AND method = ?3 AND date = ?4
                   AND fetched_at >= ?5",
                params![key.lat_key, key.lng_key, key.method, key.date, oldest],
                |row| {
                    Ok(DailyPrayerTimes {
                        date: row.get(0)?,
                        fajr: row.get(1)?,
                        dhuhr: row.get(2)?,
                        asr: row.get(3)?,
                        maghrib: row.get(4)?,
                        isha: row.get(5)?,
                        sunrise: row.get(6)?,
                        sunset: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn store(
        conn: &Connection,
        key: &CacheKey,
        times: &DailyPrayerTimes,
        now: DateTime<Utc>,
    ) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO prayer_times_cache
                (lat_key, lng_key, method, date, fajr, dhuhr, asr, maghrib, isha, sunrise, sunset, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                key.lat_key,
                key.lng_key,
                key.method,
                key.date,
                times.fajr,
                times.dhuhr,
                times.asr,
                times.maghrib,
                times.isha,
                times.sunrise,
                times.sunset,
                now.timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Drop every entry older than `ttl`. Returns how many went.
    pub fn purge_expired(conn: &Connection, ttl: Duration, now: DateTime<Utc>) -> Result<usize> {
        let oldest = freshness_cutoff(ttl, now);
        let n = conn.execute(
            "DELETE FROM prayer_times_cache WHERE fetched_at < ?1",
            params![oldest],
        )?;
        Ok(n)
    }

    pub fn clear_all(conn: &Connection) -> Result<usize> {
        let n = conn.execute("DELETE FROM prayer_times_cache", [])?;
        Ok(n)
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM prayer_times_cache", [], |row| row.get(0))
            .map_err(anyhow::Error::from)
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, key: &str) -> Result<()> {
        conn.execute("DELETE FROM app_meta WHERE key = ?1", params![key])?;
        Ok(())
    }
}
