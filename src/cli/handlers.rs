use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, Utc};
use rusqlite::Connection;

use crate::cli::args::{CacheCommands, ProfileCommands};
use crate::config::AppConfig;
use crate::db::repository::CacheRepo;
use crate::models::{DailyPrayerTimes, PrayerTime};
use crate::prayer_times::methods::{CALCULATION_METHODS, is_known_method, method_label};
use crate::prayer_times::{
    PrayerTimesService, ScheduleCalculator, format_countdown, now_ms, time_until,
};
use crate::session::Session;
use crate::utils::format::{format_instant, format_location};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn handle_times(
    conn: &Connection,
    config: &AppConfig,
    session: &Session,
    date: Option<&str>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let day = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Bad date '{}', expected YYYY-MM-DD", s))?,
        None => today,
    };

    let Some(times) = load_schedule(conn, config, session, day)? else {
        return Ok(());
    };

    let calc = ScheduleCalculator::local();
    let now = now_ms();
    let list = calc.to_timestamped_list(&times, day);
    let is_today = day == today;
    let current = if is_today {
        calc.current_prayer(&times, day, now)
    } else {
        None
    };

    println!();
    println_colored!(
        GOLD,
        "  Prayer Times — {} ({})",
        format_location(&session.profile),
        times.date
    );
    println!();

    if let Some(sunrise) = &times.sunrise {
        println_colored!(DIM, "  {:<10}  {}", "Sunrise", sunrise);
    }
    for prayer in &list {
        match row_style(prayer, current.as_ref(), is_today, now) {
            RowStyle::Current => {
                println_colored!(GOLD, "  {:<10}  {}  ◀ now", prayer.name, prayer.time)
            }
            RowStyle::Past => println_colored!(DIM, "  {:<10}  {}", prayer.name, prayer.time),
            RowStyle::Upcoming => println_colored!(BOLD, "  {:<10}  {}", prayer.name, prayer.time),
            RowStyle::Plain => println!("  {:<10}  {}", prayer.name, prayer.time),
        }
    }
    if let Some(sunset) = &times.sunset {
        println_colored!(DIM, "  {:<10}  {}", "Sunset", sunset);
    }

    if is_today {
        if let Some(next) = next_with_rollover(conn, config, session, &times, today, now)? {
            println!();
            print_next(&next, now);
        }
    }
    println!();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStyle {
    Current,
    Past,
    Upcoming,
    /// Another day: no position relative to now.
    Plain,
}

fn row_style(prayer: &PrayerTime, current: Option<&PrayerTime>, is_today: bool, now: i64) -> RowStyle {
    if !is_today {
        RowStyle::Plain
    } else if current.is_some_and(|c| c.name == prayer.name) {
        RowStyle::Current
    } else if prayer.has_started(now) {
        RowStyle::Past
    } else {
        RowStyle::Upcoming
    }
}

// ─── Next ────────────────────────────────────────────────────────────────────

pub fn handle_next(conn: &Connection, config: &AppConfig, session: &Session) -> Result<()> {
    let today = Local::now().date_naive();
    let Some(times) = load_schedule(conn, config, session, today)? else {
        return Ok(());
    };

    let now = now_ms();
    match next_with_rollover(conn, config, session, &times, today, now)? {
        Some(next) => print_next(&next, now),
        None => println_colored!(DIM, "  No upcoming prayer data"),
    }
    Ok(())
}

fn print_next(next: &PrayerTime, now: i64) {
    let countdown = time_until(next, now);
    println_colored!(
        AMBER,
        "  Next: {} at {} — {} remaining",
        next.name,
        format_instant(next.timestamp),
        format_countdown(&countdown)
    );
}

/// Today's next prayer, or tomorrow's Fajr once Isha has started.
fn next_with_rollover(
    conn: &Connection,
    config: &AppConfig,
    session: &Session,
    times: &DailyPrayerTimes,
    today: NaiveDate,
    now: i64,
) -> Result<Option<PrayerTime>> {
    let calc = ScheduleCalculator::local();
    if let Some(next) = calc.next_prayer(times, today, now) {
        return Ok(Some(next));
    }
    let tomorrow_times = match today.succ_opt() {
        Some(tomorrow) => PrayerTimesService::from_config(config)?.load(conn, session, tomorrow),
        None => None,
    };
    Ok(calc.next_prayer_rolling(times, tomorrow_times.as_ref(), today, now))
}

fn load_schedule(
    conn: &Connection,
    config: &AppConfig,
    session: &Session,
    day: NaiveDate,
) -> Result<Option<DailyPrayerTimes>> {
    if session.profile.coordinates().is_none() {
        println_colored!(
            AMBER,
            "  No location set. Use `waqt profile set --lat <deg> --lng <deg>`."
        );
        return Ok(None);
    }

    let service = PrayerTimesService::from_config(config)?;
    let times = service.load(conn, session, day);
    if times.is_none() {
        println_colored!(RED, "  Prayer times are unavailable right now. Try again later.");
    }
    Ok(times)
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub fn handle_signin(conn: &Connection, config: &AppConfig, name: &str) -> Result<()> {
    if let Some(existing) = Session::resume(conn, config)? {
        println_colored!(DIM, "  Ending session for {}", existing.user);
        existing.sign_out(conn)?;
    }
    let session = Session::sign_in(conn, config, name)?;
    println_colored!(GREEN, "  ✓ Signed in as {}", session.user);
    Ok(())
}

pub fn handle_signout(conn: &Connection, config: &AppConfig) -> Result<()> {
    match Session::resume(conn, config)? {
        Some(session) => {
            let user = session.user.clone();
            session.sign_out(conn)?;
            println_colored!(GREEN, "  ✓ Signed out {}", user);
        }
        None => println_colored!(DIM, "  Not signed in"),
    }
    Ok(())
}

pub fn handle_whoami(conn: &Connection, config: &AppConfig) -> Result<()> {
    match Session::resume(conn, config)? {
        Some(session) => {
            println_colored!(BOLD, "  {}", session.user);
            println_colored!(
                DIM,
                "  signed in since {}",
                session.signed_in_at.format("%Y-%m-%d %H:%M")
            );
        }
        None => println_colored!(DIM, "  Not signed in"),
    }
    Ok(())
}

// ─── Profile ─────────────────────────────────────────────────────────────────

pub fn handle_profile(config: &mut AppConfig, action: &ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::Show => {
            let profile = config.profile.to_profile();
            let method = method_label(&profile.calc_method).unwrap_or("custom");
            println!();
            println_colored!(GOLD, "  Profile");
            println!();
            println!("  Name:      {}", profile.full_name);
            println!("  Location:  {}", format_location(&profile));
            println!("  Method:    {} ({})", profile.calc_method, method);
            println!();
        }
        ProfileCommands::Set {
            name,
            location,
            lat,
            lng,
            method,
            clear_location,
        } => {
            if let Some(lat) = lat {
                if !(-90.0..=90.0).contains(lat) {
                    bail!("Latitude must be between -90 and 90, got {}", lat);
                }
            }
            if let Some(lng) = lng {
                if !(-180.0..=180.0).contains(lng) {
                    bail!("Longitude must be between -180 and 180, got {}", lng);
                }
            }
            if let Some(method) = method {
                if !is_known_method(method) {
                    bail!("Unknown calculation method '{}'. See `waqt methods`.", method);
                }
            }

            let profile = &mut config.profile;
            if let Some(name) = name {
                profile.full_name = name.clone();
            }
            if *clear_location {
                profile.latitude = None;
                profile.longitude = None;
                profile.location_name = None;
            }
            if let Some(location) = location {
                profile.location_name = Some(location.clone());
            }
            if lat.is_some() {
                profile.latitude = *lat;
            }
            if lng.is_some() {
                profile.longitude = *lng;
            }
            if let Some(method) = method {
                profile.calc_method = method.clone();
            }

            config.save()?;
            println_colored!(GREEN, "  ✓ Profile saved");
            if config.profile.latitude.is_some() != config.profile.longitude.is_some() {
                println_colored!(
                    AMBER,
                    "  Only one coordinate is set; prayer times need both --lat and --lng."
                );
            }
        }
    }
    Ok(())
}

pub fn handle_methods(config: &AppConfig) -> Result<()> {
    println!();
    for (code, label) in CALCULATION_METHODS {
        if *code == config.profile.calc_method {
            println_colored!(GOLD, "  {:<8}  {}  ◀", code, label);
        } else {
            println!("  {:<8}  {}", code, label);
        }
    }
    println!();
    Ok(())
}

// ─── Cache ───────────────────────────────────────────────────────────────────

pub fn handle_cache(conn: &Connection, config: &AppConfig, action: &CacheCommands) -> Result<()> {
    match action {
        CacheCommands::Clear => {
            let n = CacheRepo::clear_all(conn)?;
            println_colored!(GREEN, "  ✓ Removed {} cached schedules", n);
        }
        CacheCommands::Purge => {
            let n = CacheRepo::purge_expired(conn, config.cache.ttl(), Utc::now())?;
            let left = CacheRepo::count(conn)?;
            println_colored!(
                GREEN,
                "  ✓ Removed {} expired schedules ({} kept)",
                n,
                left
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrayerName;

    fn prayer(name: PrayerName, timestamp: i64) -> PrayerTime {
        PrayerTime {
            name,
            time: "00:00".to_string(),
            timestamp: Some(timestamp),
        }
    }

    #[test]
    fn other_days_are_listed_without_progress() {
        let isha = prayer(PrayerName::Isha, 1_000);
        assert_eq!(row_style(&isha, None, false, 5_000), RowStyle::Plain);
        assert_eq!(row_style(&isha, None, false, 0), RowStyle::Plain);
    }

    #[test]
    fn today_marks_current_past_and_upcoming() {
        let fajr = prayer(PrayerName::Fajr, 1_000);
        let dhuhr = prayer(PrayerName::Dhuhr, 2_000);
        let asr = prayer(PrayerName::Asr, 9_000);
        let now = 2_500;
        assert_eq!(row_style(&fajr, Some(&dhuhr), true, now), RowStyle::Past);
        assert_eq!(row_style(&dhuhr, Some(&dhuhr), true, now), RowStyle::Current);
        assert_eq!(row_style(&asr, Some(&dhuhr), true, now), RowStyle::Upcoming);
    }
}
