use chrono::{Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::models::{Countdown, DailyPrayerTimes, PrayerName, PrayerTime};

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_SECOND: i64 = 1000;

/// Turns a fetched daily schedule into absolute instants and answers
/// "which prayer is next / which one are we in" against a given `now`.
///
/// Stateless: every lookup rebuilds the five instants from the schedule.
/// The zone is only used to anchor `HH:MM` strings to the calendar date.
#[derive(Debug, Clone)]
pub struct ScheduleCalculator<Tz: TimeZone> {
    tz: Tz,
}

impl ScheduleCalculator<Local> {
    pub fn local() -> Self {
        Self::new(Local)
    }
}

impl<Tz: TimeZone> ScheduleCalculator<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The five prayers of `today` in canonical order (not sorted by instant).
    pub fn to_timestamped_list(
        &self,
        schedule: &DailyPrayerTimes,
        today: NaiveDate,
    ) -> [PrayerTime; 5] {
        PrayerName::ALL.map(|name| self.anchor(schedule, name, today))
    }

    /// First prayer strictly after `now_ms`, or `None` once Isha has started.
    pub fn next_prayer(
        &self,
        schedule: &DailyPrayerTimes,
        today: NaiveDate,
        now_ms: i64,
    ) -> Option<PrayerTime> {
        self.to_timestamped_list(schedule, today)
            .into_iter()
            .find(|p| p.is_after(now_ms))
    }

    /// Most recently started prayer, or `None` before Fajr.
    pub fn current_prayer(
        &self,
        schedule: &DailyPrayerTimes,
        today: NaiveDate,
        now_ms: i64,
    ) -> Option<PrayerTime> {
        let mut current = None;
        for prayer in self.to_timestamped_list(schedule, today) {
            if !prayer.has_started(now_ms) {
                break;
            }
            current = Some(prayer);
        }
        current
    }

    /// Like [`next_prayer`](Self::next_prayer), but after Isha falls through
    /// to Fajr of the following day when its schedule is available.
    pub fn next_prayer_rolling(
        &self,
        today_schedule: &DailyPrayerTimes,
        tomorrow_schedule: Option<&DailyPrayerTimes>,
        today: NaiveDate,
        now_ms: i64,
    ) -> Option<PrayerTime> {
        self.next_prayer(today_schedule, today, now_ms).or_else(|| {
            let tomorrow_schedule = tomorrow_schedule?;
            let tomorrow = today.succ_opt()?;
            let fajr = self.anchor(tomorrow_schedule, PrayerName::Fajr, tomorrow);
            fajr.is_after(now_ms).then_some(fajr)
        })
    }

    fn anchor(&self, schedule: &DailyPrayerTimes, name: PrayerName, date: NaiveDate) -> PrayerTime {
        let time = schedule.time_of(name);
        let timestamp = NaiveTime::parse_from_str(time, "%H:%M")
            .ok()
            .and_then(|t| self.resolve(date.and_time(t)));

        PrayerTime {
            name,
            time: time.to_string(),
            timestamp,
        }
    }

    /// Ambiguous wall times take the earlier instant; a time skipped by a
    /// forward transition is pushed past the gap.
    fn resolve(&self, local: NaiveDateTime) -> Option<i64> {
        let dt = match self.tz.from_local_datetime(&local) {
            LocalResult::None => {
                let shifted = local.checked_add_signed(Duration::hours(1))?;
                self.tz.from_local_datetime(&shifted).earliest()?
            }
            other => other.earliest()?,
        };
        Some(dt.timestamp_millis())
    }
}

/// Time left until `target`. Anything already passed (or unanchored) is zero.
pub fn time_until(target: &PrayerTime, now_ms: i64) -> Countdown {
    let diff = match target.timestamp {
        Some(ts) => ts - now_ms,
        None => return Countdown::default(),
    };
    if diff <= 0 {
        return Countdown::default();
    }

    Countdown {
        hours: diff / MS_PER_HOUR,
        minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
        seconds: (diff % MS_PER_MINUTE) / MS_PER_SECOND,
    }
}

/// `1h 30m`, `5m 20s` or `45s`. Seconds are dropped once hours show.
pub fn format_countdown(countdown: &Countdown) -> String {
    let Countdown {
        hours,
        minutes,
        seconds,
    } = *countdown;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Strip the provider's trailing annotation: `"04:32 (+03)"` -> `"04:32"`.
pub fn clean_time(raw: &str) -> &str {
    raw.split(' ').next().unwrap_or(raw)
}

/// Wall-clock now, in the same unit as [`PrayerTime::timestamp`].
pub fn now_ms() -> i64 {
    Local::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn schedule() -> DailyPrayerTimes {
        DailyPrayerTimes {
            date: "2024-03-10".to_string(),
            fajr: "05:00".to_string(),
            dhuhr: "12:15".to_string(),
            asr: "15:40".to_string(),
            maghrib: "18:05".to_string(),
            isha: "19:30".to_string(),
            sunrise: Some("06:20".to_string()),
            sunset: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> i64 {
        Utc.from_utc_datetime(&day().and_hms_opt(h, m, s).unwrap())
            .timestamp_millis()
    }

    fn calc() -> ScheduleCalculator<Utc> {
        ScheduleCalculator::new(Utc)
    }

    #[test]
    fn lists_five_prayers_in_canonical_order() {
        let list = calc().to_timestamped_list(&schedule(), day());
        let names: Vec<_> = list.iter().map(|p| p.name).collect();
        assert_eq!(names, PrayerName::ALL.to_vec());
        assert_eq!(list[0].time, "05:00");
        assert_eq!(list[0].timestamp, Some(at(5, 0, 0)));
        assert_eq!(list[4].timestamp, Some(at(19, 30, 0)));
    }

    #[test]
    fn keeps_provider_order_even_when_unsorted() {
        let mut s = schedule();
        s.asr = "11:00".to_string();
        let list = calc().to_timestamped_list(&s, day());
        assert_eq!(list[2].name, PrayerName::Asr);
        assert_eq!(list[2].timestamp, Some(at(11, 0, 0)));
    }

    #[test]
    fn anchors_in_the_given_zone() {
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let list = ScheduleCalculator::new(plus_three).to_timestamped_list(&schedule(), day());
        assert_eq!(list[0].timestamp, Some(at(2, 0, 0)));
    }

    #[test]
    fn same_inputs_give_same_list() {
        let c = calc();
        assert_eq!(
            c.to_timestamped_list(&schedule(), day()),
            c.to_timestamped_list(&schedule(), day())
        );
    }

    /// New York around the 2024-03-10 spring-forward: 02:00-03:00 local
    /// does not exist.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn est() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }
        fn edt() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, _: &NaiveDate) -> LocalResult<FixedOffset> {
            LocalResult::Single(Self::est())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_start = day().and_hms_opt(2, 0, 0).unwrap();
            let gap_end = day().and_hms_opt(3, 0, 0).unwrap();
            if *local < gap_start {
                LocalResult::Single(Self::est())
            } else if *local < gap_end {
                LocalResult::None
            } else {
                LocalResult::Single(Self::edt())
            }
        }

        fn offset_from_utc_date(&self, _: &NaiveDate) -> FixedOffset {
            Self::est()
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < day().and_hms_opt(7, 0, 0).unwrap() {
                Self::est()
            } else {
                Self::edt()
            }
        }
    }

    #[test]
    fn time_inside_dst_gap_moves_forward() {
        let mut s = schedule();
        s.fajr = "02:30".to_string();
        let c = ScheduleCalculator::new(SpringForward);

        let list = c.to_timestamped_list(&s, day());
        // 03:30 EDT
        assert_eq!(list[0].timestamp, Some(at(7, 30, 0)));
        assert_eq!(list[1].timestamp, Some(at(16, 15, 0)));

        // local midnight, EST
        let next = c.next_prayer(&s, day(), at(5, 0, 0)).unwrap();
        assert_eq!(next.name, PrayerName::Fajr);
    }

    #[test]
    fn malformed_time_has_no_instant() {
        let mut s = schedule();
        s.dhuhr = "noon".to_string();
        let list = calc().to_timestamped_list(&s, day());
        assert_eq!(list[1].timestamp, None);
        assert_eq!(list[1].time, "noon");
    }

    #[test]
    fn next_prayer_before_fajr_is_fajr() {
        let next = calc().next_prayer(&schedule(), day(), at(3, 0, 0)).unwrap();
        assert_eq!(next.name, PrayerName::Fajr);
    }

    #[test]
    fn next_prayer_is_strictly_after_now() {
        let c = calc();
        let next = c.next_prayer(&schedule(), day(), at(12, 15, 0)).unwrap();
        assert_eq!(next.name, PrayerName::Asr);
        let next = c.next_prayer(&schedule(), day(), at(12, 14, 59)).unwrap();
        assert_eq!(next.name, PrayerName::Dhuhr);
    }

    #[test]
    fn next_prayer_after_isha_is_none() {
        assert!(calc().next_prayer(&schedule(), day(), at(19, 30, 0)).is_none());
        assert!(calc().next_prayer(&schedule(), day(), at(23, 0, 0)).is_none());
    }

    #[test]
    fn next_prayer_skips_unanchored_entries() {
        let mut s = schedule();
        s.dhuhr = "??".to_string();
        let next = calc().next_prayer(&s, day(), at(10, 0, 0)).unwrap();
        assert_eq!(next.name, PrayerName::Asr);
    }

    #[test]
    fn rolling_next_prayer_falls_through_to_tomorrow_fajr() {
        let mut tomorrow = schedule();
        tomorrow.date = "2024-03-11".to_string();
        tomorrow.fajr = "04:59".to_string();

        let c = calc();
        let next = c
            .next_prayer_rolling(&schedule(), Some(&tomorrow), day(), at(21, 0, 0))
            .unwrap();
        assert_eq!(next.name, PrayerName::Fajr);
        assert_eq!(next.time, "04:59");
        assert_eq!(next.timestamp, Some(at(4, 59, 0) + 24 * MS_PER_HOUR));

        assert!(c.next_prayer_rolling(&schedule(), None, day(), at(21, 0, 0)).is_none());

        let same_day = c
            .next_prayer_rolling(&schedule(), Some(&tomorrow), day(), at(16, 0, 0))
            .unwrap();
        assert_eq!(same_day.name, PrayerName::Maghrib);
    }

    #[test]
    fn current_prayer_is_last_started() {
        let c = calc();
        assert!(c.current_prayer(&schedule(), day(), at(4, 59, 59)).is_none());
        assert_eq!(
            c.current_prayer(&schedule(), day(), at(5, 0, 0)).unwrap().name,
            PrayerName::Fajr
        );
        assert_eq!(
            c.current_prayer(&schedule(), day(), at(16, 0, 0)).unwrap().name,
            PrayerName::Asr
        );
        assert_eq!(
            c.current_prayer(&schedule(), day(), at(23, 0, 0)).unwrap().name,
            PrayerName::Isha
        );
    }

    #[test]
    fn current_prayer_stops_at_first_future_entry() {
        let mut s = schedule();
        // Out of order on purpose: Asr "later" than Maghrib.
        s.asr = "20:00".to_string();
        let current = calc().current_prayer(&s, day(), at(19, 0, 0)).unwrap();
        assert_eq!(current.name, PrayerName::Dhuhr);
    }

    #[test]
    fn time_until_splits_hours_minutes_seconds() {
        let target = PrayerTime {
            name: PrayerName::Maghrib,
            time: "18:05".to_string(),
            timestamp: Some(5_400_000),
        };
        assert_eq!(
            time_until(&target, 0),
            Countdown {
                hours: 1,
                minutes: 30,
                seconds: 0
            }
        );
        assert_eq!(
            time_until(&target, 999),
            Countdown {
                hours: 1,
                minutes: 29,
                seconds: 59
            }
        );
    }

    #[test]
    fn time_until_passed_target_is_zero() {
        let target = PrayerTime {
            name: PrayerName::Fajr,
            time: "05:00".to_string(),
            timestamp: Some(1_000),
        };
        assert_eq!(time_until(&target, 1_000), Countdown::default());
        assert_eq!(time_until(&target, 50_000), Countdown::default());

        let unanchored = PrayerTime {
            timestamp: None,
            ..target
        };
        assert!(time_until(&unanchored, 0).is_zero());
    }

    #[test]
    fn formats_countdown_by_magnitude() {
        let fmt = |hours, minutes, seconds| {
            format_countdown(&Countdown {
                hours,
                minutes,
                seconds,
            })
        };
        assert_eq!(fmt(1, 30, 0), "1h 30m");
        assert_eq!(fmt(0, 5, 20), "5m 20s");
        assert_eq!(fmt(0, 0, 45), "45s");
        assert_eq!(fmt(0, 0, 0), "0s");
        assert_eq!(fmt(2, 0, 59), "2h 0m");
    }

    #[test]
    fn cleans_provider_annotations() {
        assert_eq!(clean_time("04:32 (+03)"), "04:32");
        assert_eq!(clean_time("04:32"), "04:32");
        assert_eq!(clean_time(""), "");
    }
}
