use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Latest reset instant at or before `now`, with `at` read as wall-clock time in `tz`.
///
/// Local times skipped by a DST jump resolve to the first valid instant after them.
pub fn most_recent_boundary<Tz: TimeZone>(now: DateTime<Utc>, at: NaiveTime, tz: &Tz) -> DateTime<Utc> {
    let local_today = now.with_timezone(tz).date_naive();
    let today = boundary_on(local_today, at, tz);
    if today <= now {
        return today;
    }
    match local_today.pred_opt() {
        Some(yesterday) => boundary_on(yesterday, at, tz),
        None => today,
    }
}

/// The reset instant on a given local date.
pub fn boundary_on<Tz: TimeZone>(date: NaiveDate, at: NaiveTime, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(at);
    (0..=2)
        .find_map(|hours| {
            tz.from_local_datetime(&(naive + Duration::hours(hours)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn boundary_later_today_falls_back_to_yesterday() {
        let at = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let boundary = most_recent_boundary(utc("2024-03-10T02:00:00Z"), at, &Utc);
        assert_eq!(boundary, utc("2024-03-09T04:00:00Z"));
    }

    #[test]
    fn boundary_earlier_today_is_today() {
        let at = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let boundary = most_recent_boundary(utc("2024-03-10T09:30:00Z"), at, &Utc);
        assert_eq!(boundary, utc("2024-03-10T04:00:00Z"));
    }

    #[test]
    fn boundary_respects_local_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let boundary = most_recent_boundary(utc("2024-03-10T23:30:00Z"), NaiveTime::MIN, &tz);
        // 23:30Z is 01:30 local on the 11th; local midnight is 22:00Z on the 10th.
        assert_eq!(boundary, utc("2024-03-10T22:00:00Z"));
    }
}
