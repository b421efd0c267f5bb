use crate::domain::models::{
    attendance::{AttendanceStats, AttendanceStatus},
    event::EventConfig,
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Confirmed,
    Waitlisted { position: i32 },
}

impl Admission {
    pub fn waitlist_position(&self) -> Option<i32> {
        match self {
            Admission::Confirmed => None,
            Admission::Waitlisted { position } => Some(*position),
        }
    }
}

fn is_at_capacity(event: &EventConfig, stats: &AttendanceStats) -> bool {
    event.capacity.is_some_and(|cap| stats.seats_taken() >= i64::from(cap))
}

/// Decides how a new registration is admitted given the live counts of the event.
pub fn decide(event: &EventConfig, stats: &AttendanceStats) -> Result<Admission, AppError> {
    if !is_at_capacity(event, stats) {
        return Ok(Admission::Confirmed);
    }

    if !event.waitlist_enabled {
        return Err(AppError::EventFull);
    }

    if let Some(max) = event.waitlist_max_size
        && stats.waitlist_count >= i64::from(max) {
        return Err(AppError::WaitlistFull);
    }

    let position = i32::try_from(stats.waitlist_count + 1)
        .map_err(|_| AppError::WaitlistFull)?;

    Ok(Admission::Waitlisted { position })
}

/// Whether freeing a record with `vacated` status should pull the head of the waitlist.
/// `stats` are the counts after the record was cancelled.
pub fn should_promote(event: &EventConfig, vacated: AttendanceStatus, stats: &AttendanceStats) -> bool {
    vacated.holds_seat()
        && event.capacity.is_some()
        && stats.waitlist_count > 0
        && !is_at_capacity(event, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::event::NewEventParams;

    fn event(capacity: Option<i32>, waitlist_enabled: bool, waitlist_max_size: Option<i32>) -> EventConfig {
        EventConfig::new(NewEventParams {
            id: "ev-1".into(),
            host_id: "host-1".into(),
            title: "Mass Meeting".into(),
            published: true,
            attendance_enabled: true,
            password_hash: None,
            capacity,
            waitlist_enabled,
            waitlist_max_size,
        })
    }

    fn stats(confirmed: i64, waitlisted: i64) -> AttendanceStats {
        AttendanceStats { confirmed_count: confirmed, waitlist_count: waitlisted, attended_count: 0 }
    }

    #[test]
    fn uncapped_event_always_confirms() {
        let ev = event(None, false, None);
        assert_eq!(decide(&ev, &stats(10_000, 0)).unwrap(), Admission::Confirmed);
    }

    #[test]
    fn below_capacity_confirms() {
        let ev = event(Some(2), true, None);
        assert_eq!(decide(&ev, &stats(1, 0)).unwrap(), Admission::Confirmed);
    }

    #[test]
    fn full_event_without_waitlist_is_rejected() {
        let ev = event(Some(2), false, None);
        assert!(matches!(decide(&ev, &stats(2, 0)), Err(AppError::EventFull)));
    }

    #[test]
    fn full_event_appends_to_waitlist() {
        let ev = event(Some(2), true, None);
        assert_eq!(decide(&ev, &stats(2, 0)).unwrap(), Admission::Waitlisted { position: 1 });
        assert_eq!(decide(&ev, &stats(2, 4)).unwrap(), Admission::Waitlisted { position: 5 });
    }

    #[test]
    fn waitlist_cap_is_enforced() {
        let ev = event(Some(2), true, Some(3));
        assert_eq!(decide(&ev, &stats(2, 2)).unwrap(), Admission::Waitlisted { position: 3 });
        assert!(matches!(decide(&ev, &stats(2, 3)), Err(AppError::WaitlistFull)));
    }

    #[test]
    fn zero_capacity_goes_straight_to_waitlist() {
        let ev = event(Some(0), true, None);
        assert_eq!(decide(&ev, &stats(0, 0)).unwrap(), Admission::Waitlisted { position: 1 });
    }

    #[test]
    fn attended_records_occupy_seats() {
        let ev = event(Some(2), false, None);
        let s = AttendanceStats { confirmed_count: 1, waitlist_count: 0, attended_count: 1 };
        assert!(matches!(decide(&ev, &s), Err(AppError::EventFull)));
    }

    #[test]
    fn promotion_requires_a_vacated_seat_and_a_queue() {
        let ev = event(Some(2), true, None);
        assert!(should_promote(&ev, AttendanceStatus::Confirmed, &stats(1, 2)));
        assert!(!should_promote(&ev, AttendanceStatus::Waitlisted, &stats(1, 2)));
        assert!(!should_promote(&ev, AttendanceStatus::Confirmed, &stats(1, 0)));
        assert!(!should_promote(&ev, AttendanceStatus::Confirmed, &stats(2, 2)));
        assert!(!should_promote(&event(None, true, None), AttendanceStatus::Confirmed, &stats(1, 2)));
    }
}
