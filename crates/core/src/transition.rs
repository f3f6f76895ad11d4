//! Booking status state machine.
//!
//! ```text
//! Waiting ──Start──▶ InProgress
//!    │                  │
//!    ├──────Finish──────┼──▶ Finished
//!    └──────Cancel──────┴──▶ Cancelled
//! ```
//!
//! Finished and Cancelled are terminal.

use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, Utc};
use clinic_records::{BookingData, BookingStatus};
use std::fmt;

/// A requested status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Start,
    Finish,
    Cancel,
}

impl Transition {
    /// Status a booking ends up in after this transition.
    pub fn target(self) -> BookingStatus {
        match self {
            Transition::Start => BookingStatus::InProgress,
            Transition::Finish => BookingStatus::Finished,
            Transition::Cancel => BookingStatus::Cancelled,
        }
    }

    /// Statuses from which this transition may be taken.
    pub fn sources(self) -> &'static [BookingStatus] {
        match self {
            Transition::Start => &[BookingStatus::Waiting],
            Transition::Finish | Transition::Cancel => {
                &[BookingStatus::Waiting, BookingStatus::InProgress]
            }
        }
    }

    /// Transitions available from `status`. Terminal statuses have none.
    pub fn available_from(status: BookingStatus) -> Vec<Transition> {
        if status.is_terminal() {
            return Vec::new();
        }
        [Transition::Start, Transition::Finish, Transition::Cancel]
            .into_iter()
            .filter(|t| t.sources().contains(&status))
            .collect()
    }

    /// Check that `booking` may take this transition.
    ///
    /// Finishing a booking that is already finished gets its own error so callers can report
    /// a duplicate submission distinctly from other conflicts.
    pub fn check(self, booking: &BookingData) -> ClinicResult<()> {
        if self.sources().contains(&booking.status) {
            return Ok(());
        }

        tracing::warn!(
            booking_id = %booking.id,
            from = %booking.status,
            to = %self.target(),
            "rejected booking transition"
        );

        if self == Transition::Finish && booking.status == BookingStatus::Finished {
            return Err(ClinicError::AlreadyFinished(booking.id));
        }
        Err(ClinicError::InvalidTransition {
            id: booking.id,
            from: booking.status,
            to: self.target(),
        })
    }

    /// Check, then move `booking` into the target status and stamp its timestamps.
    pub fn apply(self, booking: &mut BookingData, now: DateTime<Utc>) -> ClinicResult<()> {
        self.check(booking)?;

        match self {
            Transition::Start => booking.started_at = Some(now),
            Transition::Finish => {
                booking.started_at.get_or_insert(now);
                booking.finished_at = Some(now);
            }
            Transition::Cancel => {}
        }
        booking.status = self.target();
        booking.updated_at = now;
        Ok(())
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transition::Start => "start",
            Transition::Finish => "finish",
            Transition::Cancel => "cancel",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use clinic_uuid::RecordId;

    fn booking(status: BookingStatus) -> BookingData {
        let created = Utc.with_ymd_and_hms(2026, 2, 23, 9, 0, 0).unwrap();
        BookingData {
            id: RecordId::new(),
            patient_id: RecordId::new(),
            doctor_id: RecordId::new(),
            appointment_time: NaiveDate::from_ymd_opt(2026, 2, 24)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            status,
            started_at: None,
            finished_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 24, 2, 5, 0).unwrap()
    }

    #[test]
    fn test_finish_from_waiting_sets_both_timestamps() {
        let mut b = booking(BookingStatus::Waiting);
        Transition::Finish.apply(&mut b, now()).unwrap();

        assert_eq!(b.status, BookingStatus::Finished);
        assert_eq!(b.started_at, Some(now()));
        assert_eq!(b.finished_at, Some(now()));
        assert_eq!(b.updated_at, now());
    }

    #[test]
    fn test_finish_from_in_progress_keeps_started_at() {
        let started = Utc.with_ymd_and_hms(2026, 2, 24, 1, 50, 0).unwrap();
        let mut b = booking(BookingStatus::Waiting);
        Transition::Start.apply(&mut b, started).unwrap();
        assert_eq!(b.status, BookingStatus::InProgress);

        Transition::Finish.apply(&mut b, now()).unwrap();
        assert_eq!(b.started_at, Some(started));
        assert_eq!(b.finished_at, Some(now()));
    }

    #[test]
    fn test_cancel_leaves_timestamps_alone() {
        let mut b = booking(BookingStatus::Waiting);
        Transition::Cancel.apply(&mut b, now()).unwrap();

        assert_eq!(b.status, BookingStatus::Cancelled);
        assert_eq!(b.started_at, None);
        assert_eq!(b.finished_at, None);
    }

    #[test]
    fn test_finishing_twice_is_already_finished() {
        let mut b = booking(BookingStatus::Waiting);
        Transition::Finish.apply(&mut b, now()).unwrap();
        let before = b.clone();

        let err = Transition::Finish.apply(&mut b, now()).unwrap_err();
        assert!(matches!(err, ClinicError::AlreadyFinished(id) if id == b.id));
        assert_eq!(b, before);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in [BookingStatus::Finished, BookingStatus::Cancelled] {
            assert!(Transition::available_from(status).is_empty());
        }
        let mut b = booking(BookingStatus::Cancelled);
        assert!(matches!(
            Transition::Finish.apply(&mut b, now()),
            Err(ClinicError::InvalidTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Finished,
                ..
            })
        ));
    }

    #[test]
    fn test_start_only_from_waiting() {
        let mut b = booking(BookingStatus::InProgress);
        assert!(matches!(
            Transition::Start.apply(&mut b, now()),
            Err(ClinicError::InvalidTransition { .. })
        ));
        assert_eq!(
            Transition::available_from(BookingStatus::Waiting),
            vec![Transition::Start, Transition::Finish, Transition::Cancel]
        );
        assert_eq!(
            Transition::available_from(BookingStatus::InProgress),
            vec![Transition::Finish, Transition::Cancel]
        );
    }
}
