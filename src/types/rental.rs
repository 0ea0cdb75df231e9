//! Rental record types and the rental state machine
//!
//! A rental is persisted once it is committed (stock reserved and fee
//! debited) and from then on only moves along the transition table encoded
//! in [`RentalStatus::can_transition_to`].

use super::error::LedgerError;
use super::ids::{BookId, RentalId, UserId};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Fixed loan period applied to every new rental
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// Rental state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RentalStatus {
    /// The book is out with the user
    Borrowed,

    /// The book came back; terminal
    Returned,

    /// The book is past its due date and still out
    ///
    /// Only ever produced by [`RentalRecord::status_at`], never stored.
    Overdue,
}

impl RentalStatus {
    /// Transition table
    ///
    /// | from     | to       |
    /// |----------|----------|
    /// | Borrowed | Returned |
    /// | Borrowed | Overdue  |
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        matches!(
            (self, next),
            (RentalStatus::Borrowed, RentalStatus::Returned)
                | (RentalStatus::Borrowed, RentalStatus::Overdue)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Borrowed => "Borrowed",
            RentalStatus::Returned => "Returned",
            RentalStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed rental
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalRecord {
    pub id: RentalId,
    pub book: BookId,
    pub user: UserId,

    /// When the rental was committed
    pub rent_date: DateTime<Utc>,

    /// Due date while borrowed, actual return time once returned
    pub return_date: Option<DateTime<Utc>>,

    /// Persisted status; see [`RentalRecord::status_at`] for the reported one
    pub status: RentalStatus,

    /// Fee debited when the rental was created
    ///
    /// Frozen at creation: later price changes never alter it.
    pub cost_charged: u64,
}

impl RentalRecord {
    /// Build a freshly borrowed rental due after the fixed loan period
    ///
    /// Fails when the due date is past the largest representable instant.
    pub fn borrowed(
        id: RentalId,
        book: BookId,
        user: UserId,
        cost_charged: u64,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let due = now
            .checked_add_signed(Duration::days(LOAN_PERIOD_DAYS))
            .ok_or_else(|| LedgerError::arithmetic_overflow("rental due date"))?;

        Ok(RentalRecord {
            id,
            book,
            user,
            rent_date: now,
            return_date: Some(due),
            status: RentalStatus::Borrowed,
            cost_charged,
        })
    }

    /// Status as reported at `now`
    ///
    /// A borrowed rental whose due date has passed reads as `Overdue`.
    pub fn status_at(&self, now: DateTime<Utc>) -> RentalStatus {
        match (self.status, self.return_date) {
            (RentalStatus::Borrowed, Some(due)) if due < now => RentalStatus::Overdue,
            (status, _) => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[rstest]
    #[case::borrowed_to_returned(RentalStatus::Borrowed, RentalStatus::Returned, true)]
    #[case::borrowed_to_overdue(RentalStatus::Borrowed, RentalStatus::Overdue, true)]
    #[case::borrowed_to_borrowed(RentalStatus::Borrowed, RentalStatus::Borrowed, false)]
    #[case::returned_to_borrowed(RentalStatus::Returned, RentalStatus::Borrowed, false)]
    #[case::returned_to_returned(RentalStatus::Returned, RentalStatus::Returned, false)]
    #[case::overdue_to_returned(RentalStatus::Overdue, RentalStatus::Returned, false)]
    fn test_transition_table(
        #[case] from: RentalStatus,
        #[case] to: RentalStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_borrowed_record_is_due_after_loan_period() {
        let record = RentalRecord::borrowed(1, 10, 20, 5000, start()).unwrap();

        assert_eq!(record.status, RentalStatus::Borrowed);
        assert_eq!(record.rent_date, start());
        assert_eq!(record.return_date, Some(start() + Duration::days(7)));
        assert_eq!(record.cost_charged, 5000);
    }

    #[test]
    fn test_borrowed_due_date_overflow_is_rejected() {
        let now = DateTime::<Utc>::MAX_UTC - Duration::days(1);

        assert_eq!(
            RentalRecord::borrowed(1, 10, 20, 5000, now),
            Err(LedgerError::arithmetic_overflow("rental due date"))
        );
    }

    #[rstest]
    #[case::same_day(Duration::zero(), RentalStatus::Borrowed)]
    #[case::exactly_due(Duration::days(7), RentalStatus::Borrowed)]
    #[case::one_second_late(Duration::days(7) + Duration::seconds(1), RentalStatus::Overdue)]
    #[case::weeks_late(Duration::days(30), RentalStatus::Overdue)]
    fn test_status_at_derives_overdue(#[case] elapsed: Duration, #[case] expected: RentalStatus) {
        let record = RentalRecord::borrowed(1, 10, 20, 5000, start()).unwrap();

        assert_eq!(record.status_at(start() + elapsed), expected);
    }

    #[test]
    fn test_returned_record_never_reads_overdue() {
        let mut record = RentalRecord::borrowed(1, 10, 20, 5000, start()).unwrap();
        record.status = RentalStatus::Returned;
        record.return_date = Some(start() + Duration::days(2));

        assert_eq!(
            record.status_at(start() + Duration::days(60)),
            RentalStatus::Returned
        );
    }
}
