//! Circulation rules: borrowing states, due dates and copy recounts.
//!
//! Pure functions only. The services apply these against the store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::CirculationError;

/// Loan period applied when the configuration does not override it
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Longest loan period the configuration accepts
pub const MAX_LOAN_PERIOD_DAYS: i64 = 3650;

/// Lifecycle of a single borrowing. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Borrowed,
    Returned,
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Borrowed => "borrowed",
            BorrowingStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BorrowingStatus {
    type Err = CirculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(BorrowingStatus::Borrowed),
            "returned" => Ok(BorrowingStatus::Returned),
            other => Err(CirculationError::Store(format!(
                "unknown borrowing status '{}'",
                other
            ))),
        }
    }
}

/// What to do when a copy-count edit removes more copies than are on the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyReductionPolicy {
    /// Floor available copies at zero and accept the edit
    #[default]
    Clamp,
    /// Refuse the edit while the loaned copies exceed the new total
    Reject,
}

impl FromStr for CopyReductionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(CopyReductionPolicy::Clamp),
            "reject" => Ok(CopyReductionPolicy::Reject),
            other => Err(format!("unknown copy reduction policy '{}'", other)),
        }
    }
}

/// Due date of a borrowing started at `borrowed_at`
pub fn due_date(
    borrowed_at: DateTime<Utc>,
    loan_period_days: i64,
) -> Result<DateTime<Utc>, CirculationError> {
    Duration::try_days(loan_period_days)
        .and_then(|period| borrowed_at.checked_add_signed(period))
        .ok_or_else(|| {
            CirculationError::Validation(format!(
                "loan period of {} days is out of range",
                loan_period_days
            ))
        })
}

/// Available copies after changing the total from `old_total` to `new_total`.
///
/// The shelf count moves by the same delta as the total. A result below zero
/// means copies currently on loan exceed the new total; `policy` decides
/// whether that is floored at zero or refused.
pub fn recount_available(
    old_total: i32,
    old_available: i32,
    new_total: i32,
    policy: CopyReductionPolicy,
) -> Result<i32, CirculationError> {
    if new_total < 1 {
        return Err(CirculationError::Validation(
            "total copies must be at least 1".to_string(),
        ));
    }

    let candidate = old_available + (new_total - old_total);
    if candidate >= 0 {
        return Ok(candidate.min(new_total));
    }

    match policy {
        CopyReductionPolicy::Clamp => Ok(0),
        CopyReductionPolicy::Reject => Err(CirculationError::Conflict(format!(
            "{} copies are on loan, cannot reduce total to {}",
            old_total - old_available,
            new_total
        ))),
    }
}

/// A borrowing is overdue while still out past its due date.
pub fn is_overdue(status: BorrowingStatus, due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == BorrowingStatus::Borrowed && due < now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_date_is_two_weeks_by_default() {
        let start = Utc.with_ymd_and_hms(2024, 2, 20, 10, 0, 0).unwrap();
        let due = due_date(start, DEFAULT_LOAN_PERIOD_DAYS).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn due_date_out_of_range_is_an_error() {
        let start = Utc.with_ymd_and_hms(2024, 2, 20, 10, 0, 0).unwrap();
        let err = due_date(start, 9_999_999_999_999).unwrap_err();
        assert!(matches!(err, CirculationError::Validation(_)));
        assert!(due_date(start, i64::MAX).is_err());
        assert!(due_date(start, MAX_LOAN_PERIOD_DAYS).is_ok());
    }

    #[test]
    fn recount_follows_the_delta() {
        // 3 owned, 1 on loan, buy 2 more
        assert_eq!(recount_available(3, 2, 5, CopyReductionPolicy::Clamp), Ok(4));
        // nothing on loan, drop to 1
        assert_eq!(recount_available(3, 3, 1, CopyReductionPolicy::Clamp), Ok(1));
    }

    #[test]
    fn recount_clamps_at_zero() {
        // 3 owned, all on loan, drop to 1
        assert_eq!(recount_available(3, 0, 1, CopyReductionPolicy::Clamp), Ok(0));
    }

    #[test]
    fn recount_rejects_when_configured() {
        let err = recount_available(3, 0, 1, CopyReductionPolicy::Reject).unwrap_err();
        assert!(matches!(err, CirculationError::Conflict(_)));
        // reductions that fit are still accepted
        assert_eq!(recount_available(3, 2, 2, CopyReductionPolicy::Reject), Ok(1));
    }

    #[test]
    fn recount_requires_one_copy() {
        let err = recount_available(3, 3, 0, CopyReductionPolicy::Clamp).unwrap_err();
        assert!(matches!(err, CirculationError::Validation(_)));
    }

    #[test]
    fn recount_never_exceeds_new_total() {
        // corrupt row with more on the shelf than owned
        assert_eq!(recount_available(2, 5, 3, CopyReductionPolicy::Clamp), Ok(3));
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!(
            "returned".parse::<BorrowingStatus>(),
            Ok(BorrowingStatus::Returned)
        );
        assert!("lost".parse::<BorrowingStatus>().is_err());
        assert_eq!(BorrowingStatus::Borrowed.to_string(), "borrowed");
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(
            " Reject ".parse::<CopyReductionPolicy>(),
            Ok(CopyReductionPolicy::Reject)
        );
        assert!("deficit".parse::<CopyReductionPolicy>().is_err());
    }

    #[test]
    fn only_open_borrowings_are_overdue() {
        let due = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(is_overdue(BorrowingStatus::Borrowed, due, now));
        assert!(!is_overdue(BorrowingStatus::Returned, due, now));
        assert!(!is_overdue(BorrowingStatus::Borrowed, now, due));
    }
}
