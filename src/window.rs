//! The booking window gate
//!
//! A crew may configure a recurring weekly open instant: booking for a
//! date in week N opens on the crew's chosen weekday of week N - 1 at the
//! configured time. Every date additionally has a fixed close deadline at
//! 02:00 the night after it. All instants are naive UTC; `now` is passed
//! in so the gate stays a pure function.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use common::BookingError;
use models::{DayOfWeek, PrimitiveCrew};

/// Check whether the booking window for `date` is open at `now`
///
/// A crew without a configured weekly open day/time is open at any time
/// before the close deadline.
pub fn check_open(
	crew: &PrimitiveCrew,
	date: NaiveDate,
	now: NaiveDateTime,
) -> Result<(), BookingError> {
	let close = close_deadline(date);

	if now > close {
		return Err(BookingError::Closed(close));
	}

	let (Some(open_day), Some(open_time)) = (crew.open_day, crew.open_time)
	else {
		return Ok(());
	};

	let open = open_instant(date, open_day, open_time);

	if now < open {
		return Err(BookingError::NotOpenYet(open));
	}

	Ok(())
}

/// The instant at which booking for `date` closes
///
/// Bookings stay possible into the small hours of the night after the
/// date itself.
#[must_use]
pub fn close_deadline(date: NaiveDate) -> NaiveDateTime {
	let close_time = NaiveTime::from_hms_opt(2, 0, 0).unwrap();

	(date + Duration::days(1)).and_time(close_time)
}

/// The instant at which booking for `date` opens
///
/// Weeks start on Monday; the open instant lies on the configured weekday
/// of the week before the week `date` falls in.
#[must_use]
pub fn open_instant(
	date: NaiveDate,
	open_day: DayOfWeek,
	open_time: NaiveTime,
) -> NaiveDateTime {
	let monday = date.week(Weekday::Mon).first_day();
	let previous_monday = monday - Duration::weeks(1);

	let open_date = previous_monday
		+ Duration::days(i64::from(
			open_day.to_weekday().num_days_from_monday(),
		));

	open_date.and_time(open_time)
}
