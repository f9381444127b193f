//! The booking engine
//!
//! Decides, for one (crew, date) slot at a time, whether a request ends
//! up CONFIRMED or WAITING. The past-date check, the duplicate check, the
//! capacity comparison and the insert run as one unit under the slot
//! lock; the confirmed count is re-derived from the ledger on every
//! decision instead of being cached.

use chrono::NaiveDate;
use common::{BookingError, DbConn, Error, RedisConn};
use models::{
	NewReservation,
	PrimitiveCrew,
	PrimitiveReservation,
	ReservationStatus,
};

use crate::lock::SlotLock;
use crate::promotion;

/// Book one slot for a member
///
/// Guest-accompanied bookings are not waitlisted: a full slot is a hard
/// [`BookingError::SoldOut`] for them, while plain member bookings fall
/// back to WAITING.
#[instrument(skip(conn, redis))]
pub async fn book_slot(
	member_id: i32,
	crew: &PrimitiveCrew,
	date: NaiveDate,
	guest_id: Option<i32>,
	today: NaiveDate,
	conn: &DbConn,
	redis: &mut RedisConn,
) -> Result<PrimitiveReservation, Error> {
	let lock = SlotLock::acquire(crew.id, date, redis).await?;

	let result =
		decide_and_insert(member_id, crew, date, guest_id, today, conn).await;

	lock.release(redis).await?;

	result
}

/// Cancel a member's reservation for one slot
///
/// Returns whether a reservation was found to cancel. Cancelling a
/// CONFIRMED reservation frees exactly one slot, so the oldest WAITING
/// reservation (if any) is promoted in the same lock hold; cancelling a
/// WAITING reservation frees nothing and promotes nothing.
#[instrument(skip(conn, redis))]
pub async fn cancel_slot(
	member_id: i32,
	crew: &PrimitiveCrew,
	date: NaiveDate,
	conn: &DbConn,
	redis: &mut RedisConn,
) -> Result<bool, Error> {
	let lock = SlotLock::acquire(crew.id, date, redis).await?;

	let result = cancel_and_promote(member_id, crew, date, conn).await;

	lock.release(redis).await?;

	result
}

async fn decide_and_insert(
	member_id: i32,
	crew: &PrimitiveCrew,
	date: NaiveDate,
	guest_id: Option<i32>,
	today: NaiveDate,
	conn: &DbConn,
) -> Result<PrimitiveReservation, Error> {
	if date < today {
		return Err(BookingError::PastDate.into());
	}

	let existing = PrimitiveReservation::find_active_for_member(
		member_id, crew.id, date, conn,
	)
	.await?;

	if existing.is_some() {
		return Err(BookingError::Duplicate.into());
	}

	let active =
		PrimitiveReservation::count_active_for_slot(crew.id, date, conn)
			.await?;

	let status = if active < i64::from(crew.capacity) {
		ReservationStatus::Confirmed
	} else if guest_id.is_some() {
		return Err(BookingError::SoldOut.into());
	} else {
		ReservationStatus::Waiting
	};

	let reservation = NewReservation {
		member_id,
		crew_id: crew.id,
		guest_id,
		date,
		status,
	}
	.insert(conn)
	.await?;

	Ok(reservation)
}

async fn cancel_and_promote(
	member_id: i32,
	crew: &PrimitiveCrew,
	date: NaiveDate,
	conn: &DbConn,
) -> Result<bool, Error> {
	let Some(reservation) = PrimitiveReservation::find_active_for_member(
		member_id, crew.id, date, conn,
	)
	.await?
	else {
		return Ok(false);
	};

	PrimitiveReservation::cancel_by_id(reservation.id, conn).await?;

	if reservation.status == ReservationStatus::Confirmed {
		promotion::promote_slot(crew, date, 1, conn).await?;
	}

	Ok(true)
}
