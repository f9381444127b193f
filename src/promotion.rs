//! The waitlist promoter
//!
//! WAITING reservations are promoted to CONFIRMED strictly in arrival
//! order (`created_at` ascending), and a promotion never pushes the
//! confirmed count of a slot above the crew's current capacity: the
//! remaining headroom is re-derived from the ledger at the instant of
//! promotion.

use chrono::NaiveDate;
use common::{BookingError, DbConn, Error, RedisConn};
use models::{PrimitiveCrew, PrimitiveReservation};

use crate::lock::SlotLock;

/// Promote up to `at_most` WAITING reservations for one slot, oldest
/// first, bounded by the slot's remaining capacity headroom
///
/// The caller must hold the slot lock for this (crew, date); the
/// cancellation path calls this in the same lock hold as the
/// cancellation write.
#[instrument(skip(conn))]
pub async fn promote_slot(
	crew: &PrimitiveCrew,
	date: NaiveDate,
	at_most: i64,
	conn: &DbConn,
) -> Result<usize, Error> {
	let confirmed =
		PrimitiveReservation::count_confirmed_for_slot(crew.id, date, conn)
			.await?;

	// A capacity shrink can leave a slot over capacity; promotion then
	// stays disabled until enough confirmed rows are cancelled.
	let remaining = i64::from(crew.capacity) - confirmed;

	if remaining <= 0 {
		return Ok(0);
	}

	let waiting =
		PrimitiveReservation::waiting_for_slot(crew.id, date, conn).await?;

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let take = remaining.min(at_most).min(waiting.len() as i64) as usize;

	if take == 0 {
		return Ok(0);
	}

	let ids = waiting.iter().take(take).map(|r| r.id).collect();

	PrimitiveReservation::confirm_by_ids(ids, conn).await
}

/// Promote waitlisted reservations after a crew's capacity was raised
///
/// Every date that still has WAITING rows is visited and topped up to
/// the new capacity, oldest first. Each date is promoted under its own
/// slot lock so the top-up cannot race a concurrent booking for the same
/// date.
///
/// The capacity write has already committed when this runs, so a busy
/// slot is skipped rather than failing the whole pass; its waitlist is
/// topped up by the next cancellation or capacity change.
#[instrument(skip(conn, redis))]
pub async fn promote_after_capacity_increase(
	crew: &PrimitiveCrew,
	conn: &DbConn,
	redis: &mut RedisConn,
) -> Result<usize, Error> {
	let dates = PrimitiveReservation::dates_with_waiting(crew.id, conn).await?;

	let mut promoted = 0;

	for date in dates {
		let lock = match SlotLock::acquire(crew.id, date, redis).await {
			Ok(lock) => lock,
			Err(Error::BookingError(BookingError::LockTimeout)) => {
				warn!(
					"slot {}:{date} stayed busy, leaving its waitlist for a \
					 later pass",
					crew.id
				);

				continue;
			},
			Err(e) => return Err(e),
		};

		let result = promote_slot(crew, date, i64::MAX, conn).await;

		lock.release(redis).await?;

		promoted += result?;
	}

	if promoted > 0 {
		info!(
			"capacity increase promoted {promoted} reservation(s) for crew {}",
			crew.id
		);
	}

	Ok(promoted)
}
