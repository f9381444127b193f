use chrono::{NaiveDate, NaiveDateTime};
use common::{DbConn, Error};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use crate::PrimitiveMember;
use crate::schema::{member, reservation};

/// Lifecycle state of a reservation
///
/// The only transitions are WAITING -> CONFIRMED (promotion) and
/// {CONFIRMED, WAITING} -> CANCELLED; CANCELLED is terminal.
#[derive(
	Clone, Copy, DbEnum, Debug, Deserialize, Eq, PartialEq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::ReservationStatus"]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
	Confirmed,
	Waiting,
	Cancelled,
}

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = reservation)]
#[diesel(check_for_backend(Pg))]
pub struct PrimitiveReservation {
	pub id:         i32,
	pub member_id:  i32,
	pub crew_id:    i32,
	pub guest_id:   Option<i32>,
	pub date:       NaiveDate,
	pub status:     ReservationStatus,
	pub teaching:   bool,
	pub created_at: NaiveDateTime,
}

impl PrimitiveReservation {
	/// Count the non-cancelled reservations for one (crew, date) slot
	///
	/// This is the number the capacity decision compares against; it is
	/// re-derived on every call instead of cached so it can never drift.
	#[instrument(skip(conn))]
	pub async fn count_active_for_slot(
		c_id: i32,
		day: NaiveDate,
		conn: &DbConn,
	) -> Result<i64, Error> {
		let count = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.filter(crew_id.eq(c_id))
					.filter(date.eq(day))
					.filter(status.ne(ReservationStatus::Cancelled))
					.count()
					.get_result(conn)
			})
			.await??;

		Ok(count)
	}

	/// Count the CONFIRMED reservations for one (crew, date) slot
	#[instrument(skip(conn))]
	pub async fn count_confirmed_for_slot(
		c_id: i32,
		day: NaiveDate,
		conn: &DbConn,
	) -> Result<i64, Error> {
		let count = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.filter(crew_id.eq(c_id))
					.filter(date.eq(day))
					.filter(status.eq(ReservationStatus::Confirmed))
					.count()
					.get_result(conn)
			})
			.await??;

		Ok(count)
	}

	/// Find a member's non-cancelled reservation for a date, if any
	#[instrument(skip(conn))]
	pub async fn find_active_for_member(
		m_id: i32,
		c_id: i32,
		day: NaiveDate,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let found = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.filter(member_id.eq(m_id))
					.filter(crew_id.eq(c_id))
					.filter(date.eq(day))
					.filter(status.ne(ReservationStatus::Cancelled))
					.select(Self::as_select())
					.first(conn)
					.optional()
			})
			.await??;

		Ok(found)
	}

	/// Get the non-cancelled reservations for a slot with their owners,
	/// oldest first
	#[instrument(skip(conn))]
	pub async fn active_for_slot(
		c_id: i32,
		day: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<(Self, PrimitiveMember)>, Error> {
		let rows = conn
			.interact(move |conn| {
				reservation::table
					.inner_join(
						member::table
							.on(reservation::member_id.eq(member::id)),
					)
					.filter(reservation::crew_id.eq(c_id))
					.filter(reservation::date.eq(day))
					.filter(
						reservation::status.ne(ReservationStatus::Cancelled),
					)
					.order(reservation::created_at.asc())
					.select((
						Self::as_select(),
						PrimitiveMember::as_select(),
					))
					.get_results(conn)
			})
			.await??;

		Ok(rows)
	}

	/// Get the WAITING reservations for a slot in arrival order
	///
	/// Arrival order (`created_at` ascending) is the only waitlist
	/// tie-break.
	#[instrument(skip(conn))]
	pub async fn waiting_for_slot(
		c_id: i32,
		day: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		let waiting = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.filter(crew_id.eq(c_id))
					.filter(date.eq(day))
					.filter(status.eq(ReservationStatus::Waiting))
					.order(created_at.asc())
					.select(Self::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(waiting)
	}

	/// Get every distinct date of a crew that still has WAITING rows
	#[instrument(skip(conn))]
	pub async fn dates_with_waiting(
		c_id: i32,
		conn: &DbConn,
	) -> Result<Vec<NaiveDate>, Error> {
		let dates = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.filter(crew_id.eq(c_id))
					.filter(status.eq(ReservationStatus::Waiting))
					.select(date)
					.distinct()
					.order(date.asc())
					.get_results(conn)
			})
			.await??;

		Ok(dates)
	}

	/// Get a member's non-cancelled reservations in a date range,
	/// oldest date first
	#[instrument(skip(conn))]
	pub async fn for_member_between(
		m_id: i32,
		c_id: i32,
		from: NaiveDate,
		until: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		let reservations = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.filter(member_id.eq(m_id))
					.filter(crew_id.eq(c_id))
					.filter(date.between(from, until))
					.filter(status.ne(ReservationStatus::Cancelled))
					.order(date.asc())
					.select(Self::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(reservations)
	}

	/// Count non-cancelled reservations per date in a date range
	#[instrument(skip(conn))]
	pub async fn daily_counts_between(
		c_id: i32,
		from: NaiveDate,
		until: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<(NaiveDate, i64)>, Error> {
		let counts = conn
			.interact(move |conn| {
				use diesel::dsl::count_star;

				use crate::schema::reservation::dsl::*;

				reservation
					.filter(crew_id.eq(c_id))
					.filter(date.between(from, until))
					.filter(status.ne(ReservationStatus::Cancelled))
					.group_by(date)
					.select((date, count_star()))
					.get_results(conn)
			})
			.await??;

		Ok(counts)
	}

	/// Promote WAITING reservations to CONFIRMED
	///
	/// Only rows still in WAITING state are touched, so a promotion racing
	/// a cancellation can never resurrect a cancelled row.
	#[instrument(skip(conn))]
	pub async fn confirm_by_ids(
		ids: Vec<i32>,
		conn: &DbConn,
	) -> Result<usize, Error> {
		let promoted = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				diesel::update(
					reservation
						.filter(id.eq_any(ids))
						.filter(status.eq(ReservationStatus::Waiting)),
				)
				.set(status.eq(ReservationStatus::Confirmed))
				.execute(conn)
			})
			.await??;

		info!("promoted {promoted} waiting reservation(s)");

		Ok(promoted)
	}

	/// Cancel a reservation; CANCELLED is terminal
	#[instrument(skip(conn))]
	pub async fn cancel_by_id(r_id: i32, conn: &DbConn) -> Result<(), Error> {
		conn.interact(move |conn| {
			use crate::schema::reservation::dsl::*;

			diesel::update(
				reservation
					.find(r_id)
					.filter(status.ne(ReservationStatus::Cancelled)),
			)
			.set(status.eq(ReservationStatus::Cancelled))
			.execute(conn)
		})
		.await??;

		info!("cancelled reservation with id {r_id}");

		Ok(())
	}

	/// Set or clear the teaching add-on flag
	///
	/// Only valid while the reservation is CONFIRMED.
	#[instrument(skip(conn))]
	pub async fn set_teaching(
		r_id: i32,
		value: bool,
		conn: &DbConn,
	) -> Result<usize, Error> {
		let updated = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				diesel::update(
					reservation
						.find(r_id)
						.filter(status.eq(ReservationStatus::Confirmed)),
				)
				.set(teaching.eq(value))
				.execute(conn)
			})
			.await??;

		Ok(updated)
	}
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = reservation)]
#[diesel(check_for_backend(Pg))]
pub struct NewReservation {
	pub member_id: i32,
	pub crew_id:   i32,
	pub guest_id:  Option<i32>,
	pub date:      NaiveDate,
	pub status:    ReservationStatus,
}

impl NewReservation {
	/// Insert this [`NewReservation`]
	#[instrument(skip(conn))]
	pub async fn insert(
		self,
		conn: &DbConn,
	) -> Result<PrimitiveReservation, Error> {
		let reservation = conn
			.interact(|conn| {
				use crate::schema::reservation::dsl::*;

				diesel::insert_into(reservation)
					.values(self)
					.returning(PrimitiveReservation::as_returning())
					.get_result(conn)
			})
			.await??;

		info!(
			"created reservation {} ({:?}) for member {} on {}",
			reservation.id,
			reservation.status,
			reservation.member_id,
			reservation.date
		);

		Ok(reservation)
	}
}
