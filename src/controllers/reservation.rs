use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{NaiveDate, Utc};
use common::{BookingError, DbPool, Error, RedisConn};
use models::{
	PrimitiveCrew,
	PrimitiveGuest,
	PrimitiveMember,
	PrimitiveReservation,
	ReservationStatus,
};
use validator::Validate;

use crate::schemas::reservation::{
	CancelOutcome,
	CancelReservationsRequest,
	CancelResponse,
	CancelResult,
	CreateReservationsRequest,
	DayRosterResponse,
	ReservationResult,
	ReservationsResponse,
	RosterEntry,
};
use crate::session::Session;
use crate::{booking, window};

/// Book a batch of dates in one crew's season room
///
/// Every date gets its own outcome; one rejected date never aborts the
/// rest of the batch. Only an unknown crew or guest, or a caller who may
/// not book at all, fails the request as a whole.
#[instrument(skip(pool, redis))]
pub async fn create_reservations(
	State(pool): State<DbPool>,
	State(mut redis): State<RedisConn>,
	session: Session,
	Path(crew_id): Path<i32>,
	Json(request): Json<CreateReservationsRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if !member.is_approved_member_of(&crew) {
		return Err(Error::Forbidden);
	}

	if let Some(guest_id) = request.guest_id {
		let guest = PrimitiveGuest::get_by_id(guest_id, &conn).await?;

		if guest.crew_id != crew.id {
			return Err(Error::NotFound(format!(
				"no guest with id {guest_id}"
			)));
		}
	}

	let now = Utc::now().naive_utc();
	let today = now.date();

	let mut results = Vec::with_capacity(request.dates.len());

	for date in request.dates {
		if let Err(e) = window::check_open(&crew, date, now) {
			results.push(ReservationResult::rejected(date, &e));

			continue;
		}

		let outcome = booking::book_slot(
			member.id,
			&crew,
			date,
			request.guest_id,
			today,
			&conn,
			&mut redis,
		)
		.await;

		match outcome {
			Ok(reservation) => {
				results.push(ReservationResult::created(&reservation));
			},
			Err(Error::BookingError(e)) => {
				results.push(ReservationResult::rejected(date, &e));
			},
			Err(e) => return Err(e),
		}
	}

	let response = ReservationsResponse::new(crew.id, results);

	Ok((StatusCode::OK, Json(response)))
}

/// Cancel a batch of the caller's own reservations
///
/// Cancelling a CONFIRMED reservation promotes the oldest WAITING one for
/// that date within the same lock hold.
#[instrument(skip(pool, redis))]
pub async fn cancel_reservations(
	State(pool): State<DbPool>,
	State(mut redis): State<RedisConn>,
	session: Session,
	Path(crew_id): Path<i32>,
	Json(request): Json<CancelReservationsRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if !member.is_approved_member_of(&crew) {
		return Err(Error::Forbidden);
	}

	let mut results = Vec::with_capacity(request.dates.len());

	for date in request.dates {
		let outcome =
			booking::cancel_slot(member.id, &crew, date, &conn, &mut redis)
				.await;

		let status = match outcome {
			Ok(true) => CancelOutcome::Cancelled,
			Ok(false) => CancelOutcome::NotFound,
			Err(Error::BookingError(BookingError::LockTimeout)) => {
				CancelOutcome::RetryLazily
			},
			Err(e) => return Err(e),
		};

		results.push(CancelResult { date, status });
	}

	let response = CancelResponse::new(crew.id, results);

	Ok((StatusCode::OK, Json(response)))
}

/// Get who is confirmed and who is waiting for one date
#[instrument(skip(pool))]
pub async fn get_day_roster(
	State(pool): State<DbPool>,
	session: Session,
	Path((crew_id, date)): Path<(i32, NaiveDate)>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if !member.is_approved_member_of(&crew) {
		return Err(Error::Forbidden);
	}

	let rows =
		PrimitiveReservation::active_for_slot(crew.id, date, &conn).await?;

	let mut confirmed = vec![];
	let mut waiting = vec![];

	for (reservation, owner) in rows {
		let entry = RosterEntry::from((reservation.clone(), owner));

		match reservation.status {
			ReservationStatus::Confirmed => confirmed.push(entry),
			ReservationStatus::Waiting => waiting.push(entry),
			ReservationStatus::Cancelled => (),
		}
	}

	let response = DayRosterResponse { date, confirmed, waiting };

	Ok((StatusCode::OK, Json(response)))
}

/// Mark the caller's CONFIRMED reservation for a date as a teaching slot
#[instrument(skip(pool))]
pub async fn apply_teaching(
	State(pool): State<DbPool>,
	session: Session,
	Path((crew_id, date)): Path<(i32, NaiveDate)>,
) -> Result<impl IntoResponse, Error> {
	set_teaching(&pool, session, crew_id, date, true).await?;

	Ok(StatusCode::NO_CONTENT)
}

/// Clear the teaching flag on the caller's reservation for a date
#[instrument(skip(pool))]
pub async fn cancel_teaching(
	State(pool): State<DbPool>,
	session: Session,
	Path((crew_id, date)): Path<(i32, NaiveDate)>,
) -> Result<impl IntoResponse, Error> {
	set_teaching(&pool, session, crew_id, date, false).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn set_teaching(
	pool: &DbPool,
	session: Session,
	crew_id: i32,
	date: NaiveDate,
	value: bool,
) -> Result<(), Error> {
	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if !member.is_approved_member_of(&crew) {
		return Err(Error::Forbidden);
	}

	let Some(reservation) = PrimitiveReservation::find_active_for_member(
		member.id, crew.id, date, &conn,
	)
	.await?
	else {
		return Err(Error::NotFound(format!("no reservation on {date}")));
	};

	let updated =
		PrimitiveReservation::set_teaching(reservation.id, value, &conn)
			.await?;

	if updated == 0 {
		return Err(Error::ValidationError(
			"only a confirmed reservation can be a teaching slot".to_string(),
		));
	}

	Ok(())
}
