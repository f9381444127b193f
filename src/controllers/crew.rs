use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Datelike, Duration, NaiveDate};
use common::{DbPool, Error, RedisConn};
use models::{CrewUpdate, PrimitiveCrew, PrimitiveMember, PrimitiveReservation};
use validator::Validate;

use crate::promotion;
use crate::schemas::crew::{
	CalendarDayResponse,
	CalendarQuery,
	CrewCalendarResponse,
	CrewResponse,
	MyReservationResponse,
	OccupancyStatus,
	UpdateCrewRequest,
};
use crate::session::Session;

/// Get a crew's registry entry
#[instrument(skip(pool))]
pub async fn get_crew(
	State(pool): State<DbPool>,
	session: Session,
	Path(crew_id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if member.crew_id != Some(crew.id) {
		return Err(Error::Forbidden);
	}

	Ok((StatusCode::OK, Json(CrewResponse::from(crew))))
}

/// Update a crew's registry fields
///
/// Raising the capacity immediately tops up every date that still has a
/// waitlist; shrinking it never cancels anything retroactively.
#[instrument(skip(pool, redis))]
pub async fn update_crew(
	State(pool): State<DbPool>,
	State(mut redis): State<RedisConn>,
	session: Session,
	Path(crew_id): Path<i32>,
	Json(request): Json<UpdateCrewRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if !member.is_manager_of(&crew) {
		return Err(Error::Forbidden);
	}

	// The weekly open day and time only make sense as a pair; a PATCH may
	// supply either half as long as the other half is already set.
	let open_day = request.open_day.or(crew.open_day);
	let open_time = request.open_time.or(crew.open_time);

	if open_day.is_some() != open_time.is_some() {
		return Err(Error::ValidationError(
			"openDay and openTime must be set together".to_string(),
		));
	}

	let update = CrewUpdate {
		name: request.name,
		pin: request.pin,
		capacity: request.capacity,
		open_day: request.open_day,
		open_time: request.open_time,
	};

	let updated = update.apply_to(crew.id, &conn).await?;

	if updated.capacity > crew.capacity {
		promotion::promote_after_capacity_increase(&updated, &conn, &mut redis)
			.await?;
	}

	Ok((StatusCode::OK, Json(CrewResponse::from(updated))))
}

/// Get the per-day occupancy of a crew's season room for one month
#[instrument(skip(pool))]
pub async fn get_crew_calendar(
	State(pool): State<DbPool>,
	session: Session,
	Path(crew_id): Path<i32>,
	Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let crew = PrimitiveCrew::get_by_id(crew_id, &conn).await?;
	let member =
		PrimitiveMember::get_by_id(session.data.member_id, &conn).await?;

	if !member.is_approved_member_of(&crew) {
		return Err(Error::Forbidden);
	}

	let Some(first) = NaiveDate::from_ymd_opt(query.year, query.month, 1)
	else {
		return Err(Error::ValidationError(format!(
			"{}-{} is not a valid month",
			query.year, query.month
		)));
	};

	let last = next_month(first) - Duration::days(1);

	let counts: HashMap<NaiveDate, i64> =
		PrimitiveReservation::daily_counts_between(crew.id, first, last, &conn)
			.await?
			.into_iter()
			.collect();

	let days = first
		.iter_days()
		.take_while(|d| *d <= last)
		.map(|date| {
			let count = counts.get(&date).copied().unwrap_or(0);

			CalendarDayResponse {
				date,
				count,
				occupancy_status: OccupancyStatus::for_count(
					count,
					crew.capacity,
				),
			}
		})
		.collect();

	let my_reservations = if query.show_my_schedule {
		let mine = PrimitiveReservation::for_member_between(
			member.id, crew.id, first, last, &conn,
		)
		.await?;

		Some(
			mine.into_iter()
				.map(|r| {
					MyReservationResponse { date: r.date, status: r.status }
				})
				.collect(),
		)
	} else {
		None
	};

	let response =
		CrewCalendarResponse { crew_id: crew.id, days, my_reservations };

	Ok((StatusCode::OK, Json(response)))
}

fn next_month(first: NaiveDate) -> NaiveDate {
	if first.month() == 12 {
		NaiveDate::from_ymd_opt(first.year() + 1, 1, 1).unwrap()
	} else {
		NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1).unwrap()
	}
}
