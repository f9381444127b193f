use chrono::NaiveDate;
use common::BookingError;
use models::{MemberRole, PrimitiveMember, PrimitiveReservation, ReservationStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationsRequest {
	#[validate(length(min = 1, message = "at least one date is required"))]
	pub dates:    Vec<NaiveDate>,
	pub guest_id: Option<i32>,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationsRequest {
	#[validate(length(min = 1, message = "at least one date is required"))]
	pub dates: Vec<NaiveDate>,
}

/// Per-date outcome of a booking attempt
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationOutcome {
	Created,
	Duplicated,
	SoldOut,
	Closed,
	Invalid,
	RetryLazily,
}

impl From<&BookingError> for ReservationOutcome {
	fn from(error: &BookingError) -> Self {
		match error {
			BookingError::NotOpenYet(_) | BookingError::Closed(_) => Self::Closed,
			BookingError::PastDate => Self::Invalid,
			BookingError::Duplicate => Self::Duplicated,
			BookingError::SoldOut => Self::SoldOut,
			BookingError::LockTimeout => Self::RetryLazily,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResult {
	pub date:           NaiveDate,
	pub status:         ReservationOutcome,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state:          Option<ReservationStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reservation_id: Option<i32>,
}

impl ReservationResult {
	#[must_use]
	pub fn created(reservation: &PrimitiveReservation) -> Self {
		Self {
			date:           reservation.date,
			status:         ReservationOutcome::Created,
			state:          Some(reservation.status),
			reservation_id: Some(reservation.id),
		}
	}

	#[must_use]
	pub fn rejected(date: NaiveDate, error: &BookingError) -> Self {
		Self {
			date,
			status: error.into(),
			state: None,
			reservation_id: None,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
	pub requested: usize,
	pub succeeded: usize,
	pub failed:    usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsResponse {
	pub crew_id: i32,
	pub results: Vec<ReservationResult>,
	pub summary: ReservationSummary,
}

impl ReservationsResponse {
	#[must_use]
	pub fn new(crew_id: i32, results: Vec<ReservationResult>) -> Self {
		let requested = results.len();
		let succeeded = results
			.iter()
			.filter(|r| r.status == ReservationOutcome::Created)
			.count();

		Self {
			crew_id,
			results,
			summary: ReservationSummary {
				requested,
				succeeded,
				failed: requested - succeeded,
			},
		}
	}
}

/// Per-date outcome of a cancellation attempt
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
	Cancelled,
	NotFound,
	RetryLazily,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
	pub date:   NaiveDate,
	pub status: CancelOutcome,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
	pub crew_id: i32,
	pub results: Vec<CancelResult>,
	pub summary: ReservationSummary,
}

impl CancelResponse {
	#[must_use]
	pub fn new(crew_id: i32, results: Vec<CancelResult>) -> Self {
		let requested = results.len();
		let succeeded = results
			.iter()
			.filter(|r| r.status == CancelOutcome::Cancelled)
			.count();

		Self {
			crew_id,
			results,
			summary: ReservationSummary {
				requested,
				succeeded,
				failed: requested - succeeded,
			},
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
	pub member_id: i32,
	pub username:  String,
	pub role:      MemberRole,
	pub teaching:  bool,
}

impl From<(PrimitiveReservation, PrimitiveMember)> for RosterEntry {
	fn from((reservation, member): (PrimitiveReservation, PrimitiveMember)) -> Self {
		Self {
			member_id: member.id,
			username:  member.username,
			role:      member.role,
			teaching:  reservation.teaching,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRosterResponse {
	pub date:      NaiveDate,
	pub confirmed: Vec<RosterEntry>,
	pub waiting:   Vec<RosterEntry>,
}
