use chrono::{NaiveDate, NaiveTime};
use models::{DayOfWeek, PrimitiveCrew, ReservationStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewResponse {
	pub id:        i32,
	pub name:      String,
	pub capacity:  i32,
	pub open_day:  Option<DayOfWeek>,
	pub open_time: Option<NaiveTime>,
}

impl From<PrimitiveCrew> for CrewResponse {
	fn from(crew: PrimitiveCrew) -> Self {
		Self {
			id:        crew.id,
			name:      crew.name,
			capacity:  crew.capacity,
			open_day:  crew.open_day,
			open_time: crew.open_time,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCrewRequest {
	pub name:      Option<String>,
	#[validate(range(min = 1000, max = 9999, message = "pin must be 4 digits"))]
	pub pin:       Option<i32>,
	#[validate(range(min = 1, message = "capacity must be at least 1"))]
	pub capacity:  Option<i32>,
	pub open_day:  Option<DayOfWeek>,
	pub open_time: Option<NaiveTime>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
	pub year:             i32,
	pub month:            u32,
	#[serde(default)]
	pub show_my_schedule: bool,
}

/// Coarse fill level of a day, for calendar colouring
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccupancyStatus {
	Low,
	Medium,
	High,
}

impl OccupancyStatus {
	#[must_use]
	pub fn for_count(count: i64, capacity: i32) -> Self {
		let capacity = i64::from(capacity);

		if count * 2 < capacity {
			Self::Low
		} else if count < capacity {
			Self::Medium
		} else {
			Self::High
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDayResponse {
	pub date:             NaiveDate,
	pub count:            i64,
	pub occupancy_status: OccupancyStatus,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyReservationResponse {
	pub date:   NaiveDate,
	pub status: ReservationStatus,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewCalendarResponse {
	pub crew_id:         i32,
	pub days:            Vec<CalendarDayResponse>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub my_reservations: Option<Vec<MyReservationResponse>>,
}
