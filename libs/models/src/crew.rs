use chrono::{NaiveDateTime, NaiveTime, Weekday};
use common::{DbConn, Error};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use crate::schema::crew;

/// Day on which a crew's weekly booking window opens
///
/// Ordered as the wire format orders them (SUNDAY = 0 .. SATURDAY = 6),
/// which is not [`chrono::Weekday`]'s ordering; the two conversions below
/// are total in both directions.
#[derive(
	Clone, Copy, DbEnum, Debug, Deserialize, Eq, PartialEq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::DayOfWeek"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
	Sunday,
	Monday,
	Tuesday,
	Wednesday,
	Thursday,
	Friday,
	Saturday,
}

impl DayOfWeek {
	/// Map this day to the calendar weekday type
	#[must_use]
	pub fn to_weekday(self) -> Weekday {
		match self {
			Self::Sunday => Weekday::Sun,
			Self::Monday => Weekday::Mon,
			Self::Tuesday => Weekday::Tue,
			Self::Wednesday => Weekday::Wed,
			Self::Thursday => Weekday::Thu,
			Self::Friday => Weekday::Fri,
			Self::Saturday => Weekday::Sat,
		}
	}

	/// Map a calendar weekday back to the domain day
	#[must_use]
	pub fn from_weekday(weekday: Weekday) -> Self {
		match weekday {
			Weekday::Sun => Self::Sunday,
			Weekday::Mon => Self::Monday,
			Weekday::Tue => Self::Tuesday,
			Weekday::Wed => Self::Wednesday,
			Weekday::Thu => Self::Thursday,
			Weekday::Fri => Self::Friday,
			Weekday::Sat => Self::Saturday,
		}
	}
}

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = crew)]
#[diesel(check_for_backend(Pg))]
pub struct PrimitiveCrew {
	pub id:         i32,
	pub name:       String,
	pub pin:        i32,
	pub capacity:   i32,
	pub open_day:   Option<DayOfWeek>,
	pub open_time:  Option<NaiveTime>,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

impl PrimitiveCrew {
	/// Get a [`PrimitiveCrew`] by its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(c_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let crew = conn
			.interact(move |conn| {
				use crate::schema::crew::dsl::*;

				crew.find(c_id).select(Self::as_select()).get_result(conn)
			})
			.await?
			.map_err(|e| {
				match e {
					diesel::result::Error::NotFound => {
						Error::NotFound(format!("no crew with id {c_id}"))
					},
					e => e.into(),
				}
			})?;

		Ok(crew)
	}
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = crew)]
#[diesel(check_for_backend(Pg))]
pub struct NewCrew {
	pub name:      String,
	pub pin:       i32,
	pub capacity:  i32,
	pub open_day:  Option<DayOfWeek>,
	pub open_time: Option<NaiveTime>,
}

impl NewCrew {
	/// Insert this [`NewCrew`]
	#[instrument(skip(conn))]
	pub async fn insert(self, conn: &DbConn) -> Result<PrimitiveCrew, Error> {
		let crew = conn
			.interact(|conn| {
				use crate::schema::crew::dsl::*;

				diesel::insert_into(crew)
					.values(self)
					.returning(PrimitiveCrew::as_returning())
					.get_result(conn)
			})
			.await??;

		info!("created crew {}", crew.id);

		Ok(crew)
	}
}

/// Partial update of a crew's registry fields
///
/// Absent fields keep their current value; the weekly open day/time pair
/// can be set but never cleared through this changeset.
#[derive(AsChangeset, Clone, Debug, Default, Deserialize, Serialize)]
#[diesel(table_name = crew)]
pub struct CrewUpdate {
	pub name:      Option<String>,
	pub pin:       Option<i32>,
	pub capacity:  Option<i32>,
	pub open_day:  Option<DayOfWeek>,
	pub open_time: Option<NaiveTime>,
}

impl CrewUpdate {
	/// Apply this update to the given crew
	#[instrument(skip(conn))]
	pub async fn apply_to(
		self,
		c_id: i32,
		conn: &DbConn,
	) -> Result<PrimitiveCrew, Error> {
		let crew = conn
			.interact(move |conn| {
				use crate::schema::crew::dsl::*;

				diesel::update(crew.find(c_id))
					.set(self)
					.returning(PrimitiveCrew::as_returning())
					.get_result(conn)
			})
			.await??;

		info!("updated crew {}", crew.id);

		Ok(crew)
	}
}
