use chrono::NaiveDateTime;
use common::{DbConn, Error};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::guest;

/// A guest registered by a crew member
///
/// Guests can accompany a member's reservation but never hold one
/// themselves.
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = guest)]
#[diesel(check_for_backend(Pg))]
pub struct PrimitiveGuest {
	pub id:         i32,
	pub name:       String,
	pub crew_id:    i32,
	pub invited_by: i32,
	pub created_at: NaiveDateTime,
}

impl PrimitiveGuest {
	/// Get a [`PrimitiveGuest`] by its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(g_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let guest = conn
			.interact(move |conn| {
				use crate::schema::guest::dsl::*;

				guest.find(g_id).select(Self::as_select()).get_result(conn)
			})
			.await?
			.map_err(|e| {
				match e {
					diesel::result::Error::NotFound => {
						Error::NotFound(format!("no guest with id {g_id}"))
					},
					e => e.into(),
				}
			})?;

		Ok(guest)
	}
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = guest)]
#[diesel(check_for_backend(Pg))]
pub struct NewGuest {
	pub name:       String,
	pub crew_id:    i32,
	pub invited_by: i32,
}

impl NewGuest {
	/// Insert this [`NewGuest`]
	#[instrument(skip(conn))]
	pub async fn insert(self, conn: &DbConn) -> Result<PrimitiveGuest, Error> {
		let guest = conn
			.interact(|conn| {
				use crate::schema::guest::dsl::*;

				diesel::insert_into(guest)
					.values(self)
					.returning(PrimitiveGuest::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(guest)
	}
}
