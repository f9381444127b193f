use chrono::NaiveDateTime;
use common::{DbConn, Error};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use crate::PrimitiveCrew;
use crate::schema::member;

/// Role of a member within their crew
#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::MemberRole"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
	President,
	Manager,
	#[default]
	Member,
	Guest,
}

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = member)]
#[diesel(check_for_backend(Pg))]
pub struct PrimitiveMember {
	pub id:            i32,
	pub username:      String,
	pub crew_id:       Option<i32>,
	pub role:          MemberRole,
	pub is_registered: bool,
	pub is_admin:      bool,
	pub created_at:    NaiveDateTime,
}

impl PrimitiveMember {
	/// Get a [`PrimitiveMember`] by its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(m_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let member = conn
			.interact(move |conn| {
				use crate::schema::member::dsl::*;

				member.find(m_id).select(Self::as_select()).get_result(conn)
			})
			.await?
			.map_err(|e| {
				match e {
					diesel::result::Error::NotFound => {
						Error::NotFound(format!("no member with id {m_id}"))
					},
					e => e.into(),
				}
			})?;

		Ok(member)
	}

	/// Whether this member may book the given crew's season room
	///
	/// Guests and members who never completed registration are excluded,
	/// as is anyone belonging to a different crew.
	#[must_use]
	pub fn is_approved_member_of(&self, crew: &PrimitiveCrew) -> bool {
		self.crew_id == Some(crew.id)
			&& self.role != MemberRole::Guest
			&& self.is_registered
	}

	/// Whether this member may administer the given crew
	#[must_use]
	pub fn is_manager_of(&self, crew: &PrimitiveCrew) -> bool {
		self.crew_id == Some(crew.id)
			&& matches!(self.role, MemberRole::President | MemberRole::Manager)
	}
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = member)]
#[diesel(check_for_backend(Pg))]
pub struct NewMember {
	pub username:      String,
	pub crew_id:       Option<i32>,
	pub role:          MemberRole,
	pub is_registered: bool,
	pub is_admin:      bool,
}

impl NewMember {
	/// Insert this [`NewMember`]
	#[instrument(skip(conn))]
	pub async fn insert(self, conn: &DbConn) -> Result<PrimitiveMember, Error> {
		let member = conn
			.interact(|conn| {
				use crate::schema::member::dsl::*;

				diesel::insert_into(member)
					.values(self)
					.returning(PrimitiveMember::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(member)
	}
}
