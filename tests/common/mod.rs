#![allow(dead_code)]

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use chrono::{NaiveDate, NaiveTime};
use common::{DbPool, RedisConn};
use mock_redis::{RedisUrlGuard, RedisUrlProvider};
use models::{
	DayOfWeek,
	MemberRole,
	NewCrew,
	NewGuest,
	NewMember,
	PrimitiveCrew,
	PrimitiveGuest,
	PrimitiveMember,
};
use seasonroom::session::Session;
use seasonroom::{AppState, Config, routes};

mod mock_db;
mod mock_redis;

use mock_db::{DATABASE_PROVIDER, DatabaseGuard};

pub struct TestEnv {
	pub app:         TestServer,
	pub config:      Config,
	pub pool:        DbPool,
	pub redis:       RedisConn,
	pub db_guard:    DatabaseGuard,
	pub redis_guard: RedisUrlGuard,
}

impl TestEnv {
	/// Get a test environment with mocked resources for running tests
	///
	/// # Panics
	/// Panics if building a test server fails
	pub async fn new() -> Self {
		let config = Config::from_env();

		let test_pool_guard = (*DATABASE_PROVIDER).acquire().await;
		let test_pool = test_pool_guard.create_pool().await;

		let redis_url_guard = RedisUrlProvider::acquire();
		let redis_connection = redis_url_guard.connect().await;

		let state = AppState {
			config:           config.clone(),
			database_pool:    test_pool.clone(),
			redis_connection: redis_connection.clone(),
		};
		let app = routes::get_app_router(state);

		let test_server =
			TestServer::builder().save_cookies().build(app).unwrap();

		TestEnv {
			app: test_server,
			config,
			pool: test_pool,
			redis: redis_connection,
			db_guard: test_pool_guard,
			redis_guard: redis_url_guard,
		}
	}

	/// Insert a crew without a weekly open schedule
	pub async fn create_crew(&self, capacity: i32) -> PrimitiveCrew {
		let conn = self.pool.get().await.unwrap();

		NewCrew {
			name: "testcrew".to_string(),
			pin: 1234,
			capacity,
			open_day: None,
			open_time: None,
		}
		.insert(&conn)
		.await
		.unwrap()
	}

	/// Insert a crew whose booking window opens weekly
	pub async fn create_scheduled_crew(
		&self,
		capacity: i32,
		open_day: DayOfWeek,
		open_time: NaiveTime,
	) -> PrimitiveCrew {
		let conn = self.pool.get().await.unwrap();

		NewCrew {
			name: "testcrew".to_string(),
			pin: 1234,
			capacity,
			open_day: Some(open_day),
			open_time: Some(open_time),
		}
		.insert(&conn)
		.await
		.unwrap()
	}

	/// Insert a registered member of the given crew
	pub async fn create_member(
		&self,
		username: &str,
		crew: &PrimitiveCrew,
		role: MemberRole,
	) -> PrimitiveMember {
		let conn = self.pool.get().await.unwrap();

		NewMember {
			username: username.to_string(),
			crew_id: Some(crew.id),
			role,
			is_registered: true,
			is_admin: false,
		}
		.insert(&conn)
		.await
		.unwrap()
	}

	/// Insert a guest invited by the given member
	pub async fn create_guest(
		&self,
		name: &str,
		crew: &PrimitiveCrew,
		inviter: &PrimitiveMember,
	) -> PrimitiveGuest {
		let conn = self.pool.get().await.unwrap();

		NewGuest {
			name: name.to_string(),
			crew_id: crew.id,
			invited_by: inviter.id,
		}
		.insert(&conn)
		.await
		.unwrap()
	}

	/// Occupy a slot's lock from outside the engine
	///
	/// The key outlives the engine's acquisition wait, so requests
	/// against the slot time out instead of inheriting an expired lease.
	pub async fn block_slot(&self, crew_id: i32, date: NaiveDate) {
		let mut redis = self.redis.clone();

		let _: Option<String> = redis::cmd("SET")
			.arg(format!("slot_lock:{crew_id}:{date}"))
			.arg("blocked")
			.arg("NX")
			.arg("PX")
			.arg(10_000_u64)
			.query_async(&mut redis)
			.await
			.unwrap();
	}

	/// Mint a session for a member and return its access token cookie
	///
	/// Tests attach the cookie per request so several members can act
	/// within one test.
	pub async fn login(&self, member: &PrimitiveMember) -> Cookie<'static> {
		let mut redis = self.redis.clone();

		let session = Session::create(
			self.config.access_token_lifetime,
			member,
			&mut redis,
		)
		.await
		.unwrap();

		session.to_access_token_cookie(
			self.config.access_token_name.clone(),
			self.config.access_token_lifetime,
			false,
		)
	}
}
