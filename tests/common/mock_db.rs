use std::sync::LazyLock;

use common::{DbConn, DbPool};
use deadpool_diesel::postgres::{Manager, Pool};
use diesel_migrations::{
	EmbeddedMigrations,
	MigrationHarness,
	embed_migrations,
};
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Global provider handing out throwaway test databases
///
/// Every test gets its own database so the slot-count and roster
/// assertions never observe rows written by a sibling test.
pub static DATABASE_PROVIDER: LazyLock<DatabaseProvider> =
	LazyLock::new(DatabaseProvider::new);

pub struct DatabaseProvider {
	base_url:  String,
	root_pool: DbPool,
}

/// RAII guard owning one `test_<uuid>` database, dropped with it
pub struct DatabaseGuard {
	root_conn:     DbConn,
	database_name: String,
	database_url:  String,
}

impl DatabaseProvider {
	fn new() -> Self {
		let database_url = std::env::var("DATABASE_URL").unwrap();
		let (base_url, _) = database_url.rsplit_once('/').unwrap();

		let manager = Manager::new(
			database_url.as_str(),
			deadpool_diesel::Runtime::Tokio1,
		);

		Self {
			base_url:  base_url.to_string(),
			root_pool: Pool::builder(manager).build().unwrap(),
		}
	}

	/// Create a fresh test database and return its guard
	///
	/// # Panics
	/// Panics if creating the database fails
	pub(crate) async fn acquire(&self) -> DatabaseGuard {
		let suffix = Uuid::new_v4().simple().to_string();
		let database_name = format!("test_{suffix}");
		let database_url = format!("{}/{database_name}", self.base_url);

		let root_conn = self
			.root_pool
			.get()
			.await
			.expect("could not get root pool connection");

		let create_db_query = format!("CREATE DATABASE {database_name};");

		root_conn
			.interact(|conn| {
				use diesel::prelude::*;

				diesel::sql_query(create_db_query).execute(conn)
			})
			.await
			.expect("could not interact with root connection")
			.expect("could not create test database");

		DatabaseGuard { root_conn, database_name, database_url }
	}
}

impl DatabaseGuard {
	/// Build a pool against this guard's database and run the migrations
	///
	/// # Panics
	/// Panics if the pool cannot be built or a migration fails
	pub async fn create_pool(&self) -> DbPool {
		let manager = Manager::new(
			self.database_url.as_str(),
			deadpool_diesel::Runtime::Tokio1,
		);

		// The default max_size is cpu_count * 2, which on small runners
		// is below the number of connections some tests hold at once.
		let pool = Pool::builder(manager).max_size(8).build().unwrap();

		let conn = pool.get().await.unwrap();

		conn.interact(|conn| conn.run_pending_migrations(MIGRATIONS).map(|_| ()))
			.await
			.unwrap()
			.unwrap();

		pool
	}
}

impl Drop for DatabaseGuard {
	fn drop(&mut self) {
		let drop_db_query =
			format!("DROP DATABASE {} WITH (FORCE);", self.database_name);

		// Drop impls cannot be async; this only runs at test teardown.
		futures::executor::block_on(async move {
			self.root_conn
				.interact(|conn| {
					use diesel::prelude::*;

					diesel::sql_query(drop_db_query).execute(conn)
				})
				.await
				.expect("could not interact with root connection")
				.expect("could not drop test database");
		});
	}
}
