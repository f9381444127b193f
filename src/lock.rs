//! The slot lock manager
//!
//! Capacity decisions for one (crew, date) slot must be serialized across
//! processes: the count-then-insert sequence in the booking engine is a
//! check-then-act race without it. The lock is a redis `SET NX PX` key
//! with a short lease so a crashed holder can only stall a slot briefly,
//! and a bounded acquisition wait so contended requests fail fast with a
//! retryable outcome.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::NaiveDate;
use common::{BookingError, Error, RedisConn};
use redis::Script;
use uuid::Uuid;

/// Upper bound on waiting for a contended slot lock
pub const SLOT_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Lease after which a lock held by a crashed process expires on its own
pub const SLOT_LOCK_LEASE: Duration = Duration::from_secs(3);

const SLOT_LOCK_RETRY: Duration = Duration::from_millis(100);

/// Delete the lock key only if it still holds our token, so a lock that
/// expired and was re-acquired by someone else is never released from
/// under them
static RELEASE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
	Script::new(
		"if redis.call('get', KEYS[1]) == ARGV[1] then \
		 return redis.call('del', KEYS[1]) \
		 else return 0 end",
	)
});

/// An exclusive short-lived lock over one (crew, date) slot
#[derive(Debug)]
pub struct SlotLock {
	key:   String,
	token: String,
}

impl SlotLock {
	/// Acquire the lock for a slot, waiting up to [`SLOT_LOCK_WAIT`]
	///
	/// Failing to acquire within the wait bound is a
	/// [`BookingError::LockTimeout`], which batch callers surface as a
	/// retryable per-date outcome rather than a hard failure.
	#[instrument(skip(conn))]
	pub async fn acquire(
		crew_id: i32,
		date: NaiveDate,
		conn: &mut RedisConn,
	) -> Result<Self, Error> {
		let key = format!("slot_lock:{crew_id}:{date}");
		let token = Uuid::new_v4().simple().to_string();

		#[allow(clippy::cast_possible_truncation)]
		let lease_ms = SLOT_LOCK_LEASE.as_millis() as u64;

		let deadline = tokio::time::Instant::now() + SLOT_LOCK_WAIT;

		loop {
			let acquired: Option<String> = redis::cmd("SET")
				.arg(&key)
				.arg(&token)
				.arg("NX")
				.arg("PX")
				.arg(lease_ms)
				.query_async(conn)
				.await?;

			if acquired.is_some() {
				debug!("acquired slot lock {key}");

				return Ok(Self { key, token });
			}

			if tokio::time::Instant::now() + SLOT_LOCK_RETRY > deadline {
				warn!("timed out waiting for slot lock {key}");

				return Err(BookingError::LockTimeout.into());
			}

			tokio::time::sleep(SLOT_LOCK_RETRY).await;
		}
	}

	/// Release the lock if this instance still holds it
	#[instrument(skip(conn))]
	pub async fn release(self, conn: &mut RedisConn) -> Result<(), Error> {
		let released: i32 = RELEASE_SCRIPT
			.key(&self.key)
			.arg(&self.token)
			.invoke_async(conn)
			.await?;

		if released == 0 {
			warn!("slot lock {} expired before it was released", self.key);
		} else {
			debug!("released slot lock {}", self.key);
		}

		Ok(())
	}
}
