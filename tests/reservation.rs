use axum::http::StatusCode;
use chrono::{Duration, Utc};
use models::{MemberRole, ReservationStatus};

mod common;

use common::TestEnv;
use seasonroom::schemas::reservation::{
	CancelOutcome,
	CancelResponse,
	DayRosterResponse,
	ReservationOutcome,
	ReservationsResponse,
};

#[tokio::test(flavor = "multi_thread")]
async fn unauthenticated_request_is_rejected() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.json(&serde_json::json!({ "dates": ["2030-01-01"] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_reports_each_date_separately() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;
	let member = env.create_member("alice", &crew, MemberRole::Member).await;
	let cookie = env.login(&member).await;

	let today = Utc::now().date_naive();
	let long_gone = today - Duration::days(3);
	let tomorrow = today + Duration::days(1);

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(cookie)
		.json(&serde_json::json!({ "dates": [long_gone, tomorrow] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationsResponse>();

	assert_eq!(body.results.len(), 2);
	assert_eq!(body.results[0].status, ReservationOutcome::Closed);
	assert_eq!(body.results[1].status, ReservationOutcome::Created);
	assert_eq!(body.results[1].state, Some(ReservationStatus::Confirmed));
	assert!(body.results[1].reservation_id.is_some());

	assert_eq!(body.summary.requested, 2);
	assert_eq!(body.summary.succeeded, 1);
	assert_eq!(body.summary.failed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn rebooking_a_date_is_reported_as_duplicate() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;
	let member = env.create_member("alice", &crew, MemberRole::Member).await;
	let cookie = env.login(&member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);
	let request = serde_json::json!({ "dates": [tomorrow] });

	let first = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(cookie.clone())
		.json(&request)
		.await;

	assert_eq!(first.status_code(), StatusCode::OK);

	let second = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(cookie)
		.json(&request)
		.await;

	assert_eq!(second.status_code(), StatusCode::OK);

	let body = second.json::<ReservationsResponse>();

	assert_eq!(body.results[0].status, ReservationOutcome::Duplicated);
	assert_eq!(body.summary.succeeded, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn full_slot_waitlists_additional_members() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(1).await;
	let alice = env.create_member("alice", &crew, MemberRole::Member).await;
	let bob = env.create_member("bob", &crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);
	let request = serde_json::json!({ "dates": [tomorrow] });

	let first = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&alice).await)
		.json(&request)
		.await;

	let body = first.json::<ReservationsResponse>();
	assert_eq!(body.results[0].state, Some(ReservationStatus::Confirmed));

	let second = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&bob).await)
		.json(&request)
		.await;

	assert_eq!(second.status_code(), StatusCode::OK);

	let body = second.json::<ReservationsResponse>();

	assert_eq!(body.results[0].status, ReservationOutcome::Created);
	assert_eq!(body.results[0].state, Some(ReservationStatus::Waiting));
}

#[tokio::test(flavor = "multi_thread")]
async fn guest_booking_is_rejected_when_full() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(1).await;
	let alice = env.create_member("alice", &crew, MemberRole::Member).await;
	let bob = env.create_member("bob", &crew, MemberRole::Member).await;
	let guest = env.create_guest("carol", &crew, &bob).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);

	env.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&alice).await)
		.json(&serde_json::json!({ "dates": [tomorrow] }))
		.await;

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&bob).await)
		.json(&serde_json::json!({ "dates": [tomorrow], "guestId": guest.id }))
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationsResponse>();

	assert_eq!(body.results[0].status, ReservationOutcome::SoldOut);
	assert_eq!(body.summary.succeeded, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn guest_of_another_crew_is_not_found() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;
	let other_crew = env.create_crew(2).await;
	let alice = env.create_member("alice", &crew, MemberRole::Member).await;
	let dave =
		env.create_member("dave", &other_crew, MemberRole::Member).await;
	let stranger = env.create_guest("eve", &other_crew, &dave).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&alice).await)
		.json(&serde_json::json!({
			"dates": [tomorrow],
			"guestId": stranger.id,
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn member_of_another_crew_is_forbidden() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;
	let other_crew = env.create_crew(2).await;
	let outsider =
		env.create_member("dave", &other_crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&outsider).await)
		.json(&serde_json::json!({ "dates": [tomorrow] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn scheduled_crew_rejects_dates_weeks_ahead() {
	let env = TestEnv::new().await;

	let crew = env
		.create_scheduled_crew(
			2,
			models::DayOfWeek::Monday,
			"10:00:00".parse().unwrap(),
		)
		.await;
	let member = env.create_member("alice", &crew, MemberRole::Member).await;

	// The window for a date three weeks out cannot have opened yet.
	let far_ahead = Utc::now().date_naive() + Duration::weeks(3);

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&member).await)
		.json(&serde_json::json!({ "dates": [far_ahead] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationsResponse>();

	assert_eq!(body.results[0].status, ReservationOutcome::Closed);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_confirmed_promotes_oldest_waiting() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(1).await;
	let alice = env.create_member("alice", &crew, MemberRole::Member).await;
	let bob = env.create_member("bob", &crew, MemberRole::Member).await;
	let carol = env.create_member("carol", &crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);
	let request = serde_json::json!({ "dates": [tomorrow] });

	for member in [&alice, &bob, &carol] {
		env.app
			.post(&format!("/crews/{}/reservations", crew.id))
			.add_cookie(env.login(member).await)
			.json(&request)
			.await;
	}

	let response = env
		.app
		.delete(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&alice).await)
		.json(&request)
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<CancelResponse>();
	assert_eq!(body.results[0].status, CancelOutcome::Cancelled);

	let roster = env
		.app
		.get(&format!("/crews/{}/reservations/{}", crew.id, tomorrow))
		.add_cookie(env.login(&bob).await)
		.await
		.json::<DayRosterResponse>();

	assert_eq!(roster.confirmed.len(), 1);
	assert_eq!(roster.confirmed[0].username, "bob");
	assert_eq!(roster.waiting.len(), 1);
	assert_eq!(roster.waiting[0].username, "carol");
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_waiting_promotes_nothing() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(1).await;
	let alice = env.create_member("alice", &crew, MemberRole::Member).await;
	let bob = env.create_member("bob", &crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);
	let request = serde_json::json!({ "dates": [tomorrow] });

	for member in [&alice, &bob] {
		env.app
			.post(&format!("/crews/{}/reservations", crew.id))
			.add_cookie(env.login(member).await)
			.json(&request)
			.await;
	}

	let response = env
		.app
		.delete(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&bob).await)
		.json(&request)
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let roster = env
		.app
		.get(&format!("/crews/{}/reservations/{}", crew.id, tomorrow))
		.add_cookie(env.login(&alice).await)
		.await
		.json::<DayRosterResponse>();

	assert_eq!(roster.confirmed.len(), 1);
	assert_eq!(roster.confirmed[0].username, "alice");
	assert!(roster.waiting.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_an_unknown_date_is_reported() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(1).await;
	let member = env.create_member("alice", &crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);

	let response = env
		.app
		.delete(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&member).await)
		.json(&serde_json::json!({ "dates": [tomorrow] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<CancelResponse>();

	assert_eq!(body.results[0].status, CancelOutcome::NotFound);
	assert_eq!(body.summary.failed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn teaching_flag_follows_the_reservation() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(1).await;
	let alice = env.create_member("alice", &crew, MemberRole::Member).await;
	let bob = env.create_member("bob", &crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);
	let request = serde_json::json!({ "dates": [tomorrow] });

	for member in [&alice, &bob] {
		env.app
			.post(&format!("/crews/{}/reservations", crew.id))
			.add_cookie(env.login(member).await)
			.json(&request)
			.await;
	}

	let marked = env
		.app
		.post(&format!(
			"/crews/{}/reservations/{}/teaching",
			crew.id, tomorrow
		))
		.add_cookie(env.login(&alice).await)
		.await;

	assert_eq!(marked.status_code(), StatusCode::NO_CONTENT);

	let roster = env
		.app
		.get(&format!("/crews/{}/reservations/{}", crew.id, tomorrow))
		.add_cookie(env.login(&alice).await)
		.await
		.json::<DayRosterResponse>();

	assert!(roster.confirmed[0].teaching);

	// A waitlisted member holds no slot to teach in.
	let rejected = env
		.app
		.post(&format!(
			"/crews/{}/reservations/{}/teaching",
			crew.id, tomorrow
		))
		.add_cookie(env.login(&bob).await)
		.await;

	assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

	let cleared = env
		.app
		.delete(&format!(
			"/crews/{}/reservations/{}/teaching",
			crew.id, tomorrow
		))
		.add_cookie(env.login(&alice).await)
		.await;

	assert_eq!(cleared.status_code(), StatusCode::NO_CONTENT);

	let roster = env
		.app
		.get(&format!("/crews/{}/reservations/{}", crew.id, tomorrow))
		.add_cookie(env.login(&alice).await)
		.await
		.json::<DayRosterResponse>();

	assert!(!roster.confirmed[0].teaching);
}

#[tokio::test(flavor = "multi_thread")]
async fn busy_slot_is_reported_as_retryable() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;
	let member = env.create_member("alice", &crew, MemberRole::Member).await;

	let tomorrow = Utc::now().date_naive() + Duration::days(1);

	env.block_slot(crew.id, tomorrow).await;

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&member).await)
		.json(&serde_json::json!({ "dates": [tomorrow] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationsResponse>();

	assert_eq!(body.results[0].status, ReservationOutcome::RetryLazily);
	assert_eq!(body.summary.failed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_batch_is_rejected() {
	let env = TestEnv::new().await;

	let crew = env.create_crew(2).await;
	let member = env.create_member("alice", &crew, MemberRole::Member).await;

	let response = env
		.app
		.post(&format!("/crews/{}/reservations", crew.id))
		.add_cookie(env.login(&member).await)
		.json(&serde_json::json!({ "dates": [] }))
		.await;

	assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}
