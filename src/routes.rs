use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::controllers::crew::{get_crew, get_crew_calendar, update_crew};
use crate::controllers::healthcheck;
use crate::controllers::reservation::{
	apply_teaching,
	cancel_reservations,
	cancel_teaching,
	create_reservations,
	get_day_roster,
};
use crate::middleware::AuthLayer;

/// Get the app router
pub fn get_app_router(state: AppState) -> Router {
	let api_routes = Router::new()
		.route("/healthcheck", get(healthcheck))
		.nest("/crews", crew_routes(&state));

	Router::new()
		.merge(api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(10)))
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

/// Crew and reservation routes, all auth protected
fn crew_routes(state: &AppState) -> Router<AppState> {
	Router::new()
		.route("/{crew_id}", get(get_crew).patch(update_crew))
		.route("/{crew_id}/calendar", get(get_crew_calendar))
		.route(
			"/{crew_id}/reservations",
			post(create_reservations).delete(cancel_reservations),
		)
		.route("/{crew_id}/reservations/{date}", get(get_day_roster))
		.route(
			"/{crew_id}/reservations/{date}/teaching",
			post(apply_teaching).delete(cancel_teaching),
		)
		.route_layer(AuthLayer::new(state.clone()))
}
