pub mod handlers;
pub mod state;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/devices", get(handlers::all_devices))
        .route("/disconnect/:provider", post(handlers::disconnect))
        // Trackimo
        .route("/trackimo/connect", post(handlers::trackimo_connect))
        .route("/trackimo/restore", post(handlers::trackimo_restore))
        .route("/trackimo/devices", get(handlers::trackimo_devices))
        .route(
            "/trackimo/devices/:device_id/location",
            get(handlers::trackimo_location),
        )
        .route(
            "/trackimo/devices/:device_id/history",
            get(handlers::trackimo_history),
        )
        .route("/trackimo/devices/:device_id/beep", post(handlers::trackimo_beep))
        .route(
            "/trackimo/devices/:device_id/locate",
            post(handlers::trackimo_locate),
        )
        // Arvento
        .route("/arvento/connect", post(handlers::arvento_connect))
        .route(
            "/arvento/vehicles",
            get(handlers::arvento_vehicles).post(handlers::arvento_add_vehicle),
        )
        .route(
            "/arvento/vehicles/:node/location",
            get(handlers::arvento_location_by_node),
        )
        .route(
            "/arvento/vehicles/plate/:plate/location",
            get(handlers::arvento_location_by_plate),
        )
        .with_state(state)
        .layer(ServiceBuilder::new().layer(middleware::from_fn(trace_request)))
}

/// Wraps each request in a span with a fresh request id and logs the outcome.
async fn trace_request(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_server_error() {
            warn!(status = status.as_u16(), elapsed_ms, "request failed");
        } else {
            info!(status = status.as_u16(), elapsed_ms, "request completed");
        }
        response
    }
    .instrument(span)
    .await
}
