use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{handlers, state::AppState};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/me", get(handlers::me))
        .route("/tickets", get(handlers::list_tickets).post(handlers::create_ticket))
        .route("/tickets/{id}", get(handlers::get_ticket))
        .route("/tickets/{id}/comments", post(handlers::add_comment))
        .route("/tickets/{id}/status", post(handlers::update_status));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
