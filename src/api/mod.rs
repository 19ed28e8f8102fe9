// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth::middleware::require_auth, state::AppState};

pub mod auth_flow;
pub mod health;
pub mod me;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(me::me))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let v1_routes = Router::new()
        .route("/auth/login", post(auth_flow::login))
        .route("/auth/refresh", post(auth_flow::refresh))
        .merge(protected);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
