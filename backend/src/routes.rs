//! API surface assembly. Separated from `main` so integration tests can
//! drive the real router with test state.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::handlers;
use crate::middleware as app_middleware;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    // Routes reachable without a session.
    let public_routes = Router::new()
        .route("/api/v1/user/register", post(handlers::users::register))
        .route("/api/v1/user/auth/logout", post(handlers::users::logout))
        .route("/api/v1/user/auth/status", get(handlers::users::auth_status))
        .route("/api/v1/user/verify/email", get(handlers::users::verify_email))
        .route(
            "/api/v1/user/super-user",
            patch(handlers::users::upsert_super_user),
        )
        .route("/health", get(health));

    // Login is inversely gated: an already-authenticated caller is rejected.
    let login_routes = Router::new()
        .route("/api/v1/user/auth/login", post(handlers::users::login))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::block_if_authenticated,
        ));

    // Everything below requires a resolved identity.
    let protected_routes = Router::new()
        .route(
            "/api/v1/user/current-user",
            get(handlers::users::current_user),
        )
        .route("/api/v1/users", get(handlers::users::list_users))
        .route(
            "/api/v1/user/update-user/{id}",
            put(handlers::users::update_user),
        )
        .route(
            "/api/v1/user/demote/{id}",
            patch(handlers::users::demote_user),
        )
        .route(
            "/api/v1/user/{id}",
            get(handlers::users::get_user).delete(handlers::users::delete_user),
        )
        .route("/api/v1/events", get(handlers::events::list_events))
        .route("/api/v1/event/create", post(handlers::events::create_event))
        .route(
            "/api/v1/event/update/{id}",
            put(handlers::events::update_event),
        )
        .route(
            "/api/v1/event/delete/{id}",
            delete(handlers::events::delete_event),
        )
        .route(
            "/api/v1/email_templates/{event_id}",
            get(handlers::email_templates::get_template),
        )
        .route(
            "/api/v1/email_templates",
            post(handlers::email_templates::create_template)
                .put(handlers::email_templates::update_template),
        )
        .route(
            "/api/v1/event/{event_id}/attendees",
            get(handlers::attendees::list_attendees_paginated)
                .delete(handlers::attendees::delete_all_attendees),
        )
        .route(
            "/api/v1/event/{event_id}/attendees/count",
            get(handlers::attendees::count_attendees),
        )
        .route(
            "/api/v1/event/{event_id}/attendees/all",
            get(handlers::attendees::list_all_attendees),
        )
        .route(
            "/api/v1/event/{event_id}/attendees/{attendee_id}",
            delete(handlers::attendees::delete_attendee),
        )
        .route(
            "/api/v1/event/{event_id}/attendees/import",
            post(handlers::attendees::import_attendees_csv),
        )
        .route(
            "/api/v1/event/{event_id}/attendees/send_invitation",
            post(handlers::attendees::send_invitation_emails),
        )
        .route(
            "/api/v1/event/add_attendee",
            post(handlers::attendees::create_attendee),
        )
        .route(
            "/api/v1/event/attendees/{attendee_id}",
            put(handlers::attendees::update_attendee),
        )
        .route(
            "/api/v1/attendees/{attendee_id}",
            get(handlers::attendees::get_attendee),
        )
        .route(
            "/api/v1/attendees/mark_attendance/{attendee_email}",
            post(handlers::attendees::mark_attendance),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(
                    app_middleware::request_id::request_id,
                ))
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION, ACCEPT])
        .allow_credentials(true);

    if let Ok(origin) = config.public_host.parse::<HeaderValue>() {
        cors = cors.allow_origin(origin);
    }
    cors
}
