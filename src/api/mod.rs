mod admin;
mod amenities;
pub mod auth;
pub mod error;
pub mod metrics;
mod places;
mod reviews;
mod users;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new().route("/login", post(auth::login));

    let api_routes = Router::new()
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user).put(users::update_user))
        .route("/users/:id/stats", get(users::get_user_stats))
        // Places
        .route("/places", get(places::list_places).post(places::create_place))
        .route(
            "/places/:id",
            get(places::get_place)
                .put(places::update_place)
                .delete(places::delete_place),
        )
        .route("/places/:id/reviews", get(places::list_place_reviews))
        .route("/places/:id/stats", get(places::get_place_stats))
        .route("/places/:id/amenities", get(places::list_place_amenities))
        .route(
            "/places/:id/amenities/:amenity_id",
            post(places::add_place_amenity).delete(places::remove_place_amenity),
        )
        // Reviews
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route(
            "/reviews/:id",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        // Amenities
        .route(
            "/amenities",
            get(amenities::list_amenities).post(amenities::create_amenity),
        )
        .route(
            "/amenities/:id",
            get(amenities::get_amenity).put(amenities::update_amenity),
        );

    let admin_routes = Router::new()
        .route("/users", post(admin::create_user))
        .route("/users/:id", put(admin::update_user).delete(admin::delete_user))
        .route("/places/:id", put(admin::update_place).delete(admin::delete_place))
        .route(
            "/places/:id/amenities/:amenity_id",
            post(admin::add_place_amenity).delete(admin::remove_place_amenity),
        )
        .route("/amenities", post(admin::create_amenity))
        .route(
            "/amenities/:id",
            put(admin::update_amenity).delete(admin::delete_amenity),
        )
        .route(
            "/reviews/:id",
            put(admin::update_review).delete(admin::delete_review),
        )
        .route("/stats", get(admin::get_stats));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_endpoint))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/admin", admin_routes)
        .nest("/api/v1", api_routes)
        // route_layer so the middleware sees MatchedPath
        .route_layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
