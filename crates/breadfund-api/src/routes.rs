use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use breadfund_types::api::HealthResponse;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{campaigns, donations, feed_posts, reactions};

/// Assemble the full HTTP surface.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/user/signup", post(auth::signup))
        .route("/user/login", post(auth::login))
        .route("/campaign/hot", get(campaigns::list_popular))
        .route(
            "/campaign/{campaign_id}/donation",
            get(donations::list).post(donations::save),
        )
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/campaign/", get(campaigns::list_mine).post(campaigns::create))
        .route(
            "/campaign/{campaign_id}",
            get(campaigns::retrieve)
                .patch(campaigns::update)
                .delete(campaigns::delete),
        )
        .route("/campaign/{campaign_id}/like", post(reactions::react_to_campaign))
        .route("/campaign/{campaign_id}/qr-code", get(campaigns::qr_code))
        .route(
            "/campaign/{campaign_id}/beneficiary/{email}",
            post(campaigns::add_beneficiary),
        )
        .route("/campaign/{campaign_id}/feed-post", post(feed_posts::create))
        .route(
            "/campaign/{campaign_id}/feed-post/{feed_id}",
            patch(feed_posts::update).delete(feed_posts::delete),
        )
        .route("/campaign/feed-post/{feed_id}/like", post(reactions::react_to_feed_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// GET /healthcheck: liveness check (no auth).
pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
