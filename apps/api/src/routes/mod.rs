pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::ai::handlers as ai_handlers;
use crate::auth;
use crate::state::AppState;
use crate::users::handlers as user_handlers;

/// Body limit for the upload routes (images and resume PDFs).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let ai_routes = Router::new()
        .route(
            "/generate-article",
            post(ai_handlers::handle_generate_article),
        )
        .route("/generate-image", post(ai_handlers::handle_generate_image))
        .route(
            "/remove-background",
            post(ai_handlers::handle_remove_background),
        )
        .route("/remove-object", post(ai_handlers::handle_remove_object))
        .route("/resume-review", post(ai_handlers::handle_resume_review))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let user_routes = Router::new()
        .route(
            "/get-user-creation",
            get(user_handlers::handle_get_user_creation),
        )
        .route(
            "/get-published-creation",
            get(user_handlers::handle_get_published_creation),
        );

    // Everything under /api requires a verified session; the liveness probe
    // does not.
    let api = Router::new()
        .nest("/ai", ai_routes)
        .nest("/user", user_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/", get(health::liveness_handler))
        .nest("/api", api)
        .with_state(state)
}
