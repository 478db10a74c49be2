pub mod registration_handlers;
pub mod user_handlers;

pub use registration_handlers::{
    duplicate_check_email_handler, duplicate_check_id_handler, register_handler, verify_handler,
};
pub use user_handlers::{health_handler, update_password_handler};

use crate::middleware::add_security_headers;
use crate::AppState;
use axum::{
    http::header,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(app_state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let api = Router::new()
        .route("/register", post(register_handler))
        .route("/duplicate-check-id", post(duplicate_check_id_handler))
        .route("/duplicate-check-email", post(duplicate_check_email_handler))
        .route("/verify", get(verify_handler))
        .route("/users/password", patch(update_password_handler))
        .layer(cors_layer);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
