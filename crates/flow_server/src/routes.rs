//! Router construction.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use tower_http::CompressionLevel;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ServerError, ServerResult};
use crate::handlers::{account, health, oauth2};
use crate::state::AppState;

/// Build the application router with its middleware.
pub fn app(state: AppState) -> ServerResult<Router> {
    let cors = cors_layer(&state.config.allow_origins)?;
    let compression = CompressionLayer::new()
        .gzip(true)
        .quality(CompressionLevel::Precise(state.config.gzip_level as i32));

    let router = Router::new()
        // Unauthenticated
        .route("/-/readiness", get(health::readiness))
        .route("/sign_in", post(account::sign_in))
        .route("/{provider}/register", post(oauth2::register))
        // Authenticated, except sign-up on POST /
        .route(
            "/",
            post(account::sign_up)
                .get(account::get_self)
                .patch(account::update_self)
                .delete(account::delete_self),
        )
        .route("/id", get(account::get_id))
        .route("/connections", get(oauth2::connections))
        .route("/{provider}", delete(oauth2::disconnect))
        .route("/{provider}/connect", post(oauth2::connect))
        .route("/{provider}/refresh", post(oauth2::refresh))
        .with_state(state)
        .layer(compression)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

fn cors_layer(origins: &[String]) -> ServerResult<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| ServerError::Config(format!("invalid allow-origin {origin:?}: {e}")))
        })
        .collect::<ServerResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any))
}
