use axum::{
    Router,
    routing::{get, post},
    middleware::from_fn_with_state,
};

use http::{Method, header};
use std::time::Duration;
use tower_http::{
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
    cors::{Any, CorsLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod crypto {
    pub mod envelope;
}

mod models {
    pub mod user;
    pub mod lamp;
    pub mod tariff;
}

mod repositories {
    pub mod user;
    pub mod lamp;
}

mod services {
    pub mod credentials;
    pub mod tokens;
    pub mod energy;
}

mod handlers {
    pub mod auth;
    pub mod lamps;
    pub mod energy;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod auth;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded");

    let state = AppState::new(&config).await.map_err(|e| {
        anyhow::anyhow!("Failed to initialize application state: {}", e)
    })?;
    tracing::info!("✅ AppState initialized");

    // The mobile client is served cross-origin; auth rides in the
    // Authorization header, so no credentials are involved.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .max_age(Duration::from_secs(86400));

    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/lamps",
            get(handlers::lamps::list_lamps).post(handlers::lamps::create_lamp),
        )
        .route(
            "/lamps/{lamp_id}",
            get(handlers::lamps::get_lamp)
                .patch(handlers::lamps::update_lamp)
                .delete(handlers::lamps::delete_lamp),
        )
        .route(
            "/energy/tariffs",
            get(handlers::energy::get_tariffs).put(handlers::energy::put_tariffs),
        )
        .route("/energy/consumption", get(handlers::energy::consumption))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
