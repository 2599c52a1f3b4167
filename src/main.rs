//! Seoga Server - Library circulation and catalog system

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seoga_server::{
    api, config::AppConfig, repository::Repository, services::Services, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("seoga_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Seoga Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let sweep_interval = Duration::from_secs(config.circulation.sweep_interval_secs);

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        config.circulation.clone(),
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Periodic reservation expiry, alongside the lazy per-request checks
    spawn_reservation_sweeper(state.clone(), sweep_interval);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn the background task expiring reservations past their pickup window
fn spawn_reservation_sweeper(state: AppState, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match state.services.reservations.sweep_expired().await {
                Ok(expired) if expired > 0 => {
                    tracing::info!(expired, "Reservation sweep expired overdue holds");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Reservation sweep failed");
                }
            }
        }
    });
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Accounts
        .route("/users/signup", post(api::users::signup))
        .route("/users/login", post(api::users::login))
        .route("/users/me", get(api::users::me))
        // Books (catalog)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/liked", get(api::books::liked_books))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        .route("/books/:id/like", post(api::books::toggle_like))
        .route("/books/:id/reserve", post(api::books::reserve_book))
        // Rentals
        .route("/rentals", get(api::rentals::list_my_rentals))
        .route("/rentals", post(api::rentals::create_rental))
        .route("/rentals/current", get(api::rentals::current_rentals))
        .route("/rentals/overdue", get(api::rentals::overdue_rentals))
        .route("/rentals/penalty", get(api::rentals::my_penalty))
        .route("/rentals/stats", get(api::rentals::rental_stats))
        .route("/rentals/:id/return", post(api::rentals::return_rental))
        // Reservations
        .route("/reservations", get(api::reservations::list_my_reservations))
        .route("/reservations/sweep", post(api::reservations::sweep_reservations))
        .route(
            "/reservations/:id/cancel",
            post(api::reservations::cancel_reservation),
        )
        // Reviews
        .route("/reviews", get(api::reviews::list_reviews))
        .route("/reviews", post(api::reviews::create_review))
        .route("/reviews/:id", put(api::reviews::update_review))
        .route("/reviews/:id", delete(api::reviews::delete_review))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
