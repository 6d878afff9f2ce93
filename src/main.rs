//! MoneyWise Backend - Main Application Entry Point
//!
//! This is the REST API server for the MoneyWise personal-finance
//! application: user accounts with JWT authentication (plus optional
//! TOTP two-factor), families, financial accounts with XOR ownership,
//! transactions, categories, and monthly budgets.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: argon2id passwords, HS256 access tokens,
//!   rotated opaque refresh tokens
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let server_port = config.server_port;
    let state = AppState::new(pool, config);

    // Public auth routes, rate limited per client IP
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::login_rate_limit,
        ));

    // Routes requiring a valid access token
    let authenticated_routes = Router::new()
        // Session and credential management
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/auth/password", post(handlers::auth::change_password))
        .route("/api/v1/auth/2fa/setup", post(handlers::auth::totp_setup))
        .route("/api/v1/auth/2fa/enable", post(handlers::auth::totp_enable))
        .route("/api/v1/auth/2fa/disable", post(handlers::auth::totp_disable))
        // Profile routes
        .route("/api/v1/users/me", get(handlers::users::get_me))
        .route("/api/v1/users/me", patch(handlers::users::update_me))
        // Family routes
        .route("/api/v1/families", post(handlers::families::create_family))
        .route("/api/v1/families", get(handlers::families::list_families))
        .route(
            "/api/v1/families/{id}/members",
            get(handlers::families::list_members),
        )
        .route(
            "/api/v1/families/{id}/members",
            post(handlers::families::add_member),
        )
        .route(
            "/api/v1/families/{id}/members/{user_id}",
            delete(handlers::families::remove_member),
        )
        // Account management routes
        .route("/api/v1/accounts", post(handlers::accounts::create_account))
        .route("/api/v1/accounts", get(handlers::accounts::list_accounts))
        .route("/api/v1/accounts/{id}", get(handlers::accounts::get_account))
        .route(
            "/api/v1/accounts/{id}",
            patch(handlers::accounts::update_account),
        )
        .route(
            "/api/v1/accounts/{id}",
            delete(handlers::accounts::delete_account),
        )
        .route(
            "/api/v1/accounts/{id}/transactions",
            get(handlers::transactions::list_account_transactions),
        )
        // Transaction routes
        .route(
            "/api/v1/transactions/income",
            post(handlers::transactions::create_income),
        )
        .route(
            "/api/v1/transactions/expense",
            post(handlers::transactions::create_expense),
        )
        .route(
            "/api/v1/transactions/transfer",
            post(handlers::transactions::create_transfer),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(handlers::transactions::get_transaction),
        )
        // Category routes
        .route(
            "/api/v1/categories",
            post(handlers::categories::create_category),
        )
        .route(
            "/api/v1/categories",
            get(handlers::categories::list_categories),
        )
        .route(
            "/api/v1/categories/{id}",
            delete(handlers::categories::delete_category),
        )
        // Budget routes
        .route("/api/v1/budgets", post(handlers::budgets::create_budget))
        .route("/api/v1/budgets", get(handlers::budgets::list_budgets))
        .route(
            "/api/v1/budgets/{id}",
            patch(handlers::budgets::update_budget),
        )
        .route(
            "/api/v1/budgets/{id}",
            delete(handlers::budgets::delete_budget),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine authenticated routes with public routes
    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .merge(auth_routes)
        .merge(authenticated_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{server_port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // ConnectInfo exposes the peer address to the rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
