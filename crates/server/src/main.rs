//! yamdb-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, middleware, routing::get};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yamdb_api::{AppState, auth_middleware, router as api_router};
use yamdb_common::Config;
use yamdb_core::{
    AccountService, CategoryService, CommentService, ConfirmationCodes, EmailService,
    GenreService, ReviewService, TitleService, TokenService, UserService, transport_from_config,
};
use yamdb_db::repositories::{
    CategoryRepository, CommentRepository, GenreRepository, ReviewRepository, TitleRepository,
    UserRepository,
};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Per-request deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Report database connectivity.
async fn health(State(db): State<Arc<DatabaseConnection>>) -> (StatusCode, Json<Value>) {
    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yamdb=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting yamdb-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(yamdb_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    yamdb_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let genre_repo = GenreRepository::new(Arc::clone(&db));
    let title_repo = TitleRepository::new(Arc::clone(&db));
    let review_repo = ReviewRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));

    // Initialize services
    let mailer = transport_from_config(&config.email)?;
    if config.email.smtp.is_none() {
        info!("No SMTP relay configured; confirmation codes go to the log");
    }

    let account_service = AccountService::new(
        user_repo.clone(),
        ConfirmationCodes::new(&config),
        TokenService::new(&config),
        EmailService::new(mailer, &config.email),
    );

    if let Some(bootstrap) = &config.bootstrap {
        let admin = account_service.bootstrap_admin(bootstrap).await?;
        info!(username = %admin.username, "Admin account ready");
    }

    let state = AppState {
        account_service,
        user_service: UserService::new(user_repo.clone()),
        category_service: CategoryService::new(category_repo.clone()),
        genre_service: GenreService::new(genre_repo.clone()),
        title_service: TitleService::new(title_repo, category_repo, genre_repo),
        review_service: ReviewService::new(review_repo, user_repo.clone()),
        comment_service: CommentService::new(comment_repo, user_repo),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health).with_state(Arc::clone(&db)))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
