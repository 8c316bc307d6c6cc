use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod api;
mod auth;
mod config;
mod database;
mod error;
mod filter;
mod handlers;
mod middleware;
mod policy;
mod services;
mod types;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();
    tracing::info!("Starting Partner Desk in {:?} mode", config.environment);

    if let Err(e) = crate::database::bootstrap().await {
        panic!("failed to initialize database schema: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PARTNER_DESK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Partner Desk listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes
        .merge(auth_public_routes())
        // Everything else requires a bearer token
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn protected_routes() -> Router {
    use handlers::protected::{assignees, auth, dashboard, search, tickets, users};

    Router::new()
        .route("/auth/me", get(auth::me_get))
        // Ticket collection and the fixed-path operations; static segments
        // win over :id so /tickets/filter and /tickets/transfer stay routable
        .route(
            "/tickets",
            get(tickets::tickets_get).post(tickets::tickets_post),
        )
        .route(
            "/tickets/filter",
            get(tickets::filter_get).post(tickets::filter_post),
        )
        .route(
            "/tickets/transfer",
            get(tickets::transfer_get).post(tickets::transfer_post),
        )
        .route(
            "/tickets/:id",
            get(tickets::ticket_get)
                .put(tickets::ticket_put)
                .delete(tickets::ticket_delete),
        )
        .route(
            "/tickets/:id/comments",
            get(tickets::comments_get).post(tickets::comments_post),
        )
        .route("/my-tickets", get(tickets::my_tickets_get))
        .route("/search", get(search::search_get))
        .route("/search/tickets", get(search::search_tickets_get))
        .route(
            "/users",
            get(users::users_get)
                .post(users::users_post)
                .put(users::users_put)
                .delete(users::users_delete),
        )
        .route("/assignees", get(assignees::assignees_get))
        .route("/dashboard", get(dashboard::dashboard_get))
        .route("/dashboard/stats", get(dashboard::dashboard_stats_get))
        .layer(axum::middleware::from_fn(middleware::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Partner Desk",
        "version": version,
        "description": "Role-based IT support ticketing API",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/auth/register, /auth/login (public), /auth/me (protected)",
            "tickets": "/tickets[/:id], /tickets/:id/comments, /tickets/filter, /tickets/transfer (protected)",
            "my_tickets": "/my-tickets (protected)",
            "search": "/search, /search/tickets (protected)",
            "users": "/users (head office / technical)",
            "assignees": "/assignees (protected)",
            "dashboard": "/dashboard, /dashboard/stats (protected)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": "database unavailable",
                "database_error": e.to_string()
            })),
        ),
    }
}
