//! MySQL test gateway - Main Application Entry Point
//!
//! A small REST service that lets browser clients on an allowed domain read
//! from and insert into a MySQL `users` table. Every database route sits
//! behind a request gate that checks a shared token header and the request's
//! Origin/Referer hostname.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: MySQL with sqlx (async queries, bound parameters)
//! - **Authentication**: static `X-Worker-Auth-Token` plus origin allow-list
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations (unless disabled)
//! 4. Build HTTP router with routes and middleware
//! 5. Serve until Ctrl+C / SIGTERM, then close the pool

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::gate::{AllowList, RequestGate},
    services::user_store::MySqlUserStore,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    anyhow::ensure!(
        !config.worker_auth_token.is_empty(),
        "WORKER_AUTH_TOKEN must not be empty"
    );
    anyhow::ensure!(
        !config.allowed_base_domain.trim().is_empty(),
        "ALLOWED_BASE_DOMAIN must not be empty"
    );
    tracing::info!(?config, "Configuration loaded");

    let pool = db::create_pool(&config).await?;
    tracing::info!(
        max_connections = config.mysql_connection_limit,
        "Database pool created"
    );

    if config.run_migrations {
        db::run_migrations(&pool).await?;
        tracing::info!("Database migrations complete");
    }

    let gate = RequestGate::new(
        config.worker_auth_token.clone(),
        AllowList::new(&config.allowed_base_domain, &config.allowed_subdomains),
    );
    let state = AppState::new(Arc::new(MySqlUserStore::new(pool.clone())), gate);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db::close_pool(&pool).await;
    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Build the HTTP router.
///
/// `/api/mysql-test` is guarded by the gate for GET and POST; its OPTIONS
/// preflight and `/health` are public.
fn build_router(state: AppState) -> Router {
    let guarded_routes = Router::new()
        .route(
            "/api/mysql-test",
            get(handlers::users::list_users)
                .post(handlers::users::create_user)
                .options(handlers::preflight::preflight),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.gate.clone(),
            middleware::gate::gate_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(guarded_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        middleware::gate::AUTH_TOKEN_HEADER,
        models::user::User,
        services::user_store::{
            UserStore,
            fakes::{FailingUserStore, MemoryUserStore},
        },
    };
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const TOKEN: &str = "worker-secret";
    const PATH: &str = "/api/mysql-test";

    fn app_with(store: Arc<dyn UserStore>) -> Router {
        let gate = RequestGate::new(
            TOKEN,
            AllowList::new("dpdns.org", &["www".to_string(), "api".to_string()]),
        );
        build_router(AppState::new(store, gate))
    }

    fn seeded_store() -> Arc<MemoryUserStore> {
        Arc::new(MemoryUserStore::with_rows(vec![User {
            id: 1,
            name: "seed".to_string(),
            age: 30,
        }]))
    }

    fn request(method: Method, headers: &[(&str, &str)], body: Body) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(PATH);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(body).unwrap()
    }

    fn post_json(headers: &[(&str, &str)], json: &str) -> Request<Body> {
        let mut all = headers.to_vec();
        all.push(("content-type", "application/json"));
        request(Method::POST, &all, Body::from(json.to_string()))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn allow_origin(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|h| h.to_str().ok())
    }

    #[tokio::test]
    async fn get_with_valid_token_and_origin_lists_rows() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(request(
                Method::GET,
                &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", "https://dpdns.org")],
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(allow_origin(&response), Some("https://dpdns.org"));
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "X-Worker-Auth-Token, Content-Type"
        );

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        let rows = body["testData"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "seed");
    }

    #[tokio::test]
    async fn post_with_valid_token_inserts_and_returns_id() {
        let store = seeded_store();
        let app = app_with(store.clone());

        let response = app
            .oneshot(post_json(
                &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", "https://api.dpdns.org")],
                r#"{"name": "a", "age": 1}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(allow_origin(&response), Some("https://api.dpdns.org"));

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["insertId"], 2);

        let rows = store.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "a");
        assert_eq!(rows[1].age, 1);
    }

    #[tokio::test]
    async fn post_accepts_referer_only() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(post_json(
                &[
                    (AUTH_TOKEN_HEADER, TOKEN),
                    ("referer", "https://www.dpdns.org/form"),
                ],
                r#"{"name": "b", "age": 2}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(allow_origin(&response), Some("https://www.dpdns.org"));
    }

    #[tokio::test]
    async fn missing_token_is_rejected_before_the_store() {
        let store = seeded_store();
        let app = app_with(store.clone());

        let response = app
            .oneshot(post_json(
                &[("origin", "https://dpdns.org")],
                r#"{"name": "a", "age": 1}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(allow_origin(&response).is_none());
        assert_eq!(body_json(response).await["success"], false);
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn wrong_token_is_unauthorized() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(request(
                Method::GET,
                &[(AUTH_TOKEN_HEADER, "nope"), ("origin", "https://dpdns.org")],
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_without_origin_or_referer_is_forbidden() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(request(
                Method::GET,
                &[(AUTH_TOKEN_HEADER, TOKEN)],
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["message"],
            "Missing Origin or Referer header"
        );
    }

    #[tokio::test]
    async fn lookalike_origins_are_forbidden() {
        for origin in ["https://dpdns.org.evil.com", "https://evildpdns.org"] {
            let app = app_with(seeded_store());

            let response = app
                .oneshot(request(
                    Method::GET,
                    &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", origin)],
                    Body::empty(),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{origin}");
            assert!(allow_origin(&response).is_none());
        }
    }

    #[tokio::test]
    async fn name_with_sql_metacharacters_is_stored_verbatim() {
        let store = seeded_store();
        let app = app_with(store.clone());
        let name = "Robert'); DROP TABLE users; --";

        let response = app
            .oneshot(post_json(
                &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", "https://dpdns.org")],
                &serde_json::json!({ "name": name, "age": 7 }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(store.rows()[1].name, name);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(post_json(
                &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", "https://dpdns.org")],
                r#"{"name": "a"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn database_failure_is_500_with_driver_message() {
        let app = app_with(Arc::new(FailingUserStore {
            message: "Access denied for user 'worker'",
        }));

        let response = app
            .clone()
            .oneshot(request(
                Method::GET,
                &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", "https://dpdns.org")],
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(allow_origin(&response), Some("https://dpdns.org"));
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Access denied"));

        let response = app
            .oneshot(post_json(
                &[(AUTH_TOKEN_HEADER, TOKEN), ("origin", "https://dpdns.org")],
                r#"{"name": "a", "age": 1}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Data insert failed");
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_gets_cors_headers() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(request(
                Method::OPTIONS,
                &[
                    ("origin", "https://api.dpdns.org"),
                    ("access-control-request-method", "POST"),
                ],
                Body::empty(),
            ))
            .await
            .unwrap();

        assert!(response.status().as_u16() < 300);
        assert_eq!(allow_origin(&response), Some("https://api.dpdns.org"));
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "X-Worker-Auth-Token, Content-Type"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[tokio::test]
    async fn preflight_uses_substring_match_on_origin() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(request(
                Method::OPTIONS,
                &[("origin", "https://dpdns.org.evil.com")],
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn preflight_from_other_origin_is_forbidden_without_cors() {
        for headers in [vec![("origin", "https://evil.com")], vec![]] {
            let app = app_with(seeded_store());

            let response = app
                .oneshot(request(Method::OPTIONS, &headers, Body::empty()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert!(allow_origin(&response).is_none());
            assert!(
                response
                    .headers()
                    .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                    .is_none()
            );
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app_with(seeded_store());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["database"], "connected");
    }

    #[tokio::test]
    async fn health_reports_database_failure() {
        let app = app_with(Arc::new(FailingUserStore {
            message: "server has gone away",
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
