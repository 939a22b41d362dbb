//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/librarysearch", get(handlers::api_search))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::engines::BackendRegistry;
    use crate::metrics::Metrics;
    use crate::network::HttpClient;
    use crate::search::{Aggregator, LibrarySearch};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(settings: Settings) -> Router {
        let settings = Arc::new(settings);
        let metrics = Arc::new(Metrics::new());
        let aggregator = Aggregator::new(
            HttpClient::new().unwrap(),
            Arc::new(BackendRegistry::with_defaults()),
            metrics.clone(),
        );
        let search = Arc::new(LibrarySearch::new(settings.clone(), aggregator, metrics));
        create_router(AppState::new(settings, search))
    }

    async fn call(router: Router, uri: &str, host: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .header("host", host)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(router(Settings::default()), "/health", "localhost").await;

        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_feature_disabled_is_forbidden() {
        let (status, body) = call(
            router(Settings::default()),
            "/api/librarysearch?query=darwin",
            "localhost",
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, "LibrarySearch is disabled for this tenant");
    }

    #[tokio::test]
    async fn test_tenant_resolved_from_host() {
        let mut settings = Settings::default();
        settings.set_value("cam", "librarysearch", "enabled", true);
        settings
            .server
            .tenant_hosts
            .insert("cam.example.org".to_string(), "cam".to_string());
        let router = router(settings);

        let (status, body) = call(
            router.clone(),
            "/api/librarysearch?query=%20%20",
            "cam.example.org:8888",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "An invalid query was provided");

        let (status, _) = call(router, "/api/librarysearch?query=darwin", "other.example.org").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_query_is_invalid() {
        let mut settings = Settings::default();
        settings.set_value("default", "librarysearch", "enabled", true);

        let (status, _) = call(router(settings), "/api/librarysearch", "localhost").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_counts_rejections() {
        let router = router(Settings::default());
        call(router.clone(), "/api/librarysearch?query=darwin", "localhost").await;

        let (status, body) = call(router, "/stats", "localhost").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["rejected_searches"], 1);
        assert_eq!(value["total_searches"], 0);
    }
}
