#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use chrono::Duration;
    use domain::core::PortfolioManager;
    use tower::ServiceExt;

    use crate::api::jwt::JwtKeys;
    use crate::services::AppHandle;

    fn app() -> axum::Router {
        crate::api::create_api(AppHandle::new(
            PortfolioManager::in_memory(),
            JwtKeys::new(b"test-secret", Duration::hours(1)),
        ))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/apidoc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/api/investments/{investment_id}"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
