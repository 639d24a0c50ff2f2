#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use chrono::Duration;
    use domain::core::PortfolioManager;
    use domain::report::AnalysisReport;
    use domain::store::Stores;
    use domain::suggestion::{SelectionPolicy, SuggestionEngine};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::api::jwt::JwtKeys;
    use crate::services::AppHandle;

    async fn create_test_setup(policy: SelectionPolicy) -> (Router, AppHandle, String) {
        let manager =
            PortfolioManager::with_seed(Stores::in_memory(), SuggestionEngine::new(policy), 11);
        let handle = AppHandle::new(manager, JwtKeys::new(b"test-secret", Duration::hours(1)));

        let user_id = handle
            .manager()
            .sign_up("reporter@test.com", "password123")
            .await
            .unwrap();
        let token = handle.jwt().issue(user_id, "reporter@test.com").unwrap();
        (crate::api::create_api(handle.clone()), handle, token)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_generate_and_list_reports() {
        let (app, _, token) = create_test_setup(SelectionPolicy::RandomSample).await;

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/reports", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let first: AnalysisReport = serde_json::from_value(body_json(response).await).unwrap();
        assert!(!first.prediction.is_empty());

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/reports", Some(&token), None))
            .await
            .unwrap();
        let second: AnalysisReport = serde_json::from_value(body_json(response).await).unwrap();

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/reports", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reports: Vec<AnalysisReport> = serde_json::from_value(body_json(response).await).unwrap();
        let ids: Vec<_> = reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let response = app
            .oneshot(request(
                Method::GET,
                &format!("/api/reports/{}", first.id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_report_of_another_user_is_forbidden() {
        let (app, handle, token) = create_test_setup(SelectionPolicy::RandomSample).await;
        let other_id = handle
            .manager()
            .sign_up("other@test.com", "password123")
            .await
            .unwrap();
        let other = handle.jwt().issue(other_id, "other@test.com").unwrap();

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/reports", Some(&token), None))
            .await
            .unwrap();
        let report: AnalysisReport = serde_json::from_value(body_json(response).await).unwrap();

        let response = app
            .oneshot(request(
                Method::GET,
                &format!("/api/reports/{}", report.id),
                Some(&other),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_report_uses_recorded_ticks() {
        let (app, _, token) = create_test_setup(SelectionPolicy::MostRelevant).await;

        for (symbol, price) in [("AAPL", 150.0), ("MSFT", 300.0), ("GOOGL", 140.0), ("AMZN", 160.0)] {
            let response = app
                .clone()
                .oneshot(request(
                    Method::POST,
                    "/api/market-data",
                    Some(&token),
                    Some(json!({ "symbol": symbol, "price": price })),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(request(Method::POST, "/api/reports", Some(&token), None))
            .await
            .unwrap();
        let report: AnalysisReport = serde_json::from_value(body_json(response).await).unwrap();
        assert!(report.prediction.contains("MSFT, AMZN, AAPL"));
    }
}
