use super::*;
use crate::suggestion::{MAX_SUGGESTIONS, PARAGRAPH_SEPARATOR, SelectionPolicy};

fn manager() -> PortfolioManager {
    PortfolioManager::with_seed(Stores::in_memory(), SuggestionEngine::default(), 7)
}

fn investment(kind: InvestmentType, value: f64, risk: RiskLevel, sector: &str) -> NewInvestment {
    NewInvestment {
        asset_name: format!("{kind} holding"),
        kind,
        value,
        risk,
        sector: sector.to_string(),
    }
}

async fn signed_up(manager: &PortfolioManager, email: &str) -> UserId {
    manager.sign_up(email, "password123").await.unwrap()
}

#[tokio::test]
async fn test_sign_up_and_sign_in() {
    let manager = manager();
    let user_id = signed_up(&manager, "alice@example.com").await;

    assert_eq!(
        manager.sign_in("alice@example.com", "password123").await.unwrap(),
        user_id
    );
    assert!(matches!(
        manager.sign_in("alice@example.com", "wrong-password").await,
        Err(ServiceError::Auth(AuthError::InvalidPassword))
    ));
    assert!(matches!(
        manager.sign_up("alice@example.com", "password123").await,
        Err(ServiceError::Auth(AuthError::UserAlreadyExists))
    ));
    assert!(manager.user_exists(&user_id).await.unwrap());
}

#[tokio::test]
async fn test_portfolio_is_created_once() {
    let manager = manager();
    let user_id = signed_up(&manager, "bob@example.com").await;

    let first = manager.get_or_create_portfolio(&user_id).await.unwrap();
    let second = manager.get_or_create_portfolio(&user_id).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(manager.stores().portfolios.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_portfolio_creation() {
    let manager = std::sync::Arc::new(manager());
    let user_id = signed_up(&manager, "carol@example.com").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_or_create_portfolio(&user_id).await.unwrap().id })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn test_total_follows_mutations() {
    let manager = manager();
    let user_id = signed_up(&manager, "dave@example.com").await;

    let stocks = manager
        .add_investment(user_id, investment(InvestmentType::Stocks, 1000.0, RiskLevel::High, "Technology"))
        .await
        .unwrap();
    manager
        .add_investment(user_id, investment(InvestmentType::Bonds, 500.0, RiskLevel::Low, "Finance"))
        .await
        .unwrap();
    let total = manager.get_or_create_portfolio(&user_id).await.unwrap().total_investments;
    assert!((total - 1500.0).abs() < 1e-9);

    manager
        .update_investment(
            user_id,
            stocks.id,
            investment(InvestmentType::Stocks, 250.0, RiskLevel::High, "Technology"),
        )
        .await
        .unwrap();
    let total = manager.get_or_create_portfolio(&user_id).await.unwrap().total_investments;
    assert!((total - 750.0).abs() < 1e-9);

    manager.delete_investment(user_id, stocks.id).await.unwrap();
    let total = manager.get_or_create_portfolio(&user_id).await.unwrap().total_investments;
    assert!((total - 500.0).abs() < 1e-9);
    assert_eq!(manager.list_investments(&user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_total_overflow_is_rejected() {
    let manager = manager();
    let user_id = signed_up(&manager, "huge@example.com").await;
    let huge = || investment(InvestmentType::Stocks, 1e308, RiskLevel::Low, "Technology");

    manager.add_investment(user_id, huge()).await.unwrap();
    let err = manager.add_investment(user_id, huge()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let small = manager
        .add_investment(user_id, investment(InvestmentType::Bonds, 1.0, RiskLevel::Low, "Finance"))
        .await
        .unwrap();
    let err = manager
        .update_investment(user_id, small.id, huge())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    assert_eq!(manager.list_investments(&user_id).await.unwrap().len(), 2);
    let portfolio = manager.get_or_create_portfolio(&user_id).await.unwrap();
    assert!(portfolio.total_investments.is_finite());

    let stored = serde_json::to_value(&portfolio).unwrap();
    let read_back: Portfolio = serde_json::from_value(stored).unwrap();
    assert_eq!(read_back, portfolio);

    let summary = manager.portfolio_summary(&user_id).await.unwrap();
    assert!(summary.total_value.is_finite());
    manager.generate_report(user_id).await.unwrap();
}

#[tokio::test]
async fn test_update_keeps_identity() {
    let manager = manager();
    let user_id = signed_up(&manager, "erin@example.com").await;
    let original = manager
        .add_investment(user_id, investment(InvestmentType::Crypto, 10.0, RiskLevel::High, "Technology"))
        .await
        .unwrap();

    let updated = manager
        .update_investment(
            user_id,
            original.id,
            investment(InvestmentType::Deposits, 20.0, RiskLevel::Low, "Finance"),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.kind, "Deposits");
}

#[tokio::test]
async fn test_investments_are_private() {
    let manager = manager();
    let owner = signed_up(&manager, "owner@example.com").await;
    let intruder = signed_up(&manager, "intruder@example.com").await;

    let record = manager
        .add_investment(owner, investment(InvestmentType::Stocks, 10.0, RiskLevel::Medium, "Energy"))
        .await
        .unwrap();

    assert!(matches!(
        manager.delete_investment(intruder, record.id).await,
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        manager
            .update_investment(intruder, record.id, investment(InvestmentType::Stocks, 1.0, RiskLevel::Low, "Energy"))
            .await,
        Err(ServiceError::Forbidden)
    ));
    assert!(manager.list_investments(&intruder).await.unwrap().is_empty());
    assert!(matches!(
        manager.delete_investment(owner, Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_invalid_investment_is_rejected() {
    let manager = manager();
    let user_id = signed_up(&manager, "frank@example.com").await;

    let result = manager
        .add_investment(user_id, investment(InvestmentType::Stocks, -1.0, RiskLevel::Low, "Technology"))
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let mut blank_name = investment(InvestmentType::Stocks, 10.0, RiskLevel::Low, "Technology");
    blank_name.asset_name = "  ".to_string();
    let result = manager.add_investment(user_id, blank_name).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let result = manager
        .add_investment(user_id, investment(InvestmentType::Stocks, 10.0, RiskLevel::Low, " "))
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    assert!(manager.list_investments(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_end_to_end() {
    let manager = manager();
    let user_id = signed_up(&manager, "grace@example.com").await;
    manager
        .add_investment(user_id, investment(InvestmentType::Stocks, 1000.0, RiskLevel::High, "Technology"))
        .await
        .unwrap();
    manager
        .add_investment(user_id, investment(InvestmentType::Bonds, 500.0, RiskLevel::Low, "Finance"))
        .await
        .unwrap();

    let summary = manager.portfolio_summary(&user_id).await.unwrap();
    assert!((summary.total_value - 1500.0).abs() < 1e-9);
    assert_eq!(summary.risk_level, RiskLevel::Medium);
    assert_eq!(summary.type_allocation[0].kind, InvestmentType::Stocks);
    assert_eq!(summary.type_allocation[1].kind, InvestmentType::Bonds);
    assert_eq!(summary.sector_allocation[0].sector, "Technology");
    assert_eq!(summary.sector_allocation[1].sector, "Finance");
}

#[tokio::test]
async fn test_malformed_stored_record_fails_summary() {
    let manager = manager();
    let user_id = signed_up(&manager, "heidi@example.com").await;
    let mut record = manager
        .add_investment(user_id, investment(InvestmentType::Stocks, 1.0, RiskLevel::Low, "Technology"))
        .await
        .unwrap();

    record.risk = "Unknown".to_string();
    manager.stores().investments.update(record.id, record).await.unwrap();

    assert!(matches!(
        manager.portfolio_summary(&user_id).await,
        Err(ServiceError::Analysis(AnalysisError::InvalidInput(_)))
    ));
    assert!(matches!(
        manager.generate_report(user_id).await,
        Err(ServiceError::Analysis(AnalysisError::InvalidInput(_)))
    ));
    assert!(manager.list_reports(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_report() {
    let manager = manager();
    let user_id = signed_up(&manager, "ivan@example.com").await;
    manager
        .add_investment(user_id, investment(InvestmentType::Crypto, 800.0, RiskLevel::High, "Technology"))
        .await
        .unwrap();

    let report = manager.generate_report(user_id).await.unwrap();
    assert_eq!(report.user_id, user_id);
    assert_eq!(report.risk_level, RiskLevel::High);
    assert_eq!(
        report.prediction.split(PARAGRAPH_SEPARATOR).count(),
        MAX_SUGGESTIONS
    );

    let second = manager.generate_report(user_id).await.unwrap();
    let reports = manager.list_reports(&user_id).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].id, second.id);
    assert_eq!(manager.get_report(&user_id, &report.id).await.unwrap(), report);
}

#[tokio::test]
async fn test_report_for_empty_portfolio() {
    let manager = manager();
    let user_id = signed_up(&manager, "judy@example.com").await;

    let report = manager.generate_report(user_id).await.unwrap();
    assert_eq!(report.risk_level, RiskLevel::Low);
    assert!(!report.prediction.is_empty());
}

#[tokio::test]
async fn test_seeded_managers_agree() {
    let engine = SuggestionEngine::new(SelectionPolicy::RandomSample);
    let a = PortfolioManager::with_seed(Stores::in_memory(), engine.clone(), 99);
    let b = PortfolioManager::with_seed(Stores::in_memory(), engine, 99);

    let user_a = signed_up(&a, "same@example.com").await;
    let user_b = signed_up(&b, "same@example.com").await;

    let report_a = a.generate_report(user_a).await.unwrap();
    let report_b = b.generate_report(user_b).await.unwrap();
    assert_eq!(report_a.prediction, report_b.prediction);
}

#[tokio::test]
async fn test_report_uses_market_data() {
    let manager = PortfolioManager::with_seed(
        Stores::in_memory(),
        SuggestionEngine::new(SelectionPolicy::MostRelevant),
        1,
    );
    let user_id = signed_up(&manager, "kim@example.com").await;
    for (symbol, price) in [("AAPL", 150.0), ("MSFT", 300.0), ("GOOGL", 140.0), ("AMZN", 160.0)] {
        manager.record_market_tick(symbol, price, None).await.unwrap();
    }

    let report = manager.generate_report(user_id).await.unwrap();
    assert!(report.prediction.contains("MSFT, AMZN, AAPL"));
}

#[tokio::test]
async fn test_market_ticks() {
    let manager = manager();
    let now = Utc::now();
    manager
        .record_market_tick("aapl", 100.0, Some(now - chrono::Duration::minutes(1)))
        .await
        .unwrap();
    manager.record_market_tick("AAPL", 110.0, Some(now)).await.unwrap();

    let latest = manager.latest_market_data().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert!((latest[0].price - 110.0).abs() < f64::EPSILON);

    assert!(matches!(
        manager.record_market_tick(" ", 1.0, None).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        manager.record_market_tick("AAPL", f64::NAN, None).await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_profile() {
    let manager = manager();
    let user_id = signed_up(&manager, "leo@example.com").await;
    assert!(manager.get_profile(&user_id).await.unwrap().is_none());

    let input = ProfileInput {
        first_name: "Leo".to_string(),
        last_name: "Martin".to_string(),
        email: "leo@example.com".to_string(),
        phone: Some("+33 6 00 00 00 00".to_string()),
        address: None,
        dob: None,
    };
    let saved = manager.save_profile(user_id, input.clone()).await.unwrap();
    assert_eq!(manager.get_profile(&user_id).await.unwrap(), Some(saved));

    let invalid = ProfileInput {
        email: "leo".to_string(),
        ..input
    };
    assert!(matches!(
        manager.save_profile(user_id, invalid).await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_blank_profile_names_are_rejected() {
    let manager = manager();
    let user_id = signed_up(&manager, "mia@example.com").await;

    let blank = ProfileInput {
        first_name: "   ".to_string(),
        last_name: "Rossi".to_string(),
        email: " mia@example.com ".to_string(),
        phone: Some("  ".to_string()),
        address: None,
        dob: None,
    };
    assert!(matches!(
        manager.save_profile(user_id, blank.clone()).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(manager.get_profile(&user_id).await.unwrap().is_none());

    let saved = manager
        .save_profile(
            user_id,
            ProfileInput {
                first_name: " Mia ".to_string(),
                ..blank
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.first_name, "Mia");
    assert_eq!(saved.email, "mia@example.com");
    assert_eq!(saved.phone, None);
}

#[tokio::test]
async fn test_seed_demo_data_is_idempotent() {
    let manager = manager();
    let first = manager.seed_demo_data().await.unwrap();
    let second = manager.seed_demo_data().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(manager.list_investments(&first).await.unwrap().len(), 3);
    assert_eq!(
        manager.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap(),
        first
    );
}
