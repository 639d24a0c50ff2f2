use serde::{Deserialize, Serialize};

use crate::db::{PostgresRepo, Repository};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct Holding {
    owner: String,
    sector: String,
    value: f64,
}

async fn fresh_repo() -> anyhow::Result<PostgresRepo<Holding, String>> {
    // Each test uses a fresh table to avoid conflicts
    let table = format!(
        "holdings_test_{}",
        uuid::Uuid::new_v4().to_string().replace('-', "")
    );
    Ok(PostgresRepo::from_env(&table).await?)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
async fn test_postgres_repo_crud() -> anyhow::Result<()> {
    let repo = fresh_repo().await?;

    let holding = Holding {
        owner: "alice".into(),
        sector: "Technology".into(),
        value: 1000.0,
    };
    repo.insert("1".to_string(), holding.clone()).await?;

    let fetched = repo.get(&"1".to_string()).await?;
    assert_eq!(fetched, Some(holding.clone()));

    let updated = Holding {
        value: 1500.0,
        ..holding
    };
    repo.update("1".to_string(), updated.clone()).await?;
    assert_eq!(repo.get(&"1".to_string()).await?, Some(updated));

    assert_eq!(repo.len().await?, 1);

    repo.remove("1".to_string()).await?;
    assert!(repo.get(&"1".to_string()).await?.is_none());
    assert!(repo.is_empty().await?);

    Ok(())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
async fn test_postgres_repo_field_lookup_keeps_insertion_order() -> anyhow::Result<()> {
    let repo = fresh_repo().await?;

    for (id, owner, value) in [("a", "bob", 3.0), ("b", "alice", 1.0), ("c", "bob", 2.0)] {
        repo.insert(
            id.to_string(),
            Holding {
                owner: owner.into(),
                sector: "Finance".into(),
                value,
            },
        )
        .await?;
    }

    let bobs = repo.find_all_by_field("owner", "bob").await?;
    let ids: Vec<_> = bobs.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let first = repo.find_by_field("owner", "alice").await?;
    assert_eq!(first.map(|(id, _)| id), Some("b".to_string()));

    // Numbers compare by their JSON text form
    let by_value = repo.find_all_by_field("value", "2.0").await?;
    assert_eq!(by_value.len(), 1);

    Ok(())
}
