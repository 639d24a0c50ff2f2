use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::fmt;

#[derive(Debug)]
pub enum DbError {
    SqlxError(sqlx::Error),
    SerdeError(serde_json::Error),
    TokioError(std::io::Error),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::SqlxError(e) => write!(f, "Database error: {e}"),
            DbError::SerdeError(e) => write!(f, "Serialization error: {e}"),
            DbError::TokioError(e) => write!(f, "Runtime error: {e}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        DbError::SqlxError(error)
    }
}

impl From<serde_json::Error> for DbError {
    fn from(error: serde_json::Error) -> Self {
        DbError::SerdeError(error)
    }
}

impl From<std::io::Error> for DbError {
    fn from(error: std::io::Error) -> Self {
        DbError::TokioError(error)
    }
}

/// Document store: every item is kept as one JSON document keyed by `Id`.
///
/// Listing operations (`all`, `find_all_by_field`) return rows in insertion order.
#[async_trait]
pub trait Repository<T, Id>: Send + Sync
where
    T: Send + 'static,
    Id: Send + Sync + 'static,
{
    /// Insert a new item with the given ID
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn insert(&self, id: Id, item: T) -> Result<(), DbError>;
    /// Update an existing item with the given ID
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn update(&self, id: Id, item: T) -> Result<(), DbError>;
    /// Remove an item with the given ID
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn remove(&self, id: Id) -> Result<(), DbError>;
    /// Get an item by ID
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn get(&self, id: &Id) -> Result<Option<T>, DbError>;
    /// Get the number of items in the repository
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn len(&self) -> Result<usize, DbError>;
    /// Check if the repository is empty
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn is_empty(&self) -> Result<bool, DbError> {
        Ok(self.len().await? == 0)
    }
    /// Every item with its ID
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn all(&self) -> Result<Vec<(Id, T)>, DbError>;
    /// Find an item whose top-level JSON field renders as `value`
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<(Id, T)>, DbError>;
    /// Find all items whose top-level JSON field renders as `value`
    /// # Errors
    /// - Returns `DbError` if the operation fails
    async fn find_all_by_field(&self, field: &str, value: &str) -> Result<Vec<(Id, T)>, DbError>;
}

/// Connect a pool that can be shared by several repositories.
/// # Errors
/// - Returns `DbError` if the connection cannot be established
pub async fn connect(database_url: &str) -> Result<Pool<Postgres>, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Generic Postgres repository, stores T as JSON
#[derive(Clone)]
pub struct PostgresRepo<T, Id> {
    pool: Pool<Postgres>,
    table: String,
    _phantom: std::marker::PhantomData<fn() -> (T, Id)>,
}

impl<T, Id> std::fmt::Debug for PostgresRepo<T, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRepo")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<T, Id> PostgresRepo<T, Id> {
    /// Create a repository on `table`, creating the table when missing.
    /// # Errors
    /// - Returns `DbError` if the table cannot be created
    pub async fn new(pool: Pool<Postgres>, table: &str) -> Result<Self, DbError> {
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                seq  BIGSERIAL,
                id   TEXT PRIMARY KEY,
                data JSONB NOT NULL
            )"
        );
        sqlx::query(&query).execute(&pool).await?;

        Ok(Self {
            pool,
            table: table.to_string(),
            _phantom: std::marker::PhantomData,
        })
    }

    /// Create a repository using `DATABASE_URL` from the environment or `.env`.
    /// # Errors
    /// - Returns `DbError` if `DATABASE_URL` is missing or the connection fails
    pub async fn from_env(table: &str) -> Result<Self, DbError> {
        dotenvy::dotenv().ok();
        let db_url = std::env::var("DATABASE_URL")
            .map_err(|e| DbError::SqlxError(sqlx::Error::Configuration(Box::new(e))))?;
        let pool = connect(&db_url).await?;
        Self::new(pool, table).await
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

fn decode_rows<T, Id>(rows: Vec<(String, serde_json::Value)>) -> Result<Vec<(Id, T)>, DbError>
where
    T: DeserializeOwned,
    Id: std::str::FromStr,
{
    let mut result = Vec::with_capacity(rows.len());
    for (id_str, val) in rows {
        // Rows whose key does not parse as `Id` were not written by this repository.
        let Ok(id) = id_str.parse() else {
            continue;
        };
        result.push((id, serde_json::from_value(val)?));
    }
    Ok(result)
}

#[async_trait]
impl<T, Id> Repository<T, Id> for PostgresRepo<T, Id>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    Id: ToString + std::str::FromStr + Send + Sync + 'static,
{
    async fn insert(&self, id: Id, item: T) -> Result<(), DbError> {
        let data = serde_json::to_value(item)?;
        let query = format!("INSERT INTO {} (id, data) VALUES ($1, $2)", self.table);

        sqlx::query(&query)
            .bind(id.to_string())
            .bind(data)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(&self, id: Id, item: T) -> Result<(), DbError> {
        let data = serde_json::to_value(item)?;
        let query = format!("UPDATE {} SET data = $2 WHERE id = $1", self.table);

        sqlx::query(&query)
            .bind(id.to_string())
            .bind(data)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove(&self, id: Id) -> Result<(), DbError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table);

        sqlx::query(&query)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get(&self, id: &Id) -> Result<Option<T>, DbError> {
        let query = format!("SELECT data FROM {} WHERE id = $1", self.table);

        let row: Option<serde_json::Value> = sqlx::query_scalar(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(val) => Ok(Some(serde_json::from_value(val)?)),
            None => Ok(None),
        }
    }

    async fn len(&self) -> Result<usize, DbError> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table);

        let (count,): (i64,) = sqlx::query_as(&query).fetch_one(&self.pool).await?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn all(&self) -> Result<Vec<(Id, T)>, DbError> {
        let query = format!("SELECT id, data FROM {} ORDER BY seq ASC", self.table);

        let rows: Vec<(String, serde_json::Value)> =
            sqlx::query_as(&query).fetch_all(&self.pool).await?;

        decode_rows(rows)
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<(Id, T)>, DbError> {
        let query = format!(
            "SELECT id, data FROM {} WHERE data->>$1 = $2 ORDER BY seq ASC LIMIT 1",
            self.table
        );

        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(&query)
            .bind(field)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        Ok(decode_rows(rows)?.into_iter().next())
    }

    async fn find_all_by_field(&self, field: &str, value: &str) -> Result<Vec<(Id, T)>, DbError> {
        let query = format!(
            "SELECT id, data FROM {} WHERE data->>$1 = $2 ORDER BY seq ASC",
            self.table
        );

        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(&query)
            .bind(field)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        decode_rows(rows)
    }
}
