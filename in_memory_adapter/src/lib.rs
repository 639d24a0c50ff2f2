use async_trait::async_trait;
use database_adapter::db::{DbError, Repository};
use serde::Serialize;
use tokio::sync::RwLock;

/// Process-local `Repository`, used by tests and when no database is configured.
///
/// Items are kept in insertion order; field lookups serialize each item and
/// compare the text form of the field, the same way the Postgres adapter
/// compares `data->>field`.
#[derive(Debug)]
pub struct InMemoryRepo<T, Id> {
    storage: RwLock<Vec<(Id, T)>>,
}

impl<T, Id> InMemoryRepo<T, Id> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(Vec::new()),
        }
    }
}

impl<T, Id> Default for InMemoryRepo<T, Id> {
    fn default() -> Self {
        Self::new()
    }
}

fn field_text<T: Serialize>(item: &T, field: &str) -> Result<Option<String>, DbError> {
    let value = serde_json::to_value(item)?;
    Ok(match value.get(field) {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    })
}

#[async_trait]
impl<T, Id> Repository<T, Id> for InMemoryRepo<T, Id>
where
    T: Serialize + Clone + Send + Sync + 'static,
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    async fn insert(&self, id: Id, item: T) -> Result<(), DbError> {
        let mut storage = self.storage.write().await;
        if let Some(slot) = storage.iter_mut().find(|(key, _)| *key == id) {
            slot.1 = item;
        } else {
            storage.push((id, item));
        }
        Ok(())
    }

    async fn update(&self, id: Id, item: T) -> Result<(), DbError> {
        let mut storage = self.storage.write().await;
        if let Some(slot) = storage.iter_mut().find(|(key, _)| *key == id) {
            slot.1 = item;
        }
        Ok(())
    }

    async fn remove(&self, id: Id) -> Result<(), DbError> {
        self.storage.write().await.retain(|(key, _)| *key != id);
        Ok(())
    }

    async fn get(&self, id: &Id) -> Result<Option<T>, DbError> {
        let storage = self.storage.read().await;
        Ok(storage
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, item)| item.clone()))
    }

    async fn len(&self) -> Result<usize, DbError> {
        Ok(self.storage.read().await.len())
    }

    async fn all(&self) -> Result<Vec<(Id, T)>, DbError> {
        Ok(self.storage.read().await.clone())
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Option<(Id, T)>, DbError> {
        let storage = self.storage.read().await;
        for (id, item) in storage.iter() {
            if field_text(item, field)?.as_deref() == Some(value) {
                return Ok(Some((id.clone(), item.clone())));
            }
        }
        Ok(None)
    }

    async fn find_all_by_field(&self, field: &str, value: &str) -> Result<Vec<(Id, T)>, DbError> {
        let storage = self.storage.read().await;
        let mut found = Vec::new();
        for (id, item) in storage.iter() {
            if field_text(item, field)?.as_deref() == Some(value) {
                found.push((id.clone(), item.clone()));
            }
        }
        Ok(found)
    }
}
