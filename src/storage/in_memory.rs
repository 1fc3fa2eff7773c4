//! In-memory implementation of DataService for testing and development

use crate::core::service::{DataService, field_matches};
use crate::core::Entity;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory record store
///
/// Clones share the same underlying map. Listings are ordered by creation
/// time, oldest first.
#[derive(Clone)]
pub struct InMemoryDataService<T> {
    records: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T> InMemoryDataService<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> Default for InMemoryDataService<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted<T: Entity>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by_key(|r| (r.created_at(), r.id()));
    records
}

#[async_trait]
impl<T: Entity> DataService<T> for InMemoryDataService<T> {
    async fn create(&self, entity: T) -> Result<T> {
        let mut records = self.records.write().await;
        let id = entity.id();
        if records.contains_key(&id) {
            return Err(anyhow!("{} {} already stored", T::resource_name_singular(), id));
        }
        records.insert(id, entity.clone());
        tracing::debug!(resource = T::resource_name(), %id, "record created");
        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<T>> {
        let records = self.records.read().await;
        Ok(sorted(records.values().cloned().collect()))
    }

    async fn list_by_company(&self, company_id: &Uuid) -> Result<Vec<T>> {
        let records = self.records.read().await;
        Ok(sorted(
            records
                .values()
                .filter(|r| r.belongs_to(*company_id))
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, id: &Uuid, entity: T) -> Result<T> {
        let mut records = self.records.write().await;
        let slot = records
            .get_mut(id)
            .ok_or_else(|| anyhow!("{} {} not found", T::resource_name_singular(), id))?;
        *slot = entity.clone();
        tracing::debug!(resource = T::resource_name(), %id, "record updated");
        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        if self.records.write().await.remove(id).is_some() {
            tracing::debug!(resource = T::resource_name(), %id, "record deleted");
        }
        Ok(())
    }

    async fn search(&self, company_id: &Uuid, field: &str, value: &str) -> Result<Vec<T>> {
        let records = self.records.read().await;
        let mut matches = Vec::new();
        for record in records.values().filter(|r| r.belongs_to(*company_id)) {
            let json = serde_json::to_value(record)?;
            if field_matches(&json, field, value) {
                matches.push(record.clone());
            }
        }
        Ok(sorted(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Department;

    #[tokio::test]
    async fn test_clones_share_storage() {
        let service = InMemoryDataService::<Department>::new();
        let clone = service.clone();
        let company = Uuid::new_v4();

        let dept = service
            .create(Department::new(company, "Finance".to_string(), None))
            .await
            .unwrap();
        assert!(clone.get(&dept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let service = InMemoryDataService::<Department>::new();
        let dept = Department::new(Uuid::new_v4(), "Ops".to_string(), None);
        service.create(dept.clone()).await.unwrap();
        assert!(service.create(dept).await.is_err());
    }

    #[tokio::test]
    async fn test_search_is_tenant_scoped() {
        let service = InMemoryDataService::<Department>::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        service
            .create(Department::new(a, "Sales".to_string(), None))
            .await
            .unwrap();
        service
            .create(Department::new(b, "Sales".to_string(), None))
            .await
            .unwrap();

        let found = service.search(&a, "name", "Sales").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].company_id, a);
    }
}
