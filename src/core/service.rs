//! Service trait for record storage

use crate::core::Entity;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Service trait for managing one record type
///
/// Implementations provide CRUD operations for a specific record type.
/// The handlers are agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Entity>: Send + Sync {
    /// Store a new record
    async fn create(&self, entity: T) -> Result<T>;

    /// Get a record by ID, regardless of tenant
    async fn get(&self, id: &Uuid) -> Result<Option<T>>;

    /// List all records across tenants
    async fn list(&self) -> Result<Vec<T>>;

    /// List the records of one tenant
    async fn list_by_company(&self, company_id: &Uuid) -> Result<Vec<T>>;

    /// Replace an existing record
    async fn update(&self, id: &Uuid, entity: T) -> Result<T>;

    /// Delete a record
    async fn delete(&self, id: &Uuid) -> Result<()>;

    /// Search records of one tenant by field value
    ///
    /// The value is compared against the JSON rendering of the field, so
    /// `("status", "active")` and `("month", "3")` both match.
    async fn search(&self, company_id: &Uuid, field: &str, value: &str) -> Result<Vec<T>>;

    /// Get a record by ID only if it belongs to `company_id`
    async fn get_scoped(&self, company_id: &Uuid, id: &Uuid) -> Result<Option<T>> {
        Ok(self.get(id).await?.filter(|e| e.belongs_to(*company_id)))
    }
}

/// Compare a JSON field value with a search string
pub fn field_matches(record: &serde_json::Value, field: &str, value: &str) -> bool {
    match record.get(field) {
        Some(serde_json::Value::String(s)) => s == value,
        Some(serde_json::Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}
