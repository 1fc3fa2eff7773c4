//! Entity trait shared by every tenant-scoped record

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Base trait for all records in the system.
///
/// Every record has:
/// - id: Unique identifier
/// - company_id: The tenant the record belongs to
/// - created_at / updated_at: Timestamps managed by the store and handlers
///
/// Records never cross tenants: a lookup with the wrong company behaves as if
/// the record did not exist.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The plural resource name used in URLs (e.g., "employees", "tax-slabs")
    fn resource_name() -> &'static str;

    /// The singular resource name used in messages (e.g., "employee")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the tenant this record belongs to
    fn company_id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Refresh `updated_at`
    fn touch(&mut self);

    /// Check whether the record belongs to `company_id`
    fn belongs_to(&self, company_id: Uuid) -> bool {
        self.company_id() == company_id
    }
}
