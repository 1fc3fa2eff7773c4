//! Shared server state
//!
//! `ServerHost` holds the configuration and one [`DataService`] per record
//! type. It is transport-agnostic: REST handlers receive it as
//! `State<Arc<ServerHost>>`, tests build it directly.

use crate::config::{AppConfig, StorageBackend};
use crate::core::auth::AuthContext;
use crate::core::error::PayrollResult;
use crate::core::service::DataService;
use crate::entities::{
    Branch, Company, Department, Designation, Employee, Expense, Order, Purchase, Revenue,
    SalaryHead, SalarySetting, SalarySlip, TaxSlab,
};
use crate::storage::InMemoryDataService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Host context containing all service state
///
/// # Example
///
/// ```rust,ignore
/// let host = Arc::new(ServerHost::in_memory(AppConfig::with_defaults()));
/// let app = RestExposure::build_router(host)?;
/// ```
pub struct ServerHost {
    pub config: Arc<AppConfig>,

    pub companies: Arc<dyn DataService<Company>>,
    pub branches: Arc<dyn DataService<Branch>>,
    pub departments: Arc<dyn DataService<Department>>,
    pub designations: Arc<dyn DataService<Designation>>,
    pub employees: Arc<dyn DataService<Employee>>,
    pub orders: Arc<dyn DataService<Order>>,
    pub revenues: Arc<dyn DataService<Revenue>>,
    pub expenses: Arc<dyn DataService<Expense>>,
    pub purchases: Arc<dyn DataService<Purchase>>,
    pub salary_heads: Arc<dyn DataService<SalaryHead>>,
    pub salary_settings: Arc<dyn DataService<SalarySetting>>,
    pub tax_slabs: Arc<dyn DataService<TaxSlab>>,
    pub salary_slips: Arc<dyn DataService<SalarySlip>>,

    tenant_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ServerHost {
    /// Host backed by in-memory stores
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            companies: Arc::new(InMemoryDataService::new()),
            branches: Arc::new(InMemoryDataService::new()),
            departments: Arc::new(InMemoryDataService::new()),
            designations: Arc::new(InMemoryDataService::new()),
            employees: Arc::new(InMemoryDataService::new()),
            orders: Arc::new(InMemoryDataService::new()),
            revenues: Arc::new(InMemoryDataService::new()),
            expenses: Arc::new(InMemoryDataService::new()),
            purchases: Arc::new(InMemoryDataService::new()),
            salary_heads: Arc::new(InMemoryDataService::new()),
            salary_settings: Arc::new(InMemoryDataService::new()),
            tax_slabs: Arc::new(InMemoryDataService::new()),
            salary_slips: Arc::new(InMemoryDataService::new()),
            tenant_locks: Mutex::default(),
        }
    }

    /// Host backed by MongoDB collections
    #[cfg(feature = "mongodb_backend")]
    pub async fn mongodb(config: AppConfig) -> PayrollResult<Self> {
        use crate::core::error::StorageError;
        use crate::storage::MongoDataService;

        let client = mongodb::Client::with_uri_str(&config.storage.uri)
            .await
            .map_err(|e| StorageError::ConnectionError {
                backend: "mongodb".to_string(),
                message: e.to_string(),
            })?;
        let db = client.database(&config.storage.database);

        Ok(Self {
            config: Arc::new(config),
            companies: Arc::new(MongoDataService::new(db.clone())),
            branches: Arc::new(MongoDataService::new(db.clone())),
            departments: Arc::new(MongoDataService::new(db.clone())),
            designations: Arc::new(MongoDataService::new(db.clone())),
            employees: Arc::new(MongoDataService::new(db.clone())),
            orders: Arc::new(MongoDataService::new(db.clone())),
            revenues: Arc::new(MongoDataService::new(db.clone())),
            expenses: Arc::new(MongoDataService::new(db.clone())),
            purchases: Arc::new(MongoDataService::new(db.clone())),
            salary_heads: Arc::new(MongoDataService::new(db.clone())),
            salary_settings: Arc::new(MongoDataService::new(db.clone())),
            tax_slabs: Arc::new(MongoDataService::new(db.clone())),
            salary_slips: Arc::new(MongoDataService::new(db)),
            tenant_locks: Mutex::default(),
        })
    }

    /// Host for the backend named in the configuration
    pub async fn from_config(config: AppConfig) -> PayrollResult<Self> {
        match config.storage.backend {
            StorageBackend::Memory => Ok(Self::in_memory(config)),
            #[cfg(feature = "mongodb_backend")]
            StorageBackend::Mongodb => Self::mongodb(config).await,
            #[cfg(not(feature = "mongodb_backend"))]
            StorageBackend::Mongodb => Err(crate::core::error::ConfigError::InvalidValue {
                field: "storage.backend".to_string(),
                value: "mongodb".to_string(),
                message: "built without the mongodb_backend feature".to_string(),
            }
            .into()),
        }
    }

    /// Exclusive write section for one tenant.
    ///
    /// Held across every check-then-write sequence (uniqueness checks, order
    /// numbering, one slip per employee and month) so concurrent requests of
    /// the same company cannot interleave between the check and the write.
    pub async fn lock_tenant(&self, company_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.tenant_locks.lock().await;
            locks.entry(company_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Check the configured policy for `action` on `resource`
    pub fn authorize(&self, ctx: &AuthContext, resource: &str, action: &str) -> PayrollResult<()> {
        let policy = self.config.policy(resource, action);
        ctx.authorize(&policy, &format!("{} {}", action, resource))?;
        Ok(())
    }

    /// Authorize, then resolve the tenant the request acts on
    pub fn tenant(&self, ctx: &AuthContext, resource: &str, action: &str) -> PayrollResult<Uuid> {
        self.authorize(ctx, resource, action)?;
        Ok(ctx.require_company()?)
    }
}
