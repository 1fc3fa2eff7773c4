//! Entity registry for managing entity descriptors and auto-generating CRUD routes

use crate::core::auth::AuthContext;
use crate::core::error::PayrollResult;
use crate::core::query::{PaginatedResponse, QueryParams};
use crate::core::validation::{IdPath, QueryOf, Validated};
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, find_scoped};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Trait that describes how to build routes for an entity
pub trait EntityDescriptor: Send + Sync {
    /// The entity type name (singular, e.g., "order")
    fn entity_type(&self) -> &str;

    /// The plural form used in URLs (e.g., "orders")
    fn plural(&self) -> &str;

    /// Build the routes for this entity
    fn build_routes(&self) -> Router<Arc<ServerHost>>;
}

/// Registry for all entities in the application
///
/// Descriptors are kept sorted by entity type so route registration order
/// is stable.
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity descriptor, keyed by its entity type
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let entity_type = descriptor.entity_type().to_string();
        self.descriptors.insert(entity_type, descriptor);
    }

    /// Register the generic CRUD routes of `T`
    pub fn register_crud<T: Resource>(&mut self) {
        self.register(Box::new(CrudDescriptor::<T>::new()));
    }

    /// Build a router with all registered entity routes
    pub fn build_routes(&self) -> Router<Arc<ServerHost>> {
        self.descriptors
            .values()
            .fold(Router::new(), |router, d| router.merge(d.build_routes()))
    }

    /// Get all registered entity types
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }
}

/// Descriptor exposing `GET/POST /api/{plural}` and
/// `GET/PUT/DELETE /api/{plural}/{id}` for a [`Resource`]
pub struct CrudDescriptor<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> CrudDescriptor<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for CrudDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> EntityDescriptor for CrudDescriptor<T> {
    fn entity_type(&self) -> &str {
        T::resource_name_singular()
    }

    fn plural(&self) -> &str {
        T::resource_name()
    }

    fn build_routes(&self) -> Router<Arc<ServerHost>> {
        let collection = format!("/api/{}", T::resource_name());
        let item = format!("/api/{}/{{id}}", T::resource_name());

        Router::new()
            .route(&collection, get(list_records::<T>).post(create_handler::<T>))
            .route(
                &item,
                get(get_record::<T>)
                    .put(update_handler::<T>)
                    .delete(delete_handler::<T>),
            )
    }
}

// =============================================================================
// CRUD operations
// =============================================================================

/// Build, check, store and run side effects for a new record
pub async fn create_record<T: Resource>(
    host: &ServerHost,
    company_id: Uuid,
    payload: T::Create,
) -> PayrollResult<T> {
    let _guard = host.lock_tenant(company_id).await;
    let record = T::build(host, company_id, payload).await?;
    record.before_save(host, None).await?;
    let record = T::store(host).create(record).await?;
    record.after_save(host, None).await?;
    tracing::info!(resource = T::resource_name(), id = %record.id(), %company_id, "created");
    Ok(record)
}

/// Apply an update payload to a stored record
pub async fn update_record<T: Resource>(
    host: &ServerHost,
    company_id: Uuid,
    id: Uuid,
    payload: T::Update,
) -> PayrollResult<T> {
    let _guard = host.lock_tenant(company_id).await;
    let previous = find_scoped(T::store(host), company_id, id).await?;
    let mut record = previous.clone();
    record.apply(host, payload).await?;
    record.touch();
    record.before_save(host, Some(&previous)).await?;
    let record = T::store(host).update(&id, record).await?;
    record.after_save(host, Some(&previous)).await?;
    tracing::info!(resource = T::resource_name(), %id, %company_id, "updated");
    Ok(record)
}

/// Delete a stored record after its guards pass
pub async fn delete_record<T: Resource>(
    host: &ServerHost,
    company_id: Uuid,
    id: Uuid,
) -> PayrollResult<()> {
    let _guard = host.lock_tenant(company_id).await;
    let record = find_scoped(T::store(host), company_id, id).await?;
    record.before_delete(host).await?;
    T::store(host).delete(&id).await?;
    record.after_delete(host).await?;
    tracing::info!(resource = T::resource_name(), %id, %company_id, "deleted");
    Ok(())
}

/// Serialize records and run filter, sort and pagination over them
pub fn paginate_records<T: serde::Serialize>(
    records: &[T],
    params: &QueryParams,
) -> PayrollResult<PaginatedResponse<Value>> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(params.apply(values))
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn list_records<T: Resource>(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(params): QueryOf<QueryParams>,
) -> PayrollResult<Json<PaginatedResponse<Value>>> {
    let company_id = host.tenant(&ctx, T::resource_name(), "list")?;
    let records = T::store(&host).list_by_company(&company_id).await?;
    Ok(Json(paginate_records(&records, &params)?))
}

pub async fn get_record<T: Resource>(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
) -> PayrollResult<Json<T>> {
    let company_id = host.tenant(&ctx, T::resource_name(), "get")?;
    Ok(Json(find_scoped(T::store(&host), company_id, id).await?))
}

pub async fn create_handler<T: Resource>(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    Validated(payload): Validated<T::Create>,
) -> PayrollResult<(StatusCode, Json<T>)> {
    let company_id = if T::OWNS_TENANT {
        host.authorize(&ctx, T::resource_name(), "create")?;
        Uuid::nil()
    } else {
        host.tenant(&ctx, T::resource_name(), "create")?
    };
    let record = create_record::<T>(&host, company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_handler<T: Resource>(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    Validated(payload): Validated<T::Update>,
) -> PayrollResult<Json<T>> {
    let company_id = host.tenant(&ctx, T::resource_name(), "update")?;
    Ok(Json(update_record::<T>(&host, company_id, id, payload).await?))
}

pub async fn delete_handler<T: Resource>(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
) -> PayrollResult<StatusCode> {
    let company_id = host.tenant(&ctx, T::resource_name(), "delete")?;
    delete_record::<T>(&host, company_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Branch, Department};

    struct MockDescriptor {
        entity_type: String,
        plural: String,
    }

    impl EntityDescriptor for MockDescriptor {
        fn entity_type(&self) -> &str {
            &self.entity_type
        }

        fn plural(&self) -> &str {
            &self.plural
        }

        fn build_routes(&self) -> Router<Arc<ServerHost>> {
            Router::new()
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        assert!(EntityRegistry::new().entity_types().is_empty());
    }

    #[test]
    fn test_register_replaces_same_type() {
        let mut registry = EntityRegistry::new();
        for plural in ["orders", "orders-v2"] {
            registry.register(Box::new(MockDescriptor {
                entity_type: "order".to_string(),
                plural: plural.to_string(),
            }));
        }
        assert_eq!(registry.entity_types(), vec!["order"]);
    }

    #[test]
    fn test_crud_descriptor_names() {
        let mut registry = EntityRegistry::new();
        registry.register_crud::<Department>();
        registry.register_crud::<Branch>();
        assert_eq!(registry.entity_types(), vec!["branch", "department"]);

        let descriptor = CrudDescriptor::<Department>::new();
        assert_eq!(descriptor.plural(), "departments");
    }
}
