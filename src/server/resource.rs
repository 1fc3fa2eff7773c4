//! Behaviour a record type plugs into the generic CRUD routes

use crate::core::error::{EntityError, PayrollError, PayrollResult};
use crate::core::{DataService, Entity};
use crate::server::host::ServerHost;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// A record type exposed through `/api/{plural}`
///
/// `build` and `apply` turn validated payloads into records. The hooks run
/// around every store mutation:
///
/// 1. `before_save(previous)`: reference and uniqueness checks
/// 2. store create/update
/// 3. `after_save(previous)`: side effects on other records
///
/// `previous` is `None` on create and the stored version on update.
#[async_trait]
pub trait Resource: Entity {
    /// Payload accepted by `POST /api/{plural}`
    type Create: DeserializeOwned + Validate + Send + 'static;

    /// Payload accepted by `PUT /api/{plural}/{id}`
    type Update: DeserializeOwned + Validate + Send + 'static;

    /// Set for records that open their own tenant; create needs no company header
    const OWNS_TENANT: bool = false;

    /// The store holding this record type
    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>>;

    /// Build a new record for `company_id`
    async fn build(host: &ServerHost, company_id: Uuid, payload: Self::Create)
    -> PayrollResult<Self>;

    /// Apply an update payload in place
    async fn apply(&mut self, host: &ServerHost, payload: Self::Update) -> PayrollResult<()>;

    async fn before_save(&self, _host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        Ok(())
    }

    async fn after_save(&self, _host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        Ok(())
    }

    async fn before_delete(&self, _host: &ServerHost) -> PayrollResult<()> {
        Ok(())
    }

    async fn after_delete(&self, _host: &ServerHost) -> PayrollResult<()> {
        Ok(())
    }
}

/// Fetch a record of the tenant or fail with 404
pub async fn find_scoped<T: Entity>(
    store: &Arc<dyn DataService<T>>,
    company_id: Uuid,
    id: Uuid,
) -> PayrollResult<T> {
    store
        .get_scoped(&company_id, &id)
        .await?
        .ok_or_else(|| PayrollError::not_found(T::resource_name_singular(), id))
}

/// Resolve a reference field or fail with 400
pub async fn require_reference<T: Entity>(
    store: &Arc<dyn DataService<T>>,
    company_id: Uuid,
    field: &str,
    id: Uuid,
) -> PayrollResult<T> {
    store.get_scoped(&company_id, &id).await?.ok_or_else(|| {
        EntityError::InvalidReference {
            entity_type: T::resource_name_singular().to_string(),
            field: field.to_string(),
            id,
        }
        .into()
    })
}

/// Resolve an optional reference field
pub async fn optional_reference<T: Entity>(
    store: &Arc<dyn DataService<T>>,
    company_id: Uuid,
    field: &str,
    id: Option<Uuid>,
) -> PayrollResult<Option<T>> {
    match id {
        Some(id) => Ok(Some(require_reference(store, company_id, field, id).await?)),
        None => Ok(None),
    }
}

/// Fail with 409 when another record of the tenant already has `field == value`
///
/// Comparison ignores case and surrounding whitespace.
pub async fn ensure_unique<T: Entity>(
    store: &Arc<dyn DataService<T>>,
    record: &T,
    field: &str,
    value: &str,
) -> PayrollResult<()> {
    let wanted = value.trim().to_lowercase();
    for other in store.list_by_company(&record.company_id()).await? {
        if other.id() == record.id() {
            continue;
        }
        let json = serde_json::to_value(&other)?;
        let taken = json
            .get(field)
            .and_then(|v| v.as_str())
            .is_some_and(|v| v.trim().to_lowercase() == wanted);
        if taken {
            return Err(EntityError::AlreadyExists {
                entity_type: T::resource_name_singular().to_string(),
                field: field.to_string(),
                value: value.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// 409 for a record that other records still point at
pub fn still_referenced(entity_type: &str, message: impl Into<String>) -> PayrollError {
    EntityError::Conflict {
        entity_type: entity_type.to_string(),
        message: message.into(),
    }
    .into()
}
