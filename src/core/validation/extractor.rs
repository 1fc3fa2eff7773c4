//! Axum extractor for validated payloads

use crate::core::error::{PayrollError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Axum extractor that parses a JSON body and runs its validation rules
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_expense(
///     Validated(payload): Validated<CreateExpense>,
/// ) -> Result<Json<Expense>, PayrollError> {
///     // payload passed every #[validate] rule
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    /// Get the inner payload
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = PayrollError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ValidationError::InvalidJson {
                message: rejection.body_text(),
            })?;

        payload
            .validate()
            .map_err(|errors| ValidationError::FieldErrors(field_errors(&errors)))?;

        Ok(Validated(payload))
    }
}

/// The `{id}` segment of an item route, parsed as a UUID
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub Uuid);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = PayrollError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::InvalidQuery {
                message: rejection.body_text(),
            })?;
        let id = Uuid::parse_str(&raw).map_err(|_| ValidationError::InvalidUuid { value: raw })?;
        Ok(IdPath(id))
    }
}

/// Query string extractor whose failures render as JSON errors
#[derive(Debug, Clone)]
pub struct QueryOf<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryOf<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = PayrollError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::InvalidQuery {
                message: rejection.body_text(),
            })?;
        Ok(QueryOf(value))
    }
}

/// Query string extractor that also runs the validation rules
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = PayrollError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let QueryOf(value) = QueryOf::<T>::from_request_parts(parts, state).await?;
        value
            .validate()
            .map_err(|errors| ValidationError::FieldErrors(field_errors(&errors)))?;
        Ok(ValidatedQuery(value))
    }
}

/// Flatten validator errors into `field -> messages`
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("failed '{}' check", err.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
