use crate::core::auth::AuthContext;
use crate::core::error::PayrollResult;
use crate::core::validation::{IdPath, ValidatedQuery, validators};
use crate::server::host::ServerHost;
use crate::server::resource::find_scoped;
use axum::{Json, Router, extract::State, routing::get};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new().route("/api/salary-heads/{id}/value", get(head_value))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BasicQuery {
    #[validate(custom(function = "validators::non_negative"))]
    pub basic: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HeadValue {
    pub head_id: Uuid,
    pub name: String,
    pub basic: Decimal,
    pub value: Decimal,
}

/// Monthly value of a head for the given basic salary
pub async fn head_value(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    ValidatedQuery(query): ValidatedQuery<BasicQuery>,
) -> PayrollResult<Json<HeadValue>> {
    let company_id = host.tenant(&ctx, "salary-heads", "get")?;
    let head = find_scoped(&host.salary_heads, company_id, id).await?;
    let value = head.value_for(query.basic)?;
    Ok(Json(HeadValue {
        head_id: head.id,
        name: head.name,
        basic: query.basic,
        value,
    }))
}
