use crate::core::auth::AuthContext;
use crate::core::error::PayrollResult;
use crate::core::validation::{Validated, validators};
use crate::finance::gst::{GstBreakdown, calculate_gst, check_rate};
use crate::server::host::ServerHost;
use crate::server::resource::require_reference;
use axum::{Json, Router, extract::State, routing::post};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new().route("/api/gst/calculate", post(calculate))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GstRequest {
    #[validate(custom(function = "validators::non_negative"))]
    pub amount: Decimal,
    #[validate(custom(function = "validators::percentage"))]
    pub rate: Decimal,
    /// Defaults to the caller's company
    #[validate(custom(function = "validators::state"))]
    pub supplier_state: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub recipient_state: String,
}

/// GST preview; nothing is stored
pub async fn calculate(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    Validated(req): Validated<GstRequest>,
) -> PayrollResult<Json<GstBreakdown>> {
    let company_id = host.tenant(&ctx, "gst", "calculate")?;
    check_rate(req.rate, &host.config.gst.allowed_rates)?;

    let supplier = match req.supplier_state {
        Some(state) => state,
        None => {
            let company =
                require_reference(&host.companies, company_id, "company_id", company_id).await?;
            company.supply_state().to_string()
        }
    };
    Ok(Json(calculate_gst(
        req.amount,
        req.rate,
        &supplier,
        &req.recipient_state,
    )?))
}
