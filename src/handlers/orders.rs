//! Order payments, status changes, summaries and order purchases

use crate::core::auth::AuthContext;
use crate::core::error::PayrollResult;
use crate::core::query::{PaginatedResponse, QueryParams};
use crate::core::validation::{IdPath, QueryOf, Validated};
use crate::entities::order::{RecordPayment, UpdateOrderStatus};
use crate::entities::purchase::CreatePurchase;
use crate::entities::{Order, OrderStatus, Purchase, Revenue};
use crate::finance::money::{round2, sum2};
use crate::server::entity_registry::{create_record, paginate_records};
use crate::server::host::ServerHost;
use crate::server::resource::find_scoped;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/api/orders/{id}/payments", post(record_payment))
        .route("/api/orders/{id}/status", put(update_status))
        .route("/api/orders/{id}/summary", get(order_summary))
        .route(
            "/api/orders/{id}/purchases",
            get(list_order_purchases).post(create_order_purchase),
        )
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub order: Order,
    pub revenue: Revenue,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub advance_paid: Decimal,
    pub balance_due: Decimal,
    pub purchases_count: usize,
    pub purchases_total: Decimal,
    /// Order total less what was spent on purchases for it
    pub margin: Decimal,
}

/// Record a payment against an order and book it as revenue
pub async fn record_payment(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    Validated(payment): Validated<RecordPayment>,
) -> PayrollResult<(StatusCode, Json<PaymentReceipt>)> {
    let company_id = host.tenant(&ctx, "orders", "update")?;
    let _guard = host.lock_tenant(company_id).await;
    let mut order = find_scoped(&host.orders, company_id, id).await?;
    order.record_payment(payment.amount)?;
    let order = host.orders.update(&id, order).await?;

    let revenue = Revenue::new(
        company_id,
        format!("Order {}", order.order_number),
        round2(payment.amount),
        payment.date.unwrap_or_else(|| Utc::now().date_naive()),
        Some(order.id),
        payment.description,
    );
    let revenue = host.revenues.create(revenue).await?;

    tracing::info!(
        order = %order.order_number,
        amount = %revenue.amount,
        balance_due = %order.balance_due,
        "payment recorded"
    );
    Ok((StatusCode::CREATED, Json(PaymentReceipt { order, revenue })))
}

pub async fn update_status(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    Validated(body): Validated<UpdateOrderStatus>,
) -> PayrollResult<Json<Order>> {
    let company_id = host.tenant(&ctx, "orders", "update")?;
    let _guard = host.lock_tenant(company_id).await;
    let mut order = find_scoped(&host.orders, company_id, id).await?;
    let from = order.status;
    order.transition(body.status)?;
    let order = host.orders.update(&id, order).await?;
    tracing::info!(order = %order.order_number, %from, to = %order.status, "order status changed");
    Ok(Json(order))
}

pub async fn order_summary(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
) -> PayrollResult<Json<OrderSummary>> {
    let company_id = host.tenant(&ctx, "orders", "get")?;
    let order = find_scoped(&host.orders, company_id, id).await?;
    let purchases = host
        .purchases
        .search(&company_id, "order_id", &id.to_string())
        .await?;
    let purchases_total = sum2(purchases.iter().map(|p| p.amount));

    Ok(Json(OrderSummary {
        order_id: order.id,
        order_number: order.order_number,
        status: order.status,
        amount: order.amount,
        advance_paid: order.advance_paid,
        balance_due: order.balance_due,
        purchases_count: purchases.len(),
        purchases_total,
        margin: round2(order.amount - purchases_total),
    }))
}

pub async fn list_order_purchases(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    QueryOf(params): QueryOf<QueryParams>,
) -> PayrollResult<Json<PaginatedResponse<Value>>> {
    let company_id = host.tenant(&ctx, "purchases", "list")?;
    find_scoped(&host.orders, company_id, id).await?;
    let purchases = host
        .purchases
        .search(&company_id, "order_id", &id.to_string())
        .await?;
    Ok(Json(paginate_records(&purchases, &params)?))
}

/// Create a purchase linked to the order in the path
pub async fn create_order_purchase(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    Validated(mut payload): Validated<CreatePurchase>,
) -> PayrollResult<(StatusCode, Json<Purchase>)> {
    let company_id = host.tenant(&ctx, "purchases", "create")?;
    payload.order_id = Some(id);
    let purchase = create_record::<Purchase>(&host, company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}
