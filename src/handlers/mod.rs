//! Domain routes that go beyond plain CRUD

pub mod gst;
pub mod orders;
pub mod payroll;
pub mod reports;
pub mod salary_heads;

use crate::server::host::ServerHost;
use axum::Router;
use std::sync::Arc;

/// All domain routes, merged
pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .merge(orders::routes())
        .merge(gst::routes())
        .merge(payroll::routes())
        .merge(salary_heads::routes())
        .merge(reports::routes())
}
