//! # payroll
//!
//! A multi-tenant payroll and business-finance REST service.
//!
//! ## Features
//!
//! - **Tenancy**: every record carries a `company_id`; requests act on the
//!   company named in the `x-company-id` header
//! - **Roles**: admin, HR, CA and employee, with a configurable access matrix
//! - **GST**: CGST/SGST for intra-state supply, IGST for inter-state supply
//! - **Payroll**: salary heads as fixed amounts or percentages of basic,
//!   prorated by paid days, with TDS from income-tax slabs
//! - **Orders**: advances, payments booked as revenue, purchases booked as
//!   expenses, `balance_due` never negative
//! - **Reports**: totals, monthly revenue vs expense, expense categories,
//!   branch-wise payroll
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payroll::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     ServerBuilder::new()
//!         .with_config(AppConfig::with_defaults())
//!         .serve("127.0.0.1:3000")
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod finance;
pub mod handlers;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AuthContext, AuthPolicy, DataService, Entity, PayrollError, PayrollResult, Role,
    };

    // === Macros ===
    pub use crate::impl_company_entity;

    // === Records ===
    pub use crate::entities::*;

    // === Finance ===
    pub use crate::finance::gst::{GstBreakdown, SupplyType, calculate_gst};
    pub use crate::finance::money::round2;
    pub use crate::finance::salary::{SalaryBreakdown, compute_salary};

    // === Storage ===
    pub use crate::storage::InMemoryDataService;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoDataService;

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{
        EntityDescriptor, EntityRegistry, Resource, RestExposure, ServerBuilder, ServerHost,
    };

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
