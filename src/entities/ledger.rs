//! Revenue and expense entries
//!
//! Some entries are written by other records: order payments book revenue,
//! purchases book an expense. Those entries carry the source id and can only
//! change through their source.

use crate::core::DataService;
use crate::core::error::PayrollResult;
use crate::core::validation::validators;
use crate::finance::round2;
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, optional_reference, still_referenced};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Expense category written for purchases
pub const PURCHASE_CATEGORY: &str = "purchase";

/// Expense category written when a salary slip is paid
pub const SALARY_CATEGORY: &str = "salary";

impl_company_entity!(
    Revenue,
    "revenue",
    "revenues",
    {
        source: String,
        amount: Decimal,
        date: NaiveDate,
        /// Set when the revenue is a payment against an order
        #[serde(default)]
        order_id: Option<Uuid>,
        #[serde(default)]
        description: Option<String>,
    }
);

impl_company_entity!(
    Expense,
    "expense",
    "expenses",
    {
        /// Lowercase category label, e.g. `rent`, `purchase`, `salary`
        category: String,
        amount: Decimal,
        date: NaiveDate,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        branch_id: Option<Uuid>,
        /// Set when the expense mirrors a purchase
        #[serde(default)]
        purchase_id: Option<Uuid>,
        /// Set when the expense is a paid salary slip
        #[serde(default)]
        salary_slip_id: Option<Uuid>,
    }
);

impl Expense {
    /// Whether another record owns this entry
    pub fn is_derived(&self) -> bool {
        self.purchase_id.is_some() || self.salary_slip_id.is_some()
    }
}

pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRevenue {
    #[validate(custom(function = "validators::not_blank"))]
    pub source: String,
    #[validate(custom(function = "validators::non_negative"))]
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRevenue {
    #[validate(custom(function = "validators::not_blank"))]
    pub source: Option<String>,
    #[validate(custom(function = "validators::non_negative"))]
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpense {
    #[validate(custom(function = "validators::not_blank"))]
    pub category: String,
    #[validate(custom(function = "validators::non_negative"))]
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExpense {
    #[validate(custom(function = "validators::not_blank"))]
    pub category: Option<String>,
    #[validate(custom(function = "validators::non_negative"))]
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub branch_id: Option<Uuid>,
}

#[async_trait]
impl Resource for Revenue {
    type Create = CreateRevenue;
    type Update = UpdateRevenue;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.revenues
    }

    async fn build(_host: &ServerHost, company_id: Uuid, p: CreateRevenue) -> PayrollResult<Self> {
        Ok(Revenue::new(
            company_id,
            p.source,
            round2(p.amount),
            p.date.unwrap_or_else(|| Utc::now().date_naive()),
            None,
            p.description,
        ))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateRevenue) -> PayrollResult<()> {
        if let Some(source) = p.source {
            self.source = source;
        }
        if let Some(amount) = p.amount {
            self.amount = round2(amount);
        }
        if let Some(date) = p.date {
            self.date = date;
        }
        if p.description.is_some() {
            self.description = p.description;
        }
        Ok(())
    }

    async fn before_save(&self, _host: &ServerHost, previous: Option<&Self>) -> PayrollResult<()> {
        match previous {
            Some(previous) if previous.order_id.is_some() => Err(still_referenced(
                "revenue",
                "it is an order payment and follows the order",
            )),
            _ => Ok(()),
        }
    }

    async fn before_delete(&self, _host: &ServerHost) -> PayrollResult<()> {
        if self.order_id.is_some() {
            return Err(still_referenced(
                "revenue",
                "it is an order payment and follows the order",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for Expense {
    type Create = CreateExpense;
    type Update = UpdateExpense;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.expenses
    }

    async fn build(_host: &ServerHost, company_id: Uuid, p: CreateExpense) -> PayrollResult<Self> {
        Ok(Expense::new(
            company_id,
            normalize_category(&p.category),
            round2(p.amount),
            p.date.unwrap_or_else(|| Utc::now().date_naive()),
            p.description,
            p.branch_id,
            None,
            None,
        ))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateExpense) -> PayrollResult<()> {
        if let Some(category) = p.category {
            self.category = normalize_category(&category);
        }
        if let Some(amount) = p.amount {
            self.amount = round2(amount);
        }
        if let Some(date) = p.date {
            self.date = date;
        }
        if p.description.is_some() {
            self.description = p.description;
        }
        if p.branch_id.is_some() {
            self.branch_id = p.branch_id;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, previous: Option<&Self>) -> PayrollResult<()> {
        if previous.is_some_and(Expense::is_derived) {
            return Err(still_referenced(
                "expense",
                "it is owned by a purchase or salary slip",
            ));
        }
        optional_reference(&host.branches, self.company_id, "branch_id", self.branch_id).await?;
        Ok(())
    }

    async fn before_delete(&self, _host: &ServerHost) -> PayrollResult<()> {
        if self.is_derived() {
            return Err(still_referenced(
                "expense",
                "it is owned by a purchase or salary slip",
            ));
        }
        Ok(())
    }
}
