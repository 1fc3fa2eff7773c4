//! Purchases made for orders (or for the business at large)
//!
//! Every purchase owns one expense entry with the same amount and date, so
//! expense reports include purchases without double entry by hand.

use crate::core::DataService;
use crate::core::error::{EntityError, PayrollResult};
use crate::core::validation::validators;
use crate::entities::ledger::{Expense, PURCHASE_CATEGORY};
use crate::entities::order::OrderStatus;
use crate::finance::gst::{GstBreakdown, calculate_gst, check_rate};
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, require_reference};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

impl_company_entity!(
    Purchase,
    "purchase",
    "purchases",
    {
        #[serde(default)]
        order_id: Option<Uuid>,
        vendor_name: String,
        #[serde(default)]
        vendor_gstin: Option<String>,
        vendor_state: String,
        #[serde(default)]
        description: Option<String>,
        /// GST charged by the vendor; the company is the recipient
        gst: GstBreakdown,
        amount: Decimal,
        purchase_date: NaiveDate,
        /// The expense entry mirroring this purchase
        expense_id: Uuid,
    }
);

impl Purchase {
    pub fn supplier_state(&self) -> &str {
        self.vendor_gstin.as_deref().unwrap_or(&self.vendor_state)
    }

    fn expense_description(&self) -> String {
        match &self.description {
            Some(description) => format!("Purchase from {}: {}", self.vendor_name, description),
            None => format!("Purchase from {}", self.vendor_name),
        }
    }

    /// The expense entry this purchase books
    pub fn to_expense(&self) -> Expense {
        let mut expense = Expense::new(
            self.company_id,
            PURCHASE_CATEGORY.to_string(),
            self.amount,
            self.purchase_date,
            Some(self.expense_description()),
            None,
            Some(self.id),
            None,
        );
        expense.id = self.expense_id;
        expense
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchase {
    pub order_id: Option<Uuid>,
    #[validate(custom(function = "validators::not_blank"))]
    pub vendor_name: String,
    #[validate(custom(function = "validators::gstin"))]
    pub vendor_gstin: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub vendor_state: String,
    pub description: Option<String>,
    #[validate(custom(function = "validators::non_negative"))]
    pub base_amount: Decimal,
    #[validate(custom(function = "validators::percentage"))]
    pub gst_rate: Decimal,
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePurchase {
    #[validate(custom(function = "validators::not_blank"))]
    pub vendor_name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validators::non_negative"))]
    pub base_amount: Option<Decimal>,
    #[validate(custom(function = "validators::percentage"))]
    pub gst_rate: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
}

async fn purchase_gst(
    host: &ServerHost,
    company_id: Uuid,
    base_amount: Decimal,
    rate: Decimal,
    supplier_state: &str,
) -> PayrollResult<GstBreakdown> {
    let company = require_reference(&host.companies, company_id, "company_id", company_id).await?;
    check_rate(rate, &host.config.gst.allowed_rates)?;
    Ok(calculate_gst(
        base_amount,
        rate,
        supplier_state,
        company.supply_state(),
    )?)
}

#[async_trait]
impl Resource for Purchase {
    type Create = CreatePurchase;
    type Update = UpdatePurchase;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.purchases
    }

    async fn build(host: &ServerHost, company_id: Uuid, p: CreatePurchase) -> PayrollResult<Self> {
        let supplier = p.vendor_gstin.as_deref().unwrap_or(&p.vendor_state);
        let gst = purchase_gst(host, company_id, p.base_amount, p.gst_rate, supplier).await?;
        let amount = gst.total_amount;
        Ok(Purchase::new(
            company_id,
            p.order_id,
            p.vendor_name,
            p.vendor_gstin,
            p.vendor_state,
            p.description,
            gst,
            amount,
            p.purchase_date.unwrap_or_else(|| Utc::now().date_naive()),
            Uuid::new_v4(),
        ))
    }

    async fn apply(&mut self, host: &ServerHost, p: UpdatePurchase) -> PayrollResult<()> {
        if let Some(name) = p.vendor_name {
            self.vendor_name = name;
        }
        if p.description.is_some() {
            self.description = p.description;
        }
        if let Some(date) = p.purchase_date {
            self.purchase_date = date;
        }
        let base = p.base_amount.unwrap_or(self.gst.taxable_amount);
        let rate = p.gst_rate.unwrap_or(self.gst.rate);
        self.gst = purchase_gst(host, self.company_id, base, rate, self.supplier_state()).await?;
        self.amount = self.gst.total_amount;
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, previous: Option<&Self>) -> PayrollResult<()> {
        // only new purchases check the order; a later cancellation keeps history
        if previous.is_some() {
            return Ok(());
        }
        if let Some(order_id) = self.order_id {
            let order =
                require_reference(&host.orders, self.company_id, "order_id", order_id).await?;
            if order.status == OrderStatus::Cancelled {
                return Err(EntityError::Conflict {
                    entity_type: "order".to_string(),
                    message: format!("{} is cancelled", order.order_number),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn after_save(&self, host: &ServerHost, previous: Option<&Self>) -> PayrollResult<()> {
        let expense = self.to_expense();
        match previous {
            None => {
                host.expenses.create(expense).await?;
            }
            Some(_) => match host.expenses.get(&self.expense_id).await? {
                Some(existing) => {
                    let mut updated = expense;
                    updated.created_at = existing.created_at;
                    host.expenses.update(&self.expense_id, updated).await?;
                }
                None => {
                    host.expenses.create(expense).await?;
                }
            },
        }
        Ok(())
    }

    async fn after_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        host.expenses.delete(&self.expense_id).await?;
        Ok(())
    }
}
