//! Client orders with GST, advances and payment tracking
//!
//! Invariants kept by every mutation:
//! - `amount == gst.total_amount`
//! - `balance_due == amount - advance_paid`, never negative
//! - `payment_status` follows from `advance_paid` and `amount`

use crate::core::{DataService, Entity};
use crate::core::error::{EntityError, PayrollError, PayrollResult};
use crate::core::validation::validators;
use crate::entities::company::Company;
use crate::entities::ledger::Revenue;
use crate::finance::gst::{GstBreakdown, calculate_gst, check_rate};
use crate::finance::money::round2;
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, require_reference, still_referenced};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// pending -> confirmed | cancelled, confirmed -> completed | cancelled
    pub fn can_move_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Completed)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn from_amounts(advance_paid: Decimal, balance_due: Decimal) -> Self {
        if balance_due <= Decimal::ZERO {
            PaymentStatus::Paid
        } else if advance_paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }
}

impl_company_entity!(
    Order,
    "order",
    "orders",
    {
        /// Per-company sequence, `ORD-0001`, `ORD-0002`, ...
        order_number: String,
        client_name: String,
        #[serde(default)]
        client_gstin: Option<String>,
        client_state: String,
        #[serde(default)]
        description: Option<String>,
        gst: GstBreakdown,
        /// Invoice total including GST
        amount: Decimal,
        advance_paid: Decimal,
        balance_due: Decimal,
        status: OrderStatus,
        payment_status: PaymentStatus,
        order_date: NaiveDate,
    }
);

impl Order {
    /// Where the client receives supply, for GST purposes
    pub fn recipient_state(&self) -> &str {
        self.client_gstin.as_deref().unwrap_or(&self.client_state)
    }

    /// Replace the GST breakdown and recompute the derived amounts
    pub fn reprice(&mut self, gst: GstBreakdown) -> PayrollResult<()> {
        if self.advance_paid > gst.total_amount {
            return Err(PayrollError::rule(
                "base_amount",
                format!(
                    "order total {} would be below the {} already paid",
                    gst.total_amount, self.advance_paid
                ),
            ));
        }
        self.amount = gst.total_amount;
        self.gst = gst;
        self.settle();
        Ok(())
    }

    /// Recompute `balance_due` and `payment_status` from `amount` and `advance_paid`
    pub fn settle(&mut self) {
        self.balance_due = round2((self.amount - self.advance_paid).max(Decimal::ZERO));
        self.payment_status = PaymentStatus::from_amounts(self.advance_paid, self.balance_due);
    }

    /// Add a payment against the balance.
    ///
    /// The payment is rounded to paise first; anything that rounds to zero
    /// is refused.
    pub fn record_payment(&mut self, amount: Decimal) -> PayrollResult<()> {
        if self.status == OrderStatus::Cancelled {
            return Err(EntityError::Conflict {
                entity_type: "order".to_string(),
                message: format!("{} is cancelled", self.order_number),
            }
            .into());
        }
        let amount = round2(amount);
        if amount <= Decimal::ZERO {
            return Err(PayrollError::rule("amount", "payment must be at least 0.01"));
        }
        if amount > self.balance_due {
            return Err(PayrollError::rule(
                "amount",
                format!(
                    "payment {} exceeds the balance due {}",
                    amount, self.balance_due
                ),
            ));
        }
        self.advance_paid += amount;
        self.settle();
        self.touch();
        Ok(())
    }

    /// Move to `next`, enforcing the status machine
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), EntityError> {
        if !self.status.can_move_to(next) {
            return Err(EntityError::InvalidTransition {
                entity_type: "order".to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }
}

/// Next `ORD-nnnn` number after the highest one in use
pub fn next_order_number(existing: &[Order]) -> String {
    let highest = existing
        .iter()
        .filter_map(|o| o.order_number.strip_prefix("ORD-"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("ORD-{:04}", highest + 1)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrder {
    #[validate(custom(function = "validators::not_blank"))]
    pub client_name: String,
    #[validate(custom(function = "validators::gstin"))]
    pub client_gstin: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub client_state: String,
    pub description: Option<String>,
    /// Taxable value before GST
    #[validate(custom(function = "validators::non_negative"))]
    pub base_amount: Decimal,
    #[validate(custom(function = "validators::percentage"))]
    pub gst_rate: Decimal,
    #[validate(custom(function = "validators::non_negative"))]
    pub advance_paid: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
}

/// Editable order details; payments and status have their own endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrder {
    #[validate(custom(function = "validators::not_blank"))]
    pub client_name: Option<String>,
    #[validate(custom(function = "validators::gstin"))]
    pub client_gstin: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub client_state: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validators::non_negative"))]
    pub base_amount: Option<Decimal>,
    #[validate(custom(function = "validators::percentage"))]
    pub gst_rate: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPayment {
    #[validate(custom(function = "validators::positive"))]
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

/// GST on an order supplied by `company`
pub fn order_gst(
    host: &ServerHost,
    company: &Company,
    base_amount: Decimal,
    rate: Decimal,
    recipient_state: &str,
) -> PayrollResult<GstBreakdown> {
    check_rate(rate, &host.config.gst.allowed_rates)?;
    Ok(calculate_gst(
        base_amount,
        rate,
        company.supply_state(),
        recipient_state,
    )?)
}

#[async_trait]
impl Resource for Order {
    type Create = CreateOrder;
    type Update = UpdateOrder;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.orders
    }

    async fn build(host: &ServerHost, company_id: Uuid, p: CreateOrder) -> PayrollResult<Self> {
        let company =
            require_reference(&host.companies, company_id, "company_id", company_id).await?;
        let recipient = p.client_gstin.as_deref().unwrap_or(&p.client_state);
        let gst = order_gst(host, &company, p.base_amount, p.gst_rate, recipient)?;

        let advance_paid = round2(p.advance_paid.unwrap_or_default());
        if advance_paid > gst.total_amount {
            return Err(PayrollError::rule(
                "advance_paid",
                format!(
                    "advance {} exceeds the order total {}",
                    advance_paid, gst.total_amount
                ),
            ));
        }

        let existing = host.orders.list_by_company(&company_id).await?;
        let amount = gst.total_amount;
        let mut order = Order::new(
            company_id,
            next_order_number(&existing),
            p.client_name,
            p.client_gstin,
            p.client_state,
            p.description,
            gst,
            amount,
            advance_paid,
            Decimal::ZERO,
            OrderStatus::Pending,
            PaymentStatus::Unpaid,
            p.order_date.unwrap_or_else(|| Utc::now().date_naive()),
        );
        order.settle();
        Ok(order)
    }

    async fn apply(&mut self, host: &ServerHost, p: UpdateOrder) -> PayrollResult<()> {
        if self.status.is_terminal() {
            return Err(EntityError::Conflict {
                entity_type: "order".to_string(),
                message: format!("{} is {}", self.order_number, self.status),
            }
            .into());
        }
        if let Some(name) = p.client_name {
            self.client_name = name;
        }
        if p.client_gstin.is_some() {
            self.client_gstin = p.client_gstin;
        }
        if let Some(state) = p.client_state {
            self.client_state = state;
        }
        if p.description.is_some() {
            self.description = p.description;
        }
        if let Some(date) = p.order_date {
            self.order_date = date;
        }

        let company = require_reference(
            &host.companies,
            self.company_id,
            "company_id",
            self.company_id,
        )
        .await?;
        let base = p.base_amount.unwrap_or(self.gst.taxable_amount);
        let rate = p.gst_rate.unwrap_or(self.gst.rate);
        let gst = order_gst(host, &company, base, rate, self.recipient_state())?;
        self.reprice(gst)
    }

    /// An advance taken with the order is revenue like any later payment
    async fn after_save(&self, host: &ServerHost, previous: Option<&Self>) -> PayrollResult<()> {
        if previous.is_none() && self.advance_paid > Decimal::ZERO {
            let revenue = Revenue::new(
                self.company_id,
                format!("Order {} advance", self.order_number),
                self.advance_paid,
                self.order_date,
                Some(self.id),
                None,
            );
            host.revenues.create(revenue).await?;
        }
        Ok(())
    }

    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        let id = self.id.to_string();
        if !host.purchases.search(&self.company_id, "order_id", &id).await?.is_empty() {
            return Err(still_referenced("order", "purchases are recorded against it"));
        }
        if !host.revenues.search(&self.company_id, "order_id", &id).await?.is_empty() {
            return Err(still_referenced(
                "order",
                "payments are recorded against it; cancel it instead",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::entities::company::CreateCompany;
    use crate::finance::gst::SupplyType;
    use crate::finance::money::d;
    use crate::server::entity_registry::create_record;
    use std::collections::HashSet;

    fn order(amount: &str, advance: &str) -> Order {
        let gst = calculate_gst(d(amount), Decimal::ZERO, "Goa", "Goa").unwrap();
        let mut order = Order::new(
            Uuid::new_v4(),
            "ORD-0001".to_string(),
            "Client".to_string(),
            None,
            "Goa".to_string(),
            None,
            gst,
            d(amount),
            d(advance),
            Decimal::ZERO,
            OrderStatus::Pending,
            PaymentStatus::Unpaid,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        order.settle();
        order
    }

    #[test]
    fn test_balance_and_payment_status() {
        let mut o = order("1000", "0");
        assert_eq!(o.balance_due, d("1000"));
        assert_eq!(o.payment_status, PaymentStatus::Unpaid);

        o.record_payment(d("400")).unwrap();
        assert_eq!(o.balance_due, d("600"));
        assert_eq!(o.payment_status, PaymentStatus::Partial);

        o.record_payment(d("600")).unwrap();
        assert_eq!(o.balance_due, Decimal::ZERO);
        assert_eq!(o.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_overpayment_rejected() {
        let mut o = order("100", "50");
        assert!(o.record_payment(d("50.01")).is_err());
        assert_eq!(o.advance_paid, d("50"));
    }

    #[test]
    fn test_payment_rounding_to_zero_rejected() {
        let mut o = order("100", "0");
        let err = o.record_payment(d("0.001")).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(o.advance_paid, Decimal::ZERO);
        assert_eq!(o.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_payment_is_stored_in_paise() {
        let mut o = order("100", "0");
        o.record_payment(d("10.005")).unwrap();
        assert_eq!(o.advance_paid, d("10.01"));
        assert_eq!(o.balance_due, d("89.99"));
    }

    #[test]
    fn test_cancelled_order_refuses_payment() {
        let mut o = order("100", "0");
        o.transition(OrderStatus::Cancelled).unwrap();
        let err = o.record_payment(d("10")).unwrap_err();
        assert_eq!(err.error_code(), "ENTITY_CONFLICT");
    }

    #[test]
    fn test_status_machine() {
        let mut o = order("100", "0");
        assert!(o.transition(OrderStatus::Completed).is_err());
        o.transition(OrderStatus::Confirmed).unwrap();
        o.transition(OrderStatus::Completed).unwrap();
        assert!(o.transition(OrderStatus::Cancelled).is_err());
        assert!(o.status.is_terminal());
    }

    #[test]
    fn test_reprice_below_advance_rejected() {
        let mut o = order("1000", "800");
        let smaller = calculate_gst(d("500"), d("18"), "Goa", "Kerala").unwrap();
        assert!(o.reprice(smaller).is_err());

        let larger = calculate_gst(d("1000"), d("18"), "Goa", "Kerala").unwrap();
        o.reprice(larger).unwrap();
        assert_eq!(o.amount, d("1180"));
        assert_eq!(o.balance_due, d("380"));
        assert_eq!(o.gst.supply_type, SupplyType::InterState);
    }

    #[test]
    fn test_next_order_number() {
        assert_eq!(next_order_number(&[]), "ORD-0001");
        let mut a = order("1", "0");
        a.order_number = "ORD-0009".to_string();
        let mut b = order("1", "0");
        b.order_number = "legacy-7".to_string();
        assert_eq!(next_order_number(&[a, b]), "ORD-0010");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_get_distinct_numbers() {
        let host = Arc::new(ServerHost::in_memory(AppConfig::with_defaults()));
        let company = create_record::<Company>(
            &host,
            Uuid::nil(),
            CreateCompany {
                name: "Acme".to_string(),
                gstin: None,
                state: "Goa".to_string(),
                address: None,
                email: None,
            },
        )
        .await
        .unwrap();

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let host = host.clone();
                tokio::spawn(async move {
                    let payload = CreateOrder {
                        client_name: format!("Client {}", i),
                        client_gstin: None,
                        client_state: "Goa".to_string(),
                        description: None,
                        base_amount: d("100"),
                        gst_rate: d("18"),
                        advance_paid: None,
                        order_date: None,
                    };
                    create_record::<Order>(&host, company.id, payload).await
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        for task in tasks {
            let order = task.await.unwrap().unwrap();
            numbers.insert(order.order_number);
        }
        assert_eq!(numbers.len(), 64);
        assert!(numbers.contains("ORD-0064"));
    }
}
