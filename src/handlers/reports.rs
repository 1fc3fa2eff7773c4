//! Dashboard and report aggregates

use crate::core::auth::AuthContext;
use crate::core::error::{PayrollError, PayrollResult};
use crate::core::validation::QueryOf;
use crate::entities::{Expense, OrderStatus, Revenue, SlipStatus};
use crate::finance::money::{round2, sum2};
use crate::finance::rollup::{
    BranchPayroll, DatedAmount, MonthlyComparison, PayrollEntry, branch_wise_monthly_payroll,
    counts_by_key, revenue_vs_expense, total, totals_by_key,
};
use crate::server::host::ServerHost;
use axum::{Json, Router, extract::State, routing::get};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/api/reports/dashboard", get(dashboard))
        .route("/api/reports/total-revenue", get(total_revenue))
        .route("/api/reports/total-expense", get(total_expense))
        .route("/api/reports/monthly", get(monthly))
        .route("/api/reports/expense-categories", get(expense_categories))
        .route("/api/reports/branch-payroll", get(branch_payroll))
        .route("/api/reports/orders", get(order_report))
}

/// Inclusive date range; either end may be open
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    fn check(&self) -> PayrollResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(PayrollError::rule("from", "must not be after 'to'"));
        }
        Ok(())
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct YearQuery {
    pub year: Option<i32>,
}

impl YearQuery {
    fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    pub net_profit: Decimal,
    pub employee_count: usize,
    pub active_employees: usize,
    pub order_count: usize,
    /// Balance due on orders that are not cancelled
    pub outstanding_balance: Decimal,
    pub pending_slips: usize,
}

#[derive(Debug, Serialize)]
pub struct TotalReport {
    pub total: Decimal,
    pub count: usize,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub months: Vec<MonthlyComparison>,
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    pub net_profit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub categories: BTreeMap<String, Decimal>,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BranchPayrollReport {
    pub year: i32,
    pub branches: Vec<BranchPayroll>,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderReport {
    pub count: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub total_amount: Decimal,
    pub total_received: Decimal,
    pub outstanding_balance: Decimal,
}

fn revenue_amounts(revenues: &[Revenue]) -> Vec<DatedAmount> {
    revenues
        .iter()
        .map(|r| DatedAmount::new(r.date, r.amount))
        .collect()
}

fn expense_amounts(expenses: &[Expense]) -> Vec<DatedAmount> {
    expenses
        .iter()
        .map(|e| DatedAmount::new(e.date, e.amount))
        .collect()
}

fn total_report(amounts: Vec<DatedAmount>, range: &DateRange) -> TotalReport {
    let selected: Vec<DatedAmount> = amounts
        .into_iter()
        .filter(|a| range.contains(a.date))
        .collect();
    TotalReport {
        total: total(&selected),
        count: selected.len(),
        from: range.from,
        to: range.to,
    }
}

fn read_tenant(host: &ServerHost, ctx: &AuthContext) -> PayrollResult<Uuid> {
    host.tenant(ctx, "reports", "read")
}

pub async fn dashboard(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
) -> PayrollResult<Json<Dashboard>> {
    let company_id = read_tenant(&host, &ctx)?;
    let revenues = host.revenues.list_by_company(&company_id).await?;
    let expenses = host.expenses.list_by_company(&company_id).await?;
    let employees = host.employees.list_by_company(&company_id).await?;
    let orders = host.orders.list_by_company(&company_id).await?;
    let slips = host.salary_slips.list_by_company(&company_id).await?;

    let total_revenue = total(&revenue_amounts(&revenues));
    let total_expense = total(&expense_amounts(&expenses));
    Ok(Json(Dashboard {
        total_revenue,
        total_expense,
        net_profit: round2(total_revenue - total_expense),
        employee_count: employees.len(),
        active_employees: employees.iter().filter(|e| e.is_active()).count(),
        order_count: orders.len(),
        outstanding_balance: sum2(
            orders
                .iter()
                .filter(|o| o.status != OrderStatus::Cancelled)
                .map(|o| o.balance_due),
        ),
        pending_slips: slips
            .iter()
            .filter(|s| s.status == SlipStatus::Pending)
            .count(),
    }))
}

pub async fn total_revenue(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(range): QueryOf<DateRange>,
) -> PayrollResult<Json<TotalReport>> {
    let company_id = read_tenant(&host, &ctx)?;
    range.check()?;
    let revenues = host.revenues.list_by_company(&company_id).await?;
    Ok(Json(total_report(revenue_amounts(&revenues), &range)))
}

pub async fn total_expense(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(range): QueryOf<DateRange>,
) -> PayrollResult<Json<TotalReport>> {
    let company_id = read_tenant(&host, &ctx)?;
    range.check()?;
    let expenses = host.expenses.list_by_company(&company_id).await?;
    Ok(Json(total_report(expense_amounts(&expenses), &range)))
}

/// Revenue, expense and profit for each month of a year
pub async fn monthly(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(query): QueryOf<YearQuery>,
) -> PayrollResult<Json<MonthlyReport>> {
    let company_id = read_tenant(&host, &ctx)?;
    let year = query.year();
    let revenues = host.revenues.list_by_company(&company_id).await?;
    let expenses = host.expenses.list_by_company(&company_id).await?;

    let months = revenue_vs_expense(&revenue_amounts(&revenues), &expense_amounts(&expenses), year);
    let total_revenue = sum2(months.iter().map(|m| m.revenue));
    let total_expense = sum2(months.iter().map(|m| m.expense));
    Ok(Json(MonthlyReport {
        year,
        months,
        total_revenue,
        total_expense,
        net_profit: round2(total_revenue - total_expense),
    }))
}

pub async fn expense_categories(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(range): QueryOf<DateRange>,
) -> PayrollResult<Json<CategoryReport>> {
    let company_id = read_tenant(&host, &ctx)?;
    range.check()?;
    let expenses = host.expenses.list_by_company(&company_id).await?;
    let categories = totals_by_key(
        expenses
            .into_iter()
            .filter(|e| range.contains(e.date))
            .map(|e| (e.category, e.amount)),
    );
    let total = sum2(categories.values().copied());
    Ok(Json(CategoryReport { categories, total }))
}

/// Net pay per branch and month, from generated slips
pub async fn branch_payroll(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(query): QueryOf<YearQuery>,
) -> PayrollResult<Json<BranchPayrollReport>> {
    let company_id = host.tenant(&ctx, "reports", "branch_payroll")?;
    let year = query.year();
    let branches: Vec<(Uuid, String)> = host
        .branches
        .list_by_company(&company_id)
        .await?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect();
    let entries: Vec<PayrollEntry> = host
        .salary_slips
        .list_by_company(&company_id)
        .await?
        .into_iter()
        .map(|s| PayrollEntry {
            branch_id: s.branch_id,
            year: s.year,
            month: s.month,
            net: s.breakdown.net,
        })
        .collect();

    let branches = branch_wise_monthly_payroll(&entries, &branches, year);
    let total = sum2(branches.iter().map(|b| b.total));
    Ok(Json(BranchPayrollReport {
        year,
        branches,
        total,
    }))
}

pub async fn order_report(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
) -> PayrollResult<Json<OrderReport>> {
    let company_id = read_tenant(&host, &ctx)?;
    let orders = host.orders.list_by_company(&company_id).await?;
    let live: Vec<_> = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .collect();

    Ok(Json(OrderReport {
        count: orders.len(),
        by_status: counts_by_key(orders.iter().map(|o| o.status)),
        total_amount: sum2(live.iter().map(|o| o.amount)),
        total_received: sum2(orders.iter().map(|o| o.advance_paid)),
        outstanding_balance: sum2(live.iter().map(|o| o.balance_due)),
    }))
}
