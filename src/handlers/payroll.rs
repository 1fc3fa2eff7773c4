//! Salary computation and salary slips
//!
//! A slip is computed from the employee's salary setting: basic salary plus
//! the active heads it lists, prorated by paid days, with TDS from the
//! company's tax slabs of the configured regime. Employees (role
//! `employee`) only ever see slips whose `employee_id` is their user id.

use crate::core::auth::{AuthContext, Role};
use crate::core::error::{EntityError, PayrollError, PayrollResult};
use crate::core::query::{PaginatedResponse, QueryParams};
use crate::core::validation::{IdPath, QueryOf, Validated, validators};
use crate::entities::salary::regime_bands;
use crate::entities::{Employee, SalarySlip, SlipStatus};
use crate::finance::salary::{SalaryBreakdown, SalaryInput, TdsInput, compute_salary};
use crate::server::entity_registry::paginate_records;
use crate::server::host::ServerHost;
use crate::server::resource::{find_scoped, require_reference};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<ServerHost>> {
    Router::new()
        .route("/api/payroll/preview", post(preview))
        .route("/api/payroll/run", post(run_payroll))
        .route("/api/payroll/slips", get(list_slips).post(generate_slip))
        .route("/api/payroll/slips/{id}", get(get_slip).delete(delete_slip))
        .route("/api/payroll/slips/{id}/pay", put(pay_slip))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlipRequest {
    pub employee_id: Uuid,
    #[validate(custom(function = "validators::month"))]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    /// Defaults to `payroll.default_working_days`
    #[validate(custom(function = "validators::working_days"))]
    pub working_days: Option<Decimal>,
    /// Defaults to the working days
    #[validate(custom(function = "validators::non_negative"))]
    pub paid_days: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RunRequest {
    #[validate(custom(function = "validators::month"))]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    #[validate(custom(function = "validators::working_days"))]
    pub working_days: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlipFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub employee_id: Option<Uuid>,
    pub status: Option<SlipStatus>,
}

#[derive(Debug, Serialize)]
pub struct SalaryPreview {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub month: u32,
    pub year: i32,
    pub working_days: Decimal,
    pub paid_days: Decimal,
    pub breakdown: SalaryBreakdown,
}

#[derive(Debug, Serialize)]
pub struct SkippedEmployee {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub month: u32,
    pub year: i32,
    pub generated: Vec<SalarySlip>,
    pub skipped: Vec<SkippedEmployee>,
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.pred_opt())
}

/// Compute one month of pay for `employee`
pub async fn compute_for(
    host: &ServerHost,
    employee: &Employee,
    month: u32,
    year: i32,
    working_days: Decimal,
    paid_days: Decimal,
) -> PayrollResult<SalaryBreakdown> {
    if !employee.is_active() {
        return Err(PayrollError::rule(
            "employee_id",
            format!("{} is inactive", employee.name),
        ));
    }

    let company_id = employee.company_id;
    let setting = host
        .salary_settings
        .search(&company_id, "employee_id", &employee.id.to_string())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            PayrollError::rule(
                "employee_id",
                format!("{} has no salary setting", employee.name),
            )
        })?;

    if let Some(end) = month_end(year, month)
        && setting.effective_from > end
    {
        return Err(PayrollError::rule(
            "month",
            format!(
                "salary setting of {} is effective from {}",
                employee.name, setting.effective_from
            ),
        ));
    }

    let mut components = Vec::with_capacity(setting.head_ids.len());
    for head_id in &setting.head_ids {
        let head = require_reference(&host.salary_heads, company_id, "head_ids", *head_id).await?;
        if head.active {
            components.push(head.to_component());
        }
    }

    let payroll = &host.config.payroll;
    let tds = if payroll.tds_enabled {
        let bands = regime_bands(host, company_id, &payroll.tax_regime).await?;
        (!bands.is_empty()).then(|| TdsInput {
            bands,
            cess_percent: payroll.cess_percent,
        })
    } else {
        None
    };

    Ok(compute_salary(&SalaryInput {
        basic_salary: setting.basic_salary,
        components,
        working_days,
        paid_days,
        tds,
    })?)
}

async fn existing_slip(
    host: &ServerHost,
    employee: &Employee,
    month: u32,
    year: i32,
) -> PayrollResult<Option<SalarySlip>> {
    let slips = host
        .salary_slips
        .search(&employee.company_id, "employee_id", &employee.id.to_string())
        .await?;
    Ok(slips
        .into_iter()
        .find(|s| s.month == month && s.year == year))
}

/// Generate and store the slip of one employee, refusing duplicates
async fn generate_for(
    host: &ServerHost,
    employee: &Employee,
    month: u32,
    year: i32,
    working_days: Decimal,
    paid_days: Decimal,
) -> PayrollResult<SalarySlip> {
    let _guard = host.lock_tenant(employee.company_id).await;
    if existing_slip(host, employee, month, year).await?.is_some() {
        return Err(EntityError::AlreadyExists {
            entity_type: "salary slip".to_string(),
            field: "month".to_string(),
            value: format!("{:04}-{:02} for {}", year, month, employee.name),
        }
        .into());
    }
    let breakdown = compute_for(host, employee, month, year, working_days, paid_days).await?;
    let slip = SalarySlip::generate(employee, month, year, working_days, paid_days, breakdown);
    Ok(host.salary_slips.create(slip).await?)
}

fn days(
    host: &ServerHost,
    working_days: Option<Decimal>,
    paid_days: Option<Decimal>,
) -> (Decimal, Decimal) {
    let working = working_days.unwrap_or(host.config.payroll.default_working_days);
    (working, paid_days.unwrap_or(working))
}

/// Employees may only see their own slips
fn visible_to(ctx: &AuthContext, slip: &SalarySlip) -> bool {
    ctx.role() != Some(Role::Employee) || ctx.user_id() == Some(slip.employee_id)
}

pub async fn preview(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    Validated(req): Validated<SlipRequest>,
) -> PayrollResult<Json<SalaryPreview>> {
    let company_id = host.tenant(&ctx, "payroll", "preview")?;
    let employee =
        require_reference(&host.employees, company_id, "employee_id", req.employee_id).await?;
    let (working_days, paid_days) = days(&host, req.working_days, req.paid_days);
    let breakdown =
        compute_for(&host, &employee, req.month, req.year, working_days, paid_days).await?;
    Ok(Json(SalaryPreview {
        employee_id: employee.id,
        employee_name: employee.name,
        month: req.month,
        year: req.year,
        working_days,
        paid_days,
        breakdown,
    }))
}

pub async fn generate_slip(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    Validated(req): Validated<SlipRequest>,
) -> PayrollResult<(StatusCode, Json<SalarySlip>)> {
    let company_id = host.tenant(&ctx, "payroll", "generate")?;
    let employee =
        require_reference(&host.employees, company_id, "employee_id", req.employee_id).await?;
    let (working_days, paid_days) = days(&host, req.working_days, req.paid_days);
    let slip = generate_for(&host, &employee, req.month, req.year, working_days, paid_days).await?;
    tracing::info!(
        slip = %slip.id,
        employee = %employee.id,
        period = %slip.period(),
        net = %slip.breakdown.net,
        "salary slip generated"
    );
    Ok((StatusCode::CREATED, Json(slip)))
}

/// Generate slips for every active employee of the company
pub async fn run_payroll(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    Validated(req): Validated<RunRequest>,
) -> PayrollResult<Json<RunReport>> {
    let company_id = host.tenant(&ctx, "payroll", "run")?;
    let working_days = req
        .working_days
        .unwrap_or(host.config.payroll.default_working_days);

    let mut report = RunReport {
        month: req.month,
        year: req.year,
        generated: Vec::new(),
        skipped: Vec::new(),
    };

    let employees = host.employees.list_by_company(&company_id).await?;
    for employee in employees.iter().filter(|e| e.is_active()) {
        match generate_for(&host, employee, req.month, req.year, working_days, working_days).await
        {
            Ok(slip) => report.generated.push(slip),
            Err(err @ (PayrollError::Entity(_) | PayrollError::Validation(_))) => {
                report.skipped.push(SkippedEmployee {
                    employee_id: employee.id,
                    employee_name: employee.name.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        %company_id,
        month = req.month,
        year = req.year,
        generated = report.generated.len(),
        skipped = report.skipped.len(),
        "payroll run finished"
    );
    Ok(Json(report))
}

pub async fn list_slips(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    QueryOf(filter): QueryOf<SlipFilter>,
    QueryOf(params): QueryOf<QueryParams>,
) -> PayrollResult<Json<PaginatedResponse<Value>>> {
    let company_id = host.tenant(&ctx, "payroll", "list")?;
    let mut slips: Vec<SalarySlip> = host
        .salary_slips
        .list_by_company(&company_id)
        .await?
        .into_iter()
        .filter(|s| visible_to(&ctx, s))
        .filter(|s| filter.month.is_none_or(|m| s.month == m))
        .filter(|s| filter.year.is_none_or(|y| s.year == y))
        .filter(|s| filter.employee_id.is_none_or(|e| s.employee_id == e))
        .filter(|s| filter.status.is_none_or(|st| s.status == st))
        .collect();
    slips.sort_by(|a, b| {
        (b.year, b.month)
            .cmp(&(a.year, a.month))
            .then_with(|| a.employee_name.cmp(&b.employee_name))
    });
    Ok(Json(paginate_records(&slips, &params)?))
}

async fn visible_slip(
    host: &ServerHost,
    ctx: &AuthContext,
    company_id: Uuid,
    id: Uuid,
) -> PayrollResult<SalarySlip> {
    let slip = find_scoped(&host.salary_slips, company_id, id).await?;
    if !visible_to(ctx, &slip) {
        return Err(PayrollError::not_found("salary slip", id));
    }
    Ok(slip)
}

pub async fn get_slip(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
) -> PayrollResult<Json<SalarySlip>> {
    let company_id = host.tenant(&ctx, "payroll", "get")?;
    Ok(Json(visible_slip(&host, &ctx, company_id, id).await?))
}

/// Mark a slip paid and book its net pay as a salary expense
pub async fn pay_slip(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
    body: Option<Json<PayRequest>>,
) -> PayrollResult<Json<SalarySlip>> {
    let company_id = host.tenant(&ctx, "payroll", "pay")?;
    let _guard = host.lock_tenant(company_id).await;
    let mut slip = find_scoped(&host.salary_slips, company_id, id).await?;
    let paid_on = body
        .and_then(|Json(req)| req.paid_on)
        .unwrap_or_else(|| Utc::now().date_naive());
    slip.pay(paid_on)?;
    let slip = host.salary_slips.update(&id, slip).await?;
    let expense = host.expenses.create(slip.to_expense()).await?;
    tracing::info!(
        slip = %slip.id,
        expense = %expense.id,
        amount = %expense.amount,
        "salary slip paid"
    );
    Ok(Json(slip))
}

pub async fn delete_slip(
    State(host): State<Arc<ServerHost>>,
    ctx: AuthContext,
    IdPath(id): IdPath,
) -> PayrollResult<StatusCode> {
    let company_id = host.tenant(&ctx, "payroll", "delete")?;
    let slip = find_scoped(&host.salary_slips, company_id, id).await?;
    if slip.status == SlipStatus::Paid {
        return Err(EntityError::Conflict {
            entity_type: "salary slip".to_string(),
            message: format!("slip {} is already paid", slip.period()),
        }
        .into());
    }
    host.salary_slips.delete(&id).await?;
    tracing::info!(slip = %id, "salary slip deleted");
    Ok(StatusCode::NO_CONTENT)
}
