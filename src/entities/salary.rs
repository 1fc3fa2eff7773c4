//! Salary heads, per-employee salary settings and income-tax slabs

use crate::core::DataService;
use crate::core::error::{EntityError, PayrollError, PayrollResult};
use crate::core::validation::validators;
use crate::finance::FinanceError;
use crate::finance::salary::{Calculation, HeadType, SalaryComponent, applicable_value};
use crate::finance::tax::{TaxBand, bands_overlap};
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, ensure_unique, require_reference, still_referenced};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

impl_company_entity!(
    /// A named earning or deduction, e.g. HRA at 40% of basic
    SalaryHead,
    "salary head",
    "salary-heads",
    {
        name: String,
        head_type: HeadType,
        calculation: Calculation,
        /// Monthly amount for fixed heads, percent of basic otherwise
        value: Decimal,
        active: bool,
    }
);

impl SalaryHead {
    /// Monthly value for `basic_salary`
    pub fn value_for(&self, basic_salary: Decimal) -> Result<Decimal, FinanceError> {
        applicable_value(self.calculation, self.value, basic_salary)
    }

    pub fn to_component(&self) -> SalaryComponent {
        SalaryComponent {
            name: self.name.clone(),
            head_type: self.head_type,
            calculation: self.calculation,
            value: self.value,
        }
    }
}

impl_company_entity!(
    /// The basic salary and heads one employee is paid with
    SalarySetting,
    "salary setting",
    "salary-settings",
    {
        employee_id: Uuid,
        basic_salary: Decimal,
        /// Heads in payslip order
        head_ids: Vec<Uuid>,
        effective_from: NaiveDate,
    }
);

impl_company_entity!(
    /// One band of an income-tax regime
    TaxSlab,
    "tax slab",
    "tax-slabs",
    {
        regime: String,
        min_income: Decimal,
        #[serde(default)]
        max_income: Option<Decimal>,
        rate: Decimal,
    }
);

impl TaxSlab {
    pub fn band(&self) -> TaxBand {
        TaxBand::new(self.min_income, self.max_income, self.rate)
    }
}

fn dedup_heads(head_ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(head_ids.len());
    for id in head_ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalaryHead {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: String,
    pub head_type: HeadType,
    pub calculation: Calculation,
    #[validate(custom(function = "validators::non_negative"))]
    pub value: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSalaryHead {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: Option<String>,
    pub head_type: Option<HeadType>,
    pub calculation: Option<Calculation>,
    #[validate(custom(function = "validators::non_negative"))]
    pub value: Option<Decimal>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalarySetting {
    pub employee_id: Uuid,
    #[validate(custom(function = "validators::non_negative"))]
    pub basic_salary: Decimal,
    #[serde(default)]
    pub head_ids: Vec<Uuid>,
    pub effective_from: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSalarySetting {
    #[validate(custom(function = "validators::non_negative"))]
    pub basic_salary: Option<Decimal>,
    pub head_ids: Option<Vec<Uuid>>,
    pub effective_from: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaxSlab {
    #[validate(custom(function = "validators::not_blank"))]
    pub regime: String,
    #[validate(custom(function = "validators::non_negative"))]
    pub min_income: Decimal,
    #[validate(custom(function = "validators::non_negative"))]
    pub max_income: Option<Decimal>,
    #[validate(custom(function = "validators::percentage"))]
    pub rate: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaxSlab {
    #[validate(custom(function = "validators::non_negative"))]
    pub min_income: Option<Decimal>,
    #[validate(custom(function = "validators::non_negative"))]
    pub max_income: Option<Decimal>,
    #[validate(custom(function = "validators::percentage"))]
    pub rate: Option<Decimal>,
}

#[async_trait]
impl Resource for SalaryHead {
    type Create = CreateSalaryHead;
    type Update = UpdateSalaryHead;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.salary_heads
    }

    async fn build(
        _host: &ServerHost,
        company_id: Uuid,
        p: CreateSalaryHead,
    ) -> PayrollResult<Self> {
        Ok(SalaryHead::new(
            company_id,
            p.name.trim().to_string(),
            p.head_type,
            p.calculation,
            p.value,
            p.active,
        ))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateSalaryHead) -> PayrollResult<()> {
        if let Some(name) = p.name {
            self.name = name.trim().to_string();
        }
        if let Some(head_type) = p.head_type {
            self.head_type = head_type;
        }
        if let Some(calculation) = p.calculation {
            self.calculation = calculation;
        }
        if let Some(value) = p.value {
            self.value = value;
        }
        if let Some(active) = p.active {
            self.active = active;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        // rejects percentages outside 0..=100
        self.value_for(Decimal::ZERO)?;
        ensure_unique(&host.salary_heads, self, "name", &self.name).await
    }

    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        let settings = host.salary_settings.list_by_company(&self.company_id).await?;
        let in_use = settings.iter().filter(|s| s.head_ids.contains(&self.id)).count();
        if in_use > 0 {
            return Err(still_referenced(
                "salary head",
                format!("{} salary setting(s) use it; deactivate it instead", in_use),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for SalarySetting {
    type Create = CreateSalarySetting;
    type Update = UpdateSalarySetting;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.salary_settings
    }

    async fn build(
        _host: &ServerHost,
        company_id: Uuid,
        p: CreateSalarySetting,
    ) -> PayrollResult<Self> {
        Ok(SalarySetting::new(
            company_id,
            p.employee_id,
            p.basic_salary,
            dedup_heads(p.head_ids),
            p.effective_from.unwrap_or_else(|| Utc::now().date_naive()),
        ))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateSalarySetting) -> PayrollResult<()> {
        if let Some(basic) = p.basic_salary {
            self.basic_salary = basic;
        }
        if let Some(head_ids) = p.head_ids {
            self.head_ids = dedup_heads(head_ids);
        }
        if let Some(date) = p.effective_from {
            self.effective_from = date;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        require_reference(&host.employees, self.company_id, "employee_id", self.employee_id).await?;
        for head_id in &self.head_ids {
            require_reference(&host.salary_heads, self.company_id, "head_ids", *head_id).await?;
        }

        let existing = host
            .salary_settings
            .search(&self.company_id, "employee_id", &self.employee_id.to_string())
            .await?;
        if existing.iter().any(|s| s.id != self.id) {
            return Err(EntityError::AlreadyExists {
                entity_type: "salary setting".to_string(),
                field: "employee_id".to_string(),
                value: self.employee_id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for TaxSlab {
    type Create = CreateTaxSlab;
    type Update = UpdateTaxSlab;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.tax_slabs
    }

    async fn build(_host: &ServerHost, company_id: Uuid, p: CreateTaxSlab) -> PayrollResult<Self> {
        Ok(TaxSlab::new(
            company_id,
            p.regime.trim().to_lowercase(),
            p.min_income,
            p.max_income,
            p.rate,
        ))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateTaxSlab) -> PayrollResult<()> {
        if let Some(min) = p.min_income {
            self.min_income = min;
        }
        if p.max_income.is_some() {
            self.max_income = p.max_income;
        }
        if let Some(rate) = p.rate {
            self.rate = rate;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        if let Some(max) = self.max_income
            && max <= self.min_income
        {
            return Err(PayrollError::rule(
                "max_income",
                format!("must be above min_income {}", self.min_income),
            ));
        }

        let band = self.band();
        let slabs = host
            .tax_slabs
            .search(&self.company_id, "regime", &self.regime)
            .await?;
        if let Some(clash) = slabs
            .iter()
            .find(|s| s.id != self.id && bands_overlap(&s.band(), &band))
        {
            return Err(EntityError::Conflict {
                entity_type: "tax slab".to_string(),
                message: format!(
                    "overlaps the {} slab starting at {}",
                    clash.regime, clash.min_income
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// Bands of `regime` for TDS
pub async fn regime_bands(
    host: &ServerHost,
    company_id: Uuid,
    regime: &str,
) -> PayrollResult<Vec<TaxBand>> {
    let slabs = host.tax_slabs.search(&company_id, "regime", regime).await?;
    Ok(slabs.iter().map(TaxSlab::band).collect())
}
