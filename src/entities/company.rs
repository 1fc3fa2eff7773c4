//! Companies are the tenants; a company's `company_id` is its own `id`

use crate::core::DataService;
use crate::core::error::{PayrollError, PayrollResult};
use crate::core::validation::validators;
use crate::finance::gst::{resolve_state, state_code_from_gstin};
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, still_referenced};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

impl_company_entity!(
    /// A registered business
    Company,
    "company",
    "companies",
    {
        name: String,
        #[serde(default)]
        gstin: Option<String>,
        /// State of registration; decides intra/inter-state GST
        state: String,
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        email: Option<String>,
    }
);

impl Company {
    /// Where this company supplies from, for GST purposes
    pub fn supply_state(&self) -> &str {
        self.gstin.as_deref().unwrap_or(&self.state)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompany {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: String,
    #[validate(custom(function = "validators::gstin"))]
    pub gstin: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub state: String,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompany {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validators::gstin"))]
    pub gstin: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub state: Option<String>,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[async_trait]
impl Resource for Company {
    type Create = CreateCompany;
    type Update = UpdateCompany;

    const OWNS_TENANT: bool = true;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.companies
    }

    /// The caller's tenant is ignored: a new company is its own tenant
    async fn build(_host: &ServerHost, _company_id: Uuid, p: CreateCompany) -> PayrollResult<Self> {
        let mut company = Company::new(Uuid::nil(), p.name, p.gstin, p.state, p.address, p.email);
        company.company_id = company.id;
        Ok(company)
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateCompany) -> PayrollResult<()> {
        if let Some(name) = p.name {
            self.name = name;
        }
        if p.gstin.is_some() {
            self.gstin = p.gstin;
        }
        if let Some(state) = p.state {
            self.state = state;
        }
        if p.address.is_some() {
            self.address = p.address;
        }
        if p.email.is_some() {
            self.email = p.email;
        }
        Ok(())
    }

    async fn before_save(&self, _host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        if let Some(gstin) = &self.gstin {
            let registered = resolve_state(&self.state)?;
            if state_code_from_gstin(gstin) != Some(registered) {
                return Err(PayrollError::rule(
                    "gstin",
                    format!("GSTIN {} is not registered in {}", gstin, self.state),
                ));
            }
        }
        Ok(())
    }

    /// A company is deleted only once every record of its tenant is gone
    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        let tenant = self.id;
        let held = [
            ("branches", host.branches.list_by_company(&tenant).await?.len()),
            ("departments", host.departments.list_by_company(&tenant).await?.len()),
            ("designations", host.designations.list_by_company(&tenant).await?.len()),
            ("employees", host.employees.list_by_company(&tenant).await?.len()),
            ("orders", host.orders.list_by_company(&tenant).await?.len()),
            ("revenues", host.revenues.list_by_company(&tenant).await?.len()),
            ("expenses", host.expenses.list_by_company(&tenant).await?.len()),
            ("purchases", host.purchases.list_by_company(&tenant).await?.len()),
            ("salary heads", host.salary_heads.list_by_company(&tenant).await?.len()),
            ("salary settings", host.salary_settings.list_by_company(&tenant).await?.len()),
            ("tax slabs", host.tax_slabs.list_by_company(&tenant).await?.len()),
            ("salary slips", host.salary_slips.list_by_company(&tenant).await?.len()),
        ];
        let remaining: Vec<String> = held
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(kind, count)| format!("{} {}", count, kind))
            .collect();
        if remaining.is_empty() {
            Ok(())
        } else {
            Err(still_referenced(
                "company",
                format!("it still has {}", remaining.join(", ")),
            ))
        }
    }
}
