//! Branches, departments and designations

use crate::core::DataService;
use crate::core::error::PayrollResult;
use crate::core::validation::validators;
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, ensure_unique, optional_reference, still_referenced};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

impl_company_entity!(
    /// A branch office; payroll reports group by branch
    Branch,
    "branch",
    "branches",
    {
        name: String,
        state: String,
        #[serde(default)]
        address: Option<String>,
    }
);

impl_company_entity!(
    Department,
    "department",
    "departments",
    {
        name: String,
        #[serde(default)]
        description: Option<String>,
    }
);

impl_company_entity!(
    /// A job title, optionally tied to a department
    Designation,
    "designation",
    "designations",
    {
        title: String,
        #[serde(default)]
        department_id: Option<Uuid>,
    }
);

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranch {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: String,
    #[validate(custom(function = "validators::state"))]
    pub state: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBranch {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validators::state"))]
    pub state: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartment {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepartment {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDesignation {
    #[validate(custom(function = "validators::not_blank"))]
    pub title: String,
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDesignation {
    #[validate(custom(function = "validators::not_blank"))]
    pub title: Option<String>,
    pub department_id: Option<Uuid>,
}

/// Fail when any employee still points at `id` through `field`
async fn ensure_no_employees(
    host: &ServerHost,
    company_id: Uuid,
    field: &str,
    id: Uuid,
    entity_type: &str,
) -> PayrollResult<()> {
    let assigned = host
        .employees
        .search(&company_id, field, &id.to_string())
        .await?;
    if assigned.is_empty() {
        Ok(())
    } else {
        Err(still_referenced(
            entity_type,
            format!("{} employee(s) are still assigned to it", assigned.len()),
        ))
    }
}

#[async_trait]
impl Resource for Branch {
    type Create = CreateBranch;
    type Update = UpdateBranch;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.branches
    }

    async fn build(_host: &ServerHost, company_id: Uuid, p: CreateBranch) -> PayrollResult<Self> {
        Ok(Branch::new(company_id, p.name, p.state, p.address))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateBranch) -> PayrollResult<()> {
        if let Some(name) = p.name {
            self.name = name;
        }
        if let Some(state) = p.state {
            self.state = state;
        }
        if p.address.is_some() {
            self.address = p.address;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        ensure_unique(&host.branches, self, "name", &self.name).await
    }

    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        ensure_no_employees(host, self.company_id, "branch_id", self.id, "branch").await
    }
}

#[async_trait]
impl Resource for Department {
    type Create = CreateDepartment;
    type Update = UpdateDepartment;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.departments
    }

    async fn build(
        _host: &ServerHost,
        company_id: Uuid,
        p: CreateDepartment,
    ) -> PayrollResult<Self> {
        Ok(Department::new(company_id, p.name, p.description))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateDepartment) -> PayrollResult<()> {
        if let Some(name) = p.name {
            self.name = name;
        }
        if p.description.is_some() {
            self.description = p.description;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        ensure_unique(&host.departments, self, "name", &self.name).await
    }

    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        ensure_no_employees(host, self.company_id, "department_id", self.id, "department").await
    }
}

#[async_trait]
impl Resource for Designation {
    type Create = CreateDesignation;
    type Update = UpdateDesignation;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.designations
    }

    async fn build(
        _host: &ServerHost,
        company_id: Uuid,
        p: CreateDesignation,
    ) -> PayrollResult<Self> {
        Ok(Designation::new(company_id, p.title, p.department_id))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateDesignation) -> PayrollResult<()> {
        if let Some(title) = p.title {
            self.title = title;
        }
        if p.department_id.is_some() {
            self.department_id = p.department_id;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        optional_reference(&host.departments, self.company_id, "department_id", self.department_id)
            .await?;
        ensure_unique(&host.designations, self, "title", &self.title).await
    }

    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        ensure_no_employees(host, self.company_id, "designation_id", self.id, "designation").await
    }
}
