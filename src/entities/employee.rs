use crate::core::DataService;
use crate::core::auth::Role;
use crate::core::error::PayrollResult;
use crate::core::validation::validators;
use crate::server::host::ServerHost;
use crate::server::resource::{Resource, ensure_unique, optional_reference, still_referenced};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl_company_entity!(
    /// A person on the payroll; `role` is the access role they log in with
    Employee,
    "employee",
    "employees",
    {
        name: String,
        email: String,
        #[serde(default)]
        phone: Option<String>,
        role: Role,
        #[serde(default)]
        branch_id: Option<Uuid>,
        #[serde(default)]
        department_id: Option<Uuid>,
        #[serde(default)]
        designation_id: Option<Uuid>,
        date_of_joining: NaiveDate,
        #[serde(default)]
        status: EmployeeStatus,
        #[serde(default)]
        pan: Option<String>,
        #[serde(default)]
        bank_account: Option<String>,
    }
);

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployee {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    pub branch_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub designation_id: Option<Uuid>,
    pub date_of_joining: Option<NaiveDate>,
    #[validate(length(equal = 10, message = "PAN must be 10 characters"))]
    pub pan: Option<String>,
    pub bank_account: Option<String>,
}

fn default_role() -> Role {
    Role::Employee
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployee {
    #[validate(custom(function = "validators::not_blank"))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub branch_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub designation_id: Option<Uuid>,
    pub date_of_joining: Option<NaiveDate>,
    pub status: Option<EmployeeStatus>,
    #[validate(length(equal = 10, message = "PAN must be 10 characters"))]
    pub pan: Option<String>,
    pub bank_account: Option<String>,
}

#[async_trait]
impl Resource for Employee {
    type Create = CreateEmployee;
    type Update = UpdateEmployee;

    fn store(host: &ServerHost) -> &Arc<dyn DataService<Self>> {
        &host.employees
    }

    async fn build(_host: &ServerHost, company_id: Uuid, p: CreateEmployee) -> PayrollResult<Self> {
        Ok(Employee::new(
            company_id,
            p.name,
            p.email.trim().to_lowercase(),
            p.phone,
            p.role,
            p.branch_id,
            p.department_id,
            p.designation_id,
            p.date_of_joining.unwrap_or_else(|| Utc::now().date_naive()),
            EmployeeStatus::Active,
            p.pan.map(|pan| pan.to_uppercase()),
            p.bank_account,
        ))
    }

    async fn apply(&mut self, _host: &ServerHost, p: UpdateEmployee) -> PayrollResult<()> {
        if let Some(name) = p.name {
            self.name = name;
        }
        if let Some(email) = p.email {
            self.email = email.trim().to_lowercase();
        }
        if p.phone.is_some() {
            self.phone = p.phone;
        }
        if let Some(role) = p.role {
            self.role = role;
        }
        if p.branch_id.is_some() {
            self.branch_id = p.branch_id;
        }
        if p.department_id.is_some() {
            self.department_id = p.department_id;
        }
        if p.designation_id.is_some() {
            self.designation_id = p.designation_id;
        }
        if let Some(date) = p.date_of_joining {
            self.date_of_joining = date;
        }
        if let Some(status) = p.status {
            self.status = status;
        }
        if let Some(pan) = p.pan {
            self.pan = Some(pan.to_uppercase());
        }
        if p.bank_account.is_some() {
            self.bank_account = p.bank_account;
        }
        Ok(())
    }

    async fn before_save(&self, host: &ServerHost, _previous: Option<&Self>) -> PayrollResult<()> {
        let company = self.company_id;
        optional_reference(&host.branches, company, "branch_id", self.branch_id).await?;
        optional_reference(&host.departments, company, "department_id", self.department_id)
            .await?;
        optional_reference(&host.designations, company, "designation_id", self.designation_id)
            .await?;
        ensure_unique(&host.employees, self, "email", &self.email).await
    }

    /// Employees with salary slips are kept for the payroll history
    async fn before_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        let slips = host
            .salary_slips
            .search(&self.company_id, "employee_id", &self.id.to_string())
            .await?;
        if slips.is_empty() {
            Ok(())
        } else {
            Err(still_referenced(
                "employee",
                "salary slips exist; mark the employee inactive instead",
            ))
        }
    }

    async fn after_delete(&self, host: &ServerHost) -> PayrollResult<()> {
        let settings = host
            .salary_settings
            .search(&self.company_id, "employee_id", &self.id.to_string())
            .await?;
        for setting in settings {
            host.salary_settings.delete(&setting.id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::error::{EntityError, PayrollError};
    use crate::server::entity_registry::{create_record, update_record};

    fn payload(email: &str) -> CreateEmployee {
        CreateEmployee {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            phone: None,
            role: Role::Employee,
            branch_id: None,
            department_id: None,
            designation_id: None,
            date_of_joining: NaiveDate::from_ymd_opt(2024, 4, 1),
            pan: Some("abcde1234f".to_string()),
            bank_account: None,
        }
    }

    #[tokio::test]
    async fn test_email_unique_case_insensitive() {
        let host = ServerHost::in_memory(AppConfig::with_defaults());
        let company = Uuid::new_v4();
        let first = create_record::<Employee>(&host, company, payload("asha@acme.test"))
            .await
            .unwrap();
        assert_eq!(first.pan.as_deref(), Some("ABCDE1234F"));
        assert!(first.is_active());

        let err = create_record::<Employee>(&host, company, payload("ASHA@acme.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::Entity(EntityError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_unknown_branch_rejected() {
        let host = ServerHost::in_memory(AppConfig::with_defaults());
        let mut p = payload("ravi@acme.test");
        p.branch_id = Some(Uuid::new_v4());
        let err = create_record::<Employee>(&host, Uuid::new_v4(), p)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE");
    }

    #[tokio::test]
    async fn test_update_keeps_own_email() {
        let host = ServerHost::in_memory(AppConfig::with_defaults());
        let company = Uuid::new_v4();
        let emp = create_record::<Employee>(&host, company, payload("meera@acme.test"))
            .await
            .unwrap();

        let updated = update_record::<Employee>(
            &host,
            company,
            emp.id,
            UpdateEmployee {
                name: None,
                email: Some("meera@acme.test".to_string()),
                phone: Some("9800000000".to_string()),
                role: None,
                branch_id: None,
                department_id: None,
                designation_id: None,
                date_of_joining: None,
                status: Some(EmployeeStatus::Inactive),
                pan: None,
                bank_account: None,
            },
        )
        .await
        .unwrap();
        assert!(!updated.is_active());
        assert_eq!(updated.phone.as_deref(), Some("9800000000"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_emails_admit_one() {
        let host = Arc::new(ServerHost::in_memory(AppConfig::with_defaults()));
        let company = Uuid::new_v4();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let host = host.clone();
                tokio::spawn(async move {
                    create_record::<Employee>(&host, company, payload("dup@acme.test")).await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(host.employees.list_by_company(&company).await.unwrap().len(), 1);
    }
}
