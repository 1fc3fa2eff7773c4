use crate::core::Entity;
use crate::core::error::{EntityError, PayrollResult};
use crate::entities::employee::Employee;
use crate::entities::ledger::{Expense, SALARY_CATEGORY};
use crate::finance::salary::SalaryBreakdown;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlipStatus {
    #[default]
    Pending,
    Paid,
}

impl_company_entity!(
    /// One employee's pay for one month
    SalarySlip,
    "salary slip",
    "salary-slips",
    {
        employee_id: uuid::Uuid,
        /// Copied at generation so the slip survives renames
        employee_name: String,
        #[serde(default)]
        branch_id: Option<uuid::Uuid>,
        #[serde(default)]
        department_id: Option<uuid::Uuid>,
        month: u32,
        year: i32,
        working_days: Decimal,
        paid_days: Decimal,
        breakdown: SalaryBreakdown,
        status: SlipStatus,
        #[serde(default)]
        paid_on: Option<NaiveDate>,
    }
);

impl SalarySlip {
    /// Pending slip for `employee`
    pub fn generate(
        employee: &Employee,
        month: u32,
        year: i32,
        working_days: Decimal,
        paid_days: Decimal,
        breakdown: SalaryBreakdown,
    ) -> Self {
        SalarySlip::new(
            employee.company_id,
            employee.id,
            employee.name.clone(),
            employee.branch_id,
            employee.department_id,
            month,
            year,
            working_days,
            paid_days,
            breakdown,
            SlipStatus::Pending,
            None,
        )
    }

    pub fn period(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Mark the slip paid on `date`
    pub fn pay(&mut self, date: NaiveDate) -> PayrollResult<()> {
        if self.status == SlipStatus::Paid {
            return Err(EntityError::InvalidTransition {
                entity_type: "salary slip".to_string(),
                from: "paid".to_string(),
                to: "paid".to_string(),
            }
            .into());
        }
        self.status = SlipStatus::Paid;
        self.paid_on = Some(date);
        self.touch();
        Ok(())
    }

    /// The salary expense booked when the slip is paid
    pub fn to_expense(&self) -> Expense {
        Expense::new(
            self.company_id,
            SALARY_CATEGORY.to_string(),
            self.breakdown.net,
            self.paid_on.unwrap_or_else(|| chrono::Utc::now().date_naive()),
            Some(format!("Salary {} for {}", self.period(), self.employee_name)),
            self.branch_id,
            None,
            Some(self.id),
        )
    }
}
