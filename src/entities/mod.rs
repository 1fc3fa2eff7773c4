//! Tenant-scoped records and their create/update payloads

#[macro_use]
pub mod macros;

pub mod company;
pub mod employee;
pub mod ledger;
pub mod order;
pub mod organization;
pub mod purchase;
pub mod salary;
pub mod salary_slip;

pub use company::Company;
pub use employee::{Employee, EmployeeStatus};
pub use ledger::{Expense, Revenue};
pub use order::{Order, OrderStatus, PaymentStatus};
pub use organization::{Branch, Department, Designation};
pub use purchase::Purchase;
pub use salary::{SalaryHead, SalarySetting, TaxSlab};
pub use salary_slip::{SalarySlip, SlipStatus};
