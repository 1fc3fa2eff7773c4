//! Pure business arithmetic: GST, salary heads, income-tax slabs and rollups
//!
//! Nothing in this module touches storage or HTTP. Handlers fetch records,
//! hand plain values to these functions and persist the results.

pub mod gst;
pub mod money;
pub mod rollup;
pub mod salary;
pub mod tax;

pub use gst::{GstBreakdown, SupplyType, calculate_gst};
pub use money::{round2, sum2};
pub use salary::{Calculation, HeadType, SalaryBreakdown, SalaryInput, compute_salary};
pub use tax::{TaxBand, compute_income_tax};

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the finance computations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FinanceError {
    #[error("amount must not be negative (got {0})")]
    NegativeAmount(Decimal),

    #[error("GST rate {rate}% is not one of the allowed rates {allowed:?}")]
    RateNotAllowed { rate: Decimal, allowed: Vec<Decimal> },

    #[error("percentage must be between 0 and 100 (got {0})")]
    InvalidPercentage(Decimal),

    #[error("working days must be greater than zero")]
    InvalidWorkingDays,

    #[error("paid days ({paid}) cannot exceed working days ({working})")]
    PaidDaysExceedWorking { paid: Decimal, working: Decimal },

    #[error("deductions exceed gross pay, net would be {0}")]
    NegativeNetPay(Decimal),

    #[error("unknown state '{0}'")]
    UnknownState(String),
}

impl FinanceError {
    /// Name of the input field the error is about
    pub fn field(&self) -> &'static str {
        match self {
            FinanceError::NegativeAmount(_) => "amount",
            FinanceError::RateNotAllowed { .. } => "gst_rate",
            FinanceError::InvalidPercentage(_) => "value",
            FinanceError::InvalidWorkingDays => "working_days",
            FinanceError::PaidDaysExceedWorking { .. } => "paid_days",
            FinanceError::NegativeNetPay(_) => "deductions",
            FinanceError::UnknownState(_) => "state",
        }
    }
}
