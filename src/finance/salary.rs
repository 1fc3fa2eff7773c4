//! Salary head evaluation and monthly salary computation

use super::FinanceError;
use super::gst::is_percentage;
use super::money::{percent_of, round2, sum2};
use super::tax::{TaxBand, compute_income_tax};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Whether a head adds to or subtracts from pay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadType {
    Earning,
    Deduction,
}

/// How a head's value is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calculation {
    /// `value` is a monthly amount
    Fixed,
    /// `value` is a percentage of basic salary
    PercentageOfBasic,
}

/// Monthly value of a head for a given basic salary.
///
/// Fixed heads return their amount; percentage heads return
/// `basic * value / 100`. Both are rounded to 2 decimals.
pub fn applicable_value(
    calculation: Calculation,
    value: Decimal,
    basic_salary: Decimal,
) -> Result<Decimal, FinanceError> {
    match calculation {
        Calculation::Fixed => {
            if value < Decimal::ZERO {
                return Err(FinanceError::NegativeAmount(value));
            }
            Ok(round2(value))
        }
        Calculation::PercentageOfBasic => {
            if !is_percentage(value) {
                return Err(FinanceError::InvalidPercentage(value));
            }
            Ok(round2(percent_of(basic_salary, value)))
        }
    }
}

/// One configured head as seen by the computation
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryComponent {
    pub name: String,
    pub head_type: HeadType,
    pub calculation: Calculation,
    pub value: Decimal,
}

/// Income-tax withholding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TdsInput {
    pub bands: Vec<TaxBand>,
    pub cess_percent: Decimal,
}

/// Everything needed to compute one month of pay
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryInput {
    pub basic_salary: Decimal,
    pub components: Vec<SalaryComponent>,
    pub working_days: Decimal,
    pub paid_days: Decimal,
    pub tds: Option<TdsInput>,
}

/// Result of a salary computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub basic: Decimal,
    pub earnings: IndexMap<String, Decimal>,
    pub deductions: IndexMap<String, Decimal>,
    pub gross: Decimal,
    pub total_deductions: Decimal,
    pub tds: Decimal,
    pub net: Decimal,
}

/// Compute a month of pay.
///
/// Basic and every head are prorated by `paid_days / working_days`. TDS is
/// the monthly share of income tax on the projected annual gross of a full
/// month and is not prorated.
pub fn compute_salary(input: &SalaryInput) -> Result<SalaryBreakdown, FinanceError> {
    if input.basic_salary < Decimal::ZERO {
        return Err(FinanceError::NegativeAmount(input.basic_salary));
    }
    if input.working_days <= Decimal::ZERO {
        return Err(FinanceError::InvalidWorkingDays);
    }
    if input.paid_days < Decimal::ZERO {
        return Err(FinanceError::NegativeAmount(input.paid_days));
    }
    if input.paid_days > input.working_days {
        return Err(FinanceError::PaidDaysExceedWorking {
            paid: input.paid_days,
            working: input.working_days,
        });
    }

    let prorate = |full: Decimal| round2(full * input.paid_days / input.working_days);
    let basic = prorate(input.basic_salary);

    let mut earnings: IndexMap<String, Decimal> = IndexMap::new();
    let mut deductions: IndexMap<String, Decimal> = IndexMap::new();
    let mut full_month_earnings = Decimal::ZERO;

    for component in &input.components {
        let full = applicable_value(component.calculation, component.value, input.basic_salary)?;
        let prorated = prorate(full);
        let bucket = match component.head_type {
            HeadType::Earning => {
                full_month_earnings += full;
                &mut earnings
            }
            HeadType::Deduction => &mut deductions,
        };
        let entry = bucket.entry(component.name.clone()).or_insert(Decimal::ZERO);
        *entry = round2(*entry + prorated);
    }

    let gross = round2(basic + sum2(earnings.values().copied()));
    let total_deductions = sum2(deductions.values().copied());

    let tds = match &input.tds {
        Some(tds) => {
            let annual_gross = (input.basic_salary + full_month_earnings) * MONTHS_PER_YEAR;
            let annual_tax = compute_income_tax(annual_gross, &tds.bands, tds.cess_percent);
            round2(annual_tax / MONTHS_PER_YEAR)
        }
        None => Decimal::ZERO,
    };

    let net = round2(gross - total_deductions - tds);
    if net < Decimal::ZERO {
        return Err(FinanceError::NegativeNetPay(net));
    }

    Ok(SalaryBreakdown {
        basic,
        earnings,
        deductions,
        gross,
        total_deductions,
        tds,
        net,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::money::d;

    fn component(
        name: &str,
        head_type: HeadType,
        calculation: Calculation,
        value: &str,
    ) -> SalaryComponent {
        SalaryComponent {
            name: name.to_string(),
            head_type,
            calculation,
            value: d(value),
        }
    }

    fn standard_input() -> SalaryInput {
        SalaryInput {
            basic_salary: d("30000"),
            components: vec![
                component("HRA", HeadType::Earning, Calculation::PercentageOfBasic, "40"),
                component("Conveyance", HeadType::Earning, Calculation::Fixed, "1600"),
                component("PF", HeadType::Deduction, Calculation::PercentageOfBasic, "12"),
                component("Professional Tax", HeadType::Deduction, Calculation::Fixed, "200"),
            ],
            working_days: d("30"),
            paid_days: d("30"),
            tds: None,
        }
    }

    #[test]
    fn test_percentage_head_value() {
        assert_eq!(
            applicable_value(Calculation::PercentageOfBasic, d("12.5"), d("33333")).unwrap(),
            d("4166.63")
        );
        assert_eq!(
            applicable_value(Calculation::Fixed, d("1600.004"), Decimal::ZERO).unwrap(),
            d("1600")
        );
    }

    #[test]
    fn test_percentage_out_of_range() {
        assert_eq!(
            applicable_value(Calculation::PercentageOfBasic, d("150"), d("1000")),
            Err(FinanceError::InvalidPercentage(d("150")))
        );
    }

    #[test]
    fn test_full_month() {
        let breakdown = compute_salary(&standard_input()).unwrap();
        assert_eq!(breakdown.basic, d("30000"));
        assert_eq!(breakdown.earnings["HRA"], d("12000"));
        assert_eq!(breakdown.earnings["Conveyance"], d("1600"));
        assert_eq!(breakdown.gross, d("43600"));
        assert_eq!(breakdown.deductions["PF"], d("3600"));
        assert_eq!(breakdown.total_deductions, d("3800"));
        assert_eq!(breakdown.tds, Decimal::ZERO);
        assert_eq!(breakdown.net, d("39800"));
    }

    #[test]
    fn test_heads_keep_configured_order() {
        let breakdown = compute_salary(&standard_input()).unwrap();
        let names: Vec<&String> = breakdown.earnings.keys().collect();
        assert_eq!(names, vec!["HRA", "Conveyance"]);
    }

    #[test]
    fn test_prorated_month() {
        let mut input = standard_input();
        input.paid_days = d("15");
        let breakdown = compute_salary(&input).unwrap();
        assert_eq!(breakdown.basic, d("15000"));
        assert_eq!(breakdown.earnings["HRA"], d("6000"));
        assert_eq!(breakdown.gross, d("21800"));
        assert_eq!(breakdown.net, d("19900"));
    }

    #[test]
    fn test_proration_rounds_each_head_to_paise() {
        let mut input = standard_input();
        input.working_days = d("26");
        input.paid_days = d("20");
        let breakdown = compute_salary(&input).unwrap();
        // 30000 * 20 / 26 = 23076.923...
        assert_eq!(breakdown.basic, d("23076.92"));
        // 1600 * 20 / 26 = 1230.769...
        assert_eq!(breakdown.earnings["Conveyance"], d("1230.77"));
    }

    #[test]
    fn test_paid_days_exceeding_working_days() {
        let mut input = standard_input();
        input.paid_days = d("31");
        assert!(matches!(
            compute_salary(&input),
            Err(FinanceError::PaidDaysExceedWorking { .. })
        ));
    }

    #[test]
    fn test_zero_working_days() {
        let mut input = standard_input();
        input.working_days = Decimal::ZERO;
        input.paid_days = Decimal::ZERO;
        assert_eq!(compute_salary(&input), Err(FinanceError::InvalidWorkingDays));
    }

    #[test]
    fn test_negative_net_rejected() {
        let mut input = standard_input();
        input
            .components
            .push(component("Loan", HeadType::Deduction, Calculation::Fixed, "50000"));
        assert!(matches!(
            compute_salary(&input),
            Err(FinanceError::NegativeNetPay(_))
        ));
    }

    #[test]
    fn test_tds_from_slabs() {
        let mut input = standard_input();
        input.tds = Some(TdsInput {
            bands: vec![
                TaxBand::new(Decimal::ZERO, Some(d("300000")), Decimal::ZERO),
                TaxBand::new(d("300000"), Some(d("700000")), d("5")),
                TaxBand::new(d("700000"), None, d("10")),
            ],
            cess_percent: Decimal::ZERO,
        });
        // annual gross 523200: 5% of 223200 = 11160, monthly 930
        let breakdown = compute_salary(&input).unwrap();
        assert_eq!(breakdown.tds, d("930"));
        assert_eq!(breakdown.net, d("38870"));
    }
}
