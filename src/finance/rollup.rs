//! Aggregations behind the dashboard and report endpoints

use super::money::{round2, sum2};
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Label used for payroll rows without a branch
pub const UNASSIGNED_BRANCH: &str = "Unassigned";

/// An amount booked on a date (revenue, expense, payment)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedAmount {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl DatedAmount {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self { date, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: u32,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyComparison {
    pub month: u32,
    pub revenue: Decimal,
    pub expense: Decimal,
    pub profit: Decimal,
}

/// Sum of all amounts
pub fn total(records: &[DatedAmount]) -> Decimal {
    sum2(records.iter().map(|r| r.amount))
}

/// Twelve monthly totals for `year`, months without records are zero
pub fn monthly_totals(records: &[DatedAmount], year: i32) -> Vec<MonthlyTotal> {
    let mut buckets = [Decimal::ZERO; 12];
    for record in records.iter().filter(|r| r.date.year() == year) {
        buckets[record.date.month0() as usize] += record.amount;
    }
    buckets
        .iter()
        .enumerate()
        .map(|(i, total)| MonthlyTotal {
            month: i as u32 + 1,
            total: round2(*total),
        })
        .collect()
}

/// Month-by-month revenue, expense and profit for `year`
pub fn revenue_vs_expense(
    revenues: &[DatedAmount],
    expenses: &[DatedAmount],
    year: i32,
) -> Vec<MonthlyComparison> {
    monthly_totals(revenues, year)
        .into_iter()
        .zip(monthly_totals(expenses, year))
        .map(|(revenue, expense)| MonthlyComparison {
            month: revenue.month,
            revenue: revenue.total,
            expense: expense.total,
            profit: round2(revenue.total - expense.total),
        })
        .collect()
}

/// Sum amounts per key, keys sorted
pub fn totals_by_key<K, I>(items: I) -> BTreeMap<K, Decimal>
where
    K: Ord,
    I: IntoIterator<Item = (K, Decimal)>,
{
    let mut totals = BTreeMap::new();
    for (key, amount) in items {
        let entry = totals.entry(key).or_insert(Decimal::ZERO);
        *entry = round2(*entry + amount);
    }
    totals
}

/// Count occurrences per key, keys sorted
pub fn counts_by_key<K, I>(keys: I) -> BTreeMap<K, usize>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Net pay of one salary slip, located in a branch and a month
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollEntry {
    pub branch_id: Option<Uuid>,
    pub year: i32,
    pub month: u32,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchPayroll {
    pub branch_id: Option<Uuid>,
    pub branch_name: String,
    pub months: Vec<MonthlyTotal>,
    pub total: Decimal,
}

/// Net payroll per branch and month for `year`.
///
/// Every branch in `branches` appears, in the given order, even without
/// slips. Slips without a branch (or with a branch no longer listed) are
/// grouped under [`UNASSIGNED_BRANCH`] after the known branches.
pub fn branch_wise_monthly_payroll(
    entries: &[PayrollEntry],
    branches: &[(Uuid, String)],
    year: i32,
) -> Vec<BranchPayroll> {
    let mut grouped: IndexMap<Option<Uuid>, (String, [Decimal; 12])> = branches
        .iter()
        .map(|(id, name)| (Some(*id), (name.clone(), [Decimal::ZERO; 12])))
        .collect();

    for entry in entries.iter().filter(|e| e.year == year) {
        if !(1..=12).contains(&entry.month) {
            continue;
        }
        let key = entry.branch_id.filter(|id| grouped.contains_key(&Some(*id)));
        let (_, months) = grouped
            .entry(key)
            .or_insert_with(|| (UNASSIGNED_BRANCH.to_string(), [Decimal::ZERO; 12]));
        months[entry.month as usize - 1] += entry.net;
    }

    grouped
        .into_iter()
        .map(|(branch_id, (branch_name, months))| {
            let months: Vec<MonthlyTotal> = months
                .iter()
                .enumerate()
                .map(|(i, total)| MonthlyTotal {
                    month: i as u32 + 1,
                    total: round2(*total),
                })
                .collect();
            let total = sum2(months.iter().map(|m| m.total));
            BranchPayroll {
                branch_id,
                branch_name,
                months,
                total,
            }
        })
        .collect()
}
