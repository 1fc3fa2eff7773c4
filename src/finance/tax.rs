//! Progressive income tax over configured slabs

use super::money::{percent_of, round2};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One slab: income above `min_income` up to `max_income` is taxed at `rate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBand {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBand {
    pub fn new(min_income: Decimal, max_income: Option<Decimal>, rate: Decimal) -> Self {
        Self {
            min_income,
            max_income,
            rate,
        }
    }

    /// Whether `income` lies below this band's upper bound (open bands have none)
    fn below_upper(&self, income: Decimal) -> bool {
        self.max_income.is_none_or(|max| income < max)
    }

    /// Portion of `income` that falls into this band
    pub fn taxable_portion(&self, income: Decimal) -> Decimal {
        if income <= self.min_income {
            return Decimal::ZERO;
        }
        let capped = match self.max_income {
            Some(max) => income.min(max),
            None => income,
        };
        capped - self.min_income
    }
}

/// Whether two bands cover any common income range.
///
/// Bands are half-open `(min, max]`, so a band ending at 300000 and one
/// starting at 300000 do not overlap.
pub fn bands_overlap(a: &TaxBand, b: &TaxBand) -> bool {
    a.below_upper(b.min_income) && b.below_upper(a.min_income)
}

/// Annual income tax on `income`, plus `cess_percent` on the tax
pub fn compute_income_tax(income: Decimal, bands: &[TaxBand], cess_percent: Decimal) -> Decimal {
    if income <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let tax: Decimal = bands
        .iter()
        .map(|band| percent_of(band.taxable_portion(income), band.rate))
        .sum();

    round2(tax + percent_of(tax, cess_percent))
}
