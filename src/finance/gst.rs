//! GST computation and state resolution
//!
//! A supply inside one state is taxed as CGST + SGST, split evenly. A supply
//! across states is taxed wholly as IGST. States may be given by name, by
//! two-digit GST state code, or as a full GSTIN whose first two digits are the
//! state code.

use super::FinanceError;
use super::money::{percent_of, round2};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// GST state codes and their names
const STATES: &[(u8, &str)] = &[
    (1, "jammu and kashmir"),
    (2, "himachal pradesh"),
    (3, "punjab"),
    (4, "chandigarh"),
    (5, "uttarakhand"),
    (6, "haryana"),
    (7, "delhi"),
    (8, "rajasthan"),
    (9, "uttar pradesh"),
    (10, "bihar"),
    (11, "sikkim"),
    (12, "arunachal pradesh"),
    (13, "nagaland"),
    (14, "manipur"),
    (15, "mizoram"),
    (16, "tripura"),
    (17, "meghalaya"),
    (18, "assam"),
    (19, "west bengal"),
    (20, "jharkhand"),
    (21, "odisha"),
    (22, "chhattisgarh"),
    (23, "madhya pradesh"),
    (24, "gujarat"),
    (26, "dadra and nagar haveli and daman and diu"),
    (27, "maharashtra"),
    (29, "karnataka"),
    (30, "goa"),
    (31, "lakshadweep"),
    (32, "kerala"),
    (33, "tamil nadu"),
    (34, "puducherry"),
    (35, "andaman and nicobar islands"),
    (36, "telangana"),
    (37, "andhra pradesh"),
    (38, "ladakh"),
];

fn gstin_regex() -> &'static Regex {
    static GSTIN: OnceLock<Regex> = OnceLock::new();
    GSTIN.get_or_init(|| {
        // Literal pattern; compilation cannot fail.
        Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$")
            .unwrap_or_else(|_| unreachable!("GSTIN pattern is valid"))
    })
}

/// Check the 15-character GSTIN shape
pub fn is_valid_gstin(gstin: &str) -> bool {
    gstin_regex().is_match(gstin.trim())
}

/// State code carried by a GSTIN, if it is well formed
pub fn state_code_from_gstin(gstin: &str) -> Option<u8> {
    let gstin = gstin.trim();
    if !is_valid_gstin(gstin) {
        return None;
    }
    let code: u8 = gstin.get(0..2)?.parse().ok()?;
    STATES.iter().any(|(c, _)| *c == code).then_some(code)
}

fn normalize_state(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up the state code for a state name
pub fn state_code_for_name(name: &str) -> Option<u8> {
    let normalized = normalize_state(name);
    STATES
        .iter()
        .find(|(_, n)| *n == normalized)
        .map(|(code, _)| *code)
}

/// Resolve a state given as a name, a two-digit code or a GSTIN
pub fn resolve_state(input: &str) -> Result<u8, FinanceError> {
    let trimmed = input.trim();
    if let Some(code) = state_code_from_gstin(trimmed) {
        return Ok(code);
    }
    if trimmed.len() == 2
        && let Ok(code) = trimmed.parse::<u8>()
        && STATES.iter().any(|(c, _)| *c == code)
    {
        return Ok(code);
    }
    state_code_for_name(trimmed).ok_or_else(|| FinanceError::UnknownState(input.to_string()))
}

/// How a supply is taxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    IntraState,
    InterState,
}

impl SupplyType {
    /// Compare supplier and recipient states.
    ///
    /// Known states are compared by code; unknown spellings fall back to a
    /// normalized name comparison.
    pub fn between(supplier_state: &str, recipient_state: &str) -> Self {
        let same = match (resolve_state(supplier_state), resolve_state(recipient_state)) {
            (Ok(a), Ok(b)) => a == b,
            _ => normalize_state(supplier_state) == normalize_state(recipient_state),
        };
        if same {
            SupplyType::IntraState
        } else {
            SupplyType::InterState
        }
    }
}

/// Tax split for one taxable amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstBreakdown {
    pub taxable_amount: Decimal,
    pub rate: Decimal,
    pub supply_type: SupplyType,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub total_tax: Decimal,
    pub total_amount: Decimal,
}

/// Reject rates outside the configured set
pub fn check_rate(rate: Decimal, allowed: &[Decimal]) -> Result<(), FinanceError> {
    if allowed.is_empty() || allowed.contains(&rate) {
        Ok(())
    } else {
        Err(FinanceError::RateNotAllowed {
            rate,
            allowed: allowed.to_vec(),
        })
    }
}

/// Whether `value` is a percentage in `0..=100`
pub fn is_percentage(value: Decimal) -> bool {
    (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&value)
}

/// Compute the GST on `amount` at `rate` percent.
///
/// The total tax is rounded once; for intra-state supply CGST takes the
/// rounded half and SGST the remainder, so the two always add up to the
/// total even when the total has an odd paisa.
pub fn calculate_gst(
    amount: Decimal,
    rate: Decimal,
    supplier_state: &str,
    recipient_state: &str,
) -> Result<GstBreakdown, FinanceError> {
    if amount < Decimal::ZERO {
        return Err(FinanceError::NegativeAmount(amount));
    }
    if !is_percentage(rate) {
        return Err(FinanceError::InvalidPercentage(rate));
    }

    let taxable_amount = round2(amount);
    let total_tax = round2(percent_of(taxable_amount, rate));
    let supply_type = SupplyType::between(supplier_state, recipient_state);

    let (cgst, sgst, igst) = match supply_type {
        SupplyType::IntraState => {
            let cgst = round2(total_tax / Decimal::TWO);
            (cgst, total_tax - cgst, Decimal::ZERO)
        }
        SupplyType::InterState => (Decimal::ZERO, Decimal::ZERO, total_tax),
    };

    Ok(GstBreakdown {
        taxable_amount,
        rate,
        supply_type,
        cgst,
        sgst,
        igst,
        total_tax,
        total_amount: taxable_amount + total_tax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::money::d;

    #[test]
    fn test_intra_state_splits_evenly() {
        let gst = calculate_gst(d("1000"), d("18"), "Maharashtra", "maharashtra").unwrap();
        assert_eq!(gst.supply_type, SupplyType::IntraState);
        assert_eq!(gst.total_tax, d("180"));
        assert_eq!(gst.cgst, d("90"));
        assert_eq!(gst.sgst, d("90"));
        assert_eq!(gst.igst, Decimal::ZERO);
        assert_eq!(gst.total_amount, d("1180"));
    }

    #[test]
    fn test_inter_state_goes_to_igst() {
        let gst = calculate_gst(d("1000"), d("18"), "Maharashtra", "Karnataka").unwrap();
        assert_eq!(gst.supply_type, SupplyType::InterState);
        assert_eq!(gst.igst, d("180"));
        assert_eq!(gst.cgst, Decimal::ZERO);
        assert_eq!(gst.sgst, Decimal::ZERO);
    }

    #[test]
    fn test_odd_paisa_split_still_sums_to_total() {
        // 18% of 100.05 = 18.009 -> 18.01, which does not halve evenly
        let gst = calculate_gst(d("100.05"), d("18"), "Goa", "Goa").unwrap();
        assert_eq!(gst.total_tax, d("18.01"));
        assert_eq!(gst.cgst, d("9.01"));
        assert_eq!(gst.sgst, d("9.00"));
    }

    #[test]
    fn test_half_paisa_on_large_amounts_rounds_up() {
        // 18% of 190833315.25 is exactly 34349996.745
        let gst = calculate_gst(d("190833315.25"), d("18"), "Goa", "Kerala").unwrap();
        assert_eq!(gst.igst, d("34349996.75"));
        assert_eq!(gst.total_amount, d("225183312.00"));
    }

    #[test]
    fn test_tax_matches_exact_paise_rounding() {
        // half-up on integer paise, computed independently of Decimal rounding
        for paise in (1_u64..2_000_000).step_by(7919).chain([19_083_331_525]) {
            for rate in [5_u64, 12, 18, 28] {
                let exact = (paise * rate + 50) / 100;
                let amount = Decimal::new(paise as i64, 2);
                let gst = calculate_gst(amount, Decimal::from(rate), "Delhi", "Goa").unwrap();
                assert_eq!(gst.total_tax, Decimal::new(exact as i64, 2), "{} @ {}%", amount, rate);
            }
        }
    }

    #[test]
    fn test_gstin_state_code_matches_name() {
        let gst = calculate_gst(d("500"), d("5"), "27AAPFU0939F1ZV", "Maharashtra").unwrap();
        assert_eq!(gst.supply_type, SupplyType::IntraState);
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert_eq!(
            calculate_gst(d("-1"), d("18"), "Goa", "Goa"),
            Err(FinanceError::NegativeAmount(d("-1")))
        );
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        assert!(matches!(
            calculate_gst(d("10"), d("120"), "Goa", "Goa"),
            Err(FinanceError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn test_check_rate() {
        let allowed = [d("0"), d("5"), d("12"), d("18"), d("28")];
        assert!(check_rate(d("18"), &allowed).is_ok());
        assert!(check_rate(d("18.00"), &allowed).is_ok());
        assert!(check_rate(d("7"), &allowed).is_err());
        assert!(check_rate(d("7"), &[]).is_ok());
    }

    #[test]
    fn test_resolve_state_variants() {
        assert_eq!(resolve_state("Tamil Nadu").unwrap(), 33);
        assert_eq!(resolve_state("  tamil   nadu ").unwrap(), 33);
        assert_eq!(resolve_state("33").unwrap(), 33);
        assert_eq!(resolve_state("Andaman & Nicobar Islands").unwrap(), 35);
        assert!(resolve_state("Atlantis").is_err());
    }

    #[test]
    fn test_gstin_validation() {
        assert!(is_valid_gstin("29ABCDE1234F1Z5"));
        assert!(!is_valid_gstin("29ABCDE1234F1X5"));
        assert!(!is_valid_gstin("short"));
        assert_eq!(state_code_from_gstin("29ABCDE1234F1Z5"), Some(29));
    }

    #[test]
    fn test_unknown_states_compare_by_name() {
        assert_eq!(SupplyType::between("Export", "export"), SupplyType::IntraState);
        assert_eq!(SupplyType::between("Export", "Goa"), SupplyType::InterState);
    }
}
