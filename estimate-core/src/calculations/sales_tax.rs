//! Sales tax on a cost subtotal, by jurisdiction.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use estimate_core::calculations::compute_tax;
//!
//! let tax = compute_tax("Vancouver, BC", dec!(1000));
//!
//! assert_eq!(tax.jurisdiction_code, "BC");
//! assert_eq!(tax.total_tax, dec!(120.00));
//! assert_eq!(tax.grand_total, dec!(1120.00));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::models::{TaxBreakdown, TaxJurisdiction, TaxLine};
use crate::rules::{DEFAULT_JURISDICTION, match_address};

/// Jurisdiction for a free-text project address.
///
/// Empty or unrecognised addresses get the default (Ontario).
pub fn resolve_jurisdiction(address: &str) -> &'static TaxJurisdiction {
    if address.trim().is_empty() {
        return DEFAULT_JURISDICTION;
    }
    match match_address(address) {
        Some(rule) => {
            debug!(address, keyword = rule.keyword, code = rule.jurisdiction.code, "matched tax jurisdiction");
            rule.jurisdiction
        }
        None => {
            debug!(address, "no jurisdiction matched; using default");
            DEFAULT_JURISDICTION
        }
    }
}

/// Applies each tax component of `jurisdiction` to `subtotal`.
///
/// The subtotal and each component amount are rounded half-up to cents
/// before summing.
pub fn apply_tax(
    jurisdiction: &TaxJurisdiction,
    subtotal: Decimal,
) -> TaxBreakdown {
    let subtotal = round_half_up(subtotal);

    let lines: Vec<TaxLine> = jurisdiction
        .components
        .iter()
        .map(|component| TaxLine {
            name: component.name.to_string(),
            rate: component.rate,
            amount: round_half_up(subtotal * component.rate),
        })
        .collect();

    let total_tax = lines.iter().map(|line| line.amount).sum::<Decimal>();

    TaxBreakdown {
        jurisdiction_code: jurisdiction.code.to_string(),
        jurisdiction_name: jurisdiction.name.to_string(),
        lines,
        subtotal,
        total_tax,
        grand_total: subtotal + total_tax,
    }
}

/// Resolves the jurisdiction for `address` and applies it to `subtotal`.
pub fn compute_tax(
    address: &str,
    subtotal: Decimal,
) -> TaxBreakdown {
    apply_tax(resolve_jurisdiction(address), subtotal)
}
