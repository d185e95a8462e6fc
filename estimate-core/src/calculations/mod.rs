//! Cost calculation pipeline.
//!
//! An edit flows through [`quantity`] (materials), [`labor`] (labor lines),
//! [`aggregate`] (line totals and subtotals) and finally [`sales_tax`].

pub mod aggregate;
pub mod common;
pub mod input;
pub mod labor;
pub mod quantity;
pub mod sales_tax;

pub use aggregate::{Subtotals, recalculate};
pub use input::{ParseDecimalError, parse_decimal, parse_decimal_or, parse_optional_decimal};
pub use labor::{applies_to, apply_labor_rule, is_installation};
pub use quantity::{ResolvedQuantity, is_net_measure, net_area_for, resolve_item, resolve_quantity};
pub use sales_tax::{apply_tax, compute_tax, resolve_jurisdiction};
