//! Full recalculation of a breakdown: quantities, line totals, subtotals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::labor::apply_labor_rule;
use crate::calculations::quantity::resolve_item;
use crate::models::{CostBreakdown, CostSection, ResolveContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtotals {
    pub materials: Decimal,
    pub labor: Decimal,
    pub other: Decimal,
    pub subtotal: Decimal,
}

impl Subtotals {
    pub fn of(breakdown: &CostBreakdown) -> Self {
        let materials = breakdown.subtotal_of(CostSection::Materials);
        let labor = breakdown.subtotal_of(CostSection::Labor);
        let other = breakdown.subtotal_of(CostSection::Other);
        Self {
            materials,
            labor,
            other,
            subtotal: materials + labor + other,
        }
    }

    pub fn section(
        &self,
        section: CostSection,
    ) -> Decimal {
        match section {
            CostSection::Materials => self.materials,
            CostSection::Labor => self.labor,
            CostSection::Other => self.other,
        }
    }
}

/// Runs the quantity resolver over materials, the labor rule over labor, and
/// refreshes every line total.
pub fn recalculate(
    breakdown: &mut CostBreakdown,
    ctx: &ResolveContext,
) -> Subtotals {
    for item in &mut breakdown.materials {
        resolve_item(item, ctx);
    }
    for item in &mut breakdown.labor {
        apply_labor_rule(item, ctx);
    }
    for item in &mut breakdown.other {
        item.recompute_total();
    }
    Subtotals::of(breakdown)
}
