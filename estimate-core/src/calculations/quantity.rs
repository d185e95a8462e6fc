//! Quantity resolution: net area plus waste buffer, expressed in the unit the
//! material is actually bought in.
//!
//! The resolver is a pure function of (material name, net area, waste
//! percent). It is re-run on every change and its output is never cached as
//! an authority: a gross quantity loaded from storage is recomputed from the
//! stored net area before it is used.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use estimate_core::calculations::resolve_quantity;
//!
//! let resolved = resolve_quantity("Laminate Flooring", dec!(1350), dec!(10)).unwrap();
//!
//! assert_eq!(resolved.gross_area, dec!(1485));
//! assert_eq!(resolved.gross_quantity, dec!(68));
//! assert_eq!(resolved.unit, "boxes");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::calculations::common::{round_up_whole, waste_multiplier};
use crate::models::{CostItem, ResolveContext, SQ_FT};
use crate::rules::{CoverageRule, find_coverage};

/// Output of [`resolve_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQuantity {
    /// Purchasing unit, or `"sq ft"` when no coverage rule matched.
    pub unit: &'static str,
    /// Quantity to order in `unit`, always a whole number.
    pub gross_quantity: Decimal,
    /// `ceil(net × (1 + waste / 100))` in square feet.
    pub gross_area: Decimal,
    /// The net area the result was derived from.
    pub net_quantity: Decimal,
    /// The coverage rule that matched, if any.
    pub rule: Option<&'static CoverageRule>,
}

/// Converts a net area into a gross purchase quantity for `material`.
///
/// Returns `None` when `net_area` is zero or negative; callers keep the
/// quantity they already have in that case. Waste percentages outside 0–100
/// are clamped.
pub fn resolve_quantity(
    material: &str,
    net_area: Decimal,
    waste_percent: Decimal,
) -> Option<ResolvedQuantity> {
    if net_area <= Decimal::ZERO {
        return None;
    }

    let gross_area = round_up_whole(net_area * waste_multiplier(waste_percent));
    let rule = find_coverage(material);

    let (gross_quantity, unit) = match rule {
        Some(rule) if rule.divides() => (
            round_up_whole(gross_area / rule.coverage_per_unit),
            rule.unit,
        ),
        Some(rule) => (gross_area, rule.unit),
        None => (gross_area, SQ_FT),
    };

    Some(ResolvedQuantity {
        unit,
        gross_quantity,
        gross_area,
        net_quantity: net_area,
        rule,
    })
}

/// Whether `item.quantity` is a measurement the resolver can work from:
/// square feet, or the unit of a rule that only relabels (linear feet of
/// trim). Counts of boxes, sheets or gallons are not.
pub fn is_net_measure(item: &CostItem) -> bool {
    match find_coverage(&item.item) {
        Some(rule) if !rule.divides() => item.unit.trim().eq_ignore_ascii_case(rule.unit),
        _ => item.is_area_based(),
    }
}

/// Net area to resolve `item` from.
///
/// In order: the item's own `base_quantity`, the project base area, and
/// finally the item's quantity divided back by the waste multiplier when the
/// item is still in a net measure. The project base area only applies to
/// items measured in square feet whose material converts area into units;
/// trim keeps its own linear measurement. An item already counted in a
/// purchasing unit with no stored net area has nothing to re-divide.
pub fn net_area_for(
    item: &CostItem,
    ctx: &ResolveContext,
) -> Option<Decimal> {
    if let Some(base) = item.base_quantity.filter(|base| *base > Decimal::ZERO) {
        return Some(base);
    }
    let relabels = find_coverage(&item.item).is_some_and(|rule| !rule.divides());
    if item.is_area_based() && !relabels {
        if let Some(base) = ctx.usable_base_area() {
            return Some(base);
        }
    }
    if is_net_measure(item) && item.quantity > Decimal::ZERO {
        // Truncate so that re-applying the buffer lands back on the stored quantity.
        let net = (item.quantity / waste_multiplier(ctx.waste_percent))
            .round_dp_with_strategy(4, RoundingStrategy::ToZero);
        return Some(net.normalize());
    }
    None
}

/// Re-derives the gross quantity of an essential material in place and
/// refreshes its total.
///
/// Non-essential items and items without a usable net area keep their
/// quantity and unit. The total is recomputed either way.
pub fn resolve_item(
    item: &mut CostItem,
    ctx: &ResolveContext,
) {
    if item.is_essential {
        match net_area_for(item, ctx)
            .and_then(|net| resolve_quantity(&item.item, net, ctx.waste_percent))
        {
            Some(resolved) => {
                debug!(
                    item = %item.item,
                    net = %resolved.net_quantity,
                    gross_area = %resolved.gross_area,
                    quantity = %resolved.gross_quantity,
                    unit = resolved.unit,
                    "resolved material quantity"
                );
                item.base_quantity = Some(resolved.net_quantity);
                item.quantity = resolved.gross_quantity;
                item.unit = resolved.unit.to_string();
            }
            None => debug!(item = %item.item, "no net area available; keeping stored quantity"),
        }
    }
    item.recompute_total();
}
