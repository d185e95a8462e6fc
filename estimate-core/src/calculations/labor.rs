//! Labor lines for area-based installation work are billed on the installed
//! (net) area, never on the ordered quantity.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{CostItem, ResolveContext, SQ_FT};

/// Word stems that mark a line as installation labor. Matched at the start
/// of a word, so "hanging" and "laying" count but "underlayment" does not.
pub const INSTALLATION_KEYWORDS: &[&str] =
    &["install", "installation", "labor", "labour", "hang", "lay"];

/// Words that mark the work as priced per square foot of surface.
pub const AREA_WORK_KEYWORDS: &[&str] = &[
    "paint", "floor", "tile", "drywall", "laminate", "hardwood", "vinyl", "carpet", "ceiling",
    "wall",
];

/// True when some word of `description` starts with an installation stem.
pub fn is_installation(description: &str) -> bool {
    description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| INSTALLATION_KEYWORDS.iter().any(|k| word.starts_with(k)))
}

/// True when `description` names installation of area-based work.
pub fn applies_to(description: &str) -> bool {
    let lowered = description.to_lowercase();
    is_installation(&lowered) && AREA_WORK_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Forces an area-based labor line to the net area in square feet.
///
/// Uses the item's own base quantity, then the project base area. Lines the
/// rule does not cover, or with no net area available, keep their quantity.
/// The total is recomputed in every case.
pub fn apply_labor_rule(
    item: &mut CostItem,
    ctx: &ResolveContext,
) {
    if applies_to(&item.item) {
        let net = item
            .base_quantity
            .filter(|base| *base > Decimal::ZERO)
            .or_else(|| ctx.usable_base_area());

        if let Some(net) = net {
            debug!(item = %item.item, %net, "billing labor on net area");
            item.quantity = net;
            item.base_quantity = Some(net);
            item.unit = SQ_FT.to_string();
        }
    }
    item.recompute_total();
}
