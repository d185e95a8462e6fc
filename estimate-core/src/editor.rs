//! In-memory editing session for one cost breakdown.
//!
//! Every mutation re-runs the whole pipeline (quantity resolver, labor rule,
//! line totals) so the breakdown is never observed with stale numbers, and
//! marks the session unsaved until [`BreakdownEditor::mark_saved`] is called.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::calculations::common::clamp_percent;
use crate::calculations::input::parse_decimal_or;
use crate::calculations::labor::is_installation;
use crate::calculations::{Subtotals, compute_tax, is_net_measure, recalculate};
use crate::models::{
    CostBreakdown, CostItem, CostSection, EstimateDocument, NewSavedBreakdown, ResolveContext,
    SavedBreakdown, SeedItem, SeedSource, TaxBreakdown,
};
use crate::rules::find_coverage;

/// A single field change on an existing line.
///
/// Numeric edits carry the raw text the user typed; text that is not a
/// number keeps the previous value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEdit {
    Name(String),
    Unit(String),
    /// On an essential material this is read as the net area in square feet,
    /// since its ordered quantity is always derived.
    Quantity(String),
    UnitPrice(String),
    BaseQuantity(String),
    Essential(bool),
}

/// Picks the section for a seed item that did not name one.
pub fn classify(name: &str) -> (CostSection, bool) {
    if is_installation(name) {
        (CostSection::Labor, false)
    } else if find_coverage(name).is_some() {
        (CostSection::Materials, true)
    } else {
        (CostSection::Other, false)
    }
}

#[derive(Debug, Clone)]
pub struct BreakdownEditor {
    project_name: String,
    address: String,
    ctx: ResolveContext,
    breakdown: CostBreakdown,
    next_id: u64,
    dirty: bool,
}

impl BreakdownEditor {
    pub fn new(
        project_name: impl Into<String>,
        ctx: ResolveContext,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            address: String::new(),
            ctx: ResolveContext::new(ctx.base_area, clamp_percent(ctx.waste_percent)),
            breakdown: CostBreakdown::default(),
            next_id: 0,
            dirty: false,
        }
    }

    /// Reopens a stored breakdown. Stored totals are not trusted and are
    /// recomputed immediately.
    pub fn from_saved(saved: &SavedBreakdown) -> Self {
        let mut editor = Self::new(saved.project_name.clone(), saved.context());
        editor.address = saved.address.clone();
        editor.breakdown = saved.breakdown.clone();
        editor.next_id = saved.breakdown.len() as u64;
        editor.refresh();
        editor.dirty = false;
        editor
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn context(&self) -> ResolveContext {
        self.ctx
    }

    pub fn breakdown(&self) -> &CostBreakdown {
        &self.breakdown
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn allocate_id(
        &mut self,
        section: CostSection,
    ) -> String {
        let prefix = match section {
            CostSection::Materials => "m",
            CostSection::Labor => "l",
            CostSection::Other => "o",
        };
        loop {
            self.next_id += 1;
            let id = format!("{prefix}{}", self.next_id);
            if !self.breakdown.items().any(|(_, item)| item.id == id) {
                return id;
            }
        }
    }

    fn refresh(&mut self) -> Subtotals {
        self.dirty = true;
        recalculate(&mut self.breakdown, &self.ctx)
    }

    /// Appends upstream lines, classifying those without an explicit section.
    pub fn seed(
        &mut self,
        items: impl IntoIterator<Item = SeedItem>,
        source: SeedSource,
    ) -> Subtotals {
        let mut count = 0usize;
        for seed in items {
            let (section, essential) = match seed.section {
                Some(CostSection::Materials) => {
                    (CostSection::Materials, find_coverage(&seed.item).is_some())
                }
                Some(section) => (section, false),
                None => classify(&seed.item),
            };
            let id = self.allocate_id(section);
            let mut item = CostItem::new(
                id,
                seed.item,
                seed.quantity,
                seed.unit,
                seed.unit_price.unwrap_or(Decimal::ZERO),
            );
            item.is_essential = essential;
            // Labor lines take their net area from the project, never from a
            // seeded (possibly gross) quantity.
            if essential && is_net_measure(&item) && item.quantity > Decimal::ZERO {
                item.base_quantity = Some(item.quantity);
            }
            debug!(item = %item.item, section = section.as_str(), essential, "seeded cost line");
            self.breakdown.section_mut(section).push(item);
            count += 1;
        }
        info!(count, source = source.as_str(), "seeded breakdown");
        self.refresh()
    }

    /// Adds a manual line and returns its id.
    pub fn add_item(
        &mut self,
        section: CostSection,
        name: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
    ) -> String {
        let name = name.into();
        let id = self.allocate_id(section);
        let mut item = CostItem::new(id.clone(), name, quantity, unit, unit_price);
        item.is_essential = section == CostSection::Materials && find_coverage(&item.item).is_some();
        if item.is_essential && is_net_measure(&item) && quantity > Decimal::ZERO {
            item.base_quantity = Some(quantity);
        }
        self.breakdown.section_mut(section).push(item);
        self.refresh();
        id
    }

    /// Removes a line; returns it if it existed.
    pub fn remove_item(
        &mut self,
        section: CostSection,
        id: &str,
    ) -> Option<CostItem> {
        let items = self.breakdown.section_mut(section);
        let index = items.iter().position(|item| item.id == id)?;
        let removed = items.remove(index);
        self.refresh();
        Some(removed)
    }

    /// Applies one field edit. Returns false when no such line exists.
    ///
    /// [`ItemEdit::Quantity`] on an essential material is read as its net
    /// area in square feet (linear feet for trim), not as a count in the
    /// displayed unit: typing 70 on a 68-box laminate line orders 4 boxes.
    pub fn edit_item(
        &mut self,
        section: CostSection,
        id: &str,
        edit: ItemEdit,
    ) -> bool {
        let Some(item) = self.breakdown.find_mut(section, id) else {
            warn!(section = section.as_str(), id, "edit for unknown cost line ignored");
            return false;
        };
        match edit {
            ItemEdit::Name(name) => item.item = name,
            ItemEdit::Unit(unit) => item.unit = unit,
            ItemEdit::Quantity(text) if item.is_essential => {
                let previous = item.base_quantity.unwrap_or(item.quantity);
                item.base_quantity = Some(parse_decimal_or(&text, previous));
            }
            ItemEdit::Quantity(text) => item.quantity = parse_decimal_or(&text, item.quantity),
            ItemEdit::UnitPrice(text) => item.unit_price = parse_decimal_or(&text, item.unit_price),
            ItemEdit::BaseQuantity(text) => {
                let previous = item.base_quantity.unwrap_or(Decimal::ZERO);
                let base = parse_decimal_or(&text, previous);
                item.base_quantity = (base > Decimal::ZERO).then_some(base);
            }
            ItemEdit::Essential(essential) => item.is_essential = essential,
        }
        self.refresh();
        true
    }

    /// Changes the project net area.
    ///
    /// Lines whose net area was taken from the previous project area follow
    /// the new one; lines with their own measurement keep it. Clearing the
    /// area leaves every line's last net area in place.
    pub fn set_base_area(
        &mut self,
        base_area: Option<Decimal>,
    ) -> Subtotals {
        let previous = self.ctx.usable_base_area();
        let next = base_area.filter(|area| *area > Decimal::ZERO);
        if let (Some(previous), Some(next)) = (previous, next) {
            for section in [CostSection::Materials, CostSection::Labor] {
                for item in self.breakdown.section_mut(section) {
                    if item.base_quantity == Some(previous) {
                        item.base_quantity = Some(next);
                    }
                }
            }
        }
        self.ctx.base_area = next;
        self.refresh()
    }

    /// Sets the waste buffer, clamped to 0..=100.
    pub fn set_waste_percent(
        &mut self,
        waste_percent: Decimal,
    ) -> Subtotals {
        self.ctx.waste_percent = clamp_percent(waste_percent);
        self.refresh()
    }

    pub fn set_address(
        &mut self,
        address: impl Into<String>,
    ) {
        self.address = address.into();
        self.dirty = true;
    }

    pub fn set_project_name(
        &mut self,
        project_name: impl Into<String>,
    ) {
        self.project_name = project_name.into();
        self.dirty = true;
    }

    pub fn subtotals(&self) -> Subtotals {
        Subtotals::of(&self.breakdown)
    }

    pub fn totals(&self) -> TaxBreakdown {
        compute_tax(&self.address, self.breakdown.subtotal())
    }

    pub fn document(&self) -> EstimateDocument {
        EstimateDocument {
            project_name: self.project_name.clone(),
            address: self.address.clone(),
            base_area: self.ctx.base_area,
            waste_percent: self.ctx.waste_percent,
            breakdown: self.breakdown.clone(),
            tax: self.totals(),
        }
    }

    /// Snapshot handed to the persistence collaborator.
    pub fn save_payload(&self) -> NewSavedBreakdown {
        let tax = self.totals();
        NewSavedBreakdown {
            project_name: self.project_name.clone(),
            address: self.address.clone(),
            base_area: self.ctx.base_area,
            waste_percent: self.ctx.waste_percent,
            breakdown: self.breakdown.clone(),
            subtotal: tax.subtotal,
            total_tax: tax.total_tax,
            grand_total: tax.grand_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn flooring_seed() -> Vec<SeedItem> {
        vec![
            SeedItem::new("Laminate Flooring", dec!(1350), "sq ft").priced(dec!(45)),
            SeedItem::new("Laminate installation", dec!(1350), "sq ft").priced(dec!(2)),
            SeedItem::new("Disposal bin", dec!(1), "each").priced(dec!(350)),
        ]
    }

    fn seeded() -> BreakdownEditor {
        let mut editor = BreakdownEditor::new("Living room", ResolveContext::default());
        editor.seed(flooring_seed(), SeedSource::PhotoEstimate);
        editor
    }

    #[test]
    fn seeding_classifies_and_resolves_lines() {
        let editor = seeded();
        let breakdown = editor.breakdown();

        assert_eq!(breakdown.materials.len(), 1);
        assert_eq!(breakdown.labor.len(), 1);
        assert_eq!(breakdown.other.len(), 1);

        let laminate = &breakdown.materials[0];
        assert!(laminate.is_essential);
        assert_eq!(laminate.quantity, dec!(68));
        assert_eq!(laminate.unit, "boxes");
        assert_eq!(laminate.base_quantity, Some(dec!(1350)));
        assert_eq!(laminate.total_price, dec!(3060));

        assert_eq!(breakdown.labor[0].quantity, dec!(1350));
        assert!(editor.is_dirty());
    }

    #[test]
    fn seeded_labor_bills_project_net_area_not_gross() {
        let mut editor = BreakdownEditor::new("Den", ResolveContext::new(Some(dec!(1350)), dec!(10)));
        editor.seed(
            [SeedItem::new("Laminate installation", dec!(1485), "sq ft").priced(dec!(2.25))],
            SeedSource::Calculator,
        );

        let install = &editor.breakdown().labor[0];
        assert_eq!(install.quantity, dec!(1350));
        assert_eq!(install.unit, "sq ft");
        assert_eq!(install.total_price, dec!(3037.50));
    }

    #[test]
    fn seeded_trim_and_counted_materials_ignore_project_area() {
        let mut editor = BreakdownEditor::new("Den", ResolveContext::new(Some(dec!(1350)), dec!(10)));
        editor.seed(
            [
                SeedItem::new("Baseboard trim", dec!(180), "linear ft").priced(dec!(1.85)),
                SeedItem::new("Ceramic tile", dec!(10), "boxes").priced(dec!(60)),
            ],
            SeedSource::PhotoEstimate,
        );

        let trim = &editor.breakdown().materials[0];
        assert_eq!(trim.quantity, dec!(198));
        assert_eq!(trim.unit, "linear ft");
        assert_eq!(trim.base_quantity, Some(dec!(180)));

        let tile = &editor.breakdown().materials[1];
        assert_eq!(tile.quantity, dec!(10));
        assert_eq!(tile.unit, "boxes");
    }

    #[test]
    fn explicit_section_wins_over_keywords() {
        let mut editor = BreakdownEditor::new("Hall", ResolveContext::default());
        editor.seed(
            [SeedItem::new("Paint installation kit", dec!(2), "each").in_section(CostSection::Other)],
            SeedSource::Template,
        );

        assert_eq!(editor.breakdown().other.len(), 1);
        assert!(!editor.breakdown().other[0].is_essential);
    }

    #[test]
    fn classify_by_name() {
        assert_eq!(classify("Drywall hanging"), (CostSection::Labor, false));
        assert_eq!(classify("Drywall sheets"), (CostSection::Materials, true));
        assert_eq!(classify("Permit fee"), (CostSection::Other, false));
    }

    #[test]
    fn waste_change_re_resolves_essential_materials() {
        let mut editor = seeded();

        editor.set_waste_percent(dec!(0));

        let laminate = &editor.breakdown().materials[0];
        assert_eq!(laminate.quantity, dec!(62));
        assert_eq!(laminate.total_price, dec!(2790));
    }

    #[test]
    fn base_area_change_moves_lines_that_followed_it() {
        let mut editor = BreakdownEditor::new("Basement", ResolveContext::new(Some(dec!(500)), dec!(10)));
        editor.seed(
            [
                SeedItem::new("Drywall sheets", dec!(0), "sq ft").priced(dec!(15)),
                SeedItem::new("Drywall hanging labor", dec!(0), "sq ft").priced(dec!(1.5)),
            ],
            SeedSource::Calculator,
        );
        assert_eq!(editor.breakdown().materials[0].quantity, dec!(18));
        assert_eq!(editor.breakdown().labor[0].quantity, dec!(500));

        editor.set_base_area(Some(dec!(1000)));

        assert_eq!(editor.breakdown().materials[0].quantity, dec!(35));
        assert_eq!(editor.breakdown().labor[0].quantity, dec!(1000));
    }

    #[test]
    fn malformed_numeric_edit_keeps_previous_value() {
        let mut editor = seeded();
        let id = editor.breakdown().other[0].id.clone();

        assert!(editor.edit_item(CostSection::Other, &id, ItemEdit::UnitPrice("abc".into())));
        assert_eq!(editor.breakdown().other[0].unit_price, dec!(350));

        editor.edit_item(CostSection::Other, &id, ItemEdit::Quantity("".into()));
        assert_eq!(editor.breakdown().other[0].quantity, dec!(0));
        assert_eq!(editor.breakdown().other[0].total_price, dec!(0));
    }

    #[test]
    fn quantity_edit_on_essential_material_sets_net_area() {
        let mut editor = seeded();
        let id = editor.breakdown().materials[0].id.clone();

        editor.edit_item(CostSection::Materials, &id, ItemEdit::Quantity("200".into()));

        let laminate = &editor.breakdown().materials[0];
        assert_eq!(laminate.base_quantity, Some(dec!(200)));
        assert_eq!(laminate.quantity, dec!(10));
    }

    #[test]
    fn edit_of_unknown_line_is_ignored() {
        let mut editor = seeded();
        editor.mark_saved();

        assert!(!editor.edit_item(CostSection::Labor, "nope", ItemEdit::Name("x".into())));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn add_and_remove_items() {
        let mut editor = seeded();
        let id = editor.add_item(CostSection::Other, "Permit", dec!(1), "each", dec!(120));

        assert_eq!(editor.subtotals().other, dec!(470));
        let removed = editor.remove_item(CostSection::Other, &id).expect("removed");
        assert_eq!(removed.item, "Permit");
        assert_eq!(editor.subtotals().other, dec!(350));
        assert!(editor.remove_item(CostSection::Other, &id).is_none());
    }

    #[test]
    fn totals_follow_address() {
        let mut editor = BreakdownEditor::new("Deck", ResolveContext::default());
        editor.add_item(CostSection::Other, "Contractor fee", dec!(1), "each", dec!(1000));

        assert_eq!(editor.totals().grand_total, dec!(1130.00));

        editor.set_address("123 Main St, Calgary, AB");
        assert_eq!(editor.totals().total_tax, dec!(50.00));
    }

    #[test]
    fn save_payload_carries_totals_and_reopens_identically() {
        let mut editor = seeded();
        editor.set_address("Toronto, ON");
        let payload = editor.save_payload();

        assert_eq!(payload.subtotal, dec!(6110.00));
        assert_eq!(payload.total_tax, dec!(794.30));
        assert_eq!(payload.grand_total, dec!(6904.30));

        let saved = SavedBreakdown {
            id: 1,
            project_name: payload.project_name.clone(),
            address: payload.address.clone(),
            base_area: payload.base_area,
            waste_percent: payload.waste_percent,
            breakdown: payload.breakdown.clone(),
            subtotal: payload.subtotal,
            total_tax: payload.total_tax,
            grand_total: payload.grand_total,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let reopened = BreakdownEditor::from_saved(&saved);

        assert!(!reopened.is_dirty());
        assert_eq!(reopened.breakdown(), editor.breakdown());
        assert_eq!(reopened.totals(), editor.totals());
    }
}
