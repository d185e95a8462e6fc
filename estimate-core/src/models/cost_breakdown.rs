use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cost_item::{CostItem, CostSection};

/// Waste buffer applied when the user has not chosen one.
pub const DEFAULT_WASTE_PERCENT: Decimal = Decimal::TEN;

/// Inputs shared by every line of a breakdown when quantities are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveContext {
    /// Net project area in square feet, when the upstream calculator supplied one.
    pub base_area: Option<Decimal>,
    pub waste_percent: Decimal,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self {
            base_area: None,
            waste_percent: DEFAULT_WASTE_PERCENT,
        }
    }
}

impl ResolveContext {
    pub fn new(
        base_area: Option<Decimal>,
        waste_percent: Decimal,
    ) -> Self {
        Self {
            base_area,
            waste_percent,
        }
    }

    /// The project base area, ignoring zero and negative values.
    pub fn usable_base_area(&self) -> Option<Decimal> {
        self.base_area.filter(|area| *area > Decimal::ZERO)
    }
}

/// All cost lines of one estimate, grouped by section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub materials: Vec<CostItem>,
    pub labor: Vec<CostItem>,
    pub other: Vec<CostItem>,
}

impl CostBreakdown {
    pub fn section(
        &self,
        section: CostSection,
    ) -> &[CostItem] {
        match section {
            CostSection::Materials => &self.materials,
            CostSection::Labor => &self.labor,
            CostSection::Other => &self.other,
        }
    }

    pub fn section_mut(
        &mut self,
        section: CostSection,
    ) -> &mut Vec<CostItem> {
        match section {
            CostSection::Materials => &mut self.materials,
            CostSection::Labor => &mut self.labor,
            CostSection::Other => &mut self.other,
        }
    }

    pub fn find_mut(
        &mut self,
        section: CostSection,
        id: &str,
    ) -> Option<&mut CostItem> {
        self.section_mut(section).iter_mut().find(|item| item.id == id)
    }

    pub fn items(&self) -> impl Iterator<Item = (CostSection, &CostItem)> {
        CostSection::ALL
            .into_iter()
            .flat_map(move |section| self.section(section).iter().map(move |item| (section, item)))
    }

    pub fn len(&self) -> usize {
        self.materials.len() + self.labor.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refreshes `total_price` on every line.
    pub fn recompute_totals(&mut self) {
        for section in CostSection::ALL {
            for item in self.section_mut(section) {
                item.recompute_total();
            }
        }
    }

    /// Sum of `quantity × unit_price` over one section, computed from the
    /// line inputs rather than the stored totals.
    pub fn subtotal_of(
        &self,
        section: CostSection,
    ) -> Decimal {
        self.section(section)
            .iter()
            .map(|item| item.quantity * item.unit_price)
            .sum()
    }

    pub fn subtotal(&self) -> Decimal {
        CostSection::ALL
            .into_iter()
            .map(|section| self.subtotal_of(section))
            .sum()
    }
}

/// Payload handed to the persistence collaborator (no id or timestamps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSavedBreakdown {
    pub project_name: String,
    pub address: String,
    pub base_area: Option<Decimal>,
    pub waste_percent: Decimal,
    pub breakdown: CostBreakdown,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
}

/// A breakdown as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBreakdown {
    pub id: i64,
    pub project_name: String,
    pub address: String,
    pub base_area: Option<Decimal>,
    pub waste_percent: Decimal,
    pub breakdown: CostBreakdown,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedBreakdown {
    pub fn context(&self) -> ResolveContext {
        ResolveContext::new(self.base_area, self.waste_percent)
    }
}
