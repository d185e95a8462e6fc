use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cost_item::CostSection;

/// Where a list of seed items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedSource {
    PhotoEstimate,
    Calculator,
    Template,
    Manual,
}

impl SeedSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhotoEstimate => "photo-estimate",
            Self::Calculator => "calculator",
            Self::Template => "template",
            Self::Manual => "manual",
        }
    }
}

/// A line supplied by an upstream producer before any resolution happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedItem {
    pub item: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Option<Decimal>,
    /// Explicit placement; when absent the item is classified by name.
    pub section: Option<CostSection>,
}

impl SeedItem {
    pub fn new(
        item: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            quantity,
            unit: unit.into(),
            unit_price: None,
            section: None,
        }
    }

    pub fn priced(
        mut self,
        unit_price: Decimal,
    ) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    pub fn in_section(
        mut self,
        section: CostSection,
    ) -> Self {
        self.section = Some(section);
        self
    }
}
