use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit label used for everything measured as a surface area.
pub const SQ_FT: &str = "sq ft";

/// Spellings that all mean "square feet" in upstream data.
const AREA_UNITS: &[&str] = &[
    "sq ft",
    "sqft",
    "sq. ft.",
    "sq.ft.",
    "sf",
    "ft2",
    "ft²",
    "square feet",
    "square foot",
];

/// Returns true when `unit` is a surface-area unit rather than a purchasing unit.
pub fn is_area_unit(unit: &str) -> bool {
    let unit = unit.trim().to_lowercase();
    AREA_UNITS.contains(&unit.as_str())
}

/// The three sections a cost breakdown is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSection {
    Materials,
    Labor,
    Other,
}

impl CostSection {
    pub const ALL: [CostSection; 3] = [Self::Materials, Self::Labor, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Materials => "materials",
            Self::Labor => "labor",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "materials" | "material" => Some(Self::Materials),
            "labor" | "labour" => Some(Self::Labor),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Materials => "Materials",
            Self::Labor => "Labor",
            Self::Other => "Other",
        }
    }
}

/// A single priced line of a cost breakdown.
///
/// `quantity` is the gross quantity in `unit`; `base_quantity` is the net area
/// in square feet when one is known. `total_price` is derived and must be
/// refreshed with [`CostItem::recompute_total`] after any change to the other
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostItem {
    pub id: String,
    pub item: String,
    pub quantity: Decimal,
    pub base_quantity: Option<Decimal>,
    pub unit: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub is_essential: bool,
}

impl CostItem {
    pub fn new(
        id: impl Into<String>,
        item: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        let mut cost_item = Self {
            id: id.into(),
            item: item.into(),
            quantity,
            base_quantity: None,
            unit: unit.into(),
            unit_price,
            total_price: Decimal::ZERO,
            is_essential: false,
        };
        cost_item.recompute_total();
        cost_item
    }

    pub fn essential(mut self) -> Self {
        self.is_essential = true;
        self
    }

    pub fn with_base_quantity(
        mut self,
        base_quantity: Decimal,
    ) -> Self {
        self.base_quantity = Some(base_quantity);
        self
    }

    /// Sets `total_price = quantity × unit_price`.
    pub fn recompute_total(&mut self) {
        self.total_price = self.quantity * self.unit_price;
    }

    /// True when the stored total disagrees with quantity × unit price.
    pub fn has_stale_total(&self) -> bool {
        self.total_price != self.quantity * self.unit_price
    }

    pub fn is_area_based(&self) -> bool {
        is_area_unit(&self.unit)
    }
}
