use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One named sales-tax rate, e.g. GST at 5 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxComponent {
    pub name: &'static str,
    /// Rate as a fraction (0.13 for 13 %).
    pub rate: Decimal,
}

/// A province or territory and the sales taxes it levies on construction work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxJurisdiction {
    pub code: &'static str,
    pub name: &'static str,
    pub components: &'static [TaxComponent],
}

impl TaxJurisdiction {
    /// Sum of all component rates.
    pub fn combined_rate(&self) -> Decimal {
        self.components.iter().map(|c| c.rate).sum()
    }

    /// Human readable composition, e.g. `"GST 5% + PST 7%"`.
    pub fn describe(&self) -> String {
        self.components
            .iter()
            .map(|c| format!("{} {}%", c.name, (c.rate * Decimal::ONE_HUNDRED).normalize()))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    pub name: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Tax applied to a subtotal, component by component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub jurisdiction_code: String,
    pub jurisdiction_name: String,
    pub lines: Vec<TaxLine>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
}
