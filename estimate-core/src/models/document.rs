use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cost_breakdown::CostBreakdown;
use super::cost_item::CostSection;
use super::tax::TaxBreakdown;
use crate::calculations::common::round_half_up;

/// Fully resolved estimate, ready for a document exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateDocument {
    pub project_name: String,
    pub address: String,
    pub base_area: Option<Decimal>,
    pub waste_percent: Decimal,
    pub breakdown: CostBreakdown,
    pub tax: TaxBreakdown,
}

impl fmt::Display for EstimateDocument {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let title = if self.project_name.is_empty() {
            "Cost estimate"
        } else {
            self.project_name.as_str()
        };
        writeln!(f, "{title}")?;
        if !self.address.is_empty() {
            writeln!(f, "Address: {}", self.address)?;
        }
        if let Some(area) = self.base_area {
            writeln!(f, "Base area: {} sq ft", area.normalize())?;
        }
        writeln!(f, "Waste buffer: {}%", self.waste_percent.normalize())?;

        for section in CostSection::ALL {
            let items = self.breakdown.section(section);
            if items.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{}", section.label())?;
            for item in items {
                writeln!(
                    f,
                    "  {:<32} {:>10} {:<10} @ {:>10.2} = {:>12.2}",
                    item.item,
                    item.quantity.normalize(),
                    item.unit,
                    item.unit_price,
                    round_half_up(item.total_price),
                )?;
            }
            writeln!(
                f,
                "  {:<32} {:>61.2}",
                format!("{} subtotal", section.label()),
                round_half_up(self.breakdown.subtotal_of(section)),
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Subtotal: {:.2}", round_half_up(self.tax.subtotal))?;
        for line in &self.tax.lines {
            writeln!(
                f,
                "{} ({}%): {:.2}",
                line.name,
                (line.rate * Decimal::ONE_HUNDRED).normalize(),
                line.amount
            )?;
        }
        writeln!(f, "Total tax ({}): {:.2}", self.tax.jurisdiction_name, self.tax.total_tax)?;
        write!(f, "Grand total: {:.2}", self.tax.grand_total)
    }
}
