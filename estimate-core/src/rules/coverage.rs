//! Coverage table: how much area one purchasing unit of a material covers.
//!
//! Rules are matched against the lowercased material name by substring, in
//! table order, and the first hit wins. The order is the precedence:
//!
//! | # | keywords               | coverage (sq ft) | unit      |
//! |---|------------------------|------------------|-----------|
//! | 1 | underlayment           | 100              | rolls     |
//! | 2 | adhesive, glue         | 200              | gallons   |
//! | 3 | primer, paint          | 350              | gallons   |
//! | 4 | laminate               | 22               | boxes     |
//! | 5 | hardwood               | 20               | boxes     |
//! | 6 | vinyl                  | 22               | boxes     |
//! | 7 | tile, ceramic          | 15               | boxes     |
//! | 8 | flooring               | 22               | boxes     |
//! | 9 | drywall, gypsum        | 32               | sheets    |
//! | 10| baseboard, trim        | 1                | linear ft |
//!
//! Accessories (underlayment, adhesive) sit above the surface materials so
//! that "Flooring Underlayment" orders rolls and "Tile Adhesive" orders
//! gallons. A coverage of 1 relabels the unit without dividing.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageRule {
    pub keywords: &'static [&'static str],
    /// Square feet covered by one `unit`.
    pub coverage_per_unit: Decimal,
    pub unit: &'static str,
}

impl CoverageRule {
    /// Whether the rule converts area into a count of purchasing units.
    pub fn divides(&self) -> bool {
        self.coverage_per_unit > Decimal::ONE
    }

    fn matches(
        &self,
        lowered_name: &str,
    ) -> bool {
        self.keywords.iter().any(|keyword| lowered_name.contains(keyword))
    }
}

pub static COVERAGE_RULES: &[CoverageRule] = &[
    CoverageRule {
        keywords: &["underlayment"],
        coverage_per_unit: Decimal::from_parts(100, 0, 0, false, 0),
        unit: "rolls",
    },
    CoverageRule {
        keywords: &["adhesive", "glue"],
        coverage_per_unit: Decimal::from_parts(200, 0, 0, false, 0),
        unit: "gallons",
    },
    CoverageRule {
        keywords: &["primer", "paint"],
        coverage_per_unit: Decimal::from_parts(350, 0, 0, false, 0),
        unit: "gallons",
    },
    CoverageRule {
        keywords: &["laminate"],
        coverage_per_unit: Decimal::from_parts(22, 0, 0, false, 0),
        unit: "boxes",
    },
    CoverageRule {
        keywords: &["hardwood"],
        coverage_per_unit: Decimal::from_parts(20, 0, 0, false, 0),
        unit: "boxes",
    },
    CoverageRule {
        keywords: &["vinyl"],
        coverage_per_unit: Decimal::from_parts(22, 0, 0, false, 0),
        unit: "boxes",
    },
    CoverageRule {
        keywords: &["tile", "ceramic"],
        coverage_per_unit: Decimal::from_parts(15, 0, 0, false, 0),
        unit: "boxes",
    },
    CoverageRule {
        keywords: &["flooring"],
        coverage_per_unit: Decimal::from_parts(22, 0, 0, false, 0),
        unit: "boxes",
    },
    CoverageRule {
        keywords: &["drywall", "gypsum"],
        coverage_per_unit: Decimal::from_parts(32, 0, 0, false, 0),
        unit: "sheets",
    },
    CoverageRule {
        keywords: &["baseboard", "trim"],
        coverage_per_unit: Decimal::ONE,
        unit: "linear ft",
    },
];

/// First coverage rule matching `material`, case-insensitively.
pub fn find_coverage(material: &str) -> Option<&'static CoverageRule> {
    let lowered = material.to_lowercase();
    COVERAGE_RULES.iter().find(|rule| rule.matches(&lowered))
}
