//! Built-in starting points for common jobs.
//!
//! Area-priced lines carry a zero quantity so they follow the project base
//! area once seeded. Prices on essential materials are per purchasing unit
//! (box, roll, gallon, sheet).

use estimate_core::SeedItem;

use crate::loader::{SeedItemLoader, SeedItemLoaderError};

#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    csv: &'static str,
}

impl Template {
    pub fn items(&self) -> Result<Vec<SeedItem>, SeedItemLoaderError> {
        SeedItemLoader::parse_items(self.csv.as_bytes())
    }
}

pub const TEMPLATES: &[Template] = &[
    Template {
        name: "flooring",
        description: "Laminate floor with underlayment and installation",
        csv: include_str!("../templates/flooring.csv"),
    },
    Template {
        name: "painting",
        description: "Interior walls: primer, paint and labor",
        csv: include_str!("../templates/painting.csv"),
    },
    Template {
        name: "drywall",
        description: "Drywall hanging and finishing",
        csv: include_str!("../templates/drywall.csv"),
    },
    Template {
        name: "tile",
        description: "Porcelain floor tile with adhesive and grout",
        csv: include_str!("../templates/tile.csv"),
    },
];

pub fn names() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.name).collect()
}

/// Seed items for the template called `name` (case-insensitive).
pub fn preset(name: &str) -> Result<Vec<SeedItem>, SeedItemLoaderError> {
    let name = name.trim();
    TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| SeedItemLoaderError::UnknownTemplate(name.to_string()))?
        .items()
}

#[cfg(test)]
mod tests {
    use estimate_core::{BreakdownEditor, CostSection, ResolveContext, SeedSource};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn every_template_parses() {
        for template in TEMPLATES {
            let items = template.items().unwrap_or_else(|e| panic!("{}: {e}", template.name));
            assert!(!items.is_empty(), "{} has no items", template.name);
        }
    }

    #[test]
    fn names_are_listed_in_order() {
        assert_eq!(names(), vec!["flooring", "painting", "drywall", "tile"]);
    }

    #[test]
    fn unknown_template_is_an_error() {
        let err = preset("roofing").expect_err("no roofing template");

        assert!(matches!(err, SeedItemLoaderError::UnknownTemplate(name) if name == "roofing"));
    }

    #[test]
    fn flooring_template_follows_base_area() {
        let mut editor = BreakdownEditor::new("Den", ResolveContext::new(Some(dec!(1350)), dec!(10)));
        editor.seed(preset("Flooring").expect("flooring"), SeedSource::Template);
        let breakdown = editor.breakdown();

        let laminate = &breakdown.materials[0];
        assert_eq!(laminate.quantity, dec!(68));
        assert_eq!(laminate.unit, "boxes");
        let underlayment = &breakdown.materials[1];
        assert_eq!(underlayment.quantity, dec!(15));
        assert_eq!(underlayment.unit, "rolls");
        assert!(!breakdown.materials[2].is_essential);

        let install = breakdown
            .section(CostSection::Labor)
            .iter()
            .find(|item| item.item == "Laminate installation")
            .expect("install line");
        assert_eq!(install.quantity, dec!(1350));
    }

    #[test]
    fn non_coverage_materials_stay_unresolved() {
        let items = preset("painting").expect("painting");
        let mut editor = BreakdownEditor::new("Hall", ResolveContext::new(Some(dec!(700)), dec!(10)));
        editor.seed(items, SeedSource::Template);

        let tape = editor
            .breakdown()
            .materials
            .iter()
            .find(|item| item.item == "Masking tape")
            .expect("tape line");
        assert_eq!(tape.quantity, dec!(4));
        assert_eq!(tape.unit, "rolls");

        let paint = editor
            .breakdown()
            .materials
            .iter()
            .find(|item| item.item == "Interior paint")
            .expect("paint line");
        assert_eq!(paint.quantity, dec!(3));
        assert_eq!(paint.unit, "gallons");
    }
}
