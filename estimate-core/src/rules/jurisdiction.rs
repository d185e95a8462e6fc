//! Canadian sales-tax jurisdictions and the address rules that select them.
//!
//! Selection walks [`ADDRESS_RULES`] in order and returns the first match.
//! The table is laid out in three tiers:
//!
//! 1. Province and territory names, case-insensitive substring.
//! 2. City names, case-insensitive substring.
//! 3. Two-letter postal abbreviations, case-sensitive, whole word only.
//!
//! Inside a tier, Ontario entries come first, then the rest in table order, so
//! "Richmond Hill" resolves to Ontario before "Richmond" can pick British
//! Columbia. An address that matches nothing, or an empty address, falls back
//! to [`DEFAULT_JURISDICTION`].

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::{TaxComponent, TaxJurisdiction};

const fn rate(
    units: u32,
    scale: u32,
) -> Decimal {
    Decimal::from_parts(units, 0, 0, false, scale)
}

const GST: TaxComponent = TaxComponent {
    name: "GST",
    rate: rate(5, 2),
};

pub static ONTARIO: TaxJurisdiction = TaxJurisdiction {
    code: "ON",
    name: "Ontario",
    components: &[TaxComponent {
        name: "HST",
        rate: rate(13, 2),
    }],
};

pub static BRITISH_COLUMBIA: TaxJurisdiction = TaxJurisdiction {
    code: "BC",
    name: "British Columbia",
    components: &[
        GST,
        TaxComponent {
            name: "PST",
            rate: rate(7, 2),
        },
    ],
};

pub static ALBERTA: TaxJurisdiction = TaxJurisdiction {
    code: "AB",
    name: "Alberta",
    components: &[GST],
};

pub static QUEBEC: TaxJurisdiction = TaxJurisdiction {
    code: "QC",
    name: "Quebec",
    components: &[
        GST,
        TaxComponent {
            name: "QST",
            rate: rate(9975, 5),
        },
    ],
};

pub static MANITOBA: TaxJurisdiction = TaxJurisdiction {
    code: "MB",
    name: "Manitoba",
    components: &[
        GST,
        TaxComponent {
            name: "RST",
            rate: rate(7, 2),
        },
    ],
};

pub static SASKATCHEWAN: TaxJurisdiction = TaxJurisdiction {
    code: "SK",
    name: "Saskatchewan",
    components: &[
        GST,
        TaxComponent {
            name: "PST",
            rate: rate(6, 2),
        },
    ],
};

pub static NOVA_SCOTIA: TaxJurisdiction = TaxJurisdiction {
    code: "NS",
    name: "Nova Scotia",
    components: &[TaxComponent {
        name: "HST",
        rate: rate(14, 2),
    }],
};

pub static NEW_BRUNSWICK: TaxJurisdiction = TaxJurisdiction {
    code: "NB",
    name: "New Brunswick",
    components: &[TaxComponent {
        name: "HST",
        rate: rate(15, 2),
    }],
};

pub static NEWFOUNDLAND: TaxJurisdiction = TaxJurisdiction {
    code: "NL",
    name: "Newfoundland and Labrador",
    components: &[TaxComponent {
        name: "HST",
        rate: rate(15, 2),
    }],
};

pub static PRINCE_EDWARD_ISLAND: TaxJurisdiction = TaxJurisdiction {
    code: "PE",
    name: "Prince Edward Island",
    components: &[TaxComponent {
        name: "HST",
        rate: rate(15, 2),
    }],
};

pub static YUKON: TaxJurisdiction = TaxJurisdiction {
    code: "YT",
    name: "Yukon",
    components: &[GST],
};

pub static NORTHWEST_TERRITORIES: TaxJurisdiction = TaxJurisdiction {
    code: "NT",
    name: "Northwest Territories",
    components: &[GST],
};

pub static NUNAVUT: TaxJurisdiction = TaxJurisdiction {
    code: "NU",
    name: "Nunavut",
    components: &[GST],
};

pub static DEFAULT_JURISDICTION: &TaxJurisdiction = &ONTARIO;

/// How an [`AddressRule`] keyword is compared with the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive substring match.
    Contains,
    /// Case-sensitive whole-word match.
    Abbreviation,
}

#[derive(Debug, Clone, Copy)]
pub struct AddressRule {
    pub keyword: &'static str,
    pub kind: MatchKind,
    pub jurisdiction: &'static TaxJurisdiction,
}

const fn contains(
    keyword: &'static str,
    jurisdiction: &'static TaxJurisdiction,
) -> AddressRule {
    AddressRule {
        keyword,
        kind: MatchKind::Contains,
        jurisdiction,
    }
}

const fn abbreviation(
    keyword: &'static str,
    jurisdiction: &'static TaxJurisdiction,
) -> AddressRule {
    AddressRule {
        keyword,
        kind: MatchKind::Abbreviation,
        jurisdiction,
    }
}

pub static ADDRESS_RULES: &[AddressRule] = &[
    // Tier 1: province and territory names
    contains("ontario", &ONTARIO),
    contains("british columbia", &BRITISH_COLUMBIA),
    contains("alberta", &ALBERTA),
    contains("quebec", &QUEBEC),
    contains("québec", &QUEBEC),
    contains("manitoba", &MANITOBA),
    contains("saskatchewan", &SASKATCHEWAN),
    contains("nova scotia", &NOVA_SCOTIA),
    contains("new brunswick", &NEW_BRUNSWICK),
    contains("newfoundland", &NEWFOUNDLAND),
    contains("labrador", &NEWFOUNDLAND),
    contains("prince edward island", &PRINCE_EDWARD_ISLAND),
    contains("yukon", &YUKON),
    contains("northwest territories", &NORTHWEST_TERRITORIES),
    contains("nunavut", &NUNAVUT),
    // Tier 2: cities
    contains("toronto", &ONTARIO),
    contains("ottawa", &ONTARIO),
    contains("mississauga", &ONTARIO),
    contains("brampton", &ONTARIO),
    contains("hamilton", &ONTARIO),
    contains("markham", &ONTARIO),
    contains("vaughan", &ONTARIO),
    contains("richmond hill", &ONTARIO),
    contains("kitchener", &ONTARIO),
    contains("waterloo", &ONTARIO),
    contains("london", &ONTARIO),
    contains("vancouver", &BRITISH_COLUMBIA),
    contains("victoria", &BRITISH_COLUMBIA),
    contains("surrey", &BRITISH_COLUMBIA),
    contains("burnaby", &BRITISH_COLUMBIA),
    contains("richmond", &BRITISH_COLUMBIA),
    contains("kelowna", &BRITISH_COLUMBIA),
    contains("calgary", &ALBERTA),
    contains("edmonton", &ALBERTA),
    contains("montreal", &QUEBEC),
    contains("montréal", &QUEBEC),
    contains("laval", &QUEBEC),
    contains("gatineau", &QUEBEC),
    contains("winnipeg", &MANITOBA),
    contains("regina", &SASKATCHEWAN),
    contains("saskatoon", &SASKATCHEWAN),
    contains("halifax", &NOVA_SCOTIA),
    contains("moncton", &NEW_BRUNSWICK),
    contains("fredericton", &NEW_BRUNSWICK),
    contains("st. john's", &NEWFOUNDLAND),
    contains("charlottetown", &PRINCE_EDWARD_ISLAND),
    contains("whitehorse", &YUKON),
    contains("yellowknife", &NORTHWEST_TERRITORIES),
    contains("iqaluit", &NUNAVUT),
    // Tier 3: postal abbreviations
    abbreviation("ON", &ONTARIO),
    abbreviation("BC", &BRITISH_COLUMBIA),
    abbreviation("AB", &ALBERTA),
    abbreviation("QC", &QUEBEC),
    abbreviation("MB", &MANITOBA),
    abbreviation("SK", &SASKATCHEWAN),
    abbreviation("NS", &NOVA_SCOTIA),
    abbreviation("NB", &NEW_BRUNSWICK),
    abbreviation("NL", &NEWFOUNDLAND),
    abbreviation("PE", &PRINCE_EDWARD_ISLAND),
    abbreviation("YT", &YUKON),
    abbreviation("NT", &NORTHWEST_TERRITORIES),
    abbreviation("NU", &NUNAVUT),
];

/// Word-boundary patterns for every abbreviation rule, indexed like `ADDRESS_RULES`.
static ABBREVIATION_PATTERNS: LazyLock<Vec<Option<Regex>>> = LazyLock::new(|| {
    ADDRESS_RULES
        .iter()
        .map(|rule| match rule.kind {
            MatchKind::Abbreviation => {
                Regex::new(&format!(r"\b{}\b", regex::escape(rule.keyword))).ok()
            }
            MatchKind::Contains => None,
        })
        .collect()
});

/// First rule in [`ADDRESS_RULES`] that matches `address`.
pub fn match_address(address: &str) -> Option<&'static AddressRule> {
    let lowered = address.to_lowercase();
    ADDRESS_RULES
        .iter()
        .zip(ABBREVIATION_PATTERNS.iter())
        .find(|(rule, pattern)| match rule.kind {
            MatchKind::Contains => lowered.contains(rule.keyword),
            MatchKind::Abbreviation => pattern.as_ref().is_some_and(|re| re.is_match(address)),
        })
        .map(|(rule, _)| rule)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn code_for(address: &str) -> Option<&'static str> {
        match_address(address).map(|rule| rule.jurisdiction.code)
    }

    #[test]
    fn rates_are_expressed_as_fractions() {
        assert_eq!(ONTARIO.combined_rate(), dec!(0.13));
        assert_eq!(BRITISH_COLUMBIA.combined_rate(), dec!(0.12));
        assert_eq!(QUEBEC.combined_rate(), dec!(0.14975));
        assert_eq!(ALBERTA.combined_rate(), dec!(0.05));
    }

    #[test]
    fn describe_lists_components() {
        assert_eq!(BRITISH_COLUMBIA.describe(), "GST 5% + PST 7%");
        assert_eq!(ONTARIO.describe(), "HST 13%");
        assert_eq!(QUEBEC.describe(), "GST 5% + QST 9.975%");
    }

    #[test]
    fn city_names_select_their_province() {
        assert_eq!(code_for("100 Queen St W, Toronto"), Some("ON"));
        assert_eq!(code_for("Vancouver"), Some("BC"));
        assert_eq!(code_for("1 Rue Sainte-Catherine, MONTRÉAL"), Some("QC"));
        assert_eq!(code_for("Calgary"), Some("AB"));
    }

    #[test]
    fn province_name_beats_city_name() {
        assert_eq!(code_for("London, Ontario"), Some("ON"));
        assert_eq!(code_for("Victoria Avenue, Regina, Saskatchewan"), Some("SK"));
    }

    #[test]
    fn earlier_city_wins_overlapping_keywords() {
        assert_eq!(code_for("Richmond Hill"), Some("ON"));
        assert_eq!(code_for("Richmond"), Some("BC"));
    }

    #[test]
    fn abbreviations_need_word_boundaries_and_case() {
        assert_eq!(code_for("12 Main St, Kamloops BC V2C"), Some("BC"));
        assert_eq!(code_for("12 Main St, Red Deer, AB"), Some("AB"));
        assert_eq!(code_for("Abbey Road"), None);
        assert_eq!(code_for("12 main st, kamloops bc"), None);
    }

    #[test]
    fn empty_address_matches_nothing() {
        assert!(match_address("").is_none());
        assert_eq!(DEFAULT_JURISDICTION.code, "ON");
    }
}
