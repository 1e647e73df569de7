//! System vocabulary seeded into every deployment.
//!
//! These options have `isCustom = false`: they may be deactivated but never
//! deleted, and a custom option can never shadow one of their values.

use crate::domain::Category;

/// Creator id recorded on seeded options.
pub const SYSTEM_ACTOR: &str = "system";

/// A seeded option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemOption {
    /// Vocabulary.
    pub category: Category,
    /// Short code.
    pub value: &'static str,
    /// Label.
    pub display_name: &'static str,
}

const fn opt(category: Category, value: &'static str, display_name: &'static str) -> SystemOption {
    SystemOption {
        category,
        value,
        display_name,
    }
}

/// Every seeded option, grouped by category.
pub const SYSTEM_OPTIONS: &[SystemOption] = &[
    opt(Category::Particulars, "TC", "Type Check"),
    opt(Category::Particulars, "GC", "Grid Connection"),
    opt(Category::Particulars, "PQM", "Power Quality Monitor"),
    opt(Category::Particulars, "EVF", "Emergency Verification"),
    opt(Category::Particulars, "OPT", "Optimization"),
    opt(Category::Particulars, "PS", "Power System"),
    opt(Category::Particulars, "SS", "Substation"),
    opt(Category::ClientCode, "HFEX", "Haryana Electricity Exchange"),
    opt(Category::ClientCode, "ADN", "Adani Power"),
    opt(Category::ClientCode, "HEXA", "Hexagon Energy"),
    opt(Category::ClientCode, "GE", "General Electric"),
    opt(Category::SiteName, "SJPR", "Sarjapur"),
    opt(Category::SiteName, "BNSK", "Banashankari"),
    opt(Category::SiteName, "GRID", "Grid Station"),
    opt(Category::SiteName, "SUBJ", "Subject Location"),
    opt(Category::StateName, "KA", "Karnataka"),
    opt(Category::StateName, "TN", "Tamil Nadu"),
    opt(Category::StateName, "AP", "Andhra Pradesh"),
    opt(Category::StateName, "TS", "Telangana"),
    opt(Category::StateName, "MH", "Maharashtra"),
    opt(Category::StateName, "GJ", "Gujarat"),
    opt(Category::StateName, "RJ", "Rajasthan"),
];

/// Seeded options of one category.
pub fn system_options(category: Category) -> impl Iterator<Item = &'static SystemOption> {
    SYSTEM_OPTIONS.iter().filter(move |o| o.category == category)
}

/// Whether `value` is a seeded value of `category`.
pub fn is_system_value(category: Category, value: &str) -> bool {
    system_options(category).any(|o| o.value == value)
}

/// Seeded label for a value, if it is a system value.
pub fn display_name(category: Category, value: &str) -> Option<&'static str> {
    system_options(category)
        .find(|o| o.value == value)
        .map(|o| o.display_name)
}
