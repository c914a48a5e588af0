//! Place categories and their mapping onto search provider codes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TravelRankError;

/// Closed set of place categories a user can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Food,
    Cafe,
    Culture,
    Photo,
    Shopping,
    Healing,
    Experience,
    Stay,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Cafe,
        Category::Photo,
        Category::Culture,
        Category::Shopping,
        Category::Healing,
        Category::Experience,
        Category::Stay,
    ];

    /// Canonical upper-case name, as serialized
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "FOOD",
            Category::Cafe => "CAFE",
            Category::Culture => "CULTURE",
            Category::Photo => "PHOTO",
            Category::Shopping => "SHOPPING",
            Category::Healing => "HEALING",
            Category::Experience => "EXPERIENCE",
            Category::Stay => "STAY",
        }
    }

    /// Human readable label used in prompts and CLI output
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "restaurants",
            Category::Cafe => "cafes",
            Category::Culture => "culture",
            Category::Photo => "photo spots",
            Category::Shopping => "shopping",
            Category::Healing => "healing",
            Category::Experience => "experiences",
            Category::Stay => "stays",
        }
    }

    /// Kakao Local `category_group_code`s searched for this category
    #[must_use]
    pub fn search_codes(self) -> &'static [&'static str] {
        match self {
            Category::Food => &["FD6"],
            Category::Cafe => &["CE7"],
            Category::Culture => &["CT1"],
            Category::Photo => &["AT4"],
            Category::Shopping => &["MT1", "CS2"],
            Category::Healing => &["AT4"],
            Category::Experience => &["AT4", "AC5"],
            Category::Stay => &["AD5"],
        }
    }

    /// Map a provider code back onto a category.
    ///
    /// Unknown codes land in `Culture`, which is the broadest bucket.
    #[must_use]
    pub fn from_search_code(code: &str) -> Category {
        match code {
            "FD6" => Category::Food,
            "CE7" => Category::Cafe,
            "CT1" => Category::Culture,
            "AT4" => Category::Photo,
            "MT1" | "CS2" => Category::Shopping,
            "AD5" => Category::Stay,
            "AC5" => Category::Experience,
            _ => Category::Culture,
        }
    }

    /// Whether `code` is one of the provider codes this category searches.
    #[must_use]
    pub fn owns_search_code(self, code: &str) -> bool {
        self.search_codes().contains(&code)
    }

    /// Rough indoor hint handed to the AI scorer
    #[must_use]
    pub fn is_indoor(self) -> bool {
        !matches!(self, Category::Photo | Category::Healing)
    }

    /// Match an enum name, ignoring case
    #[must_use]
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    fn is_search_code(code: &str) -> bool {
        Category::ALL
            .into_iter()
            .any(|c| c.owns_search_code(code))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TravelRankError;

    /// Accepts enum names (any case) and provider codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(category) = Category::from_name(s) {
            return Ok(category);
        }
        let code = s.to_ascii_uppercase();
        if Category::is_search_code(&code) {
            return Ok(Category::from_search_code(&code));
        }
        Err(TravelRankError::validation(format!("Unknown category '{s}'")))
    }
}
