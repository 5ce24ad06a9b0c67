//! Endpoint paths and scoping parameters.
//!
//! Both the HTTP client and the stub server route through these definitions so the two sides
//! cannot drift apart.

use serde::{Deserialize, Serialize};

pub const HEALTH: &str = "/health";
pub const PRISONERS: &str = "/prisoners";
pub const VISITORS: &str = "/visitors";
pub const VISITOR_ITEMS: &str = "/visitor-items";
pub const PROPERTY_TYPES: &str = "/property-types";
pub const PROPERTY_STATUSES: &str = "/property-statuses";
pub const NEXT_OF_KIN: &str = "/next-of-kin";
pub const PROPERTIES: &str = "/properties";
pub const PROPERTY_STATUS_CHANGES: &str = "/property-status-changes";
pub const ATTENDANCES: &str = "/attendances";

/// Query parameter scoping `/visitors` to one prisoner.
pub const PRISONER_PARAM: &str = "prisoner";
/// Query parameter scoping `/visitor-items` to one visitor.
pub const VISITOR_PARAM: &str = "visitor";
/// Query parameter scoping property type and status lists to one item category.
pub const CATEGORY_PARAM: &str = "category";
/// Free-text search parameter on `/prisoners`.
pub const SEARCH_PARAM: &str = "search";

/// Path of a single property, e.g. `/properties/12`.
pub fn property(id: crate::PropertyId) -> String {
    format!("{PROPERTIES}/{id}")
}

/// One level of the administrative location hierarchy, root first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationLevel {
    Region,
    District,
    County,
    SubCounty,
    Parish,
    Village,
}

impl LocationLevel {
    pub const ALL: [LocationLevel; 6] = [
        LocationLevel::Region,
        LocationLevel::District,
        LocationLevel::County,
        LocationLevel::SubCounty,
        LocationLevel::Parish,
        LocationLevel::Village,
    ];

    /// Zero-based depth; `Region` is 0.
    pub fn depth(self) -> usize {
        self as usize
    }

    pub fn parent(self) -> Option<Self> {
        self.depth().checked_sub(1).map(|d| Self::ALL[d])
    }

    pub fn child(self) -> Option<Self> {
        Self::ALL.get(self.depth() + 1).copied()
    }

    /// Levels strictly below this one, nearest first.
    pub fn descendants(self) -> &'static [LocationLevel] {
        &Self::ALL[self.depth() + 1..]
    }

    pub fn path(self) -> &'static str {
        match self {
            LocationLevel::Region => "/regions",
            LocationLevel::District => "/districts",
            LocationLevel::County => "/counties",
            LocationLevel::SubCounty => "/sub-counties",
            LocationLevel::Parish => "/parishes",
            LocationLevel::Village => "/villages",
        }
    }

    /// Query parameter naming the parent when listing this level, `None` for regions.
    pub fn parent_param(self) -> Option<&'static str> {
        match self {
            LocationLevel::Region => None,
            LocationLevel::District => Some("region"),
            LocationLevel::County => Some("district"),
            LocationLevel::SubCounty => Some("county"),
            LocationLevel::Parish => Some("sub_county"),
            LocationLevel::Village => Some("parish"),
        }
    }

    /// Human label, e.g. "sub-county".
    pub fn label(self) -> &'static str {
        match self {
            LocationLevel::Region => "region",
            LocationLevel::District => "district",
            LocationLevel::County => "county",
            LocationLevel::SubCounty => "sub-county",
            LocationLevel::Parish => "parish",
            LocationLevel::Village => "village",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            LocationLevel::Region => "regions",
            LocationLevel::District => "districts",
            LocationLevel::County => "counties",
            LocationLevel::SubCounty => "sub-counties",
            LocationLevel::Parish => "parishes",
            LocationLevel::Village => "villages",
        }
    }
}

impl std::fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LocationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "region" => Ok(LocationLevel::Region),
            "district" => Ok(LocationLevel::District),
            "county" => Ok(LocationLevel::County),
            "sub-county" | "subcounty" => Ok(LocationLevel::SubCounty),
            "parish" => Ok(LocationLevel::Parish),
            "village" => Ok(LocationLevel::Village),
            other => Err(format!("unknown location level: {other}")),
        }
    }
}

/// Global, unscoped lookup tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Sexes,
    Relationships,
    IdTypes,
    ItemCategories,
    Units,
}

impl LookupKind {
    pub fn path(self) -> &'static str {
        match self {
            LookupKind::Sexes => "/sex-types",
            LookupKind::Relationships => "/relationships",
            LookupKind::IdTypes => "/id-types",
            LookupKind::ItemCategories => "/item-categories",
            LookupKind::Units => "/units",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LookupKind::Sexes => "sex types",
            LookupKind::Relationships => "relationship types",
            LookupKind::IdTypes => "ID types",
            LookupKind::ItemCategories => "item categories",
            LookupKind::Units => "measurement units",
        }
    }
}
