//! YAML seed data for the stub backend.

use crate::error::StubError;
use api_shared::{
    CategoryId, Choice, LocationId, LocationLevel, Lookup, NextOfKin, Prisoner, Property,
    Visitor, VisitorItem,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed bundled with the binary, used when no seed file is configured.
pub const DEFAULT_SEED: &str = include_str!("../seed/default.yaml");

/// One node of the location hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLocation {
    pub id: LocationId,
    pub name: String,
    pub level: LocationLevel,
    #[serde(default)]
    pub parent: Option<LocationId>,
}

/// A property type or status and the item categories it applies to.
///
/// An empty `categories` list means every category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedOption<I> {
    pub id: I,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

impl<I: Copy> ScopedOption<I> {
    pub fn applies_to(&self, category: Option<CategoryId>) -> bool {
        match category {
            Some(category) => self.categories.is_empty() || self.categories.contains(&category),
            None => true,
        }
    }

    pub fn choice(&self) -> Choice<I> {
        Choice::new(self.id, self.name.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLookups {
    #[serde(default)]
    pub sexes: Vec<Lookup>,
    #[serde(default)]
    pub relationships: Vec<Lookup>,
    #[serde(default)]
    pub id_types: Vec<Lookup>,
    #[serde(default)]
    pub item_categories: Vec<Lookup>,
    #[serde(default)]
    pub units: Vec<Lookup>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub prisoners: Vec<Prisoner>,
    #[serde(default)]
    pub visitors: Vec<Visitor>,
    #[serde(default)]
    pub visitor_items: Vec<VisitorItem>,
    #[serde(default)]
    pub next_of_kin: Vec<NextOfKin>,
    #[serde(default)]
    pub lookups: SeedLookups,
    #[serde(default)]
    pub locations: Vec<SeedLocation>,
    #[serde(default)]
    pub property_types: Vec<ScopedOption<api_shared::PropertyTypeId>>,
    #[serde(default)]
    pub property_statuses: Vec<ScopedOption<api_shared::PropertyStatusId>>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Seed {
    pub fn from_yaml(text: &str) -> Result<Self, StubError> {
        let seed: Seed = serde_yaml::from_str(text)?;
        seed.check()?;
        Ok(seed)
    }

    /// Read a seed file.
    pub fn load(path: &Path) -> Result<Self, StubError> {
        let text = std::fs::read_to_string(path).map_err(|source| StubError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn bundled() -> Result<Self, StubError> {
        Self::from_yaml(DEFAULT_SEED)
    }

    /// Every location below the region level must name a parent one level up.
    fn check(&self) -> Result<(), StubError> {
        for location in &self.locations {
            let expected = location.level.parent();
            let actual = location
                .parent
                .and_then(|id| self.locations.iter().find(|l| l.id == id))
                .map(|l| l.level);
            if expected != actual {
                return Err(StubError::InvalidSeed(format!(
                    "{} {} ({}) has no valid parent",
                    location.level, location.id, location.name
                )));
            }
        }
        Ok(())
    }
}
