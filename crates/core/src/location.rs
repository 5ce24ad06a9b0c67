//! Cascading administrative location selection.
//!
//! Region → District → County → SubCounty → Parish → Village. Each level's options are scoped to
//! the selection one level up, so a level is only enabled once that parent is committed and its
//! own option list has arrived.

use crate::error::{ApiError, WorkflowError, WorkflowResult};
use crate::fetch::Fetch;
use crate::reference::ReferenceCache;
use crate::remote::{Remote, Resolution};
use crate::wire::{Address, Location, LocationId, LocationLevel};

#[derive(Clone, Debug, Default, PartialEq)]
struct LevelState {
    options: Remote<Option<LocationId>, Location>,
    selected: Option<LocationId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationResolver {
    levels: [LevelState; 6],
}

impl LocationResolver {
    /// Begin loading the root level. Returns `None` when regions are cached or already loading.
    pub fn start(&mut self, cache: &ReferenceCache) -> Option<Fetch> {
        match self.level(LocationLevel::Region).options {
            Remote::Idle => self.load(LocationLevel::Region, None, cache),
            _ => None,
        }
    }

    /// Commit `id` at `level`.
    ///
    /// Every level below is cleared (selection and options) and the next level is loaded scoped to
    /// `id`. Re-selecting the current value changes nothing. The id must be one of the options
    /// currently offered at `level`.
    pub fn select(
        &mut self,
        level: LocationLevel,
        id: LocationId,
        cache: &ReferenceCache,
    ) -> WorkflowResult<Option<Fetch>> {
        let state = self.level(level);
        if !state.options.items().iter().any(|option| option.id == id) {
            return Err(WorkflowError::InvalidSelection(format!(
                "{id} is not an available {level}"
            )));
        }
        if state.selected == Some(id) {
            return Ok(None);
        }

        tracing::debug!(%level, %id, "location selected");
        self.level_mut(level).selected = Some(id);
        self.reset_below(level);

        Ok(level
            .child()
            .and_then(|child| self.load(child, Some(id), cache)))
    }

    /// Unset `level` and everything below it.
    pub fn clear(&mut self, level: LocationLevel) {
        self.level_mut(level).selected = None;
        self.reset_below(level);
    }

    /// Offer the option list for `level` scoped to `parent`.
    pub fn apply(
        &mut self,
        level: LocationLevel,
        parent: Option<LocationId>,
        result: Result<Vec<Location>, ApiError>,
    ) -> Resolution {
        let resolution = self.level_mut(level).options.resolve(&parent, result);
        if resolution.is_stale() {
            tracing::warn!(%level, ?parent, "discarding stale location options");
        }
        resolution
    }

    /// Re-request a level whose options failed to load.
    pub fn retry(&mut self, level: LocationLevel) -> Option<Fetch> {
        self.level_mut(level)
            .options
            .retry()
            .map(|parent| Fetch::Locations { level, parent })
    }

    /// Retry every failed level.
    pub fn retry_failed(&mut self) -> Vec<Fetch> {
        LocationLevel::ALL
            .into_iter()
            .filter_map(|level| self.retry(level))
            .collect()
    }

    pub fn options(&self, level: LocationLevel) -> &[Location] {
        self.level(level).options.items()
    }

    pub fn state(&self, level: LocationLevel) -> &Remote<Option<LocationId>, Location> {
        &self.level(level).options
    }

    pub fn selected(&self, level: LocationLevel) -> Option<LocationId> {
        self.level(level).selected
    }

    pub fn selected_name(&self, level: LocationLevel) -> Option<&str> {
        let id = self.selected(level)?;
        self.options(level)
            .iter()
            .find(|option| option.id == id)
            .map(|option| option.name.as_str())
    }

    /// A level accepts input once its options have arrived.
    pub fn is_enabled(&self, level: LocationLevel) -> bool {
        self.level(level).options.is_ready()
    }

    pub fn address(&self) -> Address {
        Address {
            region: self.selected(LocationLevel::Region),
            district: self.selected(LocationLevel::District),
            county: self.selected(LocationLevel::County),
            sub_county: self.selected(LocationLevel::SubCounty),
            parish: self.selected(LocationLevel::Parish),
            village: self.selected(LocationLevel::Village),
        }
    }

    fn load(
        &mut self,
        level: LocationLevel,
        parent: Option<LocationId>,
        cache: &ReferenceCache,
    ) -> Option<Fetch> {
        let state = self.level_mut(level);
        match cache.locations(level, parent) {
            Some(rows) => {
                state.options = Remote::settled(parent, rows.to_vec());
                None
            }
            None => {
                state.options = Remote::Loading(parent);
                Some(Fetch::Locations { level, parent })
            }
        }
    }

    fn reset_below(&mut self, level: LocationLevel) {
        for descendant in level.descendants() {
            *self.level_mut(*descendant) = LevelState::default();
        }
    }

    fn level(&self, level: LocationLevel) -> &LevelState {
        &self.levels[level.depth()]
    }

    fn level_mut(&mut self, level: LocationLevel) -> &mut LevelState {
        &mut self.levels[level.depth()]
    }
}
