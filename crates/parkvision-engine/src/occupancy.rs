//! Spot occupancy for the currently selected location.
//!
//! The engine is the only writer of the occupancy mapping. Every command
//! either completes fully or returns an [`EngineError`] without touching
//! state, and every successful mutation is published as an
//! [`OccupancyEvent`] to subscribers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parkvision_core::{Location, LocationCatalog};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::EngineError;

/// Chance that a spot starts out free when a location is selected.
pub const DEFAULT_FREE_PROBABILITY: f64 = 0.4;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    Free,
    Occupied,
}

impl OccupancyStatus {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            OccupancyStatus::Free => OccupancyStatus::Occupied,
            OccupancyStatus::Occupied => OccupancyStatus::Free,
        }
    }

    #[must_use]
    pub fn is_free(self) -> bool {
        self == OccupancyStatus::Free
    }
}

impl std::fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccupancyStatus::Free => write!(f, "free"),
            OccupancyStatus::Occupied => write!(f, "occupied"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotOccupancy {
    pub spot_id: String,
    pub status: OccupancyStatus,
}

/// Spot id → status mapping, kept in the location's spot order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OccupancyState {
    spots: Vec<SpotOccupancy>,
}

impl OccupancyState {
    #[must_use]
    pub fn len(&self) -> usize {
        self.spots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    #[must_use]
    pub fn get(&self, spot_id: &str) -> Option<OccupancyStatus> {
        self.spots
            .iter()
            .find(|s| s.spot_id == spot_id)
            .map(|s| s.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpotOccupancy> {
        self.spots.iter()
    }

    pub fn spot_ids(&self) -> impl Iterator<Item = &str> {
        self.spots.iter().map(|s| s.spot_id.as_str())
    }

    fn position(&self, spot_id: &str) -> Option<usize> {
        self.spots.iter().position(|s| s.spot_id == spot_id)
    }
}

/// Later entries for an already-present spot overwrite its status, so the
/// result never holds duplicate keys.
impl FromIterator<(String, OccupancyStatus)> for OccupancyState {
    fn from_iter<I: IntoIterator<Item = (String, OccupancyStatus)>>(iter: I) -> Self {
        let mut state = OccupancyState::default();
        for (spot_id, status) in iter {
            match state.position(&spot_id) {
                Some(index) => state.spots[index].status = status,
                None => state.spots.push(SpotOccupancy { spot_id, status }),
            }
        }
        state
    }
}

/// Change notifications published after each successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OccupancyEvent {
    LocationSelected { location_id: String },
    SpotToggled {
        spot_id: String,
        status: OccupancyStatus,
    },
    SelectionChanged { spot_id: Option<String> },
}

pub type SharedEngine = Arc<Mutex<OccupancyEngine>>;

/// Lock a shared engine, recovering the guard if a previous holder panicked.
///
/// Each mutation completes before the lock is released, so the mapping is
/// consistent even after a poisoning panic.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, OccupancyEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct OccupancyEngine {
    catalog: Arc<LocationCatalog>,
    free_probability: f64,
    location_id: Option<String>,
    state: OccupancyState,
    selection: Option<String>,
    toggles: u64,
    events: broadcast::Sender<OccupancyEvent>,
}

impl std::fmt::Debug for OccupancyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccupancyEngine")
            .field("location_id", &self.location_id)
            .field("free_probability", &self.free_probability)
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("toggles", &self.toggles)
            .finish_non_exhaustive()
    }
}

impl OccupancyEngine {
    #[must_use]
    pub fn new(catalog: Arc<LocationCatalog>) -> Self {
        Self::with_free_probability(catalog, DEFAULT_FREE_PROBABILITY)
    }

    /// Create an engine whose initial draws are free with `free_probability`.
    ///
    /// Values outside `[0, 1]` are clamped; a non-finite value falls back to
    /// [`DEFAULT_FREE_PROBABILITY`].
    #[must_use]
    pub fn with_free_probability(catalog: Arc<LocationCatalog>, free_probability: f64) -> Self {
        let free_probability = if free_probability.is_finite() {
            free_probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_FREE_PROBABILITY
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            catalog,
            free_probability,
            location_id: None,
            state: OccupancyState::default(),
            selection: None,
            toggles: 0,
            events,
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Replace the whole mapping with fresh random draws for location `id`.
    ///
    /// Each spot is independently free with the engine's free probability.
    /// Selecting the current location again re-rolls every spot. Any
    /// selection is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if `id` is not in the catalog; the
    /// current mapping is kept in that case.
    pub fn select_location<R: Rng + ?Sized>(
        &mut self,
        id: &str,
        rng: &mut R,
    ) -> Result<&OccupancyState, EngineError> {
        let catalog = Arc::clone(&self.catalog);
        let location = catalog.get(id)?;

        let free_probability = self.free_probability;
        let spots = location
            .spots
            .iter()
            .map(|spot_id| SpotOccupancy {
                spot_id: spot_id.clone(),
                status: if rng.random_bool(free_probability) {
                    OccupancyStatus::Free
                } else {
                    OccupancyStatus::Occupied
                },
            })
            .collect();

        self.state = OccupancyState { spots };
        self.location_id = Some(location.id.clone());
        let had_selection = self.selection.take().is_some();

        tracing::info!(
            location = %location.id,
            spots = self.state.len(),
            free = self.state.iter().filter(|s| s.status.is_free()).count(),
            "location selected"
        );

        self.publish(OccupancyEvent::LocationSelected {
            location_id: location.id.clone(),
        });
        if had_selection {
            self.publish(OccupancyEvent::SelectionChanged { spot_id: None });
        }

        Ok(&self.state)
    }

    /// Flip a spot between free and occupied, returning its new status.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSpot`] if the spot is not part of the
    /// current mapping.
    pub fn toggle_spot(&mut self, spot_id: &str) -> Result<OccupancyStatus, EngineError> {
        let index = self.index_of(spot_id)?;
        Ok(self.flip_at(index))
    }

    /// Toggle one spot chosen uniformly from the current mapping.
    ///
    /// Returns `None` without doing anything when the mapping is empty.
    pub fn toggle_random_spot<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Option<(String, OccupancyStatus)> {
        if self.state.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.state.len());
        let status = self.flip_at(index);
        Some((self.state.spots[index].spot_id.clone(), status))
    }

    /// Force a spot to `status`. Returns whether the status changed; a change
    /// counts as a toggle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSpot`] if the spot is not part of the
    /// current mapping.
    pub fn set_status(
        &mut self,
        spot_id: &str,
        status: OccupancyStatus,
    ) -> Result<bool, EngineError> {
        let index = self.index_of(spot_id)?;
        if self.state.spots[index].status == status {
            return Ok(false);
        }
        self.flip_at(index);
        Ok(true)
    }

    /// Highlight a free spot as the navigation target.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSpot`] for a spot outside the current
    /// mapping and [`EngineError::InvalidSelection`] if it is occupied.
    pub fn select_spot(&mut self, spot_id: &str) -> Result<(), EngineError> {
        match self.state.get(spot_id) {
            None => Err(EngineError::UnknownSpot {
                spot_id: spot_id.to_string(),
            }),
            Some(status @ OccupancyStatus::Occupied) => Err(EngineError::InvalidSelection {
                spot_id: spot_id.to_string(),
                status,
            }),
            Some(OccupancyStatus::Free) => {
                if self.selection.as_deref() != Some(spot_id) {
                    self.selection = Some(spot_id.to_string());
                    self.publish(OccupancyEvent::SelectionChanged {
                        spot_id: Some(spot_id.to_string()),
                    });
                }
                Ok(())
            }
        }
    }

    /// Drop the current selection. Returns `false` if nothing was selected.
    pub fn clear_selection(&mut self) -> bool {
        if self.selection.take().is_none() {
            return false;
        }
        self.publish(OccupancyEvent::SelectionChanged { spot_id: None });
        true
    }

    #[must_use]
    pub fn current_state(&self) -> &OccupancyState {
        &self.state
    }

    #[must_use]
    pub fn current_location(&self) -> Option<&Location> {
        self.location_id
            .as_deref()
            .and_then(|id| self.catalog.find(id))
    }

    #[must_use]
    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    #[must_use]
    pub fn status_of(&self, spot_id: &str) -> Option<OccupancyStatus> {
        self.state.get(spot_id)
    }

    /// Ids of the free spots, in spot order.
    #[must_use]
    pub fn free_spots(&self) -> Vec<String> {
        self.state
            .iter()
            .filter(|s| s.status.is_free())
            .map(|s| s.spot_id.clone())
            .collect()
    }

    /// Number of status changes since the engine was created.
    #[must_use]
    pub fn toggle_count(&self) -> u64 {
        self.toggles
    }

    #[must_use]
    pub fn free_probability(&self) -> f64 {
        self.free_probability
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<LocationCatalog> {
        &self.catalog
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OccupancyEvent> {
        self.events.subscribe()
    }

    fn index_of(&self, spot_id: &str) -> Result<usize, EngineError> {
        self.state
            .position(spot_id)
            .ok_or_else(|| EngineError::UnknownSpot {
                spot_id: spot_id.to_string(),
            })
    }

    fn flip_at(&mut self, index: usize) -> OccupancyStatus {
        let entry = &mut self.state.spots[index];
        entry.status = entry.status.toggled();
        let status = entry.status;
        let spot_id = entry.spot_id.clone();
        self.toggles += 1;

        tracing::debug!(spot = %spot_id, %status, "spot toggled");

        // A selection must always point at a free spot.
        let drop_selection =
            status == OccupancyStatus::Occupied && self.selection.as_deref() == Some(&spot_id);

        self.publish(OccupancyEvent::SpotToggled { spot_id, status });
        if drop_selection {
            self.selection = None;
            self.publish(OccupancyEvent::SelectionChanged { spot_id: None });
        }

        status
    }

    fn publish(&self, event: OccupancyEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "occupancy_test.rs"]
mod tests;
