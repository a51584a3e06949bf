//! Application state shared by the presentation adapters.
//!
//! [`Dashboard`] owns the active view, the engine and the simulation driver
//! so adapters pass one value around instead of reaching for globals.

use std::sync::Arc;
use std::time::Duration;

use parkvision_core::{directions_url, AppConfig, Location, LocationCatalog};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analytics::{distribution, occupancy_rate_percent, summarize};
use crate::occupancy::{lock_engine, OccupancyEngine, OccupancyEvent, SharedEngine};
use crate::simulation::{SimulationDriver, DEFAULT_INTERVAL};
use crate::{
    AnalyticsSnapshot, DistributionSlice, EngineError, OccupancyStatus, SpotOccupancy,
    DEFAULT_FREE_PROBABILITY,
};

/// Which audience the dashboard is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Find-a-spot view: free spots, selection and directions.
    #[default]
    Driver,
    /// Operator view: analytics and the live-demo switch.
    Admin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub default_location: String,
    pub sim_interval: Duration,
    pub free_probability: f64,
    pub rng_seed: Option<u64>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_location: "freedom-square".to_string(),
            sim_interval: DEFAULT_INTERVAL,
            free_probability: DEFAULT_FREE_PROBABILITY,
            rng_seed: None,
        }
    }
}

impl DashboardSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            default_location: config.default_location.clone(),
            sim_interval: Duration::from_millis(config.sim_interval_ms),
            free_probability: config.free_probability,
            rng_seed: config.rng_seed,
        }
    }
}

/// Everything a renderer needs, read under a single engine lock.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub view: View,
    pub location: Option<Location>,
    pub spots: Vec<SpotOccupancy>,
    pub free_spots: Vec<String>,
    pub selection: Option<String>,
    pub analytics: AnalyticsSnapshot,
    pub occupancy_rate: Decimal,
    pub distribution: [DistributionSlice; 2],
    pub directions_url: Option<String>,
    pub simulating: bool,
}

#[derive(Debug)]
pub struct Dashboard {
    view: View,
    catalog: Arc<LocationCatalog>,
    engine: SharedEngine,
    driver: SimulationDriver,
    rng: StdRng,
}

impl Dashboard {
    /// Build the dashboard and select the configured default location.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] if the default location is not in
    /// the catalog.
    pub fn new(
        catalog: Arc<LocationCatalog>,
        settings: &DashboardSettings,
    ) -> Result<Self, EngineError> {
        let mut rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut engine =
            OccupancyEngine::with_free_probability(Arc::clone(&catalog), settings.free_probability);
        engine.select_location(&settings.default_location, &mut rng)?;
        let engine = engine.into_shared();

        // Offset the driver's seed so its picks don't mirror the initial draws.
        let driver_seed = settings.rng_seed.map(|seed| seed.wrapping_add(1));
        let driver = SimulationDriver::new(Arc::clone(&engine), settings.sim_interval, driver_seed);

        Ok(Self {
            view: View::default(),
            catalog,
            engine,
            driver,
            rng,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<LocationCatalog> {
        &self.catalog
    }

    #[must_use]
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Switch to (or re-roll) a location.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown location id.
    pub fn select_location(&mut self, id: &str) -> Result<(), EngineError> {
        lock_engine(&self.engine).select_location(id, &mut self.rng)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSpot`] for a spot outside the current
    /// location.
    pub fn toggle_spot(&self, spot_id: &str) -> Result<OccupancyStatus, EngineError> {
        lock_engine(&self.engine).toggle_spot(spot_id)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSpot`] or [`EngineError::InvalidSelection`].
    pub fn select_spot(&self, spot_id: &str) -> Result<(), EngineError> {
        lock_engine(&self.engine).select_spot(spot_id)
    }

    pub fn clear_selection(&self) -> bool {
        lock_engine(&self.engine).clear_selection()
    }

    pub fn start_simulation(&mut self) -> bool {
        self.driver.start()
    }

    pub fn stop_simulation(&mut self) -> bool {
        self.driver.stop()
    }

    pub fn toggle_simulation(&mut self) -> bool {
        self.driver.toggle()
    }

    #[must_use]
    pub fn is_simulating(&self) -> bool {
        self.driver.is_running()
    }

    #[must_use]
    pub fn simulation_interval(&self) -> Duration {
        self.driver.interval()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OccupancyEvent> {
        lock_engine(&self.engine).subscribe()
    }

    #[must_use]
    pub fn overview(&self) -> DashboardOverview {
        let engine = lock_engine(&self.engine);
        let state = engine.current_state();
        let analytics = summarize(state);
        let location = engine.current_location().cloned();

        DashboardOverview {
            view: self.view,
            directions_url: location.as_ref().map(|l| directions_url(&l.coordinates)),
            location,
            spots: state.iter().cloned().collect(),
            free_spots: engine.free_spots(),
            selection: engine.selection().map(ToString::to_string),
            analytics,
            occupancy_rate: occupancy_rate_percent(&analytics),
            distribution: distribution(&analytics),
            simulating: self.driver.is_running(),
        }
    }
}
