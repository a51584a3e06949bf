//! Occupancy state engine for the parking dashboard.
//!
//! [`OccupancyEngine`] owns the spot → status mapping of the selected
//! location, [`analytics`] derives counts and rates from it, and
//! [`SimulationDriver`] mutates it on a timer to imitate a live feed.
//! [`Dashboard`] ties them together as the application state.

pub mod analytics;
pub mod dashboard;
pub mod error;
pub mod occupancy;
pub mod simulation;

pub use analytics::{
    distribution, occupancy_rate_percent, summarize, AnalyticsSnapshot, DistributionSlice,
};
pub use dashboard::{Dashboard, DashboardOverview, DashboardSettings, View};
pub use error::EngineError;
pub use occupancy::{
    lock_engine, OccupancyEngine, OccupancyEvent, OccupancyState, OccupancyStatus, SharedEngine,
    SpotOccupancy, DEFAULT_FREE_PROBABILITY,
};
pub use simulation::SimulationDriver;
