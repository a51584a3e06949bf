use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// YAML catalog to load instead of the built-in one.
    pub catalog_path: Option<PathBuf>,
    /// Location selected at startup.
    pub default_location: String,
    /// Period between simulated occupancy changes.
    pub sim_interval_ms: u64,
    /// Probability that a spot starts out free when a location is selected.
    pub free_probability: f64,
    /// Fixed seed for reproducible demos; OS entropy when `None`.
    pub rng_seed: Option<u64>,
}
