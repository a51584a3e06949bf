use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a working
/// development config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PARKVISION_ENV", "development"))?;
    let bind_addr = parse_addr("PARKVISION_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PARKVISION_LOG_LEVEL", "info");
    let catalog_path = lookup("PARKVISION_CATALOG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let default_location = or_default("PARKVISION_DEFAULT_LOCATION", "freedom-square");

    let sim_interval_ms = parse_u64("PARKVISION_SIM_INTERVAL_MS", "3000")?;
    if sim_interval_ms == 0 {
        return Err(invalid(
            "PARKVISION_SIM_INTERVAL_MS",
            "must be greater than zero".to_string(),
        ));
    }

    let free_probability = or_default("PARKVISION_FREE_PROBABILITY", "0.4")
        .parse::<f64>()
        .map_err(|e| invalid("PARKVISION_FREE_PROBABILITY", e.to_string()))?;
    if !(0.0..=1.0).contains(&free_probability) {
        return Err(invalid(
            "PARKVISION_FREE_PROBABILITY",
            format!("{free_probability} is outside [0, 1]"),
        ));
    }

    let rng_seed = match lookup("PARKVISION_RNG_SEED") {
        Ok(raw) => Some(
            raw.parse::<u64>()
                .map_err(|e| invalid("PARKVISION_RNG_SEED", e.to_string()))?,
        ),
        Err(_) => None,
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        default_location,
        sim_interval_ms,
        free_probability,
        rng_seed,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARKVISION_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
