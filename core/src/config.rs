//! Configuration for a simulated day at the station.
//!
//! Loaded from a TOML file or from `CHAIRLIFT_*` environment variables, with
//! defaults taken from a small two-hour morning session.
//!
//! # Example
//!
//! ```
//! use chairlift_core::config::SimulationConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SimulationConfig::from_toml_str(
//!     r#"
//!     [capacity]
//!     platform = 20
//!     vip_chairs = 2
//!     "#,
//! )?;
//!
//! assert_eq!(config.capacity.platform, 20);
//! assert_eq!(config.capacity.vip_seats(), 6);
//! assert_eq!(config.session.session_minutes(), 120);
//! # Ok(())
//! # }
//! ```

use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        /// File that could not be read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment variable holds a value of the wrong type
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Opening hours and clock compression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hour the station opens (local time)
    pub opening_hour: u8,
    /// Hour the station closes (local time)
    pub closing_hour: u8,
    /// Simulated minutes that pass per clock tick
    pub minutes_per_tick: u32,
    /// Real time between clock ticks, in milliseconds
    pub tick_interval_ms: u64,
}

impl SessionConfig {
    /// Length of the session in simulated minutes
    #[must_use]
    pub const fn session_minutes(&self) -> u32 {
        (self.closing_hour.saturating_sub(self.opening_hour) as u32) * 60
    }

    /// Real time between clock ticks
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            opening_hour: 8,
            closing_hour: 10,
            minutes_per_tick: 2,
            tick_interval_ms: 1000,
        }
    }
}

/// Arriving skiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Skiers arriving during the day
    pub skiers: u32,
    /// Upper bound on the random delay between two arrivals, in milliseconds
    pub arrival_jitter_ms: u64,
    /// Children a single guardian may supervise
    pub max_dependents_per_guardian: u8,
    /// Seed for every random choice; random if absent
    pub seed: Option<u64>,
}

impl PopulationConfig {
    /// Upper bound on the delay between arrivals
    #[must_use]
    pub const fn arrival_jitter(&self) -> Duration {
        Duration::from_millis(self.arrival_jitter_ms)
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            skiers: 50,
            arrival_jitter_ms: 500,
            max_dependents_per_guardian: 2,
            seed: None,
        }
    }
}

/// Largest slot pool a capacity gate can hold (tokio's semaphore permit limit)
pub const MAX_CAPACITY: usize = usize::MAX >> 3;

/// Sizes of the bounded resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Admission gates (turnstiles)
    pub gates: usize,
    /// Skiers allowed on the boarding platform at once
    pub platform: usize,
    /// Standard chairs on the cable
    pub chairs: usize,
    /// Seats per chair
    pub seats_per_chair: usize,
    /// Chairs reserved for VIP entitlements
    pub vip_chairs: usize,
}

impl CapacityConfig {
    /// Seats in the standard pool
    #[must_use]
    pub const fn standard_seats(&self) -> usize {
        self.chairs.saturating_mul(self.seats_per_chair)
    }

    /// Seats in the VIP pool
    #[must_use]
    pub const fn vip_seats(&self) -> usize {
        self.vip_chairs.saturating_mul(self.seats_per_chair)
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            gates: 4,
            platform: 50,
            chairs: 40,
            seats_per_chair: 3,
            vip_chairs: 4,
        }
    }
}

/// Timing of the ride itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    /// Ticks needed to reach the top
    pub ascent_ticks: u32,
    /// Real time per ascent tick, in milliseconds
    pub ascent_tick_ms: u64,
    /// Real time to ski T1, T2 and T3, in milliseconds
    pub descent_ms: [u64; 3],
}

impl RideConfig {
    /// Real time per ascent tick
    #[must_use]
    pub const fn ascent_tick(&self) -> Duration {
        Duration::from_millis(self.ascent_tick_ms)
    }

    /// Real time to ski `route`
    #[must_use]
    pub const fn descent(&self, route: Route) -> Duration {
        Duration::from_millis(self.descent_ms[route.index()])
    }
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            ascent_ticks: 5,
            ascent_tick_ms: 400,
            descent_ms: [2000, 4000, 6000],
        }
    }
}

/// Station workers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffConfig {
    /// Workers able to pause the lift
    pub workers: u8,
    /// Chance per poll that a worker stops the lift
    pub stop_probability: f64,
    /// Real time between polls, in milliseconds
    pub poll_interval_ms: u64,
    /// How long a routine stop lasts, in milliseconds
    pub outage_ms: u64,
}

impl StaffConfig {
    /// Real time between polls
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// How long a routine stop lasts
    #[must_use]
    pub const fn outage(&self) -> Duration {
        Duration::from_millis(self.outage_ms)
    }
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            stop_probability: 0.1,
            poll_interval_ms: 1000,
            outage_ms: 2000,
        }
    }
}

/// End-of-day behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Delay between the station draining and the permanent lift stop, in milliseconds
    pub grace_ms: u64,
    /// Interval at which the coordinator polls the in-flight counters, in milliseconds
    pub drain_poll_ms: u64,
    /// How long background tasks get to exit after the halt, in milliseconds
    pub task_timeout_ms: u64,
}

impl ShutdownConfig {
    /// Delay between drain and halt
    #[must_use]
    pub const fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Drain poll interval
    #[must_use]
    pub const fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }

    /// Background task exit timeout
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_ms: 5000,
            drain_poll_ms: 100,
            task_timeout_ms: 2000,
        }
    }
}

/// Full simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Opening hours and clock compression
    pub session: SessionConfig,
    /// Arriving skiers
    pub population: PopulationConfig,
    /// Sizes of the bounded resources
    pub capacity: CapacityConfig,
    /// Ride timing
    pub ride: RideConfig,
    /// Station workers
    pub staff: StaffConfig,
    /// End-of-day behaviour
    pub shutdown: ShutdownConfig,
}

impl SimulationConfig {
    /// Parse and validate a TOML document
    ///
    /// Missing sections and fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Validation`] for inconsistent values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SimulationConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Defaults overridden by `CHAIRLIFT_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a variable does not parse and
    /// [`ConfigError::Validation`] for inconsistent values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        override_from_env("CHAIRLIFT_SKIERS", &mut config.population.skiers)?;
        override_from_env("CHAIRLIFT_GATES", &mut config.capacity.gates)?;
        override_from_env("CHAIRLIFT_PLATFORM_CAPACITY", &mut config.capacity.platform)?;
        override_from_env("CHAIRLIFT_CHAIRS", &mut config.capacity.chairs)?;
        override_from_env("CHAIRLIFT_SEATS_PER_CHAIR", &mut config.capacity.seats_per_chair)?;
        override_from_env("CHAIRLIFT_VIP_CHAIRS", &mut config.capacity.vip_chairs)?;
        override_from_env("CHAIRLIFT_WORKERS", &mut config.staff.workers)?;
        override_from_env("CHAIRLIFT_TICK_MS", &mut config.session.tick_interval_ms)?;

        if let Ok(value) = env::var("CHAIRLIFT_SEED") {
            let seed = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "CHAIRLIFT_SEED",
                value,
            })?;
            config.population.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a runnable day
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.session.closing_hour <= self.session.opening_hour {
            return fail("session.closing_hour must be after session.opening_hour");
        }
        if self.session.closing_hour > 24 {
            return fail("session.closing_hour must be <= 24");
        }
        if self.session.minutes_per_tick == 0 {
            return fail("session.minutes_per_tick must be > 0");
        }
        if self.session.tick_interval_ms == 0 {
            return fail("session.tick_interval_ms must be > 0");
        }
        if self.capacity.gates == 0 {
            return fail("capacity.gates must be > 0");
        }
        if self.capacity.platform == 0 {
            return fail("capacity.platform must be > 0");
        }
        if self.capacity.standard_seats() == 0 {
            return fail("capacity.chairs and capacity.seats_per_chair must be > 0");
        }
        if self.capacity.vip_seats() == 0 {
            return fail("capacity.vip_chairs must be > 0");
        }
        if self.capacity.platform > MAX_CAPACITY {
            return fail("capacity.platform is too large");
        }
        let seats = |chairs: usize| {
            chairs
                .checked_mul(self.capacity.seats_per_chair)
                .filter(|&seats| seats <= MAX_CAPACITY)
        };
        if seats(self.capacity.chairs).is_none() {
            return fail("capacity.chairs * capacity.seats_per_chair is too large");
        }
        if seats(self.capacity.vip_chairs).is_none() {
            return fail("capacity.vip_chairs * capacity.seats_per_chair is too large");
        }
        if self.ride.ascent_ticks == 0 {
            return fail("ride.ascent_ticks must be > 0");
        }
        if !(0.0..=1.0).contains(&self.staff.stop_probability) {
            return fail("staff.stop_probability must be between 0.0 and 1.0");
        }
        if self.staff.workers > 0 && self.staff.poll_interval_ms == 0 {
            return fail("staff.poll_interval_ms must be > 0");
        }
        if self.shutdown.drain_poll_ms == 0 {
            return fail("shutdown.drain_poll_ms must be > 0");
        }
        Ok(())
    }
}

fn override_from_env<T: FromStr>(var: &'static str, target: &mut T) -> Result<(), ConfigError> {
    match env::var(var) {
        Ok(value) => {
            *target = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { var, value })?;
            Ok(())
        },
        Err(_) => Ok(()),
    }
}
