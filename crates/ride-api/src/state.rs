//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor: configuration, the ride store and the fare
//! calculator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use ride_state::Ride;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::pricing::{
    DistanceFareCalculator, FareCalculator, DEFAULT_BASE_FARE_CENTS, DEFAULT_PER_KM_CENTS,
};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// Snapshot of all records matching `filter`.
    pub fn list_where(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| filter(v))
            .cloned()
            .collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the write lock, so no other writer can change
    /// the record between validation and mutation. Returns `None` if the
    /// record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Run `f` with exclusive access to the whole map, for operations whose
    /// validation spans several records.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Configuration ------------------------------------------------------------

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token`.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, secrets are not checked.
    pub auth_token: Option<Zeroizing<String>>,
    pub base_fare_cents: u64,
    pub per_km_cents: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("base_fare_cents", &self.base_fare_cents)
            .field("per_km_cents", &self.per_km_cents)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            base_fare_cents: DEFAULT_BASE_FARE_CENTS,
            per_km_cents: DEFAULT_PER_KM_CENTS,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PORT` (default 8080)
    /// - `AUTH_TOKEN` (optional)
    /// - `RIDE_BASE_FARE_CENTS` (default 250)
    /// - `RIDE_PER_KM_CENTS` (default 150)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: env_parse("PORT", defaults.port)?,
            auth_token: std::env::var("AUTH_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            base_fare_cents: env_parse("RIDE_BASE_FARE_CENTS", defaults.base_fare_cents)?,
            per_km_cents: env_parse("RIDE_PER_KM_CENTS", defaults.per_km_cents)?,
        })
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(var.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub rides: Store<Ride>,
    pub fares: Arc<dyn FareCalculator>,
}

impl AppState {
    /// State with default configuration (auth disabled).
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// State using the distance-based fare calculator from `config`.
    pub fn with_config(config: AppConfig) -> Self {
        let fares = Arc::new(DistanceFareCalculator {
            base_cents: config.base_fare_cents,
            per_km_cents: config.per_km_cents,
        });
        Self::with_fare_calculator(config, fares)
    }

    pub fn with_fare_calculator(config: AppConfig, fares: Arc<dyn FareCalculator>) -> Self {
        Self {
            config,
            rides: Store::new(),
            fares,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
