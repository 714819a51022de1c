use crate::domain::fare::{DEFAULT_FLAT_FARE, FarePolicy, FlatFare, SurgeFare};
use crate::domain::selection::{
    DriverSelectionPolicy, LowestRegistrationOrder, MostRecentlyRegistered,
};
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Which driver a policy-driven claim takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    #[default]
    LowestRegistrationOrder,
    MostRecentlyRegistered,
}

impl SelectionStrategy {
    pub fn policy(self) -> Box<dyn DriverSelectionPolicy> {
        match self {
            SelectionStrategy::LowestRegistrationOrder => Box::new(LowestRegistrationOrder),
            SelectionStrategy::MostRecentlyRegistered => Box::new(MostRecentlyRegistered),
        }
    }
}

/// Tunables for a [`RideEngine`](crate::application::engine::RideEngine).
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "flat_fare": "85", "surge_multiplier": "1.25", "selection": "most-recently-registered" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub flat_fare: Decimal,
    pub surge_multiplier: Decimal,
    pub selection: SelectionStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flat_fare: DEFAULT_FLAT_FARE,
            surge_multiplier: Decimal::ONE,
            selection: SelectionStrategy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Builds the fare policy described by this config.
    pub fn fare_policy(&self) -> Result<Box<dyn FarePolicy>> {
        let flat = FlatFare::new(self.flat_fare)
            .map_err(|e| DispatchError::ConfigError(format!("flat_fare: {e}")))?;
        if self.surge_multiplier == Decimal::ONE {
            return Ok(Box::new(flat));
        }
        let surge = SurgeFare::new(flat, self.surge_multiplier)
            .map_err(|e| DispatchError::ConfigError(format!("surge_multiplier: {e}")))?;
        Ok(Box::new(surge))
    }

    pub fn selection_policy(&self) -> Box<dyn DriverSelectionPolicy> {
        self.selection.policy()
    }
}
