//! Scheduler configuration
//!
//! The configuration surface is deliberately small: the worker-pool size
//! for concurrent reconciles and the region-matching strategy.

use crate::error::SchedulerError;
use std::fmt;
use std::str::FromStr;

/// Region-matching strategy applied when a Shoot's purpose is not "testing".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Only Seeds in the Shoot's own region qualify
    SameRegion,
    /// Seeds at minimal region distance qualify, same-provider preferred
    MinimalDistance,
}

/// The valid strategy values, in the order they are documented.
pub const STRATEGIES: [Strategy; 2] = [Strategy::SameRegion, Strategy::MinimalDistance];

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SameRegion => write!(f, "SameRegion"),
            Strategy::MinimalDistance => write!(f, "MinimalDistance"),
        }
    }
}

impl FromStr for Strategy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SameRegion" => Ok(Strategy::SameRegion),
            "MinimalDistance" => Ok(Strategy::MinimalDistance),
            other => Err(SchedulerError::Configuration(format!(
                "unknown scheduling strategy '{}', valid strategies are: SameRegion, MinimalDistance",
                other
            ))),
        }
    }
}

/// Runtime configuration of the scheduler controller
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Maximum number of Shoots reconciled in parallel
    pub concurrent_syncs: u16,

    /// Region-matching strategy for the candidate pipeline
    pub strategy: Strategy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrent_syncs: 20,
            strategy: Strategy::SameRegion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_round_trip() {
        for strategy in STRATEGIES {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_unknown_strategy_is_error() {
        let err = "Closest".parse::<Strategy>().unwrap_err();
        assert!(err.to_string().contains("unknown scheduling strategy 'Closest'"));
        assert!(err.to_string().contains("SameRegion"));
    }

    #[test]
    fn test_strategy_parse_is_case_sensitive() {
        assert!("sameregion".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.concurrent_syncs, 20);
        assert_eq!(config.strategy, Strategy::SameRegion);
    }
}
