//! The simulation loop: one [lane::Lane] per sending peer, driven to a global completion barrier
//!  by [driver::SimulationDriver], with per-lane counters reduced into a [metrics::RunReport] at
//!  the end.

pub mod driver;
pub mod lane;
pub mod metrics;

use crate::arq::{ArqVariant, GoBackNReceiver, SelectiveRepeatReceiver};
use crate::config::{ConfigError, SimulationConfig};
use crate::frame::FrameCodec;

pub use driver::SimulationDriver;
pub use metrics::{LaneCounters, RunReport};


#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The optional turn cap was hit before all lanes reached their target. `sweeps` counts
    ///  sweeps over all lanes under round-robin scheduling, and the turns of the lane that hit the
    ///  cap under task scheduling.
    #[error("run did not complete within {sweeps} turns")]
    SweepLimitReached { sweeps: u64 },
    #[error("lane task failed: {0}")]
    LaneTaskFailed(String),
}


/// Runs a single simulation with the ARQ variant selected in the config
pub async fn run_simulation(config: SimulationConfig) -> Result<RunReport, SimulationError> {
    let fec = config.fec;
    match config.variant {
        ArqVariant::GoBackN => {
            SimulationDriver::new(config, || Ok(GoBackNReceiver::new(FrameCodec::new(fec)?)))?
                .run().await
        }
        ArqVariant::SelectiveRepeat { window_size } => {
            SimulationDriver::new(config, || SelectiveRepeatReceiver::new(FrameCodec::new(fec)?, window_size))?
                .run().await
        }
    }
}


#[cfg(test)]
mod test {
    use std::error::Error;
    use super::*;

    #[test]
    fn test_config_error_is_the_source_of_a_simulation_error() {
        let e: SimulationError = ConfigError::ZeroTarget.into();

        assert_eq!(e, SimulationError::Config(ConfigError::ZeroTarget));
        assert_eq!(e.to_string(), "invalid configuration: target number of acknowledged frames must be positive");
        assert_eq!(e.source().map(|s| s.to_string()), Some(ConfigError::ZeroTarget.to_string()));
        assert!(SimulationError::SweepLimitReached { sweeps: 3 }.source().is_none());
    }
}
