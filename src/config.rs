use std::time::Duration;

use crate::arq::ArqVariant;
use crate::frame::{FecParams, MAX_BLOCK_LEN, MAX_PARITY_LEN};


#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("FEC parameters must satisfy {max_n} >= n > k > 0 and n - k <= {max_parity}, got n={n}, k={k}", max_n = MAX_BLOCK_LEN, max_parity = MAX_PARITY_LEN)]
    InvalidFecParams { n: usize, k: usize },
    #[error("selective repeat window size must be positive")]
    ZeroWindow,
    #[error("error rate must be a probability in [0, 1], got {0}")]
    InvalidErrorRate(f64),
    #[error("symbol error rate must be a probability in [0, 1], got {0}")]
    InvalidSymbolErrorRate(f64),
    #[error("frame size must be positive")]
    ZeroFrameSize,
    #[error("target number of acknowledged frames must be positive")]
    ZeroTarget,
    #[error("at least one sending peer is required")]
    NoPeers,
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Scheduling {
    /// all lanes are stepped in index order on the caller's task
    RoundRobin,
    /// every lane runs as a separate tokio task
    Tasks,
}


#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// number of sending peers, each with its own lane to the coordinator
    pub peers: usize,
    pub variant: ArqVariant,

    /// payload bytes per frame, before FEC encoding
    pub frame_size: usize,
    pub fec: FecParams,
    /// number of acknowledged frames every sender needs before the run is complete
    pub target_frames: u64,

    /// probability that a frame is dropped on the channel
    pub error_rate: f64,
    /// probability that an individual byte of a surviving frame is damaged
    pub symbol_error_rate: f64,
    /// time a sender waits before its next attempt after a loss
    pub loss_delay: Duration,

    pub scheduling: Scheduling,
    /// Upper bound for the number of turns a run may take. Runs at error rate 1.0 never complete,
    ///  so test harnesses need a way to bail out. With [Scheduling::RoundRobin] this counts sweeps
    ///  over all lanes; with [Scheduling::Tasks] it caps every lane's own turns, so a single lane
    ///  hitting it fails the run.
    pub max_sweeps: Option<u64>,
    pub seed: Option<u64>,
}
impl SimulationConfig {
    pub fn new(peers: usize, variant: ArqVariant) -> SimulationConfig {
        SimulationConfig {
            peers,
            variant,
            frame_size: 600,
            fec: FecParams::default(),
            target_frames: 60,
            error_rate: 0.05,
            symbol_error_rate: 0.0,
            loss_delay: Duration::from_millis(10),
            scheduling: Scheduling::RoundRobin,
            max_sweeps: None,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peers == 0 {
            return Err(ConfigError::NoPeers);
        }
        if let ArqVariant::SelectiveRepeat { window_size: 0 } = self.variant {
            return Err(ConfigError::ZeroWindow);
        }
        if self.frame_size == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }
        self.fec.validate()?;
        if self.target_frames == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if !is_probability(self.error_rate) {
            return Err(ConfigError::InvalidErrorRate(self.error_rate));
        }
        if !is_probability(self.symbol_error_rate) {
            return Err(ConfigError::InvalidSymbolErrorRate(self.symbol_error_rate));
        }
        Ok(())
    }
}

fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}
