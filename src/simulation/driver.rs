use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::arq::ArqReceiver;
use crate::config::{ConfigError, Scheduling, SimulationConfig};
use crate::simulation::lane::{Lane, StepOutcome};
use crate::simulation::metrics::RunReport;
use crate::simulation::SimulationError;
use crate::util::random::{RngRandom, Random};


/// Drives all lanes of a run to the completion barrier: the run ends when the *last* lane has
///  reached its target of acknowledged frames.
pub struct SimulationDriver<A: ArqReceiver, R: Random> {
    config: SimulationConfig,
    lanes: Vec<Lane<A, R>>,
}
impl<A: ArqReceiver> SimulationDriver<A, RngRandom> {
    /// one lane per peer, each with a receiver from `new_receiver` and its own RNG
    pub fn new(config: SimulationConfig, new_receiver: impl Fn() -> Result<A, ConfigError>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut lanes = Vec::with_capacity(config.peers);
        for id in 0..config.peers {
            lanes.push(Lane::new(id, &config, new_receiver()?, RngRandom::for_lane(config.seed, id))?);
        }

        Ok(SimulationDriver {
            config,
            lanes,
        })
    }
}
impl<A: ArqReceiver, R: Random + Send + 'static> SimulationDriver<A, R> {
    pub fn with_lanes(config: SimulationConfig, lanes: Vec<Lane<A, R>>) -> Result<Self, ConfigError> {
        config.validate()?;
        if lanes.is_empty() {
            return Err(ConfigError::NoPeers);
        }

        Ok(SimulationDriver {
            config,
            lanes,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub async fn run(self) -> Result<RunReport, SimulationError> {
        let SimulationDriver { config, lanes } = self;
        debug!("starting {} run with {} lanes, target {} frames per lane", config.variant.name(), lanes.len(), config.target_frames);

        let start = Instant::now();
        let lanes = match config.scheduling {
            Scheduling::RoundRobin => run_round_robin(&config, lanes).await?,
            Scheduling::Tasks => run_tasks(&config, lanes).await?,
        };

        let report = RunReport::new(lanes.iter().map(Lane::counters).collect(), start.elapsed());
        info!("{} run complete: {} frames acknowledged in {:?} - throughput {:.2} frames/s, loss rate {:.4}",
            config.variant.name(), report.totals.acknowledged, report.elapsed, report.throughput, report.loss_rate);
        Ok(report)
    }
}

/// Sweeps the lanes in index order, giving every unfinished lane one turn per sweep. A lane that
///  lost a frame sits out the following sweeps until its loss delay has passed, while the other
///  lanes carry on.
async fn run_round_robin<A: ArqReceiver, R: Random>(config: &SimulationConfig, mut lanes: Vec<Lane<A, R>>) -> Result<Vec<Lane<A, R>>, SimulationError> {
    let mut sweeps = 0u64;

    while !lanes.iter().all(Lane::is_complete) {
        if config.max_sweeps.is_some_and(|max| sweeps >= max) {
            warn!("giving up after {} sweeps: {} of {} lanes incomplete", sweeps, lanes.iter().filter(|l| !l.is_complete()).count(), lanes.len());
            return Err(SimulationError::SweepLimitReached { sweeps });
        }
        sweeps += 1;

        let now = Instant::now();
        let mut any_sent = false;
        for lane in lanes.iter_mut() {
            if lane.is_complete() || lane.is_suspended(now) {
                continue;
            }

            match lane.step() {
                StepOutcome::Lost => {
                    any_sent = true;
                    if !config.loss_delay.is_zero() {
                        lane.suspend_until(now + config.loss_delay);
                    }
                }
                StepOutcome::Acknowledged | StepOutcome::Rejected => any_sent = true,
                StepOutcome::WindowClosed => {}
            }
        }

        if !any_sent {
            // every unfinished lane is waiting - either for its loss delay, or for its window
            let earliest_wakeup = lanes.iter()
                .filter(|l| !l.is_complete())
                .filter_map(Lane::suspended_until)
                .filter(|until| *until > now)
                .min();

            match earliest_wakeup {
                Some(wakeup) => sleep_until(wakeup).await,
                None => tokio::task::yield_now().await,
            }
        }
    }

    debug!("all lanes complete after {} sweeps", sweeps);
    Ok(lanes)
}

/// Runs every lane as a separate task. Lanes are independent, so this changes nothing but the
///  interleaving - and lets loss delays of different lanes overlap on a multi-threaded runtime.
async fn run_tasks<A: ArqReceiver, R: Random + Send + 'static>(config: &SimulationConfig, lanes: Vec<Lane<A, R>>) -> Result<Vec<Lane<A, R>>, SimulationError> {
    let num_lanes = lanes.len();

    let mut join_set = JoinSet::new();
    for lane in lanes {
        join_set.spawn(lane.run_to_completion(config.loss_delay, config.max_sweeps));
    }

    let mut completed = Vec::with_capacity(num_lanes);
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok(lane)) => completed.push(lane),
            Ok(Err(e)) => {
                join_set.abort_all();
                return Err(e);
            }
            Err(e) => {
                join_set.abort_all();
                return Err(SimulationError::LaneTaskFailed(e.to_string()));
            }
        }
    }

    completed.sort_by_key(Lane::id);
    Ok(completed)
}
