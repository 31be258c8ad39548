use std::fmt::{Display, Formatter};

use anyhow::anyhow;
use tracing::{debug, info};

use crate::arq::ArqVariant;
use crate::config::SimulationConfig;
use crate::simulation::run_simulation;
use crate::topology::Topology;


/// The single parameter a sweep varies, with the values to try
#[derive(Debug, Clone, PartialEq)]
pub enum SweepParameter {
    ErrorRate(Vec<f64>),
    FrameSize(Vec<usize>),
    Peers(Vec<usize>),
    TargetFrames(Vec<u64>),
    WindowSize(Vec<usize>),
}
impl SweepParameter {
    pub fn name(&self) -> &'static str {
        match self {
            SweepParameter::ErrorRate(_) => "error rate",
            SweepParameter::FrameSize(_) => "frame size",
            SweepParameter::Peers(_) => "number of peers",
            SweepParameter::TargetFrames(_) => "number of frames",
            SweepParameter::WindowSize(_) => "window size",
        }
    }

    /// one config per value, each a copy of `base` with only the swept parameter changed
    fn configs(&self, base: &SimulationConfig) -> anyhow::Result<Vec<(SweepValue, SimulationConfig)>> {
        fn with<T: Copy>(base: &SimulationConfig, values: &[T], to_value: impl Fn(T) -> SweepValue, apply: impl Fn(&mut SimulationConfig, T)) -> Vec<(SweepValue, SimulationConfig)> {
            values.iter()
                .map(|&v| {
                    let mut config = base.clone();
                    apply(&mut config, v);
                    (to_value(v), config)
                })
                .collect()
        }

        let result = match self {
            SweepParameter::ErrorRate(values) => with(base, values, SweepValue::Real, |c, v| c.error_rate = v),
            SweepParameter::FrameSize(values) => with(base, values, |v| SweepValue::Count(v as u64), |c, v| c.frame_size = v),
            SweepParameter::Peers(values) => with(base, values, |v| SweepValue::Count(v as u64), |c, v| c.peers = v),
            SweepParameter::TargetFrames(values) => with(base, values, SweepValue::Count, |c, v| c.target_frames = v),
            SweepParameter::WindowSize(values) => {
                if base.variant == ArqVariant::GoBackN {
                    return Err(anyhow!("window size can only be swept for selective repeat"));
                }
                with(base, values, |v| SweepValue::Count(v as u64), |c, v| c.variant = ArqVariant::SelectiveRepeat { window_size: v })
            }
        };
        Ok(result)
    }
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepValue {
    Real(f64),
    Count(u64),
}
impl Display for SweepValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepValue::Real(v) => write!(f, "{:.2}", v),
            SweepValue::Count(v) => write!(f, "{}", v),
        }
    }
}


/// Averaged results for one value of the swept parameter
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub value: SweepValue,
    pub mean_throughput: f64,
    pub mean_loss_rate: f64,
    pub trials: usize,
}


/// Varies one parameter of a base configuration at a time and averages the results over a number
///  of independent trials per value
pub struct Sweep {
    base: SimulationConfig,
    trials: usize,
}
impl Sweep {
    pub fn new(base: SimulationConfig, trials: usize) -> anyhow::Result<Sweep> {
        base.validate()?;
        if trials == 0 {
            return Err(anyhow!("a sweep needs at least one trial per value"));
        }

        Ok(Sweep { base, trials })
    }

    /// base config with the number of peers derived from a topology
    pub fn for_topology(topology: Topology, variant: ArqVariant, trials: usize) -> anyhow::Result<Sweep> {
        let peers = topology.peer_count()?;
        debug!("{} has coordinator {} and {} peers", topology, topology.coordinator()?, peers);

        Self::new(SimulationConfig::new(peers, variant), trials)
    }

    pub fn base(&self) -> &SimulationConfig {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SimulationConfig {
        &mut self.base
    }

    pub async fn run(&self, parameter: &SweepParameter) -> anyhow::Result<Vec<SweepPoint>> {
        let mut points = Vec::new();
        for (value, config) in parameter.configs(&self.base)? {
            config.validate()?;

            let mut throughput_sum = 0.0;
            let mut loss_rate_sum = 0.0;
            for trial in 0..self.trials {
                let mut config = config.clone();
                config.seed = self.base.seed.map(|seed| seed.wrapping_add(trial as u64));

                let report = run_simulation(config).await?;
                throughput_sum += report.throughput;
                loss_rate_sum += report.loss_rate;
            }

            let point = SweepPoint {
                value,
                mean_throughput: throughput_sum / self.trials as f64,
                mean_loss_rate: loss_rate_sum / self.trials as f64,
                trials: self.trials,
            };
            info!("{} {}: throughput {:.2} frames/s, loss rate {:.4}", parameter.name(), point.value, point.mean_throughput, point.mean_loss_rate);
            points.push(point);
        }
        Ok(points)
    }
}
