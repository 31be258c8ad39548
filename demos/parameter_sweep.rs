use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use clap_derive::{Parser, ValueEnum};
use rustarq::arq::ArqVariant;
use rustarq::config::Scheduling;
use rustarq::frame::FecParams;
use rustarq::sweep::{Sweep, SweepParameter};
use rustarq::topology::Topology;
use tracing::Level;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Protocol {
    Gbn,
    Sr,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shape {
    Mesh,
    Grid,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Swept {
    Nodes,
    FrameSize,
    Frames,
    ErrorRate,
    Window,
}

/// Sweeps one parameter of a Go-Back-N or Selective-Repeat simulation and prints averaged
///  throughput and loss rate for every value
#[derive(Parser)]
struct Args {
    #[clap(long, value_enum, default_value_t = Protocol::Gbn)]
    protocol: Protocol,
    #[clap(long, value_enum, default_value_t = Shape::Mesh)]
    topology: Shape,
    #[clap(long, value_enum, default_value_t = Swept::ErrorRate)]
    sweep: Swept,

    /// nodes of a mesh, or rows of a single-column grid
    #[clap(long, default_value_t = 5)]
    nodes: usize,
    #[clap(long, default_value_t = 600)]
    frame_size: usize,
    #[clap(long, default_value_t = 60)]
    frames: u64,
    #[clap(long, default_value_t = 0.05)]
    error_rate: f64,
    #[clap(long, default_value_t = 0.0)]
    symbol_error_rate: f64,
    #[clap(long, default_value_t = 100)]
    window: usize,
    #[clap(long, default_value_t = 255)]
    rs_n: usize,
    #[clap(long, default_value_t = 223)]
    rs_k: usize,
    /// delay after a lost frame in milliseconds
    #[clap(long, default_value_t = 10)]
    loss_delay_ms: u64,
    #[clap(long, default_value_t = 25)]
    trials: usize,
    #[clap(long)]
    seed: Option<u64>,
    /// run every lane as a separate task
    #[clap(long, default_value_t = false)]
    tasks: bool,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,
    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::DEBUG,
        (true, _) => Level::INFO,
        (false, false) => Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();

    let variant = match args.protocol {
        Protocol::Gbn => ArqVariant::GoBackN,
        Protocol::Sr => ArqVariant::SelectiveRepeat { window_size: args.window },
    };
    let topology = topology_with(args.topology, args.nodes);

    let mut sweep = Sweep::for_topology(topology, variant, args.trials)?;
    let config = sweep.base_mut();
    config.frame_size = args.frame_size;
    config.target_frames = args.frames;
    config.error_rate = args.error_rate;
    config.symbol_error_rate = args.symbol_error_rate;
    config.fec = FecParams::new(args.rs_n, args.rs_k)?;
    config.loss_delay = Duration::from_millis(args.loss_delay_ms);
    config.seed = args.seed;
    if args.tasks {
        config.scheduling = Scheduling::Tasks;
    }
    config.validate()?;

    let parameter = match args.sweep {
        Swept::Nodes => SweepParameter::Peers(
            (5..=25).step_by(5)
                .map(|n| topology_with(args.topology, n).peer_count())
                .collect::<Result<_, _>>()?),
        Swept::FrameSize => SweepParameter::FrameSize((600..=1000).step_by(100).collect()),
        Swept::Frames => SweepParameter::TargetFrames((60..=90).step_by(10).collect()),
        Swept::ErrorRate => SweepParameter::ErrorRate((1..=5).map(|i| 0.05 * i as f64).collect()),
        Swept::Window => {
            if let ArqVariant::GoBackN = variant {
                return Err(anyhow!("--sweep window requires --protocol sr"));
            }
            SweepParameter::WindowSize(vec![1, 10, 50, 100, 200])
        }
    };

    println!("{} over {} ({} peers), averaged over {} trials", variant.name(), topology, sweep.base().peers, args.trials);
    println!("{:>18} {:>22} {:>12}", parameter.name(), "throughput (frames/s)", "loss rate");
    for point in sweep.run(&parameter).await? {
        println!("{:>18} {:>22.2} {:>12.4}", point.value.to_string(), point.mean_throughput, point.mean_loss_rate);
    }
    Ok(())
}

fn topology_with(shape: Shape, nodes: usize) -> Topology {
    match shape {
        Shape::Mesh => Topology::Mesh { nodes },
        Shape::Grid => Topology::Grid { rows: nodes, cols: 1 },
    }
}
