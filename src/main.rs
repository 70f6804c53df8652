use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

use rust_csma::fixtures::{two_node_config, two_node_timelines};
use rust_csma::scheduler::{timelines_from, Scheduler};
use rust_csma::theoretical::expected_throughput;
use rust_csma::{
    report, run_simulation, run_sweep, scenario, BusConfig, ConstantSource, RandomStream,
    Result, SensingMode,
};

#[derive(Parser)]
#[command(author, version, about = "CSMA shared-bus contention simulator", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Single run on generated Poisson arrivals
    Run {
        #[arg(short, long, default_value_t = 20)]
        nodes: usize,
        /// Arrival rate per node, packets per second
        #[arg(short, long, default_value_t = 7.0)]
        rate: f64,
        /// Simulated seconds
        #[arg(long, default_value_t = 1000.0)]
        horizon: f64,
        #[arg(short, long, default_value_t = SensingMode::Persistent)]
        sensing: SensingMode,
        /// Propagation delay between adjacent nodes, seconds
        #[arg(long)]
        prop_delay: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Sweep node counts and arrival rates, writing CSV reports
    Sweep {
        /// YAML scenario; defaults to the reference grid
        #[arg(long = "scenario")]
        scenario_file: Option<PathBuf>,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        #[arg(short, long, default_value = "5")]
        tag: String,
        #[arg(short, long)]
        sensing: Option<SensingMode>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Replay the two-node fixture and print every contention event
    Fixture {
        #[arg(short, long, default_value_t = SensingMode::Persistent)]
        sensing: SensingMode,
    },
}

fn stream_for(seed: Option<u64>) -> RandomStream {
    let stream = match seed {
        Some(seed) => RandomStream::from_u64(seed),
        None => RandomStream::from_entropy(),
    };
    info!("seed: {}", stream.seed());
    stream
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            nodes,
            rate,
            horizon,
            sensing,
            prop_delay,
            seed,
        } => {
            let mut config = BusConfig::default()
                .with_arrival_rate(rate)
                .with_horizon(horizon)
                .with_sensing(sensing);
            if let Some(delay) = prop_delay {
                config = config.with_propagation_delay(delay);
            }
            config.validate(nodes)?;

            let mut stream = stream_for(seed);
            let result = run_simulation(&config, nodes, &mut stream)?;
            println!("{}", result);
            println!(
                "theoretical throughput: {:.1} bit/s",
                expected_throughput(&config, nodes)
            );
        }
        Commands::Sweep {
            scenario_file,
            out,
            tag,
            sensing,
            seed,
        } => {
            let mut scenario = match scenario_file {
                Some(path) => {
                    info!("loading scenario {}", path.display());
                    scenario::load(&path)?
                }
                None => scenario::Scenario::default(),
            };
            if let Some(name) = scenario.meta.name.as_deref() {
                info!("scenario: {}", name);
            }
            if let Some(sensing) = sensing {
                scenario.bus.sensing = sensing;
            }

            let stream = stream_for(seed.or(scenario.seed));
            let points = run_sweep(&scenario.bus, &scenario.sweep, &stream)?;
            for path in report::write_report_files(&out, &tag, &points)? {
                println!("{}", path.display());
            }
        }
        Commands::Fixture { sensing } => {
            let config = two_node_config().with_sensing(sensing);
            let timelines = timelines_from(two_node_timelines())?;
            let mut scheduler = Scheduler::new(&config, timelines)?.with_trace();
            let result = scheduler.run(&mut ConstantSource(0.0));
            for event in scheduler.trace() {
                println!("{}", event);
            }
            println!("{}", result);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Warn,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("logger setup failed: {}", err);
    }

    info!("... CSMA bus simulator is started ...");
    if let Err(err) = execute(cli.command) {
        error!("{}", err);
        process::exit(1);
    }
}
