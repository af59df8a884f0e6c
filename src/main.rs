use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use linear_road::simulation::{
    ExecutionMode, OutputSink, SimConfig, SimWorld, DEFAULT_ACCIDENT_CLEAR_WAIT,
    DEFAULT_ACCIDENT_INTERVAL, DEFAULT_CARS_PER_TICK, DEFAULT_SIM_LENGTH,
};

/// Output path that selects standard output
const STDOUT_PATH: &str = "-";

#[derive(Parser)]
#[command(name = "linear_road")]
#[command(about = "Linear Road benchmark data generator")]
struct Cli {
    /// Number of expressways to simulate
    #[arg(short = 'x', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    xways: u32,

    /// Position report file, or "-" for standard output
    #[arg(short, long, default_value = "car.dat")]
    output: PathBuf,

    /// Historical toll file [default: <output>.tolls.dat]
    #[arg(long)]
    tolls: Option<PathBuf>,

    /// Advance each expressway on its own worker
    #[arg(short, long)]
    multi_thread: bool,

    /// Simulated seconds to run
    #[arg(long, default_value_t = DEFAULT_SIM_LENGTH, value_parser = clap::value_parser!(u32).range(1..))]
    sim_length: u32,

    /// Base cars injected per tick per expressway
    #[arg(long, default_value_t = DEFAULT_CARS_PER_TICK)]
    cars_per_tick: u32,

    /// Base minutes between accidents on an expressway
    #[arg(long, default_value_t = DEFAULT_ACCIDENT_INTERVAL)]
    accident_interval: u32,

    /// Base minutes before an accident clears
    #[arg(long, default_value_t = DEFAULT_ACCIDENT_CLEAR_WAIT)]
    accident_clear_wait: u32,

    /// Seed every random source for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn is_stdout(&self) -> bool {
        self.output.as_os_str() == STDOUT_PATH
    }

    fn tolls_path(&self) -> PathBuf {
        match &self.tolls {
            Some(path) => path.clone(),
            None if self.is_stdout() => PathBuf::from("tolls.dat"),
            None => {
                let mut name = self.output.clone().into_os_string();
                name.push(".tolls.dat");
                PathBuf::from(name)
            }
        }
    }

    fn config(&self) -> SimConfig {
        SimConfig {
            num_xways: self.xways as usize,
            sim_length: self.sim_length,
            cars_per_tick: self.cars_per_tick,
            accident_interval: self.accident_interval,
            accident_clear_wait: self.accident_clear_wait,
            mode: if self.multi_thread {
                ExecutionMode::ParallelPerXWay
            } else {
                ExecutionMode::SingleThreaded
            },
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Both destinations must open before the first tick
    let tolls_path = cli.tolls_path();
    let mut tolls = create_toll_file(&tolls_path)?;
    let sink = if cli.is_stdout() {
        OutputSink::stdout()
    } else {
        OutputSink::create_file(&cli.output)?
    };

    let mut world = SimWorld::new(cli.config(), sink)?;
    let report = world.run()?;

    let started = Instant::now();
    let records = world.write_tolls(&mut tolls)?;
    let toll_elapsed = started.elapsed();

    report.log();
    info!(
        "Toll records: {} written to {} in {:.2?}",
        records,
        tolls_path.display(),
        toll_elapsed
    );
    Ok(())
}

fn create_toll_file(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create toll file {}", path.display()))?;
    Ok(BufWriter::new(file))
}
