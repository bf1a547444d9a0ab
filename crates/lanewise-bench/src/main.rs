//! Command-line driver for the lanewise kernels.
//!
//! Runs individual primitives over synthetic data with wall-clock
//! timings, optional verification against the sequential references, and
//! control over the device geometry.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lanewise_core::{reference, Device, DeviceConfig, Plus};

#[derive(Parser)]
#[command(name = "lanewise", version, about = "Work-group data-parallel kernel driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the device geometry that would be used
    Info {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Time one primitive over synthetic data
    Run {
        /// Primitive to run
        #[arg(value_enum)]
        op: OpKind,

        /// Number of input elements
        #[arg(long, default_value_t = 1_000_000)]
        size: usize,

        /// Timed repetitions
        #[arg(long, default_value_t = 5)]
        iterations: usize,

        /// Check results against the sequential reference
        #[arg(long)]
        verify: bool,

        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Time every primitive at one size
    Bench {
        /// Number of input elements
        #[arg(long, default_value_t = 1_000_000)]
        size: usize,

        /// Timed repetitions per primitive
        #[arg(long, default_value_t = 5)]
        iterations: usize,

        #[command(flatten)]
        device: DeviceArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpKind {
    Reduce,
    Scan,
    ExclusiveScan,
    CopyIf,
    Partition,
    SetDifference,
    SetIntersection,
    Includes,
    Search,
    Reverse,
}

const ALL_OPS: [OpKind; 10] = [
    OpKind::Reduce,
    OpKind::Scan,
    OpKind::ExclusiveScan,
    OpKind::CopyIf,
    OpKind::Partition,
    OpKind::SetDifference,
    OpKind::SetIntersection,
    OpKind::Includes,
    OpKind::Search,
    OpKind::Reverse,
];

#[derive(Args)]
struct DeviceArgs {
    /// Path to a JSON device config
    #[arg(long)]
    config: Option<String>,

    /// Lanes per group (power of two)
    #[arg(long)]
    group_size: Option<usize>,

    /// Maximum live lanes across groups
    #[arg(long)]
    lane_budget: Option<usize>,

    /// Force the guarded tree passes even for identity-bearing operations
    #[arg(long)]
    no_collective: bool,
}

impl DeviceArgs {
    fn build(&self) -> Result<Device> {
        let mut config = match &self.config {
            Some(path) => DeviceConfig::from_file(path)
                .with_context(|| format!("loading device config from {path}"))?,
            None => DeviceConfig::detect(),
        };
        if let Some(group_size) = self.group_size {
            config.group_size = group_size;
        }
        if let Some(lane_budget) = self.lane_budget {
            config.lane_budget = lane_budget;
        }
        if self.no_collective {
            config.collective_ops = false;
        }
        Device::new(config).context("invalid device geometry")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { device } => {
            let device = device.build()?;
            print_device(&device);
            Ok(())
        }
        Commands::Run {
            op,
            size,
            iterations,
            verify,
            device,
        } => {
            let device = device.build()?;
            print_device(&device);
            run_op(op, &device, size, iterations.max(1), verify)
        }
        Commands::Bench {
            size,
            iterations,
            device,
        } => {
            let device = device.build()?;
            print_device(&device);
            for op in ALL_OPS {
                run_op(op, &device, size, iterations.max(1), false)?;
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

fn print_device(device: &Device) {
    let config = device.config();
    println!(
        "{} device: group_size={} lane_budget={} collective_ops={}",
        ">>>".green(),
        config.group_size,
        config.lane_budget,
        config.collective_ops,
    );
}

fn run_op(op: OpKind, device: &Device, size: usize, iterations: usize, verify: bool) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x1a5e);
    let values: Vec<u64> = (0..size).map(|_| rng.gen_range(0..1_000_000)).collect();
    let mut output = vec![0u64; size];

    let timings = match op {
        OpKind::Reduce => {
            let timings = time(iterations, || {
                let total = lanewise_core::reduce(device, &values, Plus)?;
                Ok(total.unwrap_or(0))
            })?;
            if verify {
                let got = lanewise_core::reduce(device, &values, Plus)?;
                check(got == reference::fold(&values, &Plus))?;
            }
            timings
        }
        OpKind::Scan => {
            let timings = time(iterations, || {
                lanewise_core::inclusive_scan(device, &values, &mut output, Plus, None)?;
                Ok(output.last().copied().unwrap_or(0))
            })?;
            if verify {
                check(output == reference::inclusive_scan(&values, None, &Plus))?;
            }
            timings
        }
        OpKind::ExclusiveScan => {
            let timings = time(iterations, || {
                lanewise_core::exclusive_scan(device, &values, &mut output, 0, Plus)?;
                Ok(output.last().copied().unwrap_or(0))
            })?;
            if verify {
                check(output == reference::exclusive_scan(&values, 0, &Plus))?;
            }
            timings
        }
        OpKind::CopyIf => {
            let timings = time(iterations, || {
                let k = lanewise_core::copy_if(device, &values, &mut output, |x| x % 2 == 0)?;
                Ok(k as u64)
            })?;
            if verify {
                let k = lanewise_core::copy_if(device, &values, &mut output, |x| x % 2 == 0)?;
                let expected = reference::stable_filter(&values, |&x| x % 2 == 0);
                check(k == expected.len() && output[..k] == expected[..])?;
            }
            timings
        }
        OpKind::Partition => {
            let timings = time(iterations, || {
                let k = lanewise_core::partition(device, &values, &mut output, |x| x % 2 == 0)?;
                Ok(k as u64)
            })?;
            if verify {
                let k = lanewise_core::partition(device, &values, &mut output, |x| x % 2 == 0)?;
                let (expected, expected_k) = reference::stable_partition(&values, |&x| x % 2 == 0);
                check(k == expected_k && output == expected)?;
            }
            timings
        }
        OpKind::SetDifference => {
            let (a, b) = sorted_pair(&values);
            let timings = time(iterations, || {
                let k = lanewise_core::set_difference(device, &a, &b, &mut output, |x, y| x < y)?;
                Ok(k as u64)
            })?;
            if verify {
                let k = lanewise_core::set_difference(device, &a, &b, &mut output, |x, y| x < y)?;
                let expected = reference::set_difference(&a, &b, &|x, y| x < y);
                check(output[..k] == expected[..])?;
            }
            timings
        }
        OpKind::SetIntersection => {
            let (a, b) = sorted_pair(&values);
            let timings = time(iterations, || {
                let k =
                    lanewise_core::set_intersection(device, &a, &b, &mut output, |x, y| x < y)?;
                Ok(k as u64)
            })?;
            if verify {
                let k = lanewise_core::set_intersection(device, &a, &b, &mut output, |x, y| x < y)?;
                let expected = reference::set_intersection(&a, &b, &|x, y| x < y);
                check(output[..k] == expected[..])?;
            }
            timings
        }
        OpKind::Includes => {
            let (a, b) = sorted_pair(&values);
            let timings = time(iterations, || {
                let contained = lanewise_core::includes(device, &a, &b, |x, y| x < y)?;
                Ok(u64::from(contained))
            })?;
            if verify {
                let got = lanewise_core::includes(device, &a, &b, |x, y| x < y)?;
                check(got == reference::multiset_includes(&a, &b, &|x, y| x < y))?;
            }
            timings
        }
        OpKind::Search => {
            let start = size.saturating_mul(3) / 4;
            let needle: Vec<u64> = values[start..(start + 8).min(size)].to_vec();
            let timings = time(iterations, || {
                let found = lanewise_core::search(device, &values, &needle, |x, y| x == y)?;
                Ok(found.map_or(u64::MAX, |idx| idx as u64))
            })?;
            if verify {
                let found = lanewise_core::search(device, &values, &needle, |x, y| x == y)?;
                check(found.is_some() && found.unwrap_or(usize::MAX) <= start)?;
            }
            timings
        }
        OpKind::Reverse => {
            let timings = time(iterations, || {
                lanewise_core::reverse(device, &mut output)?;
                Ok(output.first().copied().unwrap_or(0))
            })?;
            if verify {
                output.copy_from_slice(&values);
                lanewise_core::reverse(device, &mut output)?;
                let expected: Vec<u64> = values.iter().rev().copied().collect();
                check(output == expected)?;
            }
            timings
        }
    };

    report(op, size, &timings, verify);
    Ok(())
}

/// Sorted multiset pair derived from one value stream: `a` holds all the
/// values, `b` every third one.
fn sorted_pair(values: &[u64]) -> (Vec<u64>, Vec<u64>) {
    let mut a = values.to_vec();
    let mut b: Vec<u64> = values.iter().copied().step_by(3).collect();
    a.sort_unstable();
    b.sort_unstable();
    (a, b)
}

struct Timings {
    best: Duration,
    mean: Duration,
    checksum: u64,
}

fn time<F>(iterations: usize, mut body: F) -> Result<Timings>
where
    F: FnMut() -> Result<u64>,
{
    let mut best = Duration::MAX;
    let mut total = Duration::ZERO;
    let mut checksum = 0;
    for _ in 0..iterations {
        let started = Instant::now();
        checksum = body()?;
        let elapsed = started.elapsed();
        best = best.min(elapsed);
        total += elapsed;
    }
    Ok(Timings {
        best,
        mean: total / iterations as u32,
        checksum,
    })
}

fn check(ok: bool) -> Result<()> {
    if ok {
        println!("{} verification passed", ">>>".green());
        Ok(())
    } else {
        anyhow::bail!("verification failed: kernel output diverges from reference");
    }
}

fn report(op: OpKind, size: usize, timings: &Timings, verified: bool) {
    let throughput = if timings.best.as_nanos() == 0 {
        f64::NAN
    } else {
        size as f64 / timings.best.as_secs_f64() / 1e6
    };
    let status = if verified { "ok".green() } else { "timed".normal() };
    println!(
        "{} {:?}: best {:?}, mean {:?}, {:.1} Melem/s [{}] (checksum {:x})",
        ">>>".green(),
        op,
        timings.best,
        timings.mean,
        throughput,
        status,
        timings.checksum,
    );
    tracing::info!(?op, size, best_ns = timings.best.as_nanos() as u64, "run complete");
}
