use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use distnet::check::check_solution;
use distnet::network::{BigM, FormulationOptions};
use distnet::{DistNetError, NetworkParams, NetworkProblem, Result, Settings};

/// Design a two-echelon distribution network.
///
/// Without `--params` the embedded NERD instance is solved.
#[derive(Parser, Debug)]
#[command(name = "distnet", version)]
struct Args {
    /// Parameter table (JSON).
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Stop waiting for the solve after this many seconds.
    ///
    /// The abandoned solve keeps running on a background thread, using a
    /// full core, until it finishes on its own.
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Big-M used to link CDC outflow to its open decision.
    #[arg(long, value_enum, default_value_t = BigMArg::TotalDemand)]
    big_m: BigMArg,

    /// Also solve the continuous relaxation and report the gap.
    #[arg(long)]
    relaxation: bool,

    /// Print the parameter table as JSON and exit.
    #[arg(long)]
    dump_params: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BigMArg {
    TotalDemand,
    Capacity,
}

impl From<BigMArg> for BigM {
    fn from(arg: BigMArg) -> Self {
        match arg {
            BigMArg::TotalDemand => BigM::TotalDemand,
            BigMArg::Capacity => BigM::Capacity,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(DistNetError::Infeasible) => {
            eprintln!("No feasible network exists for these parameters.");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let params = match &args.params {
        Some(path) => NetworkParams::from_path(path)?,
        None => NetworkParams::nerd()?,
    };

    if args.dump_params {
        println!("{}", params.to_json_string()?);
        return Ok(());
    }

    let options = FormulationOptions {
        big_m: args.big_m.into(),
    };
    let network = NetworkProblem::build_with(&params, options)?;

    let mut settings = Settings::default();
    if let Some(secs) = args.time_limit {
        let limit = Duration::try_from_secs_f64(secs).map_err(|err| DistNetError::InvalidParams {
            table: "settings",
            key: "time_limit".into(),
            reason: err.to_string(),
        })?;
        settings = settings.with_time_limit(limit);
    }

    let plan = network.solve_with(&settings)?;
    println!("{plan}");

    if args.relaxation {
        let bound = network.solve_relaxation(&settings)?;
        if let Some(value) = bound.value {
            let gap = if plan.objective.abs() > 0.0 {
                (plan.objective - value) / plan.objective.abs() * 100.0
            } else {
                0.0
            };
            println!();
            println!("Relaxation bound: {value:.2}   (gap {gap:.2}%)");
        }
    }

    let violations = check_solution(&params, &plan, 1e-6)?;
    for v in &violations {
        log::warn!("plan check: {}", v);
    }
    Ok(())
}
