use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use relorbit::{
    export::{export_all, export_body},
    run_simulation, SimulationError, SimulationParameters,
};

/// Simulate stellar orbits with relativistic corrections and export the observed series.
#[derive(Parser, Debug)]
#[command(name = "relorbit", version)]
struct Args {
    /// JSON parameter file; the built-in S2 / Sgr A* set is used when omitted
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Directory receiving the CSV tables
    #[arg(short, long, default_value = "output")]
    out_dir: PathBuf,

    /// Only export this body
    #[arg(short, long)]
    body: Option<String>,

    /// Print the parameters in use as JSON and exit
    #[arg(long)]
    print_params: bool,
}

fn load_params(args: &Args) -> Result<SimulationParameters, SimulationError> {
    match &args.params {
        Some(path) => {
            info!("loading parameters from {}", path.display());
            SimulationParameters::from_path(path)
        }
        None => Ok(SimulationParameters::default()),
    }
}

fn run(args: &Args) -> Result<bool, SimulationError> {
    let params = load_params(args)?;
    if args.print_params {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(true);
    }

    let result = run_simulation(&params);
    println!("{result}");
    if !result.is_success() {
        return Ok(false);
    }

    let written = match &args.body {
        Some(name) => export_body(&result, name, &args.out_dir)?,
        None => export_all(&result, &args.out_dir)?,
    };
    for path in &written {
        println!("wrote {}", path.display());
    }
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
