use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use capacity_planning::models::capacity::{Distribution, ScenarioConfig};
use capacity_planning::solver::default_solver;
use capacity_planning::{
    CapacityModel, Error, ModelConfig, Parameters, Repository, ScalarConfig, Sets,
};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Tester and handler capacity planning")]
struct Args {
    /// Directory with the parameter tables and others.txt
    #[clap(long, default_value = "clean-data")]
    data: PathBuf,
    /// JSON run configuration
    #[clap(long)]
    config: Option<PathBuf>,
    /// Solve the stochastic model with this many demand scenarios
    #[clap(long)]
    scenarios: Option<usize>,
    /// Demand factor distribution of the scenarios (uniform or normal)
    #[clap(long, default_value = "uniform")]
    distribution: Distribution,
    /// Variance of the demand factor
    #[clap(long, default_value_t = 0.1)]
    variance: f64,
    /// Seed of the scenario generator
    #[clap(long)]
    seed: Option<u64>,
    /// Do not cap production by make-to-order demand
    #[clap(long)]
    no_demand_cap: bool,
    /// Print every variable, including zeros
    #[clap(long)]
    print_all: bool,
}

fn load(data: &Path) -> Result<(Sets, Parameters), Error> {
    let repo = Repository::load(data)?;
    let scalars = ScalarConfig::read(data)?;
    for label in scalars.gaps() {
        warn!("{} is not defined in the scalar text", label);
    }

    let sets = Sets::new(&repo)?;
    let parameters = Parameters::new(&repo, &scalars, &sets)?;
    Ok((sets, parameters))
}

fn run(args: &Args) -> Result<(), Error> {
    let mut config = match &args.config {
        Some(path) => ModelConfig::read(path)?,
        None => ModelConfig::default(),
    };
    if args.no_demand_cap {
        config.demand_cap = false;
    }
    if let Some(count) = args.scenarios {
        config.stochastic = Some(ScenarioConfig {
            count,
            distribution: args.distribution,
            variance: args.variance,
            seed: args.seed,
        });
    }

    let (sets, parameters) = load(&args.data)?;
    let model = CapacityModel::build(&sets, &parameters, &config)?;

    let solver = default_solver(config.threads);
    let plan = model.solve(solver.as_ref(), &sets)?;

    println!("Objective = {}", plan.objective);
    for (s, capital) in &plan.capital {
        info!("terminal capital in scenario {}: {:.2}", s, capital);
    }
    for (m, k) in &plan.testers {
        info!("tester {}: {} in stock at the end of the horizon", m, k);
    }
    for ((h, a), k) in &plan.handlers {
        info!("handler {} of category {}: {} in stock", a, h, k);
    }

    for (name, value) in model.named_values(&plan.solution, args.print_all) {
        println!("{:<30} = {:.6}", name, value);
    }
    Ok(())
}

pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{} ({:?} error)", e, e.kind());
            ExitCode::FAILURE
        }
    }
}
