//! Command-line interface for the arrhenius-fit library
//!
//! This binary fits, simulates and synthesizes batch-reactor data of the reversible
//! reaction A ⇌ B.
//!
//! # Usage
//!
//! ```bash
//! # Fit the built-in dataset with Levenberg-Marquardt
//! arrhenius fit
//!
//! # Fit a dataset from file with L-BFGS and save the report
//! arrhenius fit --data data.json --solver lbfgs --output report.json
//!
//! # Print a predicted trajectory
//! arrhenius simulate --params 7.5,52.8,-11.5,-37.4 --temperature 310
//!
//! # Write a noisy synthetic dataset
//! arrhenius synthesize --params 7.5,52.8,-11.5,-37.4 --output data.json --sigma 0.1
//! ```

use std::path::PathBuf;

use arrhenius_fit::{
    data::{default_dataset, Dataset, DEFAULT_INITIAL_CONCENTRATION, DEFAULT_TEMPERATURES, DEFAULT_TIMES},
    io::{load_dataset, save_dataset, save_json},
    optim::{FitReport, LBFGSBuilder, LevenbergMarquardtBuilder, Optimizer, ProblemBuilder},
    parameters::ParameterSet,
    simulation::{model::ForwardModel, setup::SimulationSetupBuilder},
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use peroxide::fuga::RK4;

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available least-squares solvers
#[derive(Clone, Copy, Debug, ValueEnum)]
enum SolverKind {
    /// Levenberg-Marquardt
    Lm,
    /// L-BFGS with More-Thuente line search
    Lbfgs,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Fit logA, Ea, dH and dS to batch-reactor data
    Fit {
        /// Path to a dataset JSON file, the built-in dataset if omitted
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Solver used for the fit
        #[arg(short, long, value_enum, default_value_t = SolverKind::Lm)]
        solver: SolverKind,

        /// Initial guess as logA,Ea,dH,dS
        #[arg(short, long, default_value = "6,45,-10,-50", allow_hyphen_values = true)]
        initial: ParameterSet,

        /// Maximum integration step size
        #[arg(long, default_value_t = 0.1)]
        dt: f64,

        /// Maximum number of iterations before stopping
        #[arg(long)]
        max_iters: Option<u64>,

        /// Path to save the fit report to as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print solver progress to the terminal
        #[arg(long)]
        progress: bool,
    },
    /// Print the predicted concentration of A over time
    Simulate {
        /// Parameters as logA,Ea,dH,dS
        #[arg(short, long, allow_hyphen_values = true)]
        params: ParameterSet,

        /// Temperature [K]
        #[arg(short, long)]
        temperature: f64,

        /// Initial concentration of A
        #[arg(long, default_value_t = DEFAULT_INITIAL_CONCENTRATION)]
        c0: f64,

        /// End time [s]
        #[arg(long, default_value_t = 100.0)]
        t1: f64,

        /// Interval between printed time points [s]
        #[arg(long, default_value_t = 10.0)]
        step: f64,

        /// Maximum integration step size
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
    },
    /// Generate a synthetic dataset from the forward model
    Synthesize {
        /// Parameters as logA,Ea,dH,dS
        #[arg(short, long, allow_hyphen_values = true)]
        params: ParameterSet,

        /// Path to save the dataset to
        #[arg(short, long)]
        output: PathBuf,

        /// Temperatures [K], one experiment each
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_TEMPERATURES.to_vec())]
        temperatures: Vec<f64>,

        /// Initial concentration of A
        #[arg(long, default_value_t = DEFAULT_INITIAL_CONCENTRATION)]
        c0: f64,

        /// Standard deviation of additive Gaussian noise
        #[arg(long, default_value_t = 0.0)]
        sigma: f64,

        /// Seed of the noise generator
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

/// Main entry point for the CLI application
pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Fit {
            data,
            solver,
            initial,
            dt,
            max_iters,
            output,
            progress,
        } => {
            let dataset = match data {
                Some(path) => load_dataset(path)?,
                None => default_dataset(),
            };
            println!("{}", "Dataset".bold());
            println!("{}", dataset);

            let problem = ProblemBuilder::new(&dataset, RK4).dt(dt).build()?;

            let report: FitReport = match solver {
                SolverKind::Lm => {
                    let mut builder = LevenbergMarquardtBuilder::default().progress(progress);
                    if let Some(max_iters) = max_iters {
                        builder = builder.max_iters(max_iters);
                    }
                    builder.build().optimize(&problem, Some(initial))?
                }
                SolverKind::Lbfgs => {
                    let mut builder = LBFGSBuilder::default().progress(progress);
                    if let Some(max_iters) = max_iters {
                        builder = builder.max_iters(max_iters);
                    }
                    builder.build().optimize(&problem, Some(initial))?
                }
            };

            println!("{}", "Fit".bold());
            println!("{}", report);

            if let Some(path) = output {
                save_json(&path, &report)?;
                log::info!("Report written to {}", path.display());
            }
        }
        Commands::Simulate {
            params,
            temperature,
            c0,
            t1,
            step,
            dt,
        } => {
            if step.is_nan() || step <= 0.0 {
                return Err(format!("step must be positive, got {}", step).into());
            }

            let setup = SimulationSetupBuilder::default().dt(dt).build()?;
            let model = ForwardModel::new(RK4, setup).total_concentration(c0);

            let n = (t1 / step).floor() as usize;
            let pairs: Vec<(f64, f64)> = (0..=n).map(|i| (temperature, i as f64 * step)).collect();
            let predictions = model.predict(&params, &pairs)?;

            println!("{}", format!("{} at {} K", params, temperature).bold());
            println!("{:>10} {:>12}", "t [s]", "Ca");
            for ((_, t), c) in pairs.iter().zip(predictions.iter()) {
                println!("{:>10.3} {:>12.6}", t, c);
            }
        }
        Commands::Synthesize {
            params,
            output,
            temperatures,
            c0,
            sigma,
            seed,
        } => {
            let noise = if sigma > 0.0 { Some((sigma, seed)) } else { None };
            let dataset = Dataset::synthesize(
                &params,
                &temperatures,
                &DEFAULT_TIMES,
                c0,
                &Default::default(),
                noise,
            )?;

            save_dataset(&output, &dataset)?;
            println!("{}", dataset);
            log::info!(
                "Synthetic dataset with {} points written to {}",
                dataset.n_points(),
                output.display()
            );
        }
    }

    Ok(())
}
