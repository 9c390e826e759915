//! gganalyze CLI

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gg_core::ErrorClass;
use gg_hist::ScaleFactorMap;

mod efficiency;
mod job;
mod mutau;
mod sf_measurement;
mod trigger_efficiency;
mod trigger_study;

use job::JobArgs;
use sf_measurement::{Channel, SfMeasurement};

#[derive(Parser)]
#[command(name = "gganalyze")]
#[command(about = "gganalyze - ggNtuplizer tree analyzers")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boosted Z -> mu tau selection with OS/SS control regions
    Mutau {
        #[command(flatten)]
        job: JobArgs,

        /// Trigger scale-factor file (output of `efficiency`)
        #[arg(long)]
        trigger_sf: Option<PathBuf>,
    },

    /// Jet-trigger turn-on histograms
    TriggerEfficiency {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Tau ID scale-factor regions, muon + boosted tau
    MtSf {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Tau ID scale-factor regions, electron + boosted tau
    EtSf {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Z -> mu mu control region for the tau ID measurement
    MmSf {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Jet-trigger combinations on gen-matched mu + boosted tau events (simulation only)
    TriggerStudy {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Divide turn-on histograms and build the 2-D efficiency map
    Efficiency {
        /// Output of `trigger-efficiency`
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the efficiencies
        #[arg(short, long, default_value = "trigger_efficiency.json")]
        output: PathBuf,
    },

    /// Print version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(
        &cli.command,
        Commands::Mutau { job, .. }
        | Commands::TriggerEfficiency { job }
        | Commands::MtSf { job }
        | Commands::EtSf { job }
        | Commands::MmSf { job }
        | Commands::TriggerStudy { job } if job.verbose
    );
    let level = if verbose { cli.log_level.max(tracing::Level::INFO) } else { cli.log_level };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Mutau { job, trigger_sf } => {
            let mut analysis = mutau::MuTau::new();
            if let Some(path) = trigger_sf {
                let sf = ScaleFactorMap::from_path(&path, efficiency::EFFICIENCY_MAP)?;
                analysis = analysis.with_trigger_sf(sf);
            }
            job::run(&job, &analysis)
        }
        Commands::TriggerEfficiency { job } => {
            job::run(&job, &trigger_efficiency::TriggerEfficiency)
        }
        Commands::MtSf { job } => job::run(&job, &SfMeasurement::new(Channel::MuTau)),
        Commands::EtSf { job } => job::run(&job, &SfMeasurement::new(Channel::ETau)),
        Commands::MmSf { job } => job::run(&job, &SfMeasurement::new(Channel::MuMu)),
        Commands::TriggerStudy { job } => job::run(&job, &trigger_study::TriggerStudy),
        Commands::Efficiency { input, output } => Ok(efficiency::run(&input, &output)?),
        Commands::Version => {
            println!("gganalyze {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Exit status by error class: 2 configuration, 3 input, 4 output, 5 data,
/// 6 lookup or state, 1 anything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    let class = err.chain().find_map(|e| e.downcast_ref::<gg_core::Error>()).map(|e| e.class());
    match class {
        Some(ErrorClass::Config) => 2,
        Some(ErrorClass::Input) => 3,
        Some(ErrorClass::Output) => 4,
        Some(ErrorClass::Data) => 5,
        Some(ErrorClass::Lookup | ErrorClass::State) => 6,
        Some(ErrorClass::Io) | None => 1,
    }
}
