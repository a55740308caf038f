use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use mft::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for mft::AppCommand {
    fn from(cmd: Commands) -> mft::AppCommand {
        match cmd {
            Commands::Import { start, end } => mft::AppCommand::Import { start, end },
            Commands::Reconcile {
                from_plan_amounts,
                keep_non_trading,
            } => mft::AppCommand::Reconcile {
                from_plan_amounts,
                keep_non_trading,
            },
            Commands::Schedule { start, end } => mft::AppCommand::Schedule { start, end },
            Commands::Sync { start, end } => mft::AppCommand::Sync { start, end },
            Commands::Transactions { pending } => mft::AppCommand::Transactions {
                pending_only: pending,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Import transactions from auto-invest plan schedules
    Import {
        /// First transaction date (defaults to the earliest plan start)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last transaction date (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Confirm pending transactions against stored NAVs
    Reconcile {
        /// Take amounts from plan config instead of recorded target amounts
        #[arg(long)]
        from_plan_amounts: bool,
        /// Skip the non-trading-day cleanup pass
        #[arg(long)]
        keep_non_trading: bool,
    },
    /// Preview the buy schedule implied by enabled plans
    Schedule {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Fetch NAV history for all plan funds
    Sync {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List recorded transactions
    Transactions {
        /// Only show pending transactions
        #[arg(long)]
        pending: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => mft::cli::setup::setup(),
        Some(cmd) => mft::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
