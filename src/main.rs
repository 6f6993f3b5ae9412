use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxrate::log::init_logging;

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

#[derive(Subcommand)]
enum Commands {
    /// List supported currencies
    Currencies,
    /// Resolve a conversion rate for a pair
    Rate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Day to resolve for; latest when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Convert an amount between currencies
    Convert {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: f64,
        /// Day to convert at; latest when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Convert the same amount at two dates and compare
    Compare {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: f64,
        /// First date; latest when omitted
        #[arg(long)]
        from_date: Option<NaiveDate>,
        /// Second date; latest when omitted
        #[arg(long)]
        to_date: Option<NaiveDate>,
    },
    /// Show one rate per day over a date range
    History {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// First day of the range (inclusive)
        #[arg(long)]
        start: NaiveDate,
        /// Last day of the range (inclusive)
        #[arg(long)]
        end: NaiveDate,
    },
    /// Run the refresh loop until interrupted
    Watch,
}

impl From<Commands> for fxrate::AppCommand {
    fn from(cmd: Commands) -> fxrate::AppCommand {
        match cmd {
            Commands::Currencies => fxrate::AppCommand::Currencies,
            Commands::Rate { from, to, date } => fxrate::AppCommand::Rate { from, to, date },
            Commands::Convert {
                from,
                to,
                amount,
                date,
            } => fxrate::AppCommand::Convert {
                from,
                to,
                amount,
                date,
            },
            Commands::Compare {
                from,
                to,
                amount,
                from_date,
                to_date,
            } => fxrate::AppCommand::Compare {
                from,
                to,
                amount,
                from_date,
                to_date,
            },
            Commands::History {
                from,
                to,
                start,
                end,
            } => fxrate::AppCommand::History {
                from,
                to,
                start,
                end,
            },
            Commands::Watch => fxrate::AppCommand::Watch,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(cmd) => fxrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
