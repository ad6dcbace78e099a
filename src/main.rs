use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use hunian::cli::currency::CurrencyChoice;
use hunian::core::currency::CurrencyCode;
use hunian::core::log::init_logging;
use std::path::PathBuf;

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
    /// Create default configuration
    Setup,
    /// Show current exchange rates against IDR
    Rates {
        /// Keep running and refresh rates every hour
        #[arg(long)]
        watch: bool,
    },
    /// Convert an IDR amount into the display currency
    Convert {
        /// Amount in IDR
        amount: f64,
        /// Target currency instead of the selected one
        #[arg(long)]
        to: Option<CurrencyCode>,
        /// Abbreviate large amounts (Jt, M, K)
        #[arg(long)]
        short: bool,
    },
    /// Show or change the display currency (IDR, USD, SGD, AUD or "auto")
    Currency { code: Option<String> },
    /// Suggest improvements for listings in a YAML file
    Tips { file: PathBuf },
    /// Rank leads from a YAML file
    Leads { file: PathBuf },
}

impl TryFrom<Commands> for hunian::AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<Self> {
        Ok(match cmd {
            Commands::Rates { watch } => hunian::AppCommand::Rates { watch },
            Commands::Convert { amount, to, short } => hunian::AppCommand::Convert {
                amount_idr: amount,
                to,
                short,
            },
            Commands::Currency { code } => {
                hunian::AppCommand::Currency(CurrencyChoice::parse(code.as_deref())?)
            }
            Commands::Tips { file } => hunian::AppCommand::Tips(file),
            Commands::Leads { file } => hunian::AppCommand::Leads(file),
            Commands::Setup => anyhow::bail!("Setup command is handled separately"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => hunian::cli::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => match hunian::AppCommand::try_from(cmd) {
            Ok(command) => hunian::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
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
