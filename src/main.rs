use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use loanlens::cli::{OutputFormat, ViewOptions};
use loanlens::core::loan::AnnualRate;
use loanlens::core::log::init_logging;

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

#[derive(Args)]
struct ViewArgs {
    /// Annual rate applied to every loan, e.g. 0.05 or 5%
    #[arg(short, long)]
    rate: Option<AnnualRate>,

    /// Only include these accounts (repeatable)
    #[arg(short, long = "account")]
    accounts: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl From<ViewArgs> for ViewOptions {
    fn from(args: ViewArgs) -> ViewOptions {
        ViewOptions {
            rate: args.rate,
            accounts: args.accounts,
            format: args.format,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Create a demo customer, account and loans
    Seed,
    /// Display loan portfolio summary
    Summary(ViewArgs),
    /// Display month-by-month payoff schedules
    Schedule {
        #[command(flatten)]
        view: ViewArgs,

        /// Only show this loan
        #[arg(short, long = "loan")]
        loan_id: Option<String>,

        /// Number of months to show per loan
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Stream a short written summary of the loans
    Advise(ViewArgs),
}

impl From<Commands> for loanlens::AppCommand {
    fn from(cmd: Commands) -> loanlens::AppCommand {
        match cmd {
            Commands::Seed => loanlens::AppCommand::Seed,
            Commands::Summary(view) => loanlens::AppCommand::Summary(view.into()),
            Commands::Schedule {
                view,
                loan_id,
                limit,
            } => loanlens::AppCommand::Schedule {
                options: view.into(),
                loan_id,
                limit,
            },
            Commands::Advise(view) => loanlens::AppCommand::Advise(view.into()),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => loanlens::cli::setup::setup_at_path(path),
            None => loanlens::cli::setup::setup(),
        },
        Some(cmd) => loanlens::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
