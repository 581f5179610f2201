mod commands;
mod context;
mod render;
mod session;
mod utils;

use anyhow::Result;
use clancal_core::EventStatus;
use clancal_core::calendar::YearMonth;
use clancal_core::zone::TimeZoneMode;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use commands::edit::EditArgs;
use commands::list::FilterArgs;
use commands::new::NewArgs;
use context::AppContext;

#[derive(Parser)]
#[command(name = "clancal")]
#[command(about = "The clan calendar in your terminal")]
struct Cli {
    /// Show times in the reference zone or your own ("reference" or "local")
    #[arg(short, long, global = true)]
    zone: Option<TimeZoneMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Month grid with events bucketed by day
    Month {
        /// Month to open (YYYY-MM); defaults to the current month
        month: Option<YearMonth>,

        /// Print the grid once instead of opening the interactive view
        #[arg(long)]
        once: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Upcoming (and optionally past) events as cards
    List {
        /// Also show past events
        #[arg(long)]
        past: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Create an event
    New(NewArgs),
    /// Edit an event you created
    Edit(EditArgs),
    /// Change an event's status
    Status {
        id: String,
        status: Option<EventStatus>,
    },
    /// Delete an event
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Sign in with email and password
    Login { email: Option<String> },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in member
    Whoami,
    /// Change your username or password
    Account {
        #[arg(long)]
        username: Option<String>,

        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("{}", format!("Error: {e:#}").red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(cli.zone).await?;

    match cli.command {
        Commands::Month {
            month,
            once,
            filter,
        } => commands::month::run(&ctx, month, filter, once).await,
        Commands::List { past, filter } => commands::list::run(&ctx, filter, past).await,
        Commands::New(args) => commands::new::run(&ctx, args).await,
        Commands::Edit(args) => commands::edit::run(&ctx, args).await,
        Commands::Status { id, status } => commands::status::run(&ctx, &id, status).await,
        Commands::Delete { id, yes } => commands::delete::run(&ctx, &id, yes).await,
        Commands::Login { email } => commands::auth::login(&ctx, email).await,
        Commands::Logout => commands::auth::logout(&ctx).await,
        Commands::Whoami => commands::auth::whoami(&ctx).await,
        Commands::Account { username, password } => {
            commands::auth::account(&ctx, username, password).await
        }
    }
}
