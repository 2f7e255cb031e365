//! User Service - maintenance CLI for the users collection.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::{handle_uncaught, FileErrorLog};
use user_service_lib::config::UserServiceConfig;
use user_service_lib::infra::Database;
use user_service_lib::{run_command, Command};

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "User persistence service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create unique indexes on username and email
    Indexes,
    /// Check database connectivity
    Ping,
    /// Print the number of stored users
    Count,
    /// List users one page at a time
    List {
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long, default_value = "10")]
        limit: u64,
    },
    /// Show a user by id
    Get { id: String },
    /// Delete a user by id
    Delete { id: String },
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Indexes => Command::Indexes,
            Commands::Ping => Command::Ping,
            Commands::Count => Command::Count,
            Commands::List { page, limit } => Command::List { page, limit },
            Commands::Get { id } => Command::Get { id },
            Commands::Delete { id } => Command::Delete { id },
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = UserServiceConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let error_log = FileErrorLog::new(config.log.dir.clone(), config.run_mode);
    let db = Database::new(config.database.clone());

    let outcome = run_command(&db, cli.command.into()).await;
    db.shutdown().await;

    match outcome {
        Ok(result) => println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default()),
        Err(error) => {
            let failure = handle_uncaught(error, &error_log, config.run_mode).await;
            eprintln!("{}", serde_json::to_string_pretty(&failure).unwrap_or_default());
            std::process::exit(1);
        }
    }
}
