//! BlitzCoder CLI, the main entry point.
//!
//! Commands:
//! - `chat`    : interactive session, or one message with `--message`
//! - `search`  : look through a user's stored memories
//! - `tools`   : list the built-in tools and whether they are enabled
//! - `config`  : show, locate, initialise or validate the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "blitzcoder",
    about = "BlitzCoder: a terminal coding agent with semantic memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent (the default when no command is given)
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Whose memories to recall and extend
        #[arg(short, long, env = "BLITZCODER_USER_ID", default_value = "default")]
        user_id: String,

        /// Resume a saved conversation thread
        #[arg(short, long)]
        thread_id: Option<String>,
    },

    /// Search stored memories without calling the model
    Search {
        query: String,

        #[arg(short, long, env = "BLITZCODER_USER_ID", default_value = "default")]
        user_id: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// List built-in tools
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (keys redacted)
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check the config file for errors
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr so streamed answers stay clean on stdout.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Chat {
        message: None,
        user_id: std::env::var("BLITZCODER_USER_ID").unwrap_or_else(|_| "default".into()),
        thread_id: None,
    });

    match command {
        Commands::Chat {
            message,
            user_id,
            thread_id,
        } => commands::chat::run(message, user_id, thread_id).await?,
        Commands::Search { query, user_id, limit } => {
            commands::search::run(&query, &user_id, limit).await?
        }
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
