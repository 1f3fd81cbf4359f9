use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eai_core::Locale;
use eai_core::store::JsonFileStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod util;

use commands::catalog::CatalogCommands;
use commands::chat::ChatArgs;
use commands::profile::ProfileCommands;

#[derive(Parser)]
#[command(
    name = "eai",
    version,
    about = "EAI learning coach: rubric-grounded tutoring chat and catalog tooling"
)]
struct Cli {
    /// Catalog and conversation language (nl, en)
    #[arg(long, global = true, env = "EAI_LOCALE", default_value = "nl")]
    locale: Locale,

    /// Directory of the stored learner profile
    #[arg(long, global = true, env = "EAI_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive coaching chat on stdin/stdout
    Chat(ChatArgs),
    /// Inspect the rubric catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Check a model response (or bare analysis) against the catalog
    Validate {
        /// JSON file to check ("-" for stdin)
        #[arg(long)]
        file: String,
    },
    /// Stored learner profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eai=warn,eai_core=warn,eai_runtime=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let store = JsonFileStore::in_dir(util::profile_dir(cli.profile_dir));

    let exit_code = match cli.command {
        Commands::Chat(args) => commands::chat::run(cli.locale, store, args).await,
        Commands::Catalog { command } => commands::catalog::run(cli.locale, command),
        Commands::Validate { file } => commands::validate::run(cli.locale, &file),
        Commands::Profile { command } => commands::profile::run(&store, command),
    };

    std::process::exit(exit_code);
}
