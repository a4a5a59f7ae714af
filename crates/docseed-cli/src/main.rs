use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ApplyArgs, PlanSource};

#[derive(Parser, Debug)]
#[command(name = "docseed", version, about = "Declarative document-database bootstrap")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a plan against a running MongoDB deployment.
    ///
    /// Directives that are already in place are skipped. The first fatal
    /// failure stops the run; nothing is rolled back.
    Apply(ApplyArgs),

    /// Validate a plan file (JSON Schema + plan rules) without touching a database.
    Check {
        #[command(flatten)]
        source: PlanSource,
    },

    /// Print the ordered directive list a plan expands to.
    Show {
        #[command(flatten)]
        source: PlanSource,

        /// Print directives as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.cmd {
        Command::Apply(args) => commands::apply::run(args).await,
        Command::Check { source } => commands::check::run(&source),
        Command::Show { source, json } => commands::show::run(&source, json),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(commands::EXIT_SETUP_FAILED)
        }
    }
}
