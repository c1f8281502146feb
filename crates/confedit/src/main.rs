//! confedit - ensure values in YAML and JSON configuration documents

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "confedit")]
#[command(version)]
#[command(about = "Ensure values at paths in YAML and JSON documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a .yaml, .yml or .json file in place
    File {
        /// Document to read (and, without --dest, to write back)
        #[arg(long, value_name = "FILE")]
        src: PathBuf,

        /// Path expression, e.g. `config.person[2].name`
        #[arg(long, value_name = "PATH")]
        key: String,

        /// Value as a YAML literal (`3`, `true`, `"3"`, `{name: x}`)
        #[arg(long, value_name = "LITERAL")]
        value: Option<String>,

        /// One of present, absent or check
        #[arg(long)]
        state: String,

        /// Copy the source to <FILE>_<timestamp> before changing it
        #[arg(long)]
        backup: bool,

        /// Write the result here instead of over the source
        #[arg(long, value_name = "FILE")]
        dest: Option<PathBuf>,

        /// Report whether anything would change, without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Edit a document given on the command line and print the result
    Var {
        /// The document, as YAML or JSON text
        #[arg(long = "var", value_name = "DOCUMENT")]
        document: String,

        /// Path expression, e.g. `person[-1]`
        #[arg(long, value_name = "PATH")]
        key: String,

        /// Value as a YAML literal
        #[arg(long, value_name = "LITERAL")]
        value: Option<String>,

        /// One of present, absent or check
        #[arg(long)]
        state: String,
    },
}

fn main() {
    // Logs go to stderr; stdout is reserved for the JSON report.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confedit=info,confedit_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::File {
            src,
            key,
            value,
            state,
            backup,
            dest,
            dry_run,
        } => commands::file::execute(commands::file::FileArgs {
            src,
            key,
            value,
            state,
            backup,
            dest,
            dry_run,
        }),
        Commands::Var {
            document,
            key,
            value,
            state,
        } => commands::var::execute(&document, &key, value.as_deref(), &state),
    }
}
