use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Knowledge retrieval and structured output for a journalism teaching assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (defaults to $LECTERN_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Caller role (student, teacher, internal_test)
    #[arg(long, global = true, default_value = "student")]
    pub role: String,

    /// Caller owner id; omit for anonymous
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Owners an internal_test caller may see (repeatable)
    #[arg(long = "target", global = true)]
    pub targets: Vec<String>,

    /// Authorize an internal_test caller to see every owner
    #[arg(long, global = true)]
    pub god_view: bool,

    /// Answer without consulting the knowledge base
    #[arg(long, global = true)]
    pub no_kb: bool,

    /// Output results as JSON
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a file or directory of text files to the knowledge base
    Ingest {
        /// File or directory to ingest
        path: PathBuf,

        /// Store as system-owned course material (visible to everyone); required unless --owner is given
        #[arg(long)]
        system: bool,

        /// Delete the collection and start fresh
        #[arg(long)]
        rebuild: bool,
    },

    /// List knowledge-base sources by owner
    Sources,

    /// Ask a question
    Ask {
        /// Question text
        query: String,
    },

    /// Generate quiz questions
    Quiz {
        /// Instruction, e.g. "three questions on agenda setting"
        query: String,
    },

    /// Create or discuss a grading rubric
    Rubric {
        /// Request, e.g. "a rubric for news features"
        query: String,
    },

    /// Grade student documents
    Grade {
        /// Student files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rubric JSON file; omit for a qualitative self-check
        #[arg(long)]
        rubric: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Ingest {
            path,
            system,
            rebuild,
        } => {
            commands::ingest::execute(&cli.global, &path, system, rebuild)?;
        }
        Commands::Sources => {
            commands::sources::execute(&cli.global)?;
        }
        Commands::Ask { query } => {
            commands::ask::execute(&cli.global, &query)?;
        }
        Commands::Quiz { query } => {
            commands::quiz::execute(&cli.global, &query)?;
        }
        Commands::Rubric { query } => {
            commands::rubric::execute(&cli.global, &query)?;
        }
        Commands::Grade { files, rubric } => {
            commands::grade::execute(&cli.global, &files, rubric.as_deref())?;
        }
    }

    Ok(())
}

/// Logs go to stderr; `LECTERN_LOG` takes an `EnvFilter` directive
fn init_tracing() {
    let filter = EnvFilter::try_from_env("LECTERN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
