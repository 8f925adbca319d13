use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};
use fraud_rel::cli::{self, CliError, EvalOptions, ScoreOptions};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "rel")]
#[command(about = "rel - validate, evaluate and score fraud rule expressions")]
#[command(version)]
struct Cli {
    /// TOML file with validation limits and a field catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an expression and print its normalized form
    Validate {
        /// The REL expression
        expression: String,
    },

    /// Evaluate an expression against a transaction and user
    Eval {
        /// The REL expression
        expression: String,

        /// Transaction JSON (reads from stdin if not provided)
        #[arg(long)]
        tx: Option<String>,

        /// User JSON
        #[arg(long)]
        user: Option<String>,
    },

    /// Score a transaction against a JSON file of rules
    Score {
        /// Path to a JSON array of rules
        #[arg(long)]
        rules: PathBuf,

        /// Transaction JSON (reads from stdin if not provided)
        #[arg(long)]
        tx: Option<String>,

        /// User JSON
        #[arg(long)]
        user: Option<String>,
    },

    /// List the fields of the active catalog
    Fields,

    /// Print the token stream of an expression
    Tokens {
        /// The REL expression
        expression: String,
    },

    /// Show documentation; lists categories when none is given
    Docs {
        /// Category name
        category: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but the verdict is a failure.
fn run(cli: Cli) -> Result<bool, CliError> {
    let pretty = cli.pretty;
    let engine = cli::load_engine(cli.catalog.as_deref())?;

    match cli.command {
        Commands::Validate { expression } => {
            let result = cli::execute_validate(&engine, &expression);
            print_json(&result, pretty)?;
            Ok(result.is_valid)
        }
        Commands::Eval {
            expression,
            tx,
            user,
        } => {
            let options = EvalOptions {
                expression,
                transaction: read_input(tx)?,
                user,
            };
            print_json(&cli::execute_eval(&engine, &options)?, pretty)?;
            Ok(true)
        }
        Commands::Score { rules, tx, user } => {
            let options = ScoreOptions {
                rules: fs::read_to_string(&rules)?,
                transaction: read_input(tx)?,
                user,
            };
            print_json(&cli::execute_score(&engine, &options)?, pretty)?;
            Ok(true)
        }
        Commands::Fields => {
            print!("{}", cli::format_fields(engine.catalog()));
            Ok(true)
        }
        Commands::Tokens { expression } => {
            print_json(&cli::execute_tokens(&expression), pretty)?;
            Ok(true)
        }
        Commands::Docs { category: None } => {
            print!("{}", cli::get_docs_overview());
            Ok(true)
        }
        Commands::Docs {
            category: Some(category),
        } => {
            print!("{}", cli::get_doc_category(&category, engine.catalog())?);
            Ok(true)
        }
    }
}

fn read_input(arg: Option<String>) -> Result<Option<String>, CliError> {
    match arg {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}
