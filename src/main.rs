use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use stellar::ast_printer::AstPrinter;
use stellar::driver;
use stellar::error::StellarError;
use stellar::interpreter::{FsModuleLoader, Interpreter};
use stellar::keywords::KeywordTable;

const LOG_FILE: &str = "stellar.log";

#[derive(ClapParser, Debug)]
#[command(version, about = "Stellar language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to stellar.log
    #[arg(long, global = true)]
    log: bool,

    /// JSON keyword table remapping keyword spellings
    #[arg(long, global = true, value_name = "FILE")]
    keywords: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the tree as JSON instead of prefix notation
        #[arg(long)]
        json: bool,
    },

    /// Runs a file as a Stellar program
    Run { filename: PathBuf },
}

fn init_logger() -> Result<()> {
    let log_file: File =
        File::create(LOG_FILE).with_context(|| format!("Failed to create {}", LOG_FILE))?;

    Builder::new()
        .format(|buf, record| {
            let module: &str = record.module_path().unwrap_or("<unnamed>");
            let module: &str = module.strip_prefix("stellar::").unwrap_or(module);

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {}", LOG_FILE);

    Ok(())
}

fn load_keywords(path: Option<&Path>) -> Result<KeywordTable> {
    match path {
        Some(path) => {
            let json: String = driver::read_source(path)
                .with_context(|| format!("Failed to read keyword table {:?}", path))?;

            KeywordTable::from_json(&json)
                .with_context(|| format!("Invalid keyword table {:?}", path))
        }
        None => Ok(KeywordTable::default()),
    }
}

fn report(diagnostics: &[StellarError]) {
    for diagnostic in diagnostics {
        debug!("Diagnostic: {}", diagnostic);
        eprintln!("{}", diagnostic);
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let keywords: KeywordTable = load_keywords(args.keywords.as_deref())?;

    match args.commands {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");

            let source: String = driver::read_source(&filename)
                .with_context(|| format!("Failed to read {:?}", filename))?;
            let (tokens, diagnostics) = driver::scan(&source, &keywords);

            for token in &tokens {
                println!("{}", token);
            }

            report(&diagnostics);

            if !diagnostics.is_empty() {
                std::process::exit(65);
            }
        }

        Commands::Parse { filename, json } => {
            info!("Running Parse subcommand");

            let source: String = driver::read_source(&filename)
                .with_context(|| format!("Failed to read {:?}", filename))?;
            let (statements, diagnostics) = driver::parse(&source, &keywords);

            if !diagnostics.is_empty() {
                report(&diagnostics);
                std::process::exit(65);
            }

            if json {
                let rendered: String = serde_json::to_string_pretty(&statements)
                    .context("Failed to serialize syntax tree")?;
                println!("{}", rendered);
            } else {
                for stmt in &statements {
                    println!("{}", AstPrinter::print_stmt(stmt));
                }
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");

            let source: String = driver::read_source(&filename)
                .with_context(|| format!("Failed to read {:?}", filename))?;

            let root: PathBuf = filename
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            let mut interpreter: Interpreter =
                Interpreter::new(Rc::new(keywords)).with_loader(FsModuleLoader::new(root));

            let outcome: driver::Outcome = driver::run_source(&mut interpreter, &source);

            report(&outcome.diagnostics);

            if outcome.has_static_errors() {
                std::process::exit(65);
            }

            if let Some(error) = outcome.runtime_error {
                eprintln!("{}", error);
                std::process::exit(70);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
