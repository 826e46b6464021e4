use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use locks::ast_printer::AstPrinter;
use locks::diagnostics::Diagnostics;
use locks::runner::{self, Outcome, Runner};
use locks::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Locks language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Script to run; an interactive session starts when omitted
    script: Option<PathBuf>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a script file
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,

    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse { filename: PathBuf },
}

/// Reads a whole script file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // `[module:line] - message`, Debug by default, RUST_LOG may override
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("locks::").unwrap_or(module);
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
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn run_file(filename: &Path) -> Result<i32> {
    let source = read_file(filename)?;
    let mut runner = Runner::new(Diagnostics::stderr());

    let outcome = runner.run(&source);
    info!("Run finished: {:?}", outcome);

    Ok(outcome.exit_code())
}

fn run_prompt() -> Result<i32> {
    let diagnostics = Diagnostics::stderr();
    let mut runner = Runner::new(diagnostics.clone());
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("$ ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        if !line.trim().is_empty() {
            let outcome = runner.run(&line);
            debug!("Line finished: {:?}", outcome);
        }

        diagnostics.reset();
    }

    Ok(0)
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for result in Scanner::new(&source) {
        match result {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { Outcome::StaticError.exit_code() })
}

fn parse(filename: &Path) -> Result<i32> {
    let source = read_file(filename)?;

    match runner::parse(&source) {
        Ok(statements) => {
            println!("{}", AstPrinter::print_program(&statements));
            Ok(0)
        }
        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
            Ok(Outcome::StaticError.exit_code())
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match (args.commands, args.script) {
        (Some(Commands::Run { filename }), _) | (None, Some(filename)) => run_file(&filename)?,
        (Some(Commands::Repl), _) | (None, None) => run_prompt()?,
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json)?,
        (Some(Commands::Parse { filename }), _) => parse(&filename)?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
