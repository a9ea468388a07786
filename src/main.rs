use clap::Parser;
use robol::codegen;
use robol::frontend::{self, tokenize};
use robol::interpreter::{
    Evaluator, EvaluatorConfig, Listener, MessageSeverity, DEFAULT_MAX_CALL_DEPTH,
};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::{fs, process};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const EXIT_DATA_ERROR: i32 = 65;
const EXIT_NO_INPUT: i32 = 66;
const EXIT_SOFTWARE: i32 = 70;
const EXIT_CANT_CREATE: i32 = 73;

/// Runs a Robol program and prints its result.
#[derive(Parser, Debug)]
#[clap(name = "robol", version)]
struct Cli {
    /// Source file to run.
    file: PathBuf,

    /// Print the token stream before parsing.
    #[clap(long)]
    tokens: bool,

    /// Print the syntax tree before running.
    #[clap(long)]
    tree: bool,

    /// Write three-address code for the entry function to PATH.
    #[clap(long, value_name = "PATH")]
    tac: Option<PathBuf>,

    #[clap(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    process::exit(run(&cli));
}

fn init_logging(verbose: usize) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> i32 {
    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Failed to read {}: {}", cli.file.display(), err);
            return EXIT_NO_INPUT;
        }
    };

    let tokens = tokenize(&source);
    if cli.tokens {
        for token in &tokens {
            println!("{}", token);
        }
    }

    let program = match frontend::Parser::new(tokens.into_iter()).parse() {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err.render(&source));
            return EXIT_DATA_ERROR;
        }
    };
    if cli.tree {
        println!("{}", program.ast_string());
    }

    if let Some(path) = &cli.tac {
        if let Err(err) = fs::write(path, codegen::generate(&program)) {
            error!(path = %path.display(), %err, "could not write three-address code");
            return EXIT_CANT_CREATE;
        }
        debug!(path = %path.display(), "wrote three-address code");
    }

    let failed = Rc::new(Cell::new(false));
    let listener: Listener = {
        let failed = Rc::clone(&failed);
        Rc::new(move |message: &str, severity: MessageSeverity| match severity {
            MessageSeverity::Normal => println!("{}", message),
            MessageSeverity::Warning => eprintln!("warning: {}", message),
            MessageSeverity::Error => {
                failed.set(true);
                eprintln!("Runtime error: {}", message);
            }
        })
    };

    let config = EvaluatorConfig {
        max_call_depth: cli.max_call_depth,
    };
    let mut evaluator = Evaluator::with_config(&program, config);
    evaluator.subscribe(listener);
    evaluator.run();

    if failed.get() {
        EXIT_SOFTWARE
    } else {
        0
    }
}
