use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use minilisp::builtins::get_builtin_ops;
use minilisp::value::Value;
use minilisp::{Config, Interpreter};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

/// Run a minilisp program, or start an interactive session
#[derive(Debug, Parser)]
#[command(name = "minilisp", version)]
struct Cli {
    /// Program file to run; starts the REPL when omitted
    file: Option<PathBuf>,

    /// Maximum evaluation depth
    #[arg(long, default_value_t = minilisp::MAX_EVAL_DEPTH)]
    max_depth: usize,

    /// Maximum expression nesting accepted by the parser
    #[arg(long, default_value_t = minilisp::MAX_PARSE_DEPTH)]
    max_nesting: usize,

    /// Skip illegal characters instead of rejecting the input
    #[arg(long)]
    lenient: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::default()
        .with_max_eval_depth(cli.max_depth)
        .with_max_parse_depth(cli.max_nesting)
        .with_strict_lexing(!cli.lenient);
    let mut interp = Interpreter::new(config);

    match cli.file {
        Some(path) => run_file(&mut interp, &path),
        None => run_repl(&mut interp),
    }
}

/// Run a whole file; any failure ends the run
fn run_file(interp: &mut Interpreter, path: &Path) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(path = %path.display(), bytes = source.len(), "running file");
    match interp.eval_source(&source) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl(interp: &mut Interpreter) -> ExitCode {
    println!("Lisp!");
    println!("Type :help for commands, (quit) or Ctrl+D to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Could not initialize REPL: {e}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Err(e) = rl.add_history_entry(line) {
                    tracing::debug!(error = %e, "could not record history entry");
                }

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(interp);
                        continue;
                    }
                    ":quit" | ":exit" | "(quit)" => break,
                    _ => {}
                }

                if let Some(source) = line.strip_prefix(":parse ") {
                    match interp.parse(source) {
                        Ok(program) => println!("{program}"),
                        Err(e) => println!("Error: {e}"),
                    }
                    continue;
                }

                match interp.eval_source(line) {
                    Ok(value) => println!("{value}"),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("Error: {err:?}");
                return ExitCode::FAILURE;
            }
        }
    }

    println!("See ya!");
    ExitCode::SUCCESS
}

fn print_help() {
    println!("Commands:");
    println!("  :help          - Show this help message");
    println!("  :env           - Show current environment bindings");
    println!("  :parse <expr>  - Show how an expression parses");
    println!("  :quit, (quit)  - Exit the interpreter");
    println!();
    println!("Forms:");
    println!("  (setq x 5)                  bind a variable");
    println!("  (defun add (a b) (+ a b))   define a function");
    println!("  (if c then else)            0 is false, anything else true");
    println!("  (print expr)                print and return a value");
    println!();
    println!("Primitives:");
    println!("  Arithmetic: + - * /");
    println!("  Comparison: > < >= <= == !=");
    println!();
    println!("Builtins:");
    for op in get_builtin_ops() {
        println!("  {:<8} takes {}", op.name, op.arity);
    }
    println!();
}

fn print_environment(interp: &Interpreter) {
    let bindings = interp.environment().get_all_bindings();

    let (functions, variables): (Vec<_>, Vec<_>) = bindings
        .into_iter()
        .partition(|(_, value)| matches!(value, Value::Function(_)));

    if !functions.is_empty() {
        println!("Functions ({}):", functions.len());
        for (name, value) in functions {
            if let Value::Function(def) = value {
                println!("  {name} ({})", def.params.join(" "));
            }
        }
    }

    if !variables.is_empty() {
        println!("Variables ({}):", variables.len());
        for (name, value) in variables {
            println!("  {name} = {value}");
        }
    }
}
