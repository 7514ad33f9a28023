//! CLI wrapper for the jssim engine.
//!
//! Usage:
//!   jssim <file.js>              # Execute a script file
//!   jssim -e "code"              # Evaluate a script given inline
//!   jssim                        # Start REPL (interactive mode)

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use jssim::parser::JsParser;
use jssim::runner::api::{run_source, with_evaluation_stack, Interpreter, Outcome};
use jssim::runner::config::EngineConfig;
use jssim::runner::ds::value::ValueSnapshot;
use jssim::runner::plugin::types::LogLevel;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulates JavaScript hoisting, scopes, closures and the call stack", long_about = None)]
struct Args {
    /// Script file to execute.
    file: Option<PathBuf>,

    /// Evaluate the given code instead of a file.
    #[arg(short = 'e', long = "eval", value_name = "CODE", conflicts_with = "file")]
    eval: Option<String>,

    /// Load engine settings from a TOML file; flags override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Call-stack bound, the global activation included.
    #[arg(long, value_name = "N")]
    max_stack_depth: Option<usize>,

    /// Let assignments to undeclared names create globals.
    #[arg(long)]
    legacy_globals: bool,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,

    /// Print the parsed tree and exit.
    #[arg(long, conflicts_with = "tokens")]
    ast: bool,

    /// Print the raw parse tokens and exit.
    #[arg(long)]
    tokens: bool,

    /// Log engine internals to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn install_subscriber(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn build_config(args: &Args) -> Result<EngineConfig, String> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    if let Some(depth) = args.max_stack_depth {
        config = config.with_max_stack_depth(depth);
    }
    if args.legacy_globals {
        config = config.with_legacy_implicit_globals(true);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() {
    let args = Args::parse();
    install_subscriber(args.verbose);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    let source = match (&args.file, &args.eval) {
        (Some(path), _) => match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                process::exit(2);
            }
        },
        (None, Some(code)) => Some(code.to_string()),
        (None, None) => None,
    };

    let code = match source {
        Some(source) if args.ast || args.tokens => dump_tree(&source, args.tokens),
        Some(source) => run_script(&source, &config, args.json),
        None => run_repl(config),
    };
    process::exit(code);
}

fn dump_tree(source: &str, tokens: bool) -> i32 {
    let dumped = if tokens {
        JsParser::parse_to_token_tree(source)
    } else {
        JsParser::parse_to_ast_from_str(source).map(|program| format!("{:#?}", program))
    };
    match dumped {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Uncaught {}", e);
            1
        }
    }
}

fn run_script(source: &str, config: &EngineConfig, json: bool) -> i32 {
    let outcome = match run_source(source, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {}", e);
            return 2;
        }
    };
    if json {
        match serde_json::to_string_pretty(&outcome.report()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: {}", e);
                return 2;
            }
        }
    } else {
        print_outcome(&outcome, false);
    }
    if outcome.is_ok() {
        0
    } else {
        1
    }
}

fn print_outcome(outcome: &Outcome, echo_value: bool) {
    for line in &outcome.log {
        match line.level {
            LogLevel::Log | LogLevel::Info => println!("{}", line.text),
            LogLevel::Warn | LogLevel::Error => eprintln!("{}", line.text),
        }
    }
    match &outcome.result {
        Ok(value) => {
            if echo_value && *value != ValueSnapshot::Undefined {
                println!("{}", render_snapshot(value));
            }
        }
        Err(e) => eprintln!("{}", e.report()),
    }
}

fn render_snapshot(value: &ValueSnapshot) -> String {
    match value {
        ValueSnapshot::Undefined => "undefined".to_string(),
        ValueSnapshot::Null => "null".to_string(),
        ValueSnapshot::Boolean(b) => b.to_string(),
        ValueSnapshot::Number(n) => jssim::runner::ds::value::number_to_string(*n),
        ValueSnapshot::String(s) => format!("{:?}", s),
        ValueSnapshot::Function(name) if name.is_empty() => "[Function (anonymous)]".to_string(),
        ValueSnapshot::Function(name) => format!("[Function: {}]", name),
    }
}

fn run_repl(config: EngineConfig) -> i32 {
    let stack_bytes = config.host_stack_bytes;
    let result = with_evaluation_stack(stack_bytes, move || {
        println!("jssim v{}", env!("CARGO_PKG_VERSION"));
        println!("Type code and press Enter. Type .exit to quit.");
        println!();

        let mut interpreter = Interpreter::new(config);
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        loop {
            print!("> ");
            if stdout.flush().is_err() {
                break;
            }
            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    break;
                }
            }
            let input = input.trim();
            if input == ".exit" || input == ".quit" {
                break;
            }
            if input.is_empty() {
                continue;
            }
            let outcome = interpreter.run_source(input);
            print_outcome(&outcome, true);
        }
    });
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {}", e);
            2
        }
    }
}
