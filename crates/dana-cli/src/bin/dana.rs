//! `dana` — execute a `.na` file, or start the interactive REPL with none given.

use clap::Parser;
use dana_cli::{colors, config::SandboxConfig, error_chain, repl};
use std::path::PathBuf;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "dana",
    version,
    about = "Dana — a small, indentation-sensitive agent scripting language",
    long_about = "Run a Dana program, or start the interactive REPL when given no file.\n\n\
                  Source files are UTF-8 text with a .na extension."
)]
struct Cli {
    /// Path to a `.na` source file. Starts the REPL if omitted.
    #[arg()]
    file: Option<PathBuf>,

    /// Enable verbose host-side logging.
    #[arg(long)]
    debug: bool,

    /// Disable ANSI color output.
    #[arg(long, conflicts_with = "force_color")]
    no_color: bool,

    /// Force ANSI color output even when stdout is not a terminal.
    #[arg(long)]
    force_color: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
    colors::init(cli.no_color, cli.force_color);

    let config = SandboxConfig::from_env();
    log::debug!("sandbox config: {config:?}");

    let exit_code = match cli.file {
        Some(path) => run_file(&path),
        None => {
            repl::run_repl(dana_rt::Sandbox::new());
            EXIT_SUCCESS
        }
    };
    std::process::exit(exit_code);
}

fn run_file(path: &PathBuf) -> i32 {
    if path.extension().and_then(|e| e.to_str()) != Some("na") {
        eprintln!(
            "{}",
            error_chain::ErrorChain::new(format!("'{}' is not a .na file", path.display())).format_for_display()
        );
        return EXIT_FAILURE;
    }

    let _ = ctrlc::set_handler(|| std::process::exit(EXIT_INTERRUPTED));

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "{}",
                error_chain::ErrorChain::new(format!("could not read '{}'", path.display()))
                    .caused_by(e.to_string())
                    .format_for_display()
            );
            return EXIT_FAILURE;
        }
    };

    if let Err(compile_err) = dana_compiler::compile(&source) {
        eprintln!("{}", error_chain::format_compile_error(&compile_err.to_diagnostic(), colors::enabled()));
        return EXIT_FAILURE;
    }

    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval(&source);
    if !result.output.is_empty() {
        print!("{}", result.output);
    }

    match result.error {
        None => EXIT_SUCCESS,
        Some(chain) => {
            eprintln!("{}", error_chain::format_runtime_error(&chain, colors::enabled()));
            EXIT_FAILURE
        }
    }
}
