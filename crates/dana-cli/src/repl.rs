//! Interactive REPL for Dana.

use crate::colors::{bold, cyan, gray, green, red};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::{History, SearchDirection};
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Keywords that open an indented block and expect a `:`-terminated header.
const BLOCK_OPENERS: &[&str] = &["if", "elif", "else", "while", "for", "def", "struct", "try", "except", "finally"];

/// All keywords for tab completion.
const KEYWORDS: &[&str] = &[
    "if", "elif", "else", "while", "for", "in", "def", "return", "break", "continue", "pass",
    "import", "from", "as", "try", "except", "finally", "raise", "assert", "struct", "true",
    "false", "none", "and", "or", "not", "print", "local", "private", "public", "system",
];

/// Built-in functions for tab completion.
const BUILTINS: &[&str] = &["len", "str", "int", "float", "bool", "list", "range", "reason"];

/// REPL colon-commands for tab completion.
const COMMANDS: &[&str] = &[":help", ":quit", ":reset", ":clear", ":type", ":load", ":env", ":time", ":history"];

struct DanaCompleter;

impl Completer for DanaCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == '[' || c == '{' || c == '.')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }

        let mut candidates = Vec::new();
        if line.trim_start() == word && word.starts_with(':') {
            for &cmd in COMMANDS {
                if cmd.starts_with(word) {
                    candidates.push(Pair { display: cmd.to_string(), replacement: cmd.to_string() });
                }
            }
        } else {
            for &kw in KEYWORDS.iter().chain(BUILTINS) {
                if kw.starts_with(word) {
                    candidates.push(Pair { display: kw.to_string(), replacement: kw.to_string() });
                }
            }
        }
        Ok((start, candidates))
    }
}

impl Hinter for DanaCompleter {
    type Hint = String;
}

impl Highlighter for DanaCompleter {}
impl Validator for DanaCompleter {}
impl Helper for DanaCompleter {}

/// Names bound so far this session, purely for `:env`; the actual bindings
/// live in the sandbox's own context, which persists across `eval` calls.
#[derive(Default)]
struct SessionState {
    bound_names: Vec<String>,
}

pub fn run_repl(sandbox: dana_rt::Sandbox) {
    println!("{}", bold(&cyan("Dana REPL")));
    println!("{}\n", gray("Type :help for available commands, :quit to exit."));

    let config = rustyline::Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).expect("failed to create line editor");
    rl.set_helper(Some(DanaCompleter));

    let history_path = history_path();
    if let Some(path) = history_path.as_ref() {
        if path.exists() {
            let _ = rl.load_history(path);
        }
    }

    let mut session = SessionState::default();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            format!("{} ", green("dana>"))
        } else {
            format!("{}    ", gray("..."))
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    if buffer.is_empty() {
                        continue;
                    }
                    // Blank line closes an indented block, Python-console style.
                    eval_input(&buffer, &mut session, &sandbox);
                    buffer.clear();
                    continue;
                }

                if buffer.is_empty() {
                    if let Some(keep_going) = handle_command(&line, &mut rl, &mut session, &sandbox) {
                        if !keep_going {
                            break;
                        }
                        continue;
                    }
                }

                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if needs_more_input(&buffer) {
                    continue;
                }

                eval_input(&buffer, &mut session, &sandbox);
                buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                println!("{}", gray("(Ctrl-C to exit)"));
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {err:?}", red("Error:"));
                break;
            }
        }
    }

    if let Some(path) = history_path.as_ref() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }

    println!("\n{}", cyan("Goodbye!"));
}

fn history_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let mut path = PathBuf::from(home);
    path.push(".dana");
    path.push("repl_history");
    Some(path)
}

/// `Some(true)` to keep looping, `Some(false)` to quit, `None` if not a command.
fn handle_command<H: Helper>(
    line: &str,
    rl: &mut Editor<H, rustyline::history::DefaultHistory>,
    session: &mut SessionState,
    sandbox: &dana_rt::Sandbox,
) -> Option<bool> {
    let trimmed = line.trim();
    match trimmed {
        ":quit" | ":q" => return Some(false),
        ":help" | ":h" => {
            print_help();
            return Some(true);
        }
        ":reset" | ":r" => {
            println!("{}", gray("Session state cannot be reset without discarding the sandbox; restart the REPL instead."));
            return Some(true);
        }
        ":clear" | ":c" => {
            print!("\x1b[2J\x1b[H");
            use std::io::Write;
            std::io::stdout().flush().ok();
            return Some(true);
        }
        ":history" => {
            let history = rl.history();
            for i in 0..history.len() {
                if let Ok(Some(entry)) = history.get(i, SearchDirection::Forward) {
                    println!("{:4} {}", gray(&format!("{}", i + 1)), entry.entry);
                }
            }
            return Some(true);
        }
        ":env" => {
            cmd_env(session);
            return Some(true);
        }
        _ if trimmed.starts_with(":type ") || trimmed.starts_with(":t ") => {
            let expr = trimmed.strip_prefix(":type ").or_else(|| trimmed.strip_prefix(":t ")).unwrap();
            cmd_type(expr, sandbox);
            return Some(true);
        }
        _ if trimmed.starts_with(":load ") => {
            cmd_load(trimmed.strip_prefix(":load ").unwrap().trim(), session, sandbox);
            return Some(true);
        }
        _ if trimmed.starts_with(":time ") => {
            cmd_time(trimmed.strip_prefix(":time ").unwrap(), sandbox);
            return Some(true);
        }
        _ => None,
    }
}

/// True while `buffer` is missing a closing bracket, or its last non-blank
/// line still opens an indented block (ends with `:`).
fn needs_more_input(buffer: &str) -> bool {
    let mut parens = 0i32;
    let mut brackets = 0i32;
    let mut braces = 0i32;
    for ch in buffer.chars() {
        match ch {
            '(' => parens += 1,
            ')' => parens -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            '{' => braces += 1,
            '}' => braces -= 1,
            _ => {}
        }
    }
    if parens > 0 || brackets > 0 || braces > 0 {
        return true;
    }

    let last_line = buffer.lines().last().unwrap_or("");
    if last_line.trim_end().ends_with(':') {
        return true;
    }

    // Still inside a block: some earlier line opened one and this line is
    // indented (a continuation), so keep buffering until a blank line.
    let opened = buffer.lines().any(|l| {
        let word = l.trim_start().split(|c: char| !c.is_alphanumeric() && c != '_').next().unwrap_or("");
        BLOCK_OPENERS.contains(&word) && l.trim_end().ends_with(':')
    });
    opened && last_line.starts_with(char::is_whitespace)
}

fn eval_input(input: &str, session: &mut SessionState, sandbox: &dana_rt::Sandbox) {
    let result = sandbox.eval(&format!("{input}\n"));
    if !result.output.is_empty() {
        print!("{}", result.output);
    }
    if result.success {
        if let Some(value) = result.result {
            if !matches!(value, dana_rt::Value::None) {
                println!("{} {}", value, gray(&format!(": {}", value.type_name())));
            }
        }
        for name in new_names(input) {
            session.bound_names.push(name);
        }
    } else if let Some(chain) = result.error {
        eprintln!("{}", crate::error_chain::format_runtime_error(&chain, crate::colors::enabled()));
    }
}

/// Best-effort scrape of `name =`/`def name`/`struct name` at indentation 0,
/// just for `:env`'s listing — the sandbox's own context is authoritative.
fn new_names(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in input.lines() {
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("def ").or_else(|| trimmed.strip_prefix("struct ")) {
            if let Some(name) = rest.split(|c: char| !c.is_alphanumeric() && c != '_').next() {
                names.push(name.to_string());
            }
        } else if let Some((lhs, _)) = trimmed.split_once('=') {
            let candidate = lhs.trim();
            if !candidate.is_empty() && candidate.chars().all(|c| c.is_alphanumeric() || c == '_') {
                names.push(candidate.to_string());
            }
        }
    }
    names
}

fn cmd_type(expr: &str, sandbox: &dana_rt::Sandbox) {
    let result = sandbox.eval(&format!("__repl_type_probe = {expr}\n"));
    match (result.success, result.final_context.get_scope(dana_rt::ScopeName::Local, "__repl_type_probe")) {
        (true, Some(value)) => println!("{}", cyan(value.type_name())),
        (true, None) => println!("{}", cyan("none")),
        (false, _) => {
            if let Some(chain) = result.error {
                eprintln!("{}", crate::error_chain::format_runtime_error(&chain, crate::colors::enabled()));
            }
        }
    }
}

fn cmd_load(path: &str, session: &mut SessionState, sandbox: &dana_rt::Sandbox) {
    match fs::read_to_string(path) {
        Ok(source) => eval_input(source.trim_end(), session, sandbox),
        Err(e) => eprintln!("{} failed to read {path}: {e}", red("Error:")),
    }
}

fn cmd_env(session: &SessionState) {
    if session.bound_names.is_empty() {
        println!("{}", gray("No names defined yet."));
        return;
    }
    println!("{}", bold("Defined names:"));
    let mut names = session.bound_names.clone();
    names.sort();
    names.dedup();
    for name in names {
        println!("  {}", cyan(&name));
    }
}

fn cmd_time(expr: &str, sandbox: &dana_rt::Sandbox) {
    let start = Instant::now();
    let result = sandbox.eval(&format!("{expr}\n"));
    let elapsed = start.elapsed();
    if result.success {
        if let Some(value) = result.result {
            println!("{} {}", value, gray(&format!(": {}", value.type_name())));
        }
        println!("{}", gray(&format!("Elapsed: {elapsed:?}")));
    } else if let Some(chain) = result.error {
        eprintln!("{}", crate::error_chain::format_runtime_error(&chain, crate::colors::enabled()));
    }
}

fn print_help() {
    println!("{}", bold("Commands:"));
    println!("  {}  {}", cyan(":help, :h"), gray("Show this help"));
    println!("  {}  {}", cyan(":quit, :q"), gray("Exit the REPL"));
    println!("  {}  {}", cyan(":clear, :c"), gray("Clear terminal screen"));
    println!("  {}  {}", cyan(":type <expr>, :t <expr>"), gray("Show the type of an expression"));
    println!("  {}  {}", cyan(":load <file>"), gray("Load and execute a .na file"));
    println!("  {}  {}", cyan(":env"), gray("Show names defined this session"));
    println!("  {}  {}", cyan(":time <expr>"), gray("Evaluate and show elapsed time"));
    println!("  {}  {}", cyan(":history"), gray("Show command history"));
    println!();
    println!("{}", gray("Multi-line input: a block header ending in ':' keeps prompting until a blank line."));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_statement_needs_no_more_input() {
        assert!(!needs_more_input("x = 1"));
    }

    #[test]
    fn open_bracket_needs_more_input() {
        assert!(needs_more_input("x = [1, 2"));
        assert!(!needs_more_input("x = [1, 2]"));
    }

    #[test]
    fn block_header_needs_more_input() {
        assert!(needs_more_input("if x > 0:"));
    }

    #[test]
    fn indented_continuation_still_needs_more_input() {
        assert!(needs_more_input("if x > 0:\n    y = 1"));
    }

    #[test]
    fn new_names_picks_up_top_level_bindings() {
        let names = new_names("x = 1\ndef f(a):\n    return a\n");
        assert_eq!(names, vec!["x".to_string(), "f".to_string()]);
    }
}
