use std::io;

use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{config::Config as EditorConfig, Editor, Helper};
use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

mod input;
mod lang;

use input::{fixup_input, ReplHelper};
use lang::runtime::{Config, EvalResult, Runtime, DEFAULT_MAX_DEPTH};

const HISTORY_FILE: &str = ".plisp_history";
const PROMPT: &str = ":> ";

#[derive(Parser)]
#[command(version, about)]
struct Opt {
    /// Show debug output
    #[arg(short, long)]
    debug: bool,
    /// Deepest parenthesis nesting accepted on a line
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// Don't load or save line history
    #[arg(long)]
    no_history: bool,
}

fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    match SimpleLogger::init(filter, LogConfig::default()) {
        Ok(_) => Ok(()),
        Err(e) => bail!("Failed to init logger: {}", e),
    }
}

fn init_editor() -> Result<Editor<ReplHelper, DefaultHistory>> {
    let config = EditorConfig::builder().auto_add_history(true).build();
    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(ReplHelper::new()));

    Ok(editor)
}

fn init_history<H: Helper>(editor: &mut Editor<H, DefaultHistory>) {
    let _ = editor.load_history(HISTORY_FILE);
}

fn save_history<H: Helper>(editor: &mut Editor<H, DefaultHistory>) -> Result<()> {
    match editor.save_history(HISTORY_FILE) {
        Ok(_) => Ok(()),
        Err(e) => bail!("Failed to save history: {}", e),
    }
}

fn welcome() {
    println!("plisp v{}", env!("CARGO_PKG_VERSION"));
    println!("Enter an empty line or (exit) to quit");
    println!();
}

fn main() -> Result<()> {
    let opts = Opt::parse();
    init_logging(opts.debug)?;

    let mut editor = init_editor()?;
    if !opts.no_history {
        init_history(&mut editor);
    }
    welcome();

    let mut stdout = io::stdout();
    let mut runtime = Runtime::new(
        &mut stdout,
        Config {
            max_depth: opts.max_depth,
            interactive: true,
        },
    );
    let mut exit_code = 0;

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                info!("read: {}", &line);
                if line.trim().is_empty() {
                    break;
                }

                match runtime.eval(&fixup_input(&line)) {
                    EvalResult::Ok => (),
                    EvalResult::Quit(code) => {
                        exit_code = code;
                        break;
                    }
                    EvalResult::Err(e) => {
                        eprintln!("ERROR: {}", e);
                        continue;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("Press Ctrl-D, enter an empty line or type (exit) to quit");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Unexpected error: {}", e);
                break;
            }
        }
    }

    if !opts.no_history {
        save_history(&mut editor)?;
    }

    std::process::exit(exit_code);
}
