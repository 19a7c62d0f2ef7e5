//! Stepper CLI.
//!
//! Provides the `stepscope` binary. `trace` loads a script, builds its
//! execution trace, and steps through the whole thing printing each display
//! state (or one JSON document per state with `--json`). `vars` prints the
//! variables the static extractor would watch.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use stepscope_trace::{extract, DisplayState, TracePlayer, TracerConfig};

/// Execution-trace stepper for teaching scripts.
#[derive(Parser)]
#[command(name = "stepscope", about = "Execution-trace stepper for teaching scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Trace a script and print every step.
    Trace {
        /// Path to the script file.
        script: PathBuf,

        /// Comma-separated variables to watch (default: auto-detected).
        #[arg(short, long)]
        vars: Option<String>,

        /// Print one JSON document per step instead of text.
        #[arg(long)]
        json: bool,

        /// Executed-statement budget for the run.
        #[arg(long, default_value_t = 10_000)]
        max_statements: usize,
    },

    /// Print the auto-detected tracked variables for a script.
    Vars {
        /// Path to the script file.
        script: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Commands::Trace { script, vars, json, max_statements } => {
            let source = read_script(&script);
            let config = TracerConfig { max_statements, ..TracerConfig::default() };
            let mut player = TracePlayer::new(&source, vars.as_deref(), config);

            if player.is_finished() {
                // Empty trace: compile failure or blank script.
                print_state(&player.get_state(), json);
                return;
            }
            while !player.is_finished() {
                player.step();
                print_state(&player.get_state(), json);
            }
        }
        Commands::Vars { script } => {
            let source = read_script(&script);
            for name in extract::tracked_names(&source) {
                println!("{name}");
            }
        }
    }
}

fn read_script(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", path.display());
            process::exit(1);
        }
    }
}

fn print_state(state: &DisplayState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(doc) => println!("{doc}"),
            Err(err) => {
                eprintln!("error: cannot serialize state: {err}");
                process::exit(1);
            }
        }
        return;
    }

    if state.current_line >= 0 {
        let line = state.current_line as usize;
        let text = state
            .source_lines
            .get(line)
            .map(String::as_str)
            .unwrap_or("");
        println!("--> line {}: {}", line + 1, text);
    } else {
        println!("--> (not started)");
    }
    for (name, value) in &state.bindings {
        let scope = state
            .scopes
            .get(name)
            .map(ToString::to_string)
            .unwrap_or_default();
        println!("    {name} = {value}  [{scope}]");
    }
    for line in &state.output_lines {
        println!("    | {line}");
    }
    if state.finished {
        println!("    (finished)");
    }
    println!();
}
