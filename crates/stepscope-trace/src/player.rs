//! Forward-only, replayable cursor over one precomputed trace.
//!
//! The player is the only component the presentation layer talks to after
//! setup. `reset()` rebuilds the source model, the tracked-name set, and the
//! trace from scratch; `step()` advances the cursor one snapshot; and
//! `get_state()` projects the cursor into a serializable [`DisplayState`]
//! without mutating anything. Stepping replays recorded snapshots -- the
//! script never runs again until the next reset.
//!
//! States: `NotStarted` (`step_index == -1`) -> `Stepping` -> `Finished`;
//! `reset()` is the only way back. An empty trace (compile failure or a
//! blank script) is finished immediately, with the compile error text as
//! the sole output.

use indexmap::IndexMap;
use serde::Serialize;
use stepscope_core::source::SourceLines;

use crate::extract;
use crate::interpreter::display::ScopeLabel;
use crate::interpreter::state::{trace, TracerConfig};
use crate::interpreter::trace::{Snapshot, Trace};

/// Replayable stepper over one script's execution trace.
///
/// Each player owns an independent namespace and cursor; instances share no
/// mutable state. All failures are local to one reset cycle -- calling
/// `reset()` again discards everything and retries.
#[derive(Debug)]
pub struct TracePlayer {
    script: String,
    explicit_vars: Option<Vec<String>>,
    config: TracerConfig,
    source: SourceLines,
    tracked: Vec<String>,
    trace: Trace,
    step_index: i64,
    finished: bool,
}

/// Pure projection of the player's cursor for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    /// 0-based current line, `-1` before the first step.
    pub current_line: i64,
    /// Tracked name -> formatted value.
    pub bindings: IndexMap<String, String>,
    /// Tracked name -> scope label.
    pub scopes: IndexMap<String, ScopeLabel>,
    /// Tracked name -> type name.
    pub types: IndexMap<String, String>,
    /// Cumulative captured output, split on line breaks.
    pub output_lines: Vec<String>,
    /// The script's source lines.
    pub source_lines: Vec<String>,
    pub finished: bool,
}

impl TracePlayer {
    /// Builds a player and runs the first trace pass.
    ///
    /// `explicit_vars` is an optional comma-separated override of the
    /// tracked-variable list; when absent the extractor picks the names.
    pub fn new(script: &str, explicit_vars: Option<&str>, config: TracerConfig) -> Self {
        let mut player = TracePlayer {
            script: script.to_string(),
            explicit_vars: explicit_vars.map(parse_var_list),
            config,
            source: SourceLines::default(),
            tracked: Vec::new(),
            trace: Trace::default(),
            step_index: -1,
            finished: false,
        };
        player.reset();
        player
    }

    /// Rebuilds source, tracked names, and trace; rewinds to "not started".
    ///
    /// Auto-detected names are recomputed from scratch. The old trace and
    /// cursor are discarded entirely -- no partial reuse.
    pub fn reset(&mut self) {
        self.source = SourceLines::new(&self.script);
        self.tracked = match &self.explicit_vars {
            Some(vars) => {
                let mut sorted = vars.clone();
                sorted.sort();
                sorted.dedup();
                sorted
            }
            None => extract::tracked_names(&self.script).into_iter().collect(),
        };
        self.trace = trace(&self.script, &self.tracked, &self.config);
        self.step_index = -1;
        // An empty trace has nothing to step through; the run is already
        // over (compile failure or blank script).
        self.finished = self.trace.is_empty();
    }

    /// Advances the cursor by one snapshot. No-op once finished.
    pub fn step(&mut self) {
        if self.finished {
            return;
        }
        self.step_index += 1;
        if self.step_index as usize == self.trace.len() - 1 {
            self.finished = true;
        }
    }

    /// Pure read of the current display state; call as often as you like.
    pub fn get_state(&self) -> DisplayState {
        match self.current_snapshot() {
            Some(snapshot) => DisplayState {
                current_line: snapshot.line as i64,
                bindings: snapshot
                    .bindings
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_string()))
                    .collect(),
                scopes: snapshot.scopes.clone(),
                types: snapshot.types.clone(),
                output_lines: split_output(&snapshot.output),
                source_lines: self.source.lines().to_vec(),
                finished: self.finished,
            },
            None => DisplayState {
                current_line: -1,
                bindings: IndexMap::new(),
                scopes: IndexMap::new(),
                types: IndexMap::new(),
                output_lines: if self.trace.is_empty() {
                    split_output(self.trace.fallback_output())
                } else {
                    Vec::new()
                },
                source_lines: self.source.lines().to_vec(),
                finished: self.finished,
            },
        }
    }

    /// The snapshot under the cursor, or `None` before the first step.
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        if self.step_index < 0 {
            None
        } else {
            self.trace.get(self.step_index as usize)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The precomputed trace for the current reset cycle.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The tracked names, sorted for display.
    pub fn tracked(&self) -> &[String] {
        &self.tracked
    }
}

fn parse_var_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_output(output: &str) -> Vec<String> {
    if output.is_empty() {
        Vec::new()
    } else {
        output.lines().map(str::to_string).collect()
    }
}
