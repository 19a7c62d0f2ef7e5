//! Trace recording: one immutable snapshot per executed source line.

use indexmap::IndexMap;
use serde::Serialize;

use super::display::{DisplayValue, ScopeLabel};

/// State captured when one source line finished executing.
///
/// All fields are deep copies; a recorded snapshot never changes, whatever
/// the program does afterwards. `output` is cumulative -- across the ordered
/// snapshots of a trace the outputs form a prefix chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// 0-based source line index.
    pub line: usize,
    /// Tracked names currently bound, in tracked order.
    pub bindings: IndexMap<String, DisplayValue>,
    /// Which scope each bound name resolved from.
    pub scopes: IndexMap<String, ScopeLabel>,
    /// Surface type name of each bound value.
    pub types: IndexMap<String, String>,
    /// Everything the script printed so far, including this line.
    pub output: String,
}

/// The ordered, immutable result of one execution pass.
///
/// Built once per player reset and read-only afterwards. A trace may be
/// shorter than the script (execution aborted) or empty (the script did not
/// parse); in the empty case `fallback_output` carries the error text the
/// player surfaces as the sole output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    entries: Vec<Snapshot>,
    fallback_output: String,
}

impl Trace {
    pub(crate) fn new(entries: Vec<Snapshot>) -> Self {
        Trace { entries, fallback_output: String::new() }
    }

    pub(crate) fn failed_compile(error_text: String) -> Self {
        Trace { entries: Vec::new(), fallback_output: error_text }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Output to surface when the trace has no entries.
    pub fn fallback_output(&self) -> &str {
        &self.fallback_output
    }
}
