//! Execution tracing and replay for teaching scripts.
//!
//! Three components, each depending only on the one before it:
//!
//! - [`extract`] -- static analysis that picks the identifiers worth
//!   watching (assignment targets, loop variables, function parameters)
//!   when the caller supplies no explicit list.
//! - [`interpreter`] -- an AST-walking interpreter that executes a script
//!   exactly once in a fresh namespace and records one [`Snapshot`] per
//!   executed, non-blank source line (bindings, scope labels, cumulative
//!   output). Failures never escape: a script that does not parse yields an
//!   empty, finished trace; a script that raises yields the partial trace
//!   with the error appended to the final snapshot's output.
//! - [`player`] -- a forward-only cursor over one precomputed [`Trace`]:
//!   `reset()` rebuilds everything, `step()` advances, `get_state()` is a
//!   pure serializable projection for the presentation layer.
//!
//! Stepping never re-runs the program; it replays the precomputed trace.

pub mod extract;
pub mod interpreter;
pub mod player;

pub use interpreter::display::{DisplayValue, ScopeLabel};
pub use interpreter::error::RuntimeError;
pub use interpreter::state::{trace, TracerConfig};
pub use interpreter::trace::{Snapshot, Trace};
pub use player::{DisplayState, TracePlayer};
