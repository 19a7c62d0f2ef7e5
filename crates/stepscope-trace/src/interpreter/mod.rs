//! AST-walking interpreter with line-level trace capture.
//!
//! Executes a script exactly once in an isolated namespace and records one
//! [`Snapshot`] per executed, non-blank source line. The snapshot sequence
//! (the [`Trace`]) is immutable once built; the player replays it without
//! ever resuming real execution.
//!
//! # Architecture
//!
//! - [`state`] -- the tracer itself: statement execution, namespaces, call
//!   frames, budget enforcement, snapshot recording.
//! - [`eval`] -- operators, subscripts, iteration and built-in functions,
//!   with checked arithmetic and trap semantics.
//! - [`value`] -- runtime values; lists/dicts are shared mutable objects,
//!   iterator state is a buffered queue owned by the interpreter.
//! - [`display`] -- deep-copied display values recorded into snapshots;
//!   iterators are materialized here without disturbing the live object.
//! - [`trace`] -- the snapshot and trace types.
//! - [`error`] -- runtime error taxonomy, line-tagged.

pub mod display;
pub mod error;
pub mod eval;
pub mod state;
pub mod trace;
pub mod value;

pub use display::{DisplayValue, ScopeLabel};
pub use error::RuntimeError;
pub use state::{trace, TracerConfig};
pub use trace::{Snapshot, Trace};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::display::{DisplayValue, ScopeLabel};
    use super::state::{trace, TracerConfig};
    use super::trace::Trace;

    /// Helper: trace a script with an explicit tracked-name list.
    fn run(script: &str, tracked: &[&str]) -> Trace {
        let tracked: Vec<String> = tracked.iter().map(|s| s.to_string()).collect();
        trace(script, &tracked, &TracerConfig::default())
    }

    fn rendered(trace: &Trace, entry: usize, name: &str) -> String {
        trace
            .get(entry)
            .and_then(|s| s.bindings.get(name))
            .map(|v| v.to_string())
            .unwrap_or_else(|| panic!("entry {entry} has no binding for {name}"))
    }

    /// Asserts the §"output prefix chain" invariant over a whole trace.
    fn assert_prefix_chain(trace: &Trace) {
        for pair in trace.entries().windows(2) {
            assert!(
                pair[1].output.starts_with(&pair[0].output),
                "output {:?} is not a prefix of {:?}",
                pair[0].output,
                pair[1].output
            );
        }
    }

    // -----------------------------------------------------------------------
    // 1. Straight-line script: one entry per line, bindings appear in order
    // -----------------------------------------------------------------------

    #[test]
    fn straight_line_trace() {
        let t = run("a = [1,2,3]\nb = sum(a)\nprint(b)", &["a", "b"]);
        assert_eq!(t.len(), 3);

        // Entry 0: after `a = [1,2,3]` -- a bound, b absent.
        let e0 = t.get(0).unwrap();
        assert_eq!(e0.line, 0);
        assert!(e0.bindings.contains_key("a"));
        assert!(!e0.bindings.contains_key("b"));
        assert_eq!(rendered(&t, 0, "a"), "[1, 2, 3]");

        // Entry 1: both bound.
        let e1 = t.get(1).unwrap();
        assert_eq!(rendered(&t, 1, "b"), "6");
        assert_eq!(e1.scopes.get("b"), Some(&ScopeLabel::Global));
        assert_eq!(e1.types.get("b").map(String::as_str), Some("int"));

        // Entry 2: output captured cumulatively.
        let e2 = t.get(2).unwrap();
        assert_eq!(e2.line, 2);
        assert_eq!(e2.output, "6\n");
        assert_prefix_chain(&t);
    }

    #[test]
    fn blank_and_comment_lines_produce_no_entries() {
        let t = run("x = 1\n\n# comment\ny = 2", &["x", "y"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0).unwrap().line, 0);
        assert_eq!(t.get(1).unwrap().line, 3);
    }

    #[test]
    fn empty_script_yields_empty_trace() {
        let t = run("", &[]);
        assert!(t.is_empty());
        assert_eq!(t.fallback_output(), "");
    }

    // -----------------------------------------------------------------------
    // 2. Compile failure: empty trace, error text as sole output
    // -----------------------------------------------------------------------

    #[test]
    fn parse_failure_is_folded_into_fallback_output() {
        let t = run("x = = 1", &["x"]);
        assert!(t.is_empty());
        assert!(t.fallback_output().starts_with("error:"));
    }

    // -----------------------------------------------------------------------
    // 3. Runtime failure: partial trace, error appended to the failing line
    // -----------------------------------------------------------------------

    #[test]
    fn division_by_zero_keeps_partial_trace() {
        let t = run("x = 1\ny = x / 0\nz = 3", &["x", "y", "z"]);
        assert_eq!(t.len(), 2);

        let last = t.get(1).unwrap();
        assert_eq!(last.line, 1);
        assert!(last.output.contains("division by zero"));
        // x survived, y and z never bound.
        assert!(last.bindings.contains_key("x"));
        assert!(!last.bindings.contains_key("y"));
        assert!(!last.bindings.contains_key("z"));
        assert_prefix_chain(&t);
    }

    #[test]
    fn undefined_name_is_reported() {
        let t = run("x = missing + 1", &["x"]);
        assert_eq!(t.len(), 1);
        assert!(t.get(0).unwrap().output.contains("'missing' is not defined"));
    }

    // -----------------------------------------------------------------------
    // 4. Iterators: materialized in snapshots, undisturbed in execution
    // -----------------------------------------------------------------------

    #[test]
    fn iterator_snapshots_are_materialized_copies() {
        let t = run(
            "it = iter([1,2,3])\nfirst = next(it)\nrest = list(it)",
            &["it", "first", "rest"],
        );
        assert_eq!(t.len(), 3);

        // Right after creation the iterator shows all three items.
        assert_eq!(rendered(&t, 0, "it"), "<list_iterator [1, 2, 3]>");
        assert_eq!(
            t.get(0).unwrap().types.get("it").map(String::as_str),
            Some("list_iterator (iter)")
        );

        // Snapshot inspection did not consume anything: next() still gets 1.
        assert_eq!(rendered(&t, 1, "first"), "1");
        assert_eq!(rendered(&t, 1, "it"), "<list_iterator [2, 3]>");

        // list() drains the remainder.
        assert_eq!(rendered(&t, 2, "rest"), "[2, 3]");
        assert_eq!(rendered(&t, 2, "it"), "<list_iterator []>");
    }

    #[test]
    fn zip_and_tuple_unpacking() {
        let t = run(
            "names = ['a', 'b']\nnums = [1, 2]\npairs = zip(names, nums)\nfor n, v in pairs:\n    print(n, v)",
            &["names", "nums", "pairs"],
        );
        assert_eq!(rendered(&t, 2, "pairs"), "<zip [('a', 1), ('b', 2)]>");
        let last = t.entries().last().unwrap();
        assert_eq!(last.output, "a 1\nb 2\n");
        // The loop drained the shared zip object.
        assert_eq!(rendered(&t, t.len() - 1, "pairs"), "<zip []>");
        assert_prefix_chain(&t);
    }

    // -----------------------------------------------------------------------
    // 5. Control flow: loop headers fire per iteration, skipped lines absent
    // -----------------------------------------------------------------------

    #[test]
    fn for_loop_entry_counts() {
        let t = run("for y in range(3):\n    z = y", &["y", "z"]);
        // Header: 3 iterations + exhaustion check; body: 3 executions.
        assert_eq!(t.len(), 7);
        let lines: Vec<usize> = t.entries().iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(rendered(&t, 0, "y"), "0");
        assert_eq!(rendered(&t, 2, "y"), "1");
        // The final exhaustion check still shows the last binding.
        assert_eq!(rendered(&t, 6, "y"), "2");
        assert_eq!(rendered(&t, 6, "z"), "2");
    }

    #[test]
    fn branch_not_taken_is_absent() {
        let script = "x = 5\nif x > 10:\n    y = 1\nelif x > 3:\n    y = 2\nelse:\n    y = 3\nprint(y)";
        let t = run(script, &["x", "y"]);
        let lines: Vec<usize> = t.entries().iter().map(|s| s.line).collect();
        // if header, elif header, taken body, print; lines 2, 5, 6 never run.
        assert_eq!(lines, vec![0, 1, 3, 4, 7]);
        assert_eq!(rendered(&t, 3, "y"), "2");
        assert_eq!(t.entries().last().unwrap().output, "2\n");
    }

    #[test]
    fn while_loop_with_break() {
        let script = "n = 0\nwhile True:\n    n += 1\n    if n == 3:\n        break";
        let t = run(script, &["n"]);
        assert_eq!(rendered(&t, t.len() - 1, "n"), "3");
        // The break line itself is recorded.
        assert!(t.entries().iter().any(|s| s.line == 4));
        assert_prefix_chain(&t);
    }

    #[test]
    fn continue_skips_rest_of_body() {
        let script = "total = 0\nfor i in range(4):\n    if i % 2 == 0:\n        continue\n    total += i";
        let t = run(script, &["total", "i"]);
        assert_eq!(rendered(&t, t.len() - 1, "total"), "4");
    }

    // -----------------------------------------------------------------------
    // 6. Functions: local scope labels, recursion, limits
    // -----------------------------------------------------------------------

    #[test]
    fn function_locals_are_labeled() {
        let script = "def double(x):\n    return x * 2\ny = double(5)";
        let t = run(script, &["x", "y"]);
        // def line, return line (inside the call), assignment line.
        let lines: Vec<usize> = t.entries().iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![0, 1, 2]);

        let inside = t.get(1).unwrap();
        assert_eq!(rendered(&t, 1, "x"), "5");
        assert_eq!(
            inside.scopes.get("x"),
            Some(&ScopeLabel::Local { context: "double".into() })
        );
        // After the call, x is gone and y is global.
        let after = t.get(2).unwrap();
        assert!(!after.bindings.contains_key("x"));
        assert_eq!(after.scopes.get("y"), Some(&ScopeLabel::Global));
    }

    #[test]
    fn local_binding_shadows_global() {
        let script = "x = 1\ndef f(x):\n    return x + 10\ny = f(5)";
        let t = run(script, &["x", "y"]);
        // Inside the call the parameter wins over the global.
        let inside = t.get(2).unwrap();
        assert_eq!(inside.line, 2);
        assert_eq!(rendered(&t, 2, "x"), "5");
        assert!(matches!(
            inside.scopes.get("x"),
            Some(ScopeLabel::Local { .. })
        ));
        // Back at top level the global shows again.
        assert_eq!(rendered(&t, 3, "x"), "1");
    }

    #[test]
    fn recursion_works_within_limit() {
        let script = "def fact(n):\n    if n <= 1:\n        return 1\n    return n * fact(n - 1)\nr = fact(5)";
        let t = run(script, &["r"]);
        assert_eq!(rendered(&t, t.len() - 1, "r"), "120");
    }

    #[test]
    fn recursion_limit_is_enforced() {
        let script = "def loop(n):\n    return loop(n + 1)\nr = loop(0)";
        let t = run(script, &["r"]);
        let last = t.entries().last().unwrap();
        assert!(last.output.contains("recursion depth limit"));
    }

    // -----------------------------------------------------------------------
    // 7. Budget enforcement
    // -----------------------------------------------------------------------

    #[test]
    fn statement_budget_converts_hang_into_failure() {
        let config = TracerConfig { max_statements: 25, ..TracerConfig::default() };
        let tracked = vec!["n".to_string()];
        let t = trace("n = 0\nwhile True:\n    n += 1", &tracked, &config);
        // 25 recorded events plus the failure snapshot.
        assert_eq!(t.len(), 26);
        let last = t.entries().last().unwrap();
        assert!(last.output.contains("execution budget"));
        assert_prefix_chain(&t);
    }

    // -----------------------------------------------------------------------
    // 8. Snapshot immutability under later mutation
    // -----------------------------------------------------------------------

    #[test]
    fn earlier_snapshots_survive_in_place_mutation() {
        let t = run("xs = [1, 2]\nxs[0] = 99", &["xs"]);
        assert_eq!(rendered(&t, 0, "xs"), "[1, 2]");
        assert_eq!(rendered(&t, 1, "xs"), "[99, 2]");
    }

    #[test]
    fn dict_snapshots_are_copies_too() {
        let t = run("d = {'a': 1}\nd['b'] = 2", &["d"]);
        assert_eq!(rendered(&t, 0, "d"), "{'a': 1}");
        assert_eq!(rendered(&t, 1, "d"), "{'a': 1, 'b': 2}");
    }

    // -----------------------------------------------------------------------
    // 9. Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn identical_runs_yield_identical_traces() {
        let script = "x = 1\nfor i in range(3):\n    x = x * 2\nprint(x)";
        let tracked = vec!["x".to_string(), "i".to_string()];
        let config = TracerConfig::default();
        let first = trace(script, &tracked, &config);
        let second = trace(script, &tracked, &config);
        assert_eq!(first, second);
    }

    // -----------------------------------------------------------------------
    // 10. Assorted semantics carried by the trace
    // -----------------------------------------------------------------------

    #[test]
    fn augmented_assignment_updates_binding() {
        let t = run("x = 1\nx += 2\nx *= 3", &["x"]);
        assert_eq!(rendered(&t, 2, "x"), "9");
    }

    #[test]
    fn untracked_names_never_appear() {
        let t = run("x = 1\nsecret = 2", &["x"]);
        for snapshot in t.entries() {
            assert!(!snapshot.bindings.contains_key("secret"));
        }
    }

    #[test]
    fn tracked_order_is_preserved_in_bindings() {
        let t = run("b = 1\na = 2", &["a", "b"]);
        let last = t.get(1).unwrap();
        let names: Vec<&String> = last.bindings.keys().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn range_values_display_like_the_source() {
        let t = run("r = range(3)", &["r"]);
        assert_eq!(
            t.get(0).unwrap().bindings.get("r"),
            Some(&DisplayValue::Scalar("range(3)".into()))
        );
    }

    #[test]
    fn print_with_multiple_values() {
        let t = run("x = 1.5\nprint('x is', x)", &["x"]);
        assert_eq!(t.entries().last().unwrap().output, "x is 1.5\n");
    }
}
