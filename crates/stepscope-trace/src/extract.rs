//! Static extraction of the identifiers worth watching.
//!
//! Used only when the caller supplies no explicit variable list. Collects
//! simple-name assignment targets, augmented-assignment targets, `for` loop
//! variables (simple names only -- destructuring targets are deliberately
//! skipped, never an error), and function parameter names. A script that
//! fails to parse yields the empty set: extraction must never block the
//! rest of the pipeline.

use std::collections::BTreeSet;

use stepscope_core::ast::{Stmt, StmtKind, Target};
use stepscope_core::parser::parse;

/// Returns the set of names a learner would plausibly want to watch.
///
/// Order is insignificant (the set is sorted only as a side effect of its
/// representation); callers sort before display.
pub fn tracked_names(script: &str) -> BTreeSet<String> {
    let program = match parse(script) {
        Ok(program) => program,
        Err(err) => {
            tracing::debug!(%err, "extraction skipped: script failed to parse");
            return BTreeSet::new();
        }
    };
    let mut names = BTreeSet::new();
    collect_block(&program.body, &mut names);
    names
}

fn collect_block(body: &[Stmt], names: &mut BTreeSet<String>) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::Assign { target, .. } => collect_target(target, names),
            StmtKind::AugAssign { name, .. } => {
                names.insert(name.clone());
            }
            StmtKind::For { target, body, .. } => {
                collect_target(target, names);
                collect_block(body, names);
            }
            StmtKind::While { body, .. } => collect_block(body, names),
            StmtKind::If { branches, orelse } => {
                for branch in branches {
                    collect_block(&branch.body, names);
                }
                collect_block(orelse, names);
            }
            StmtKind::FuncDef { params, body, .. } => {
                names.extend(params.iter().cloned());
                collect_block(body, names);
            }
            StmtKind::Expr { .. }
            | StmtKind::Return { .. }
            | StmtKind::Pass
            | StmtKind::Break
            | StmtKind::Continue => {}
        }
    }
}

/// Only simple names are collected; tuple and subscript targets are skipped.
fn collect_target(target: &Target, names: &mut BTreeSet<String>) {
    if let Target::Name(name) = target {
        names.insert(name.clone());
    }
}
