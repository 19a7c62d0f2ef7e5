//! The execution tracer: runs a script once, recording snapshots.
//!
//! [`trace`] parses and executes the whole script eagerly inside one call --
//! stepping later never resumes real execution, it replays the recorded
//! trace. Execution happens in a fresh namespace per run; nothing leaks
//! between runs and nothing global is touched (output goes to an internal
//! sink, not process stdout).
//!
//! One snapshot is recorded per execution of each non-blank source line,
//! after that line's own work completes. Loop headers record once per
//! iteration plus once for the final exhaustion check, so the trace length
//! equals the number of executed-line events; lines skipped by control flow
//! never appear.
//!
//! Failures never escape. A parse failure yields an empty trace whose
//! fallback output is the error text. A runtime failure (including budget
//! exhaustion) keeps every snapshot up to the failing line, appends the
//! error message to a final snapshot for that line, and finishes the run.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use stepscope_core::ast::{BoolOp, Expr, Stmt, StmtKind, Target, UnaryOp};
use stepscope_core::parser::parse;

use super::display::{DisplayValue, ScopeLabel};
use super::error::RuntimeError;
use super::eval;
use super::trace::{Snapshot, Trace};
use super::value::{Builtin, FunctionObject, IterObject, Value};

/// Budgets enforced during trace construction, so a runaway script becomes
/// a runtime failure instead of a hang.
#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Maximum executed-statement events in one run.
    pub max_statements: usize,
    /// Maximum function call nesting.
    pub max_call_depth: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            max_statements: 10_000,
            max_call_depth: 64,
        }
    }
}

/// Executes `script` once and returns its trace.
///
/// `tracked` is the ordered list of names to capture per snapshot; the
/// caller (normally the player) sorts it. This function never fails -- see
/// the module docs for how errors are folded into the trace.
pub fn trace(script: &str, tracked: &[String], config: &TracerConfig) -> Trace {
    let _span = tracing::debug_span!("trace_run", tracked = tracked.len()).entered();
    let program = match parse(script) {
        Ok(program) => program,
        Err(err) => {
            tracing::debug!(%err, "script failed to parse");
            return Trace::failed_compile(format!("error: {err}\n"));
        }
    };
    let mut tracer = Tracer::new(tracked, config);
    tracer.run(&program.body);
    tracer.finish()
}

/// One function invocation's local namespace.
struct Frame {
    function: String,
    locals: IndexMap<String, Value>,
}

/// How a statement finished.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

struct Tracer<'a> {
    tracked: &'a [String],
    config: &'a TracerConfig,
    globals: IndexMap<String, Value>,
    frames: Vec<Frame>,
    output: String,
    entries: Vec<Snapshot>,
    executed: usize,
}

impl<'a> Tracer<'a> {
    fn new(tracked: &'a [String], config: &'a TracerConfig) -> Self {
        Tracer {
            tracked,
            config,
            globals: IndexMap::new(),
            frames: Vec::new(),
            output: String::new(),
            entries: Vec::new(),
            executed: 0,
        }
    }

    fn run(&mut self, body: &[Stmt]) {
        match self.exec_block(body) {
            Ok(_) => {
                tracing::debug!(steps = self.executed, "trace complete");
            }
            Err(err) => {
                tracing::debug!(%err, "trace aborted");
                self.output.push_str(&format!("error: {err}\n"));
                // The failing line gets a final snapshot carrying the error.
                self.push_snapshot(err.line());
            }
        }
    }

    fn finish(self) -> Trace {
        Trace::new(self.entries)
    }

    // -- statement execution ------------------------------------------------

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        let line = stmt.line;
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let value = self.eval(value, line)?;
                self.assign(target, value, line)?;
                self.record(line)?;
                Ok(Flow::Normal)
            }
            StmtKind::AugAssign { name, op, value } => {
                let current = self.lookup(name, line)?;
                let rhs = self.eval(value, line)?;
                let updated = eval::binary(*op, &current, &rhs, line)?;
                self.scope_mut().insert(name.clone(), updated);
                self.record(line)?;
                Ok(Flow::Normal)
            }
            StmtKind::Expr { value } => {
                self.eval(value, line)?;
                self.record(line)?;
                Ok(Flow::Normal)
            }
            StmtKind::Return { value } => {
                let result = match value {
                    Some(expr) => self.eval(expr, line)?,
                    None => Value::None,
                };
                // Recorded while the frame is still alive, so the snapshot
                // sees the function's locals.
                self.record(line)?;
                Ok(Flow::Return(result))
            }
            StmtKind::Pass => {
                self.record(line)?;
                Ok(Flow::Normal)
            }
            StmtKind::Break => {
                self.record(line)?;
                Ok(Flow::Break)
            }
            StmtKind::Continue => {
                self.record(line)?;
                Ok(Flow::Continue)
            }
            StmtKind::If { branches, orelse } => {
                for branch in branches {
                    let cond = self.eval(&branch.cond, branch.line)?;
                    self.record(branch.line)?;
                    if cond.truthy() {
                        return self.exec_block(&branch.body);
                    }
                }
                // The `else:` line itself never executes as a statement.
                self.exec_block(orelse)
            }
            StmtKind::While { cond, body } => {
                loop {
                    let value = self.eval(cond, line)?;
                    self.record(line)?;
                    if !value.truthy() {
                        break;
                    }
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For { target, iter, body } => {
                let iterable = self.eval(iter, line)?;
                let mut loop_iter = LoopIter::new(&iterable, line)?;
                loop {
                    match loop_iter.next() {
                        Some(item) => {
                            self.assign(target, item, line)?;
                            self.record(line)?;
                            match self.exec_block(body)? {
                                Flow::Break => break,
                                Flow::Return(v) => return Ok(Flow::Return(v)),
                                Flow::Normal | Flow::Continue => {}
                            }
                        }
                        None => {
                            // Exhaustion check: the header runs once more.
                            self.record(line)?;
                            break;
                        }
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::FuncDef { name, params, body } => {
                let function = Value::Function(Rc::new(FunctionObject {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                }));
                self.scope_mut().insert(name.clone(), function);
                self.record(line)?;
                Ok(Flow::Normal)
            }
        }
    }

    // -- expression evaluation ----------------------------------------------

    fn eval(&mut self, expr: &Expr, line: usize) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(v) => Ok(Value::Int(*v)),
            Expr::Float(v) => Ok(Value::Float(*v)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Name(name) => self.lookup(name, line),
            Expr::List(items) => {
                let values = self.eval_all(items, line)?;
                Ok(Value::List(Rc::new(RefCell::new(values))))
            }
            Expr::Tuple(items) => {
                let values = self.eval_all(items, line)?;
                Ok(Value::Tuple(Rc::new(values)))
            }
            Expr::Dict(pairs) => {
                let mut map = IndexMap::new();
                for (key_expr, value_expr) in pairs {
                    let key = self.eval(key_expr, line)?;
                    let value = self.eval(value_expr, line)?;
                    map.insert(eval::dict_key(&key, line)?, value);
                }
                Ok(Value::Dict(Rc::new(RefCell::new(map))))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, line)?;
                match op {
                    UnaryOp::Neg => eval::neg(&value, line),
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs, line)?;
                let rhs = self.eval(rhs, line)?;
                eval::binary(*op, &lhs, &rhs, line)
            }
            Expr::Compare { op, lhs, rhs } => {
                let lhs = self.eval(lhs, line)?;
                let rhs = self.eval(rhs, line)?;
                eval::compare(*op, &lhs, &rhs, line)
            }
            Expr::BoolOp { op, lhs, rhs } => {
                // Short-circuit, returning the deciding operand itself.
                let lhs = self.eval(lhs, line)?;
                let take_rhs = match op {
                    BoolOp::And => lhs.truthy(),
                    BoolOp::Or => !lhs.truthy(),
                };
                if take_rhs {
                    self.eval(rhs, line)
                } else {
                    Ok(lhs)
                }
            }
            Expr::Call { func, args } => {
                let callee = self.eval(func, line)?;
                let argv = self.eval_all(args, line)?;
                match callee {
                    Value::Function(function) => self.call_function(&function, argv, line),
                    Value::Builtin(builtin) => {
                        eval::call_builtin(builtin, argv, line, &mut self.output)
                    }
                    other => Err(RuntimeError::NotCallable {
                        type_name: other.type_name(),
                        line,
                    }),
                }
            }
            Expr::Subscript { value, index } => {
                let container = self.eval(value, line)?;
                let index = self.eval(index, line)?;
                eval::subscript_get(&container, &index, line)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], line: usize) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|e| self.eval(e, line)).collect()
    }

    fn call_function(
        &mut self,
        function: &FunctionObject,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        if self.frames.len() >= self.config.max_call_depth {
            return Err(RuntimeError::RecursionLimitExceeded {
                limit: self.config.max_call_depth,
                line,
            });
        }
        if args.len() != function.params.len() {
            return Err(RuntimeError::WrongArity {
                name: function.name.clone(),
                expected: function.params.len(),
                got: args.len(),
                line,
            });
        }
        let locals: IndexMap<String, Value> =
            function.params.iter().cloned().zip(args).collect();
        self.frames.push(Frame {
            function: function.name.clone(),
            locals,
        });
        // On error the frame is left in place so the failure snapshot still
        // sees the function's locals.
        let flow = self.exec_block(&function.body)?;
        self.frames.pop();
        Ok(match flow {
            Flow::Return(value) => value,
            _ => Value::None,
        })
    }

    // -- namespaces ---------------------------------------------------------

    /// Reads a name: innermost frame, then globals, then built-ins.
    fn lookup(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.locals.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        if let Some(builtin) = Builtin::by_name(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(RuntimeError::NameNotDefined {
            name: name.to_string(),
            line,
        })
    }

    /// The namespace assignments write into.
    fn scope_mut(&mut self) -> &mut IndexMap<String, Value> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.locals,
            None => &mut self.globals,
        }
    }

    fn assign(&mut self, target: &Target, value: Value, line: usize) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                self.scope_mut().insert(name.clone(), value);
                Ok(())
            }
            Target::Tuple(targets) => {
                let items = eval::iter_items(&value, line)?;
                if items.len() != targets.len() {
                    return Err(RuntimeError::CannotUnpack {
                        expected: targets.len(),
                        got: items.len(),
                        line,
                    });
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item, line)?;
                }
                Ok(())
            }
            Target::Subscript { value: container, index } => {
                let container = self.eval(container, line)?;
                let index = self.eval(index, line)?;
                eval::subscript_set(&container, &index, value, line)
            }
        }
    }

    // -- snapshot recording -------------------------------------------------

    /// Records an executed-line event, enforcing the statement budget.
    fn record(&mut self, line: usize) -> Result<(), RuntimeError> {
        self.executed += 1;
        if self.executed > self.config.max_statements {
            return Err(RuntimeError::BudgetExceeded {
                limit: self.config.max_statements,
                line,
            });
        }
        self.push_snapshot(line);
        Ok(())
    }

    /// Captures the currently-bound tracked names into a snapshot.
    fn push_snapshot(&mut self, line: usize) {
        let tracked = self.tracked;
        let mut bindings = IndexMap::new();
        let mut scopes = IndexMap::new();
        let mut types = IndexMap::new();
        for name in tracked {
            let found = match self.frames.last() {
                Some(frame) => frame.locals.get(name).map(|value| {
                    (value, ScopeLabel::Local { context: frame.function.clone() })
                }),
                None => None,
            };
            let found = found.or_else(|| {
                self.globals.get(name).map(|value| (value, ScopeLabel::Global))
            });
            if let Some((value, scope)) = found {
                bindings.insert(name.clone(), DisplayValue::of(value));
                types.insert(name.clone(), value.type_display());
                scopes.insert(name.clone(), scope);
            }
        }
        self.entries.push(Snapshot {
            line,
            bindings,
            scopes,
            types,
            output: self.output.clone(),
        });
    }
}

/// Iteration source for a `for` loop.
///
/// Reusable containers are buffered at loop entry; ranges stay lazy; an
/// exhaustible iterator value is shared, so the loop drains the same object
/// the script holds -- exactly like the language it models.
enum LoopIter {
    Buffered(std::vec::IntoIter<Value>),
    Range { cur: i64, stop: i64, step: i64 },
    Shared(Rc<RefCell<IterObject>>),
}

impl LoopIter {
    fn new(iterable: &Value, line: usize) -> Result<Self, RuntimeError> {
        match iterable {
            Value::Range { start, stop, step } => Ok(LoopIter::Range {
                cur: *start,
                stop: *stop,
                step: *step,
            }),
            Value::Iter(obj) => Ok(LoopIter::Shared(obj.clone())),
            other => Ok(LoopIter::Buffered(eval::iter_items(other, line)?.into_iter())),
        }
    }

    fn next(&mut self) -> Option<Value> {
        match self {
            LoopIter::Buffered(iter) => iter.next(),
            LoopIter::Range { cur, stop, step } => {
                let exhausted = if *step > 0 { *cur >= *stop } else { *cur <= *stop };
                if exhausted {
                    None
                } else {
                    let value = *cur;
                    *cur = cur.saturating_add(*step);
                    Some(Value::Int(value))
                }
            }
            LoopIter::Shared(obj) => obj.borrow_mut().items.pop_front(),
        }
    }
}
