//! Per-op evaluation logic: operators, subscripts, iteration, built-ins.
//!
//! Control flow, name resolution, and user function calls are handled by the
//! tracer in `state.rs`; this module evaluates value-producing operations
//! with checked arithmetic and trap semantics. Every failure carries the
//! source line of the statement being executed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use stepscope_core::ast::{BinOp, CmpOp};

use super::error::RuntimeError;
use super::value::{as_number, range_len, value_eq, Builtin, DictKey, IterObject, Value};

/// Upper bound on elements produced when a lazy sequence is materialized
/// (`iter(range(...))`, `list(...)`, repetition). Keeps one trace run inside
/// a sane memory budget.
pub(crate) const MAX_MATERIALIZE: usize = 100_000;

/// Evaluates a binary arithmetic operator.
pub fn binary(op: BinOp, lhs: &Value, rhs: &Value, line: usize) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => add(lhs, rhs, line),
        BinOp::Mul => mul(lhs, rhs, line),
        BinOp::Sub | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => arith(op, lhs, rhs, line),
    }
}

fn add(lhs: &Value, rhs: &Value, line: usize) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::List(Rc::new(RefCell::new(items))))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::Tuple(Rc::new(items)))
        }
        _ => arith(BinOp::Add, lhs, rhs, line),
    }
}

fn mul(lhs: &Value, rhs: &Value, line: usize) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat(checked_repeat(s.chars().count(), *n, line)?)))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let items = items.borrow();
            let count = checked_repeat(items.len(), *n, line)?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(Rc::new(RefCell::new(out))))
        }
        _ => arith(BinOp::Mul, lhs, rhs, line),
    }
}

/// Validates a sequence repetition count; negative counts yield zero.
fn checked_repeat(len: usize, n: i64, line: usize) -> Result<usize, RuntimeError> {
    let count = n.max(0) as usize;
    let total = len.saturating_mul(count);
    if total > MAX_MATERIALIZE {
        return Err(RuntimeError::TooLarge { len: total, line });
    }
    Ok(count)
}

fn arith(op: BinOp, lhs: &Value, rhs: &Value, line: usize) -> Result<Value, RuntimeError> {
    if let (Some(a), Some(b)) = (int_of(lhs), int_of(rhs)) {
        return int_arith(op, a, b, line);
    }
    match (as_number(lhs), as_number(rhs)) {
        (Some(a), Some(b)) => float_arith(op, a, b, line),
        _ => Err(unsupported(op.symbol(), lhs, rhs, line)),
    }
}

fn int_arith(op: BinOp, a: i64, b: i64, line: usize) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::IntegerOverflow { line };
    match op {
        BinOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
        BinOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
        BinOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
        // True division always yields a float.
        BinOp::Div => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero { line })
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinOp::FloorDiv => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero { line })
            } else if a == i64::MIN && b == -1 {
                Err(overflow())
            } else {
                Ok(Value::Int(floor_div(a, b)))
            }
        }
        BinOp::Mod => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero { line })
            } else if a == i64::MIN && b == -1 {
                Err(overflow())
            } else {
                // Result takes the sign of the divisor.
                Ok(Value::Int(((a % b) + b) % b))
            }
        }
    }
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn float_arith(op: BinOp, a: f64, b: f64, line: usize) -> Result<Value, RuntimeError> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero { line });
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero { line });
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero { line });
            }
            a - b * (a / b).floor()
        }
    };
    Ok(Value::Float(value))
}

/// Evaluates unary negation.
pub fn neg(value: &Value, line: usize) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(v) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or(RuntimeError::IntegerOverflow { line }),
        Value::Float(v) => Ok(Value::Float(-v)),
        Value::Bool(b) => Ok(Value::Int(if *b { -1 } else { 0 })),
        other => Err(RuntimeError::UnsupportedUnary {
            op: "-",
            operand: other.type_name(),
            line,
        }),
    }
}

/// Evaluates a comparison, producing a bool value.
pub fn compare(op: CmpOp, lhs: &Value, rhs: &Value, line: usize) -> Result<Value, RuntimeError> {
    let result = match op {
        CmpOp::Eq => value_eq(lhs, rhs),
        CmpOp::Ne => !value_eq(lhs, rhs),
        CmpOp::Lt => ordering(lhs, rhs, line, op)?.is_lt(),
        CmpOp::Le => ordering(lhs, rhs, line, op)?.is_le(),
        CmpOp::Gt => ordering(lhs, rhs, line, op)?.is_gt(),
        CmpOp::Ge => ordering(lhs, rhs, line, op)?.is_ge(),
    };
    Ok(Value::Bool(result))
}

fn ordering(
    lhs: &Value,
    rhs: &Value,
    line: usize,
    op: CmpOp,
) -> Result<std::cmp::Ordering, RuntimeError> {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        return a
            .partial_cmp(&b)
            .ok_or(RuntimeError::UnsupportedOp {
                op: op.symbol(),
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
                line,
            });
    }
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    Err(RuntimeError::UnsupportedOp {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
        line,
    })
}

fn unsupported(op: &'static str, lhs: &Value, rhs: &Value, line: usize) -> RuntimeError {
    RuntimeError::UnsupportedOp {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
        line,
    }
}

// ---------------------------------------------------------------------------
// Subscripts
// ---------------------------------------------------------------------------

/// `container[index]`.
pub fn subscript_get(value: &Value, index: &Value, line: usize) -> Result<Value, RuntimeError> {
    match value {
        Value::List(items) => {
            let items = items.borrow();
            let at = normalize_index(index, items.len(), "list", line)?;
            Ok(items[at].clone())
        }
        Value::Tuple(items) => {
            let at = normalize_index(index, items.len(), "tuple", line)?;
            Ok(items[at].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let at = normalize_index(index, chars.len(), "string", line)?;
            Ok(Value::Str(chars[at].to_string()))
        }
        Value::Dict(map) => {
            let key = dict_key(index, line)?;
            map.borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| RuntimeError::KeyNotFound { key: key.repr(), line })
        }
        other => Err(RuntimeError::NotSubscriptable {
            type_name: other.type_name(),
            line,
        }),
    }
}

/// `container[index] = value`.
pub fn subscript_set(
    container: &Value,
    index: &Value,
    value: Value,
    line: usize,
) -> Result<(), RuntimeError> {
    match container {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let at = normalize_index(index, items.len(), "list", line)?;
            items[at] = value;
            Ok(())
        }
        Value::Dict(map) => {
            let key = dict_key(index, line)?;
            map.borrow_mut().insert(key, value);
            Ok(())
        }
        Value::Tuple(_) | Value::Str(_) => Err(RuntimeError::NoItemAssignment {
            type_name: container.type_name(),
            line,
        }),
        other => Err(RuntimeError::NotSubscriptable {
            type_name: other.type_name(),
            line,
        }),
    }
}

/// Resolves an index value against a length, accepting negative indices.
fn normalize_index(
    index: &Value,
    len: usize,
    container: &'static str,
    line: usize,
) -> Result<usize, RuntimeError> {
    let raw = int_of(index).ok_or_else(|| RuntimeError::BadArgument {
        message: format!("{container} indices must be integers"),
        line,
    })?;
    let adjusted = if raw < 0 { raw + len as i64 } else { raw };
    if adjusted < 0 || adjusted as usize >= len {
        return Err(RuntimeError::IndexOutOfBounds { index: raw, len, line });
    }
    Ok(adjusted as usize)
}

/// Converts a value into a dict key.
pub fn dict_key(value: &Value, line: usize) -> Result<DictKey, RuntimeError> {
    match value {
        Value::Int(v) => Ok(DictKey::Int(*v)),
        Value::Bool(b) => Ok(DictKey::Bool(*b)),
        Value::Str(s) => Ok(DictKey::Str(s.clone())),
        other => Err(RuntimeError::BadKey {
            type_name: other.type_name(),
            line,
        }),
    }
}

/// Integer view of a value (bool coerces); floats do not index.
fn int_of(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Bool(b) => Some(if *b { 1 } else { 0 }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

/// Materializes the elements of an iterable.
///
/// Reusable containers are copied; an exhaustible iterator is drained, which
/// is exactly what the script's own `list(it)`/`sum(it)` would do.
pub fn iter_items(value: &Value, line: usize) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Tuple(items) => Ok(items.as_ref().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(map) => Ok(map.borrow().keys().map(DictKey::to_value).collect()),
        Value::Range { start, stop, step } => {
            let len = range_len(*start, *stop, *step);
            if len > MAX_MATERIALIZE {
                return Err(RuntimeError::TooLarge { len, line });
            }
            let mut out = Vec::with_capacity(len);
            let mut cur = *start;
            for _ in 0..len {
                out.push(Value::Int(cur));
                cur = cur.saturating_add(*step);
            }
            Ok(out)
        }
        Value::Iter(obj) => Ok(obj.borrow_mut().items.drain(..).collect()),
        other => Err(RuntimeError::NotIterable {
            type_name: other.type_name(),
            line,
        }),
    }
}

fn make_iter(type_name: &'static str, items: Vec<Value>) -> Value {
    Value::Iter(Rc::new(RefCell::new(IterObject {
        type_name,
        items: VecDeque::from(items),
    })))
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

/// Calls a built-in function. `out` is the run's captured output sink.
pub fn call_builtin(
    builtin: Builtin,
    args: Vec<Value>,
    line: usize,
    out: &mut String,
) -> Result<Value, RuntimeError> {
    match builtin {
        Builtin::Print => {
            let rendered: Vec<String> = args.iter().map(Value::str_value).collect();
            out.push_str(&rendered.join(" "));
            out.push('\n');
            Ok(Value::None)
        }
        Builtin::Range => {
            if args.is_empty() || args.len() > 3 {
                return Err(arity(builtin, "1 to 3", args.len(), line));
            }
            let ints: Vec<i64> = args
                .iter()
                .map(|a| {
                    int_of(a).ok_or_else(|| RuntimeError::BadArgument {
                        message: format!(
                            "range() arguments must be integers, not '{}'",
                            a.type_name()
                        ),
                        line,
                    })
                })
                .collect::<Result<_, _>>()?;
            let (start, stop, step) = match ints.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => unreachable!("length checked above"),
            };
            if step == 0 {
                return Err(RuntimeError::BadArgument {
                    message: "range() arg 3 must not be zero".into(),
                    line,
                });
            }
            Ok(Value::Range { start, stop, step })
        }
        Builtin::Len => {
            let [arg] = one(builtin, &args, line)?;
            let len = match arg {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.borrow().len(),
                Value::Tuple(items) => items.len(),
                Value::Dict(map) => map.borrow().len(),
                Value::Range { start, stop, step } => range_len(*start, *stop, *step),
                other => {
                    return Err(RuntimeError::BadArgument {
                        message: format!("object of type '{}' has no len()", other.type_name()),
                        line,
                    })
                }
            };
            Ok(Value::Int(len as i64))
        }
        Builtin::Sum => {
            let [arg] = one(builtin, &args, line)?;
            let mut acc = Value::Int(0);
            for item in iter_items(arg, line)? {
                acc = add(&acc, &item, line)?;
            }
            Ok(acc)
        }
        Builtin::Min | Builtin::Max => {
            let items = if args.len() == 1 {
                iter_items(&args[0], line)?
            } else if args.len() > 1 {
                args
            } else {
                return Err(arity(builtin, "at least 1", 0, line));
            };
            let mut iter = items.into_iter();
            let mut best = iter.next().ok_or_else(|| RuntimeError::BadArgument {
                message: format!("{}() arg is an empty sequence", builtin.name()),
                line,
            })?;
            for item in iter {
                let replace = match builtin {
                    Builtin::Min => ordering(&item, &best, line, CmpOp::Lt)?.is_lt(),
                    _ => ordering(&item, &best, line, CmpOp::Gt)?.is_gt(),
                };
                if replace {
                    best = item;
                }
            }
            Ok(best)
        }
        Builtin::Abs => {
            let [arg] = one(builtin, &args, line)?;
            match arg {
                Value::Int(v) => v
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or(RuntimeError::IntegerOverflow { line }),
                Value::Float(v) => Ok(Value::Float(v.abs())),
                Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
                other => Err(RuntimeError::BadArgument {
                    message: format!("bad operand type for abs(): '{}'", other.type_name()),
                    line,
                }),
            }
        }
        Builtin::Str => match args.as_slice() {
            [] => Ok(Value::Str(String::new())),
            [arg] => Ok(Value::Str(arg.str_value())),
            _ => Err(arity(builtin, "at most 1", args.len(), line)),
        },
        Builtin::Int => {
            let [arg] = one(builtin, &args, line)?;
            match arg {
                Value::Int(v) => Ok(Value::Int(*v)),
                Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
                Value::Float(v) => Ok(Value::Int(v.trunc() as i64)),
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    RuntimeError::BadArgument {
                        message: format!("invalid literal for int(): {}", Value::Str(s.clone()).repr()),
                        line,
                    }
                }),
                other => Err(RuntimeError::BadArgument {
                    message: format!("int() argument must be a number or string, not '{}'", other.type_name()),
                    line,
                }),
            }
        }
        Builtin::Iter => {
            let [arg] = one(builtin, &args, line)?;
            match arg {
                // iter(it) is it, same underlying object.
                Value::Iter(obj) => Ok(Value::Iter(obj.clone())),
                Value::List(_) => Ok(make_iter("list_iterator", iter_items(arg, line)?)),
                Value::Tuple(_) => Ok(make_iter("tuple_iterator", iter_items(arg, line)?)),
                Value::Str(_) => Ok(make_iter("str_iterator", iter_items(arg, line)?)),
                Value::Dict(_) => Ok(make_iter("dict_keyiterator", iter_items(arg, line)?)),
                Value::Range { .. } => Ok(make_iter("range_iterator", iter_items(arg, line)?)),
                other => Err(RuntimeError::NotIterable {
                    type_name: other.type_name(),
                    line,
                }),
            }
        }
        Builtin::Next => {
            let [arg] = one(builtin, &args, line)?;
            match arg {
                Value::Iter(obj) => obj
                    .borrow_mut()
                    .items
                    .pop_front()
                    .ok_or(RuntimeError::IteratorExhausted { line }),
                other => Err(RuntimeError::BadArgument {
                    message: format!("'{}' object is not an iterator", other.type_name()),
                    line,
                }),
            }
        }
        Builtin::List => match args.as_slice() {
            [] => Ok(Value::List(Rc::new(RefCell::new(Vec::new())))),
            [arg] => Ok(Value::List(Rc::new(RefCell::new(iter_items(arg, line)?)))),
            _ => Err(arity(builtin, "at most 1", args.len(), line)),
        },
        Builtin::Enumerate => {
            let [arg] = one(builtin, &args, line)?;
            let pairs: Vec<Value> = iter_items(arg, line)?
                .into_iter()
                .enumerate()
                .map(|(i, item)| Value::Tuple(Rc::new(vec![Value::Int(i as i64), item])))
                .collect();
            Ok(make_iter("enumerate", pairs))
        }
        Builtin::Zip => {
            let mut columns = Vec::with_capacity(args.len());
            for arg in &args {
                columns.push(iter_items(arg, line)?);
            }
            let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);
            let mut rows = Vec::with_capacity(shortest);
            for i in 0..shortest {
                let row: Vec<Value> = columns.iter().map(|c| c[i].clone()).collect();
                rows.push(Value::Tuple(Rc::new(row)));
            }
            Ok(make_iter("zip", rows))
        }
    }
}

fn one<'a>(
    builtin: Builtin,
    args: &'a [Value],
    line: usize,
) -> Result<[&'a Value; 1], RuntimeError> {
    match args {
        [arg] => Ok([arg]),
        _ => Err(arity(builtin, "exactly 1", args.len(), line)),
    }
}

fn arity(builtin: Builtin, expected: &str, got: usize, line: usize) -> RuntimeError {
    RuntimeError::BadArgument {
        message: format!(
            "{}() takes {} argument(s) but {} were given",
            builtin.name(),
            expected,
            got
        ),
        line,
    }
}
