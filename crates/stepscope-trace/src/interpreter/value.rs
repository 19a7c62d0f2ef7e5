//! Runtime value representation for the script interpreter.
//!
//! [`Value`] is the dynamic counterpart of the script language's closed type
//! set. Lists and dicts are shared mutable objects (`Rc<RefCell<..>>`) so
//! in-place mutation behaves like the scripts expect; everything recorded
//! into a snapshot is deep-copied out of them first. Iterator state is a
//! buffered queue owned by the interpreter, which is what makes snapshot
//! materialization side-effect-free.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;
use stepscope_core::ast::Stmt;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Shared mutable list.
    List(Rc<RefCell<Vec<Value>>>),
    /// Immutable tuple.
    Tuple(Rc<Vec<Value>>),
    /// Shared mutable dict; insertion-ordered.
    Dict(Rc<RefCell<IndexMap<DictKey, Value>>>),
    /// Reusable integer sequence; `step` is never zero.
    Range { start: i64, stop: i64, step: i64 },
    /// Exhaustible iteration object with buffered remaining items.
    Iter(Rc<RefCell<IterObject>>),
    Function(Rc<FunctionObject>),
    Builtin(Builtin),
}

/// A dict key. The subset restricts keys to these hashable kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl DictKey {
    pub fn repr(&self) -> String {
        match self {
            DictKey::Int(v) => v.to_string(),
            DictKey::Bool(v) => if *v { "True" } else { "False" }.to_string(),
            DictKey::Str(s) => repr_str(s),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DictKey::Int(v) => Value::Int(*v),
            DictKey::Bool(v) => Value::Bool(*v),
            DictKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Buffered iterator state. `type_name` is the surface name shown when the
/// iterator is materialized into a snapshot (`list_iterator`, `zip`, ...).
#[derive(Debug, PartialEq)]
pub struct IterObject {
    pub type_name: &'static str,
    pub items: VecDeque<Value>,
}

/// A user-defined function. The body is shared, never mutated.
#[derive(Debug, PartialEq)]
pub struct FunctionObject {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// Built-in functions reachable by bare name (shadowable by assignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Range,
    Len,
    Sum,
    Min,
    Max,
    Abs,
    Str,
    Int,
    Iter,
    Next,
    List,
    Enumerate,
    Zip,
}

impl Builtin {
    pub fn by_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "print" => Builtin::Print,
            "range" => Builtin::Range,
            "len" => Builtin::Len,
            "sum" => Builtin::Sum,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "abs" => Builtin::Abs,
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "iter" => Builtin::Iter,
            "next" => Builtin::Next,
            "list" => Builtin::List,
            "enumerate" => Builtin::Enumerate,
            "zip" => Builtin::Zip,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Iter => "iter",
            Builtin::Next => "next",
            Builtin::List => "list",
            Builtin::Enumerate => "enumerate",
            Builtin::Zip => "zip",
        }
    }
}

impl Value {
    /// The surface type name, matching what the scripts' language calls it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
            Value::Iter(obj) => obj.borrow().type_name,
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin_function",
        }
    }

    /// Type name for the per-variable type table; iterators are flagged.
    pub fn type_display(&self) -> String {
        match self {
            Value::Iter(_) => format!("{} (iter)", self.type_name()),
            other => other.type_name().to_string(),
        }
    }

    /// Truthiness. Iterators, functions and builtins are always truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(map) => !map.borrow().is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
            Value::Iter(_) | Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    /// Canonical display form, quoting strings (the scripts' `repr`).
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => repr_float(*v),
            Value::Str(s) => repr_str(s),
            Value::List(items) => {
                let inner: Vec<String> = items.borrow().iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                if inner.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
            Value::Dict(map) => {
                let inner: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Range { start, stop, step } => repr_range(*start, *stop, *step),
            Value::Iter(obj) => format!("<{} object>", obj.borrow().type_name),
            Value::Function(f) => format!("<function {}>", f.name),
            Value::Builtin(b) => format!("<built-in function {}>", b.name()),
        }
    }

    /// Display form without string quoting (the scripts' `str`, as printed).
    pub fn str_value(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }
}

/// Structural equality with numeric cross-type comparison (`True == 1`,
/// `1 == 1.0`). Iterators and functions compare by identity; mismatched
/// kinds compare unequal rather than erroring.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map(|w| value_eq(v, w)).unwrap_or(false))
        }
        (
            Value::Range { start, stop, step },
            Value::Range { start: s2, stop: e2, step: p2 },
        ) => start == s2 && stop == e2 && step == p2,
        (Value::Iter(x), Value::Iter(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => x == y,
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Numeric view of a value, with bools coercing to 0/1.
pub fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Int(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

/// Number of elements a range yields.
pub fn range_len(start: i64, stop: i64, step: i64) -> usize {
    if step > 0 {
        if stop > start {
            ((stop - start - 1) / step + 1) as usize
        } else {
            0
        }
    } else if stop < start {
        ((start - stop - 1) / (-step) + 1) as usize
    } else {
        0
    }
}

/// Range display, eliding defaulted start and step.
pub fn repr_range(start: i64, stop: i64, step: i64) -> String {
    if step == 1 {
        if start == 0 {
            format!("range({stop})")
        } else {
            format!("range({start}, {stop})")
        }
    } else {
        format!("range({start}, {stop}, {step})")
    }
}

fn repr_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Float display: integral values keep one decimal place so `2.0` never
/// collapses into `2`.
fn repr_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if v == v.trunc() && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(values)))
    }

    #[test]
    fn repr_formats() {
        assert_eq!(Value::Int(6).repr(), "6");
        assert_eq!(Value::Float(2.0).repr(), "2.0");
        assert_eq!(Value::Float(0.5).repr(), "0.5");
        assert_eq!(Value::Bool(true).repr(), "True");
        assert_eq!(Value::None.repr(), "None");
        assert_eq!(Value::Str("a'b".into()).repr(), "'a\\'b'");
        assert_eq!(
            list(vec![Value::Int(1), Value::Str("x".into())]).repr(),
            "[1, 'x']"
        );
        assert_eq!(
            Value::Tuple(Rc::new(vec![Value::Int(1)])).repr(),
            "(1,)"
        );
    }

    #[test]
    fn range_repr_elides_defaults() {
        assert_eq!(repr_range(0, 3, 1), "range(3)");
        assert_eq!(repr_range(1, 5, 1), "range(1, 5)");
        assert_eq!(repr_range(0, 10, 2), "range(0, 10, 2)");
    }

    #[test]
    fn range_len_handles_directions() {
        assert_eq!(range_len(0, 3, 1), 3);
        assert_eq!(range_len(0, 0, 1), 0);
        assert_eq!(range_len(3, 0, -1), 3);
        assert_eq!(range_len(0, 10, 3), 4);
        assert_eq!(range_len(5, 3, 1), 0);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(-1).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(!list(vec![]).truthy());
        assert!(list(vec![Value::Int(1)]).truthy());
        assert!(!Value::Range { start: 0, stop: 0, step: 1 }.truthy());
    }

    #[test]
    fn equality_crosses_numeric_kinds() {
        assert!(value_eq(&Value::Int(1), &Value::Float(1.0)));
        assert!(value_eq(&Value::Bool(true), &Value::Int(1)));
        assert!(!value_eq(&Value::Int(1), &Value::Str("1".into())));
        assert!(value_eq(
            &list(vec![Value::Int(1)]),
            &list(vec![Value::Int(1)])
        ));
        assert!(!value_eq(
            &list(vec![Value::Int(1)]),
            &Value::Tuple(Rc::new(vec![Value::Int(1)]))
        ));
    }

    #[test]
    fn str_value_drops_quotes() {
        assert_eq!(Value::Str("hi".into()).str_value(), "hi");
        assert_eq!(Value::Int(6).str_value(), "6");
    }
}
