//! Display-side value model: deep, immutable copies of runtime values.
//!
//! Snapshots never hold live [`Value`]s. Each tracked binding is converted
//! into a [`DisplayValue`] at snapshot time: an independent deep copy with a
//! closed set of variants and finite formatting rules, so later in-place
//! mutation of the program's objects can never rewrite an earlier snapshot.
//!
//! Exhaustible iteration objects are materialized here: their remaining
//! buffered elements are cloned into the `Opaque` variant's item list,
//! tagged with the iterator's type name. The clone is what makes inspection
//! side-effect-free; the live iterator is not advanced.

use std::fmt;

use serde::Serialize;

use super::value::Value;

/// A formatted, deep-copied view of one runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DisplayValue {
    /// Atomic value, already rendered (`6`, `'abc'`, `range(3)`).
    Scalar(String),
    /// Ordered elements of a list or tuple.
    Sequence(Vec<DisplayValue>),
    /// Ordered key/value pairs of a dict.
    Mapping(Vec<(DisplayValue, DisplayValue)>),
    /// A value with no literal syntax. `items` holds the materialized
    /// remaining elements for exhaustible iterators, `None` otherwise.
    Opaque {
        type_name: String,
        items: Option<Vec<DisplayValue>>,
    },
}

impl DisplayValue {
    /// Deep-copies a runtime value into its display form.
    pub fn of(value: &Value) -> DisplayValue {
        match value {
            // Tuples are immutable, so their repr text is already a frozen
            // deep copy; rendering them as Scalar keeps `()` vs `[]` visible.
            Value::None
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Tuple(_)
            | Value::Range { .. } => DisplayValue::Scalar(value.repr()),
            Value::List(items) => {
                DisplayValue::Sequence(items.borrow().iter().map(DisplayValue::of).collect())
            }
            Value::Dict(map) => DisplayValue::Mapping(
                map.borrow()
                    .iter()
                    .map(|(k, v)| (DisplayValue::Scalar(k.repr()), DisplayValue::of(v)))
                    .collect(),
            ),
            Value::Iter(obj) => {
                let obj = obj.borrow();
                DisplayValue::Opaque {
                    type_name: obj.type_name.to_string(),
                    items: Some(obj.items.iter().map(DisplayValue::of).collect()),
                }
            }
            Value::Function(_) | Value::Builtin(_) => DisplayValue::Opaque {
                type_name: value.type_name().to_string(),
                items: None,
            },
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Scalar(text) => f.write_str(text),
            DisplayValue::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            DisplayValue::Mapping(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            DisplayValue::Opaque { type_name, items } => match items {
                Some(items) => {
                    write!(f, "<{type_name} [")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{item}")?;
                    }
                    write!(f, "]>")
                }
                None => write!(f, "<{type_name} object>"),
            },
        }
    }
}

/// Where a binding was found when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeLabel {
    /// Module-level namespace.
    Global,
    /// Innermost function frame; `context` is the function's name.
    Local { context: String },
}

impl fmt::Display for ScopeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLabel::Global => f.write_str("global"),
            ScopeLabel::Local { context } => write!(f, "local ({context})"),
        }
    }
}

impl Serialize for ScopeLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::IterObject;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[test]
    fn scalars_render_as_repr() {
        assert_eq!(DisplayValue::of(&Value::Int(6)).to_string(), "6");
        assert_eq!(
            DisplayValue::of(&Value::Str("hi".into())).to_string(),
            "'hi'"
        );
        assert_eq!(
            DisplayValue::of(&Value::Range { start: 0, stop: 3, step: 1 }).to_string(),
            "range(3)"
        );
    }

    #[test]
    fn lists_become_independent_sequences() {
        let shared = Rc::new(RefCell::new(vec![Value::Int(1), Value::Int(2)]));
        let display = DisplayValue::of(&Value::List(shared.clone()));
        shared.borrow_mut()[0] = Value::Int(99);
        // The snapshot copy is unaffected by the later mutation.
        assert_eq!(display.to_string(), "[1, 2]");
    }

    #[test]
    fn iterators_materialize_without_draining() {
        let obj = Rc::new(RefCell::new(IterObject {
            type_name: "list_iterator",
            items: VecDeque::from(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        }));
        let display = DisplayValue::of(&Value::Iter(obj.clone()));
        assert_eq!(display.to_string(), "<list_iterator [1, 2, 3]>");
        assert_eq!(obj.borrow().items.len(), 3);
    }

    #[test]
    fn scope_labels_render() {
        assert_eq!(ScopeLabel::Global.to_string(), "global");
        assert_eq!(
            ScopeLabel::Local { context: "double".into() }.to_string(),
            "local (double)"
        );
    }
}
