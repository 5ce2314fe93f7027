//! The argument value vocabulary.
//!
//! Binding moves [`Value`]s from call sites into merged argument lists.
//! [`ValueType`] names each shape and drives the convertibility checks the
//! engine runs before a call is permitted.

use std::fmt::{self, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// A dynamically typed argument value.
///
/// Maps are insertion-ordered: the order in which entries were bound is
/// observable through `**kwargs` and is part of the binding contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

/// The type of a [`Value`], plus the `Any` sentinel for parameters whose type
/// is left generic until bound.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum ValueType {
    /// Accepts any value. Also models a generic parameter whose concrete
    /// type has not been fixed yet.
    Any,
    #[strum(serialize = "NoneType")]
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
}

impl ValueType {
    /// Whether a value of type `source` can be passed where `self` is
    /// declared. `Any` accepts everything; `Float` widens from `Int`;
    /// every other pairing must match exactly.
    #[must_use]
    pub const fn accepts(self, source: Self) -> bool {
        match self {
            Self::Any => true,
            Self::Float => matches!(source, Self::Float | Self::Int),
            _ => self as u8 == source as u8,
        }
    }
}

impl Value {
    /// Returns the runtime type of this value.
    #[must_use]
    pub const fn type_of(&self) -> ValueType {
        match self {
            Self::None => ValueType::NoneType,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::Str,
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
        }
    }

    /// Renders the value as a Python-flavored literal.
    ///
    /// Used for defaults in signature rendering and for naming leftover pack
    /// entries in error messages.
    #[must_use]
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.repr_fmt(&mut out).expect("writing to String cannot fail");
        out
    }

    fn repr_fmt(&self, f: &mut impl Write) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Self::Str(s) => {
                f.write_char('\'')?;
                for c in s.chars() {
                    match c {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        c => f.write_char(c)?,
                    }
                }
                f.write_char('\'')
            }
            Self::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.repr_fmt(f)?;
                }
                f.write_char(']')
            }
            Self::Map(entries) => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Self::Str(key.clone()).repr_fmt(f)?;
                    f.write_str(": ")?;
                    value.repr_fmt(f)?;
                }
                f.write_char('}')
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_scalars() {
        assert_eq!(Value::None.repr(), "None");
        assert_eq!(Value::Bool(true).repr(), "True");
        assert_eq!(Value::Int(-3).repr(), "-3");
        assert_eq!(Value::Float(2.0).repr(), "2.0");
        assert_eq!(Value::Float(2.5).repr(), "2.5");
        assert_eq!(Value::Str("a'b\n".to_owned()).repr(), "'a\\'b\\n'");
    }

    #[test]
    fn repr_containers() {
        let list = Value::List(vec![Value::Int(1), Value::Str("x".to_owned())]);
        assert_eq!(list.repr(), "[1, 'x']");
        let mut map = IndexMap::new();
        map.insert("k".to_owned(), Value::Int(5));
        assert_eq!(Value::Map(map).repr(), "{'k': 5}");
    }

    #[test]
    fn accepts() {
        assert!(ValueType::Any.accepts(ValueType::Map));
        assert!(ValueType::Float.accepts(ValueType::Int));
        assert!(!ValueType::Int.accepts(ValueType::Float));
        assert!(ValueType::Int.accepts(ValueType::Int));
        assert!(!ValueType::Str.accepts(ValueType::Bool));
    }
}
