//! Typed failures raised by signature construction and argument binding.
//!
//! Structural mistakes (order, duplicates, unknown names, coverage,
//! convertibility) are raised while a binding is being built, before any
//! merge work runs. Only pack-induced failures surface during the merge, and
//! still before the target function is invoked. Nothing is retried and
//! nothing is silently recovered.

use std::fmt::{self, Display, Write};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::value::{Value, ValueType};

/// Result type alias for every fallible operation in the crate.
pub type RunResult<T> = Result<T, Error>;

/// The closed set of failure classes.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and
/// `Into<&'static str>` implementations; the string form matches the variant
/// name exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum ErrorKind {
    // --- call-site arrangement ---
    /// Positional after keyword, keyword after a pack, or a pack out of its
    /// canonical position.
    BadArgumentOrder,
    /// The same parameter received a value twice (two keywords, or a keyword
    /// on top of a positional or partial binding).
    DuplicateValue,
    /// A keyword names no parameter and the target has no `**kwargs`.
    UnknownKeyword,
    /// More positional values than positional slots and no `*args`.
    ExcessPositional,
    /// A keyword pack finished the merge with entries left over.
    ExcessKeyword,
    /// A keyword pack entry shares its name with an already-satisfied
    /// parameter.
    ConflictingKeyword,
    /// A required parameter received no partial, source, pack, or default.
    MissingParameter,
    /// A source value is not convertible to its target parameter's type.
    TypeMismatch,

    // --- signature construction ---
    TooManyParameters,
    BadParameterName,
    BadParameterOrder,
    DuplicateParameter,
    DuplicateVariadic,
    /// A defaults tuple could not be built for the signature's optional
    /// parameters.
    BadDefault,
    /// A chain stage cannot be invoked on its predecessor's return value.
    NotCallable,
}

/// A failure with its class and a human-readable, name-bearing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Creates an error from a kind and a preformatted message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The failure class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message, without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn missing_parameter(name: &str) -> Self {
        Self::new(ErrorKind::MissingParameter, format!("missing parameter '{name}'"))
    }

    pub(crate) fn missing_default(name: &str) -> Self {
        Self::new(
            ErrorKind::BadDefault,
            format!("missing default value for parameter '{name}'"),
        )
    }

    pub(crate) fn duplicate_value(name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateValue,
            format!("got multiple values for parameter '{name}'"),
        )
    }

    pub(crate) fn unknown_keyword(name: &str) -> Self {
        Self::new(ErrorKind::UnknownKeyword, format!("unexpected keyword argument '{name}'"))
    }

    pub(crate) fn duplicate_keyword(name: &str) -> Self {
        Self::new(ErrorKind::DuplicateValue, format!("duplicate keyword argument: '{name}'"))
    }

    pub(crate) fn conflicting_value(name: &str) -> Self {
        Self::new(
            ErrorKind::ConflictingKeyword,
            format!("conflicting value for parameter '{name}'"),
        )
    }

    pub(crate) fn excess_positional(count: usize, limit: usize) -> Self {
        Self::new(
            ErrorKind::ExcessPositional,
            format!("takes at most {limit} positional arguments but {count} were given"),
        )
    }

    /// Unconsumed positional pack entries at the end of a merge.
    pub(crate) fn unconsumed_positional(remaining: &[Value]) -> Self {
        let mut message = String::from("too many positional arguments, remaining: [");
        for (i, value) in remaining.iter().enumerate() {
            if i > 0 {
                message.push_str(", ");
            }
            message.push_str(&value.repr());
        }
        message.push(']');
        Self::new(ErrorKind::ExcessPositional, message)
    }

    /// Unconsumed keyword pack entries at the end of a merge.
    pub(crate) fn unconsumed_keywords<'a>(remaining: impl Iterator<Item = &'a str>) -> Self {
        let mut message = String::from("unexpected keyword arguments: [");
        for (i, name) in remaining.enumerate() {
            if i > 0 {
                message.push_str(", ");
            }
            let _ = write!(message, "'{name}'");
        }
        message.push(']');
        Self::new(ErrorKind::ExcessKeyword, message)
    }

    pub(crate) fn type_mismatch(name: &str, expected: ValueType, got: ValueType) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("parameter '{name}' expects {expected}, got {got}"),
        )
    }

    pub(crate) fn bad_argument_order(detail: &str) -> Self {
        Self::new(ErrorKind::BadArgumentOrder, detail.to_owned())
    }

    pub(crate) fn bad_parameter_name(name: &str) -> Self {
        Self::new(ErrorKind::BadParameterName, format!("invalid parameter name '{name}'"))
    }

    pub(crate) fn duplicate_parameter(name: &str) -> Self {
        Self::new(ErrorKind::DuplicateParameter, format!("duplicate parameter '{name}'"))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_shapes() {
        assert_eq!(Error::missing_parameter("c").message(), "missing parameter 'c'");
        assert_eq!(
            Error::unconsumed_positional(&[Value::Int(4)]).message(),
            "too many positional arguments, remaining: [4]"
        );
        assert_eq!(
            Error::unconsumed_keywords(["m", "n"].into_iter()).message(),
            "unexpected keyword arguments: ['m', 'n']"
        );
        assert_eq!(
            Error::conflicting_value("x").message(),
            "conflicting value for parameter 'x'"
        );
    }

    #[test]
    fn display_includes_kind() {
        let err = Error::unknown_keyword("z");
        assert_eq!(err.to_string(), "UnknownKeyword: unexpected keyword argument 'z'");
        assert_eq!(err.kind(), ErrorKind::UnknownKeyword);
    }
}
