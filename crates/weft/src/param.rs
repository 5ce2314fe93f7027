//! Parameter annotations.
//!
//! A [`Param`] ties a name, a [`Kind`], and a declared type together with the
//! list of values already bound to it by partial application. Signatures are
//! declared as ordered lists of these annotations.
//!
//! Construction follows the trailing-modifier grammar of Python-style
//! declarations: a plain `Param::new` is positional-or-keyword and required,
//! and `.pos()`, `.kw()`, and `.opt()` refine it. Modifiers only ever add
//! constraints; there is no way to remove one from an existing annotation.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    error::{Error, ErrorKind, RunResult},
    kind::Kind,
    value::{Value, ValueType},
};

/// A value attached to a parameter through partial application.
///
/// The name records how the value was supplied: empty for a positional
/// binding, the keyword otherwise. Variadic keyword parameters key their
/// collected map by these names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundArg {
    name: String,
    value: Value,
}

impl BoundArg {
    /// A positionally supplied bound value.
    #[must_use]
    pub fn positional(value: Value) -> Self {
        Self {
            name: String::new(),
            value,
        }
    }

    /// A keyword-supplied bound value.
    #[must_use]
    pub fn keyword(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The keyword under which the value was supplied; empty if positional.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A single annotated parameter within a signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    name: String,
    kind: Kind,
    ty: ValueType,
    bound: SmallVec<[BoundArg; 2]>,
}

/// Checks the identifier rules: non-empty, first char a letter or underscore,
/// remainder alphanumeric or underscore.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Param {
    /// A required positional-or-keyword parameter, like `a` in `def f(a)`.
    pub fn new(name: &str, ty: ValueType) -> RunResult<Self> {
        if !is_identifier(name) {
            return Err(Error::bad_parameter_name(name));
        }
        Ok(Self {
            name: name.to_owned(),
            kind: Kind::positional_or_keyword(),
            ty,
            bound: SmallVec::new(),
        })
    }

    /// An anonymous required positional-only parameter. The empty name is
    /// reserved for this form.
    #[must_use]
    pub fn anon(ty: ValueType) -> Self {
        Self {
            name: String::new(),
            kind: Kind::positional_only(),
            ty,
            bound: SmallVec::new(),
        }
    }

    /// The variadic positional parameter. A leading `*` in the name is
    /// accepted and stripped, so `Param::args("*rest")` and
    /// `Param::args("rest")` are equivalent.
    pub fn args(name: &str) -> RunResult<Self> {
        let name = name.strip_prefix('*').unwrap_or(name);
        if !is_identifier(name) {
            return Err(Error::bad_parameter_name(name));
        }
        Ok(Self {
            name: name.to_owned(),
            kind: Kind::variadic_positional(),
            ty: ValueType::Any,
            bound: SmallVec::new(),
        })
    }

    /// The variadic keyword parameter. A leading `**` in the name is
    /// accepted and stripped.
    pub fn kwargs(name: &str) -> RunResult<Self> {
        let name = name.strip_prefix("**").unwrap_or(name);
        if !is_identifier(name) {
            return Err(Error::bad_parameter_name(name));
        }
        Ok(Self {
            name: name.to_owned(),
            kind: Kind::variadic_keyword(),
            ty: ValueType::Any,
            bound: SmallVec::new(),
        })
    }

    /// Restricts this parameter to positional-only supply.
    #[must_use]
    pub fn pos(mut self) -> Self {
        self.kind = self.kind.as_positional_only();
        self
    }

    /// Restricts this parameter to keyword-only supply.
    #[must_use]
    pub fn kw(mut self) -> Self {
        self.kind = self.kind.as_keyword_only();
        self
    }

    /// Marks this parameter optional; a default must then be supplied when a
    /// defaults tuple is built for the enclosing signature.
    #[must_use]
    pub fn opt(mut self) -> Self {
        self.kind = self.kind.with_opt();
        self
    }

    /// Fixes the concrete type of a generic (`Any`-typed) parameter.
    ///
    /// Re-typing a parameter whose type is already concrete is rejected;
    /// a generic can be concretised exactly once.
    pub fn with_type(mut self, ty: ValueType) -> RunResult<Self> {
        if self.ty != ValueType::Any {
            return Err(Error::new(
                ErrorKind::TypeMismatch,
                format!("parameter '{}' is already typed as {}", self.name, self.ty),
            ));
        }
        self.ty = ty;
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn ty(&self) -> ValueType {
        self.ty
    }

    /// Values attached by prior partial application, oldest first.
    #[must_use]
    pub fn bound(&self) -> &[BoundArg] {
        &self.bound
    }

    /// Appends newly bound values, enforcing the per-kind rebinding rules.
    ///
    /// Non-variadic parameters accept at most one bound value in total, and
    /// a keyword-supplied value must be named after the parameter itself.
    /// Variadic parameters accept any number of values with pairwise-unique
    /// names. Every value must be convertible to the declared type.
    pub(crate) fn rebind(&self, new: impl IntoIterator<Item = BoundArg>) -> RunResult<Self> {
        let mut merged = self.clone();
        for arg in new {
            if !self.ty.accepts(arg.value.type_of()) {
                return Err(Error::type_mismatch(&self.name, self.ty, arg.value.type_of()));
            }
            if self.kind.variadic() {
                if !arg.name.is_empty() && merged.bound.iter().any(|b| b.name == arg.name) {
                    return Err(Error::duplicate_keyword(&arg.name));
                }
                if self.kind.variadic_kw() && arg.name.is_empty() {
                    return Err(Error::new(
                        ErrorKind::BadArgumentOrder,
                        format!("values bound to '**{}' must carry keywords", self.name),
                    ));
                }
            } else {
                if !merged.bound.is_empty() {
                    return Err(Error::duplicate_value(&self.name));
                }
                if !arg.name.is_empty() && arg.name != self.name {
                    return Err(Error::unknown_keyword(&arg.name));
                }
                if self.kind.pos_only() && !arg.name.is_empty() {
                    return Err(Error::unknown_keyword(&arg.name));
                }
            }
            merged.bound.push(arg);
        }
        Ok(merged)
    }

    /// Discards the bound-to list, restoring the annotation to its declared
    /// form.
    #[must_use]
    pub(crate) fn unbound(&self) -> Self {
        let mut param = self.clone();
        param.bound.clear();
        param
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(Param::new("x", ValueType::Int).is_ok());
        assert!(Param::new("_private", ValueType::Int).is_ok());
        assert!(Param::new("x2", ValueType::Int).is_ok());
        assert!(Param::new("", ValueType::Int).is_err());
        assert!(Param::new("2x", ValueType::Int).is_err());
        assert!(Param::new("a-b", ValueType::Int).is_err());
    }

    #[test]
    fn variadic_prefix_stripping() {
        assert_eq!(Param::args("*rest").unwrap().name(), "rest");
        assert_eq!(Param::args("rest").unwrap().name(), "rest");
        assert_eq!(Param::kwargs("**extra").unwrap().name(), "extra");
    }

    #[test]
    fn modifiers_accumulate() {
        let p = Param::new("x", ValueType::Int).unwrap().pos().opt();
        assert!(p.kind().pos_only());
        assert!(p.kind().optional());

        let k = Param::new("y", ValueType::Str).unwrap().kw();
        assert!(k.kind().kw_only());
    }

    #[test]
    fn generic_concretises_once() {
        let p = Param::new("g", ValueType::Any).unwrap();
        let p = p.with_type(ValueType::Int).unwrap();
        assert_eq!(p.ty(), ValueType::Int);
        assert!(p.with_type(ValueType::Str).is_err());
    }

    #[test]
    fn rebind_single_slot() {
        let p = Param::new("x", ValueType::Int).unwrap();
        let once = p.rebind([BoundArg::keyword("x", Value::Int(1))]).unwrap();
        assert_eq!(once.bound().len(), 1);
        assert!(once.rebind([BoundArg::positional(Value::Int(2))]).is_err());
        assert!(p.rebind([BoundArg::keyword("y", Value::Int(1))]).is_err());
        assert!(p.rebind([BoundArg::positional(Value::Str("s".to_owned()))]).is_err());
    }

    #[test]
    fn rebind_variadic() {
        let args = Param::args("rest").unwrap();
        let bound = args
            .rebind([
                BoundArg::positional(Value::Int(0)),
                BoundArg::positional(Value::Int(1)),
            ])
            .unwrap();
        assert_eq!(bound.bound().len(), 2);

        let kwargs = Param::kwargs("extra").unwrap();
        assert!(
            kwargs
                .rebind([BoundArg::positional(Value::Int(0))])
                .is_err()
        );
        let bound = kwargs
            .rebind([
                BoundArg::keyword("a", Value::Int(0)),
                BoundArg::keyword("b", Value::Int(1)),
            ])
            .unwrap();
        assert!(bound.rebind([BoundArg::keyword("a", Value::Int(2))]).is_err());
    }
}
