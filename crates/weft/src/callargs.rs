//! Call-site argument expressions.
//!
//! A call site supplies a flat list of [`CallArg`]s: positional values,
//! `name=value` keywords, and at most one `*` pack and one `**` pack.
//! [`CallArgs::new`] canonicalizes that list, enforcing the structural
//! arrangement rules before any binding work happens.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, RunResult},
    packs::{KwPack, PosPack},
    value::Value,
};

/// One argument expression at a call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallArg {
    /// `f(x)`
    Pos(Value),
    /// `f(name=x)`
    Kw(String, Value),
    /// `f(*seq)`
    Star(Vec<Value>),
    /// `f(**mapping)`
    StarStar(Vec<(String, Value)>),
}

/// A positional argument.
#[must_use]
pub fn pos(value: impl Into<Value>) -> CallArg {
    CallArg::Pos(value.into())
}

/// A keyword argument, the `name=value` of a call site.
#[must_use]
pub fn kw(name: &str, value: impl Into<Value>) -> CallArg {
    CallArg::Kw(name.to_owned(), value.into())
}

/// A `*iterable` unpacking expression.
#[must_use]
pub fn star(values: impl IntoIterator<Item = impl Into<Value>>) -> CallArg {
    CallArg::Star(values.into_iter().map(Into::into).collect())
}

/// A `**mapping` unpacking expression. Anything yielding `(key, value)`
/// pairs works: an `items()`-style pair list, a zipped `keys()`/`values()`
/// pair, or key iteration with lookup all reduce to this shape.
#[must_use]
pub fn star_star(pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<Value>)>) -> CallArg {
    CallArg::StarStar(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
}

/// The canonical, owning form of a call site's argument list.
///
/// Positional values, then the `*` pack, then keywords, then the `**` pack.
/// The raw list must already be in that order; canonicalization validates
/// rather than sorts.
/// A `CallArgs` owns its values, so an argument list can be captured once
/// and forwarded to a callable later with [`apply`](CallArgs::apply).
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
    star: Option<PosPack>,
    star_star: Option<KwPack>,
}

impl CallArgs {
    /// An empty argument list.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Canonicalizes a raw argument list.
    ///
    /// Enforces the structural arrangement rules:
    /// - positional arguments precede the `*` pack, the `*` pack precedes
    ///   keywords, the `**` pack comes last;
    /// - keyword names are pairwise unique;
    /// - at most one pack of each kind;
    /// - no duplicate keys inside the `**` pack.
    pub fn new(args: Vec<CallArg>) -> RunResult<Self> {
        let mut out = Self::empty();
        // stages: 0 positional, 1 star, 2 keyword, 3 star_star
        let mut stage = 0u8;
        for arg in args {
            match arg {
                CallArg::Pos(value) => {
                    if stage > 0 {
                        return Err(Error::bad_argument_order(
                            "positional argument follows keyword argument or unpacking",
                        ));
                    }
                    out.positional.push(value);
                }
                CallArg::Star(values) => {
                    if stage >= 1 {
                        return Err(Error::bad_argument_order(
                            "at most one positional unpacking is allowed, after all positional arguments",
                        ));
                    }
                    stage = 1;
                    out.star = Some(PosPack::new(values));
                }
                CallArg::Kw(name, value) => {
                    if stage > 2 {
                        return Err(Error::bad_argument_order(
                            "keyword argument follows keyword unpacking",
                        ));
                    }
                    stage = 2;
                    if out.keywords.iter().any(|(existing, _)| *existing == name) {
                        return Err(Error::duplicate_keyword(&name));
                    }
                    out.keywords.push((name, value));
                }
                CallArg::StarStar(pairs) => {
                    if stage >= 3 {
                        return Err(Error::bad_argument_order("at most one keyword unpacking is allowed"));
                    }
                    stage = 3;
                    out.star_star = Some(KwPack::new(pairs)?);
                }
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    #[must_use]
    pub fn keywords(&self) -> &[(String, Value)] {
        &self.keywords
    }

    #[must_use]
    pub fn has_star(&self) -> bool {
        self.star.is_some()
    }

    #[must_use]
    pub fn has_star_star(&self) -> bool {
        self.star_star.is_some()
    }

    /// Forwards the captured arguments to a callable, consuming them.
    pub fn apply<C: crate::function::Callable + ?Sized>(self, f: &C) -> RunResult<Value> {
        let merged =
            crate::bind::Bind::new(f.signature(), f.defaults(), f.partial(), self)?.merge()?;
        f.call_merged(merged)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<Value>,
        Vec<(String, Value)>,
        Option<PosPack>,
        Option<KwPack>,
    ) {
        (self.positional, self.keywords, self.star, self.star_star)
    }
}
