//! Function signature representation.
//!
//! A [`Signature`] owns an ordered list of parameter annotations in canonical
//! form and precomputes the facts binding needs: per-kind counts, variadic
//! indices, the required-parameter bitmask, and a name lookup table.
//!
//! # Canonical order
//!
//! Parameters appear as: positional-only, positional-or-keyword, `*args`,
//! keyword-only, `**kwargs`, with required parameters before optional ones
//! within the positional groups. Construction rejects anything else.

use std::fmt::{self, Display};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    defaults::Defaults,
    error::{Error, ErrorKind, RunResult},
    kind::{MAX_PARAMS, kinds_in_canonical_order},
    param::Param,
    value::ValueType,
};

/// A parsed, validated parameter list with precomputed binding facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    name: String,
    params: SmallVec<[Param; 8]>,
    ret: ValueType,
    /// Number of positional-only parameters (a leading prefix).
    n_posonly: usize,
    /// Number of positional parameters: positional-only plus
    /// positional-or-keyword (a leading prefix).
    n_pos: usize,
    /// Number of keyword-only parameters.
    n_kwonly: usize,
    args_idx: Option<usize>,
    kwargs_idx: Option<usize>,
    /// A 1 bit at each parameter that is neither optional nor variadic.
    required: u64,
    by_name: AHashMap<String, usize>,
}

impl Signature {
    /// Parses a parameter list into canonical form.
    ///
    /// Each check independently vetoes construction:
    /// 1. at most [`MAX_PARAMS`] parameters;
    /// 2. anonymous names only on positional-only parameters;
    /// 3. canonical parameter order, required before optional within the
    ///    positional groups;
    /// 4. unique names across all named parameters;
    /// 5. at most one `*args` and one `**kwargs`.
    pub fn new(name: &str, params: Vec<Param>, ret: ValueType) -> RunResult<Self> {
        if params.len() > MAX_PARAMS {
            return Err(Error::new(
                ErrorKind::TooManyParameters,
                format!("signature declares {} parameters, limit is {MAX_PARAMS}", params.len()),
            ));
        }

        for param in &params {
            if param.name().is_empty() && !param.kind().pos_only() {
                return Err(Error::bad_parameter_name(""));
            }
        }

        let kinds: SmallVec<[_; 8]> = params.iter().map(Param::kind).collect();
        if !kinds_in_canonical_order(&kinds) {
            let name = Self::first_misordered(&params);
            return Err(Error::new(
                ErrorKind::BadParameterOrder,
                format!("parameter '{name}' out of canonical order"),
            ));
        }

        let mut args_idx = None;
        let mut kwargs_idx = None;
        for (i, param) in params.iter().enumerate() {
            if param.kind().variadic_pos() {
                if args_idx.is_some() {
                    return Err(Error::new(ErrorKind::DuplicateVariadic, "multiple *args parameters"));
                }
                args_idx = Some(i);
            } else if param.kind().variadic_kw() {
                if kwargs_idx.is_some() {
                    return Err(Error::new(ErrorKind::DuplicateVariadic, "multiple **kwargs parameters"));
                }
                kwargs_idx = Some(i);
            }
        }

        let mut by_name = AHashMap::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            if param.name().is_empty() {
                continue;
            }
            if by_name.insert(param.name().to_owned(), i).is_some() {
                return Err(Error::duplicate_parameter(param.name()));
            }
        }

        let mut required = 0u64;
        for (i, param) in params.iter().enumerate() {
            if param.kind().required() {
                required |= 1 << i;
            }
        }

        let n_posonly = params.iter().filter(|p| p.kind().pos_only()).count();
        let n_pos = params.iter().filter(|p| p.kind().pos()).count();
        let n_kwonly = params.iter().filter(|p| p.kind().kw_only()).count();

        Ok(Self {
            name: name.to_owned(),
            params: params.into(),
            ret,
            n_posonly,
            n_pos,
            n_kwonly,
            args_idx,
            kwargs_idx,
            required,
            by_name,
        })
    }

    /// Names the first parameter that breaks canonical order, for the error
    /// message. Only called once the order check has failed.
    fn first_misordered(params: &[Param]) -> &str {
        for i in 1..params.len() {
            if !kinds_in_canonical_order(&params[..=i].iter().map(Param::kind).collect::<Vec<_>>()) {
                return params[i].name();
            }
        }
        params.last().map_or("", Param::name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters, counting `*args` and `**kwargs` as one
    /// slot each. The merged argument list always has exactly this length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, i: usize) -> &Param {
        &self.params[i]
    }

    #[must_use]
    pub fn ret(&self) -> ValueType {
        self.ret
    }

    /// Index of the parameter with this name, if any. Anonymous parameters
    /// are unreachable by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Bitmask with a 1 at each parameter that must receive a value.
    #[must_use]
    pub fn required(&self) -> u64 {
        self.required
    }

    #[must_use]
    pub fn n_posonly(&self) -> usize {
        self.n_posonly
    }

    /// Positional capacity: positional-only plus positional-or-keyword.
    #[must_use]
    pub fn n_pos(&self) -> usize {
        self.n_pos
    }

    #[must_use]
    pub fn n_kwonly(&self) -> usize {
        self.n_kwonly
    }

    #[must_use]
    pub fn args_idx(&self) -> Option<usize> {
        self.args_idx
    }

    #[must_use]
    pub fn kwargs_idx(&self) -> Option<usize> {
        self.kwargs_idx
    }

    #[must_use]
    pub fn has_args(&self) -> bool {
        self.args_idx.is_some()
    }

    #[must_use]
    pub fn has_kwargs(&self) -> bool {
        self.kwargs_idx.is_some()
    }

    /// Number of optional parameters.
    #[must_use]
    pub fn opt_count(&self) -> usize {
        self.params.iter().filter(|p| p.kind().optional()).count()
    }

    /// Number of variadic parameters (zero, one, or two).
    #[must_use]
    pub fn variadic_count(&self) -> usize {
        usize::from(self.args_idx.is_some()) + usize::from(self.kwargs_idx.is_some())
    }

    /// Rebuilds this signature with one parameter replaced.
    ///
    /// The replacement must preserve name and kind; partial application uses
    /// this to record bound values without disturbing the precomputed facts.
    pub(crate) fn with_param(&self, index: usize, param: Param) -> Self {
        debug_assert_eq!(self.params[index].name(), param.name());
        debug_assert_eq!(self.params[index].kind(), param.kind());
        let mut sig = self.clone();
        sig.params[index] = param;
        sig
    }

    /// A copy with every bound-to list cleared.
    #[must_use]
    pub fn unbound(&self) -> Self {
        let mut sig = self.clone();
        for param in &mut sig.params {
            *param = param.unbound();
        }
        sig
    }

    /// Renders the signature as source-compatible text, on one line.
    ///
    /// Equivalent to [`to_string_with`](Self::to_string_with) with an
    /// unlimited width and no defaults tuple (optional parameters render
    /// their default as `...`).
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string_with("", usize::MAX, 4, None)
    }

    /// Renders the signature, wrapping to `max_width`.
    ///
    /// `prefix` is prepended to every output line. If the one-line form
    /// exceeds `max_width`, each parameter is indented onto its own line; a
    /// parameter that still exceeds the width wraps its type and default onto
    /// doubly-indented sub-lines. The width is not a hard limit: a single
    /// component can exceed it, but never on the same line as another.
    ///
    /// Optional parameters render their default through the supplied
    /// [`Defaults`] when one is given, and as `...` otherwise. A `/` marks
    /// the positional-only boundary; a bare `*` marks the keyword-only
    /// boundary when no `*args` exists.
    #[must_use]
    pub fn to_string_with(
        &self,
        prefix: &str,
        max_width: usize,
        indent: usize,
        defaults: Option<&Defaults>,
    ) -> String {
        enum Piece {
            Param { name: String, ty: String, default: String },
            PosOnlySep,
            KwOnlySep,
        }

        let mut pieces = Vec::with_capacity(self.params.len() + 2);
        let last_posonly = if self.n_posonly > 0 { Some(self.n_posonly - 1) } else { None };
        let first_kwonly = (!self.has_args() && self.n_kwonly > 0).then(|| self.n_pos);

        for (i, param) in self.params.iter().enumerate() {
            if first_kwonly == Some(i) {
                pieces.push(Piece::KwOnlySep);
            }
            let (name, ty) = if param.kind().variadic_pos() {
                (format!("*{}", param.name()), String::new())
            } else if param.kind().variadic_kw() {
                (format!("**{}", param.name()), String::new())
            } else if param.name().is_empty() {
                (param.ty().to_string(), String::new())
            } else {
                (param.name().to_owned(), format!(": {}", param.ty()))
            };
            let default = if param.kind().optional() {
                match defaults.and_then(|d| d.find(i)) {
                    Some(value) => format!(" = {}", value.repr()),
                    None => " = ...".to_owned(),
                }
            } else {
                String::new()
            };
            pieces.push(Piece::Param { name, ty, default });
            if last_posonly == Some(i) {
                pieces.push(Piece::PosOnlySep);
            }
        }

        let ret = if self.ret == ValueType::NoneType {
            "None".to_owned()
        } else {
            self.ret.to_string()
        };

        // hypothetical one-liner
        let mut one_line = format!("{prefix}{}(", self.name);
        for (i, piece) in pieces.iter().enumerate() {
            if i > 0 {
                one_line.push_str(", ");
            }
            match piece {
                Piece::Param { name, ty, default } => {
                    one_line.push_str(name);
                    one_line.push_str(ty);
                    one_line.push_str(default);
                }
                Piece::PosOnlySep => one_line.push('/'),
                Piece::KwOnlySep => one_line.push('*'),
            }
        }
        one_line.push_str(") -> ");
        one_line.push_str(&ret);
        if one_line.len() <= max_width {
            return one_line;
        }

        // one parameter per indented line
        let tab = " ".repeat(indent);
        let mut out = format!("{prefix}{}(\n", self.name);
        let count = pieces.len();
        for (i, piece) in pieces.into_iter().enumerate() {
            let comma = if i + 1 < count { "," } else { "" };
            match piece {
                Piece::Param { name, ty, default } => {
                    let mut line = format!("{prefix}{tab}{name}");
                    if !ty.is_empty() && line.len() + ty.len() > max_width {
                        out.push_str(&line);
                        out.push('\n');
                        line = format!("{prefix}{tab}{tab}{ty}");
                    } else {
                        line.push_str(&ty);
                    }
                    if !default.is_empty() && line.len() + default.len() > max_width {
                        out.push_str(&line);
                        out.push('\n');
                        // drop the leading space when the default starts a line
                        line = format!("{prefix}{tab}{tab}{}", &default[1..]);
                    } else {
                        line.push_str(&default);
                    }
                    out.push_str(&line);
                }
                Piece::PosOnlySep => out.push_str(&format!("{prefix}{tab}/")),
                Piece::KwOnlySep => out.push_str(&format!("{prefix}{tab}*")),
            }
            out.push_str(comma);
            out.push('\n');
        }
        out.push_str(&format!("{prefix}) -> {ret}"));
        out
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn sig(params: Vec<Param>) -> RunResult<Signature> {
        Signature::new("f", params, ValueType::Int)
    }

    #[test]
    fn counts_and_mask() {
        let s = sig(vec![
            Param::new("a", ValueType::Int).unwrap().pos(),
            Param::new("b", ValueType::Int).unwrap(),
            Param::new("c", ValueType::Int).unwrap().opt(),
            Param::args("rest").unwrap(),
            Param::new("d", ValueType::Str).unwrap().kw(),
            Param::kwargs("extra").unwrap(),
        ])
        .unwrap();
        assert_eq!(s.size(), 6);
        assert_eq!(s.n_posonly(), 1);
        assert_eq!(s.n_pos(), 3);
        assert_eq!(s.n_kwonly(), 1);
        assert_eq!(s.args_idx(), Some(3));
        assert_eq!(s.kwargs_idx(), Some(5));
        // required: a, b, d
        assert_eq!(s.required(), 0b010011);
        assert_eq!(
            s.required().count_ones() as usize + s.opt_count() + s.variadic_count(),
            s.size()
        );
        assert_eq!(s.index_of("d"), Some(4));
        assert_eq!(s.index_of("nope"), None);
    }

    #[test]
    fn rejects_misordered_params() {
        let err = sig(vec![
            Param::new("a", ValueType::Int).unwrap().kw(),
            Param::new("b", ValueType::Int).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadParameterOrder);
        assert!(err.message().contains('b'));

        let err = sig(vec![
            Param::new("a", ValueType::Int).unwrap().opt(),
            Param::new("b", ValueType::Int).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadParameterOrder);
    }

    #[test]
    fn rejects_duplicate_names_and_variadics() {
        let err = sig(vec![
            Param::new("a", ValueType::Int).unwrap(),
            Param::new("a", ValueType::Int).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateParameter);

        let err = sig(vec![Param::args("x").unwrap(), Param::args("y").unwrap()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateVariadic);
    }

    #[test]
    fn rejects_too_many_params() {
        let params = (0..=MAX_PARAMS)
            .map(|i| Param::new(&format!("p{i}"), ValueType::Any).unwrap())
            .collect();
        let err = sig(params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyParameters);
    }

    #[test]
    fn render_one_line() {
        let s = Signature::new(
            "p",
            vec![
                Param::new("a", ValueType::Int).unwrap(),
                Param::new("b", ValueType::Int).unwrap().opt(),
                Param::new("c", ValueType::Int).unwrap().kw().opt(),
            ],
            ValueType::Int,
        )
        .unwrap();
        assert_eq!(s.render(), "p(a: Int, b: Int = ..., *, c: Int = ...) -> Int");
    }

    #[test]
    fn render_separators_and_variadics() {
        let s = Signature::new(
            "f",
            vec![
                Param::new("a", ValueType::Int).unwrap().pos(),
                Param::new("b", ValueType::Str).unwrap(),
                Param::args("args").unwrap(),
                Param::new("k", ValueType::Str).unwrap().kw(),
                Param::kwargs("kwargs").unwrap(),
            ],
            ValueType::NoneType,
        )
        .unwrap();
        assert_eq!(
            s.render(),
            "f(a: Int, /, b: Str, *args, k: Str, **kwargs) -> None"
        );
    }

    #[test]
    fn render_wraps_long_components_onto_sub_lines() {
        let s = Signature::new(
            "f",
            vec![Param::new("verylongname", ValueType::Float).unwrap().opt()],
            ValueType::Int,
        )
        .unwrap();
        let rendered = s.to_string_with("", 14, 4, None);
        assert_eq!(
            rendered,
            "f(\n    verylongname\n        : Float\n        = ...\n) -> Int"
        );
    }

    #[test]
    fn render_anonymous_parameters() {
        let s = Signature::new(
            "f",
            vec![Param::anon(ValueType::Int), Param::anon(ValueType::Str)],
            ValueType::List,
        )
        .unwrap();
        assert_eq!(s.render(), "f(Int, Str, /) -> List");
    }

    #[test]
    fn render_wraps_parameters() {
        let s = Signature::new(
            "f",
            vec![
                Param::new("alpha", ValueType::Int).unwrap(),
                Param::new("beta", ValueType::Str).unwrap().opt(),
            ],
            ValueType::Int,
        )
        .unwrap();
        let rendered = s.to_string_with("", 20, 4, None);
        assert_eq!(rendered, "f(\n    alpha: Int,\n    beta: Str = ...\n) -> Int");
    }
}
