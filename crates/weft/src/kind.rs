//! Parameter kind classification.
//!
//! A [`Kind`] is a compact bitset over four flags: positional, keyword,
//! optional, and variadic. Every parameter in a signature carries exactly one
//! kind, and the binding engine dispatches on its derived predicates.

use serde::{Deserialize, Serialize};

/// Maximum number of parameters a signature may declare.
///
/// Per-parameter bookkeeping (required mask, bound-slot tracking) uses `u64`
/// bitmaps, so the cap is one machine word's worth of slots.
pub const MAX_PARAMS: usize = 64;

const OPT: u8 = 0b1;
const VAR: u8 = 0b10;
const POS: u8 = 0b100;
const KW: u8 = 0b1000;

/// The kind of a parameter: positional and/or keyword, optional, variadic.
///
/// The relative ordering of the underlying flag values is significant and
/// must not change: it dictates the order in which candidate edges are stored
/// by any dispatch table layered on top of this crate. The order is always
/// `POS < POS|OPT < POS|VAR < KW < KW|OPT < KW|VAR`, which the raw byte
/// encoding (`OPT = 1`, `VAR = 2`, `POS = 4`, `KW = 8`) preserves under
/// integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Kind(u8);

impl Kind {
    /// A required parameter accepted by position or by keyword.
    ///
    /// This is the kind of an unannotated parameter, matching `def f(a): ...`.
    #[must_use]
    pub const fn positional_or_keyword() -> Self {
        Self(POS | KW)
    }

    /// A required positional-only parameter, as before `/` in a Python
    /// signature.
    #[must_use]
    pub const fn positional_only() -> Self {
        Self(POS)
    }

    /// A required keyword-only parameter, as after `*` in a Python signature.
    #[must_use]
    pub const fn keyword_only() -> Self {
        Self(KW)
    }

    /// The variadic positional parameter (`*args`).
    #[must_use]
    pub const fn variadic_positional() -> Self {
        Self(POS | VAR)
    }

    /// The variadic keyword parameter (`**kwargs`).
    #[must_use]
    pub const fn variadic_keyword() -> Self {
        Self(KW | VAR)
    }

    /// Adds the optional flag. Modifier transitions only ever add flags;
    /// removing one is not representable.
    #[must_use]
    pub const fn with_opt(self) -> Self {
        Self(self.0 | OPT)
    }

    /// Restricts a positional-or-keyword kind to positional-only, keeping the
    /// optional flag.
    #[must_use]
    pub const fn as_positional_only(self) -> Self {
        Self((self.0 & !KW) | POS)
    }

    /// Restricts a positional-or-keyword kind to keyword-only, keeping the
    /// optional flag.
    #[must_use]
    pub const fn as_keyword_only(self) -> Self {
        Self((self.0 & !POS) | KW)
    }

    /// True if the parameter can only be supplied by position.
    #[must_use]
    pub const fn pos_only(self) -> bool {
        self.0 & !OPT == POS
    }

    /// True if the parameter can be supplied by position (and is not
    /// variadic).
    #[must_use]
    pub const fn pos(self) -> bool {
        self.0 & (VAR | POS) == POS
    }

    /// True if this is the `*args` parameter.
    #[must_use]
    pub const fn variadic_pos(self) -> bool {
        self.0 == POS | VAR
    }

    /// True if the parameter can only be supplied by keyword.
    #[must_use]
    pub const fn kw_only(self) -> bool {
        self.0 & !OPT == KW
    }

    /// True if the parameter can be supplied by keyword (and is not
    /// variadic).
    #[must_use]
    pub const fn kw(self) -> bool {
        self.0 & (VAR | KW) == KW
    }

    /// True if this is the `**kwargs` parameter.
    #[must_use]
    pub const fn variadic_kw(self) -> bool {
        self.0 == KW | VAR
    }

    /// True if the parameter has a default value.
    #[must_use]
    pub const fn optional(self) -> bool {
        self.0 & OPT != 0
    }

    /// True for `*args` and `**kwargs`.
    #[must_use]
    pub const fn variadic(self) -> bool {
        self.0 & VAR != 0
    }

    /// True if the parameter must receive a value: neither optional nor
    /// variadic.
    #[must_use]
    pub const fn required(self) -> bool {
        !self.optional() && !self.variadic()
    }

    /// Canonical position of this kind within a parameter list. Lower stages
    /// must appear before higher ones.
    pub(crate) const fn stage(self) -> u8 {
        if self.pos_only() {
            0
        } else if self.pos() {
            1
        } else if self.variadic_pos() {
            2
        } else if self.kw_only() {
            3
        } else {
            4
        }
    }
}

/// Checks that a parameter-kind list respects the canonical ordering:
/// positional-only, then positional-or-keyword, then `*args`, then
/// keyword-only, then `**kwargs`, with required parameters preceding optional
/// ones within the positional groups.
#[must_use]
pub(crate) const fn kinds_in_canonical_order(kinds: &[Kind]) -> bool {
    let mut stage = 0u8;
    let mut seen_opt_positional = false;
    let mut i = 0;
    while i < kinds.len() {
        let kind = kinds[i];
        let s = kind.stage();
        if s < stage {
            return false;
        }
        stage = s;
        if kind.pos() {
            if kind.optional() {
                seen_opt_positional = true;
            } else if seen_opt_positional {
                return false;
            }
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_ordering_is_normative() {
        let pos = Kind::positional_only();
        let pos_opt = pos.with_opt();
        let args = Kind::variadic_positional();
        let kw = Kind::keyword_only();
        let kw_opt = kw.with_opt();
        let kwargs = Kind::variadic_keyword();
        assert!(pos < pos_opt);
        assert!(pos_opt < args);
        assert!(args < kw);
        assert!(kw < kw_opt);
        assert!(kw_opt < kwargs);
    }

    #[test]
    fn predicates() {
        let plain = Kind::positional_or_keyword();
        assert!(plain.pos() && plain.kw());
        assert!(!plain.pos_only() && !plain.kw_only());
        assert!(!plain.variadic() && !plain.optional());
        assert!(plain.required());

        let opt = plain.with_opt();
        assert!(opt.optional() && !opt.required());
        assert!(opt.pos() && opt.kw());

        assert!(Kind::positional_only().pos_only());
        assert!(Kind::positional_only().with_opt().pos_only());
        assert!(Kind::keyword_only().kw_only());
        assert!(Kind::variadic_positional().variadic_pos());
        assert!(!Kind::variadic_positional().pos());
        assert!(Kind::variadic_keyword().variadic_kw());
        assert!(!Kind::variadic_keyword().kw());
    }

    #[test]
    fn canonical_order_check() {
        let ok = [
            Kind::positional_only(),
            Kind::positional_or_keyword(),
            Kind::positional_or_keyword().with_opt(),
            Kind::variadic_positional(),
            Kind::keyword_only(),
            Kind::variadic_keyword(),
        ];
        assert!(kinds_in_canonical_order(&ok));

        // keyword-only before positional
        let bad = [Kind::keyword_only(), Kind::positional_or_keyword()];
        assert!(!kinds_in_canonical_order(&bad));

        // required positional after optional positional
        let bad = [
            Kind::positional_or_keyword().with_opt(),
            Kind::positional_or_keyword(),
        ];
        assert!(!kinds_in_canonical_order(&bad));

        // required keyword-only after optional keyword-only is fine
        let ok = [
            Kind::variadic_positional(),
            Kind::keyword_only().with_opt(),
            Kind::keyword_only(),
        ];
        assert!(kinds_in_canonical_order(&ok));
    }
}
