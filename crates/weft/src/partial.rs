//! Partial application state.
//!
//! A [`Partial`] owns the values already bound to a subset of a signature's
//! parameters. Binding more arguments produces a new partial plus a new
//! signature whose affected annotations carry the values in their bound-to
//! lists; the original is never mutated, so a partial can be shared freely
//! and extended any number of times.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    callargs::{CallArg, CallArgs},
    error::{Error, ErrorKind, RunResult},
    param::BoundArg,
    signature::Signature,
    value::Value,
};

/// One bound source argument, tied to its target parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialEntry {
    /// Index of the target parameter in the enclosing signature.
    index: usize,
    /// The keyword under which the value was supplied, if any.
    name: Option<String>,
    value: Value,
}

impl PartialEntry {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The bound-argument tuple of a partially applied callable.
///
/// Entries are kept sorted by target index; a variadic target may hold
/// several entries, in the order they were bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partial {
    entries: SmallVec<[PartialEntry; 4]>,
}

impl Partial {
    /// A partial with nothing bound.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[PartialEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bitmask of the non-variadic parameters this partial covers.
    #[must_use]
    pub(crate) fn covered_mask(&self, sig: &Signature) -> u64 {
        let mut mask = 0u64;
        for entry in &self.entries {
            if !sig.param(entry.index).kind().variadic() {
                mask |= 1 << entry.index;
            }
        }
        mask
    }

    /// The entries bound to the parameter at `index`, in binding order.
    pub(crate) fn entries_at(&self, index: usize) -> impl Iterator<Item = &PartialEntry> {
        self.entries.iter().filter(move |entry| entry.index == index)
    }

    /// Extends `base` with further arguments against `sig`, producing the new
    /// partial and the signature with the new values recorded in the affected
    /// annotations' bound-to lists.
    ///
    /// The arguments must satisfy the signature's binding rules, with the
    /// extra restriction that unpacking is not allowed. Positional values
    /// fill uncovered positional slots left to right and overflow into
    /// `*args`; keywords resolve by name and overflow into `**kwargs`.
    pub(crate) fn bind(
        sig: &Signature,
        base: &Self,
        args: Vec<CallArg>,
    ) -> RunResult<(Self, Signature)> {
        let args = CallArgs::new(args)?;
        if args.has_star() || args.has_star_star() {
            return Err(Error::new(
                ErrorKind::BadArgumentOrder,
                "unpacking is not allowed when binding a partial",
            ));
        }
        let (positional, keywords, _, _) = args.into_parts();

        let mut covered = base.covered_mask(sig);
        let mut new_entries: SmallVec<[PartialEntry; 4]> = SmallVec::new();

        // positional values fill uncovered positional slots left to right
        let mut slot = 0usize;
        let given = positional.len();
        for value in positional {
            while slot < sig.n_pos() && covered & (1 << slot) != 0 {
                slot += 1;
            }
            let index = if slot < sig.n_pos() {
                let index = slot;
                slot += 1;
                index
            } else if let Some(args_idx) = sig.args_idx() {
                args_idx
            } else {
                return Err(Error::excess_positional(given, sig.n_pos()));
            };
            let param = sig.param(index);
            if !param.ty().accepts(value.type_of()) {
                return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
            }
            if !param.kind().variadic() {
                covered |= 1 << index;
            }
            new_entries.push(PartialEntry {
                index,
                name: None,
                value,
            });
        }

        for (name, value) in keywords {
            let target = sig
                .index_of(&name)
                .filter(|&i| sig.param(i).kind().kw() && !sig.param(i).kind().variadic());
            let index = if let Some(index) = target {
                if covered & (1 << index) != 0 {
                    return Err(Error::duplicate_value(&name));
                }
                covered |= 1 << index;
                index
            } else if let Some(kwargs_idx) = sig.kwargs_idx() {
                let taken = base
                    .entries_at(kwargs_idx)
                    .chain(new_entries.iter().filter(|e| e.index == kwargs_idx))
                    .any(|e| e.name.as_deref() == Some(name.as_str()));
                if taken {
                    return Err(Error::duplicate_keyword(&name));
                }
                kwargs_idx
            } else {
                return Err(Error::unknown_keyword(&name));
            };
            let param = sig.param(index);
            if !param.ty().accepts(value.type_of()) {
                return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
            }
            new_entries.push(PartialEntry {
                index,
                name: Some(name),
                value,
            });
        }

        // record the new values in the emitted signature's annotations
        let mut new_sig = sig.clone();
        let mut touched: SmallVec<[usize; 4]> = SmallVec::new();
        for entry in &new_entries {
            if !touched.contains(&entry.index) {
                touched.push(entry.index);
            }
        }
        for index in touched {
            let additions: SmallVec<[BoundArg; 2]> = new_entries
                .iter()
                .filter(|e| e.index == index)
                .map(|e| match &e.name {
                    Some(name) => BoundArg::keyword(name.clone(), e.value.clone()),
                    None => BoundArg::positional(e.value.clone()),
                })
                .collect();
            if !additions.is_empty() {
                let rebound = new_sig.param(index).rebind(additions)?;
                new_sig = new_sig.with_param(index, rebound);
            }
        }

        let mut entries = base.entries.clone();
        entries.extend(new_entries);
        entries.sort_by_key(PartialEntry::index);
        Ok((Self { entries }, new_sig))
    }
}
