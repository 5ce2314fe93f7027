//! Default values for optional parameters.
//!
//! A [`Defaults`] tuple owns one value per optional parameter of its
//! enclosing signature. Construction accepts the same argument vocabulary as
//! a call, restricted to the optional sub-signature: positional values fill
//! optionals in declaration order, keywords match optionals by name, and
//! unpacking is prohibited. Errors in a default initializer therefore read
//! exactly like errors in a mis-shaped call.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    callargs::{CallArg, CallArgs},
    error::{Error, ErrorKind, RunResult},
    signature::Signature,
    value::Value,
};

/// One default value, tied back to the enclosing signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultEntry {
    /// Index of the optional parameter in the enclosing signature.
    index: usize,
    name: String,
    value: Value,
}

impl DefaultEntry {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The defaults tuple of a signature: one entry per optional parameter, in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    entries: SmallVec<[DefaultEntry; 4]>,
}

impl Defaults {
    /// Builds the defaults tuple for `sig`.
    ///
    /// Every optional parameter must receive exactly one value; variadic
    /// sources are not allowed. A signature without optional parameters
    /// accepts only the empty list.
    pub fn new(sig: &Signature, args: Vec<CallArg>) -> RunResult<Self> {
        let args = CallArgs::new(args)?;
        if args.has_star() || args.has_star_star() {
            return Err(Error::new(
                ErrorKind::BadDefault,
                "unpacking is not allowed in a defaults tuple",
            ));
        }
        let (positional, keywords, _, _) = args.into_parts();

        let optionals: SmallVec<[usize; 4]> = sig
            .params()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind().optional())
            .map(|(i, _)| i)
            .collect();

        let mut values: SmallVec<[Option<Value>; 4]> = SmallVec::from_elem(None, optionals.len());

        if positional.len() > optionals.len() {
            return Err(Error::excess_positional(positional.len(), optionals.len()));
        }
        for (slot, value) in positional.into_iter().enumerate() {
            let param = sig.param(optionals[slot]);
            if !param.ty().accepts(value.type_of()) {
                return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
            }
            values[slot] = Some(value);
        }

        for (name, value) in keywords {
            let index = sig
                .index_of(&name)
                .filter(|&i| sig.param(i).kind().optional())
                .ok_or_else(|| Error::unknown_keyword(&name))?;
            let slot = optionals
                .iter()
                .position(|&i| i == index)
                .expect("optional parameter is present in the optionals list");
            if values[slot].is_some() {
                return Err(Error::duplicate_value(&name));
            }
            let param = sig.param(index);
            if !param.ty().accepts(value.type_of()) {
                return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
            }
            values[slot] = Some(value);
        }

        let mut entries = SmallVec::with_capacity(optionals.len());
        for (slot, index) in optionals.iter().copied().enumerate() {
            let Some(value) = values[slot].take() else {
                return Err(Error::missing_default(sig.param(index).name()));
            };
            entries.push(DefaultEntry {
                index,
                name: sig.param(index).name().to_owned(),
                value,
            });
        }
        Ok(Self { entries })
    }

    /// The default for the parameter at `index` in the enclosing signature.
    #[must_use]
    pub fn find(&self, index: usize) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.value)
    }

    #[must_use]
    pub fn entries(&self) -> &[DefaultEntry] {
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
}
