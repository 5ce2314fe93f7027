//! Function chains.
//!
//! A [`Chain`] is a right-folded composition: `chain(f, g, h)(x, y)` is
//! `h(g(f(x, y)))`. The first stage receives the whole call-site argument
//! list; every later stage receives its predecessor's return value as one
//! positional argument. Composition is spelled with `>>` and flattens in
//! every arrangement: callable with callable, chain with callable, callable
//! with chain, and chain with chain.

use std::fmt;
use std::ops::Shr;
use std::rc::Rc;

use crate::{
    callargs::CallArg,
    defaults::Defaults,
    error::{Error, ErrorKind, RunResult},
    function::{Callable, Def, DynFn, call},
    partial::Partial,
    signature::Signature,
    value::Value,
};

/// An ordered composition of callables.
#[derive(Clone)]
pub struct Chain {
    name: String,
    stages: Vec<Rc<dyn Callable>>,
}

impl Chain {
    fn from_stages(stages: Vec<Rc<dyn Callable>>) -> Self {
        debug_assert!(!stages.is_empty());
        let name = stages
            .iter()
            .map(|s| s.name().to_owned())
            .collect::<Vec<_>>()
            .join(" >> ");
        Self { name, stages }
    }

    /// Number of component callables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The component callable at `index`.
    #[must_use]
    pub fn stage(&self, index: usize) -> &dyn Callable {
        self.stages[index].as_ref()
    }

    /// Checks that every stage past the first can accept exactly one
    /// positional argument, so a mis-shaped chain fails before any stage
    /// runs.
    fn validate(&self) -> RunResult<()> {
        for stage in &self.stages[1..] {
            let sig = stage.signature();
            let covered = stage.partial().covered_mask(sig);
            let uncovered_required = sig.required() & !covered;
            let feeds: Vec<usize> = (0..sig.size())
                .filter(|&i| {
                    sig.param(i).kind().pos() && covered & (1 << i) == 0
                })
                .collect();
            let can_take_one = !feeds.is_empty() || sig.has_args();
            let required_fits = match uncovered_required.count_ones() {
                0 => true,
                1 => feeds.first().is_some_and(|&i| uncovered_required & (1 << i) != 0),
                _ => false,
            };
            if !can_take_one || !required_fits {
                return Err(Error::new(
                    ErrorKind::NotCallable,
                    format!("'{}' cannot be invoked on a single piped value", stage.name()),
                ));
            }
        }
        Ok(())
    }

    /// Invokes the chain, checking stage arities first.
    pub fn call(&self, args: Vec<CallArg>) -> RunResult<Value> {
        call(self, args)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Callable for Chain {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        self.stages[0].signature()
    }

    fn defaults(&self) -> &Defaults {
        self.stages[0].defaults()
    }

    fn partial(&self) -> &Partial {
        self.stages[0].partial()
    }

    fn call_merged(&self, merged: Vec<Value>) -> RunResult<Value> {
        self.validate()?;
        let mut value = self.stages[0].call_merged(merged)?;
        for stage in &self.stages[1..] {
            value = call(stage.as_ref(), vec![CallArg::Pos(value)])?;
        }
        Ok(value)
    }
}

/// Conversion into chain stages; the glue behind `>>`.
pub trait IntoChain {
    fn into_stages(self) -> Vec<Rc<dyn Callable>>;
}

impl IntoChain for Chain {
    fn into_stages(self) -> Vec<Rc<dyn Callable>> {
        self.stages
    }
}

impl IntoChain for DynFn {
    fn into_stages(self) -> Vec<Rc<dyn Callable>> {
        vec![Rc::new(self)]
    }
}

impl IntoChain for Def {
    fn into_stages(self) -> Vec<Rc<dyn Callable>> {
        vec![Rc::new(self)]
    }
}

impl<R: IntoChain> Shr<R> for Chain {
    type Output = Chain;

    fn shr(self, next: R) -> Chain {
        let mut stages = self.stages;
        stages.extend(next.into_stages());
        Chain::from_stages(stages)
    }
}

impl<R: IntoChain> Shr<R> for DynFn {
    type Output = Chain;

    fn shr(self, next: R) -> Chain {
        let mut stages = self.into_stages();
        stages.extend(next.into_stages());
        Chain::from_stages(stages)
    }
}

impl<R: IntoChain> Shr<R> for Def {
    type Output = Chain;

    fn shr(self, next: R) -> Chain {
        let mut stages = self.into_stages();
        stages.extend(next.into_stages());
        Chain::from_stages(stages)
    }
}
