//! The callable surface.
//!
//! [`DynFn`] wraps a native Rust function behind a declared [`Signature`];
//! [`Def`] is the partial-carrying wrapper returned by [`def`], extended with
//! [`Def::bind`] and invoked through the accumulated partial. Both implement
//! [`Callable`], the seam through which chains and comprehensions drive
//! invocation.

use std::fmt;
use std::rc::Rc;

use crate::{
    bind::Bind,
    callargs::{CallArg, CallArgs},
    defaults::Defaults,
    error::RunResult,
    partial::Partial,
    signature::Signature,
    value::Value,
};

/// The shape of a native function body: receives the merged argument list,
/// exactly matching the declared parameter list.
pub type NativeFn = dyn Fn(Vec<Value>) -> RunResult<Value>;

/// Anything the engine can invoke.
///
/// The contract is one-way: [`call_merged`](Self::call_merged) only ever
/// receives an argument list produced by a successful merge against
/// [`signature`](Self::signature), so the body can index slots directly.
pub trait Callable {
    fn name(&self) -> &str;

    /// The declared parameter list, including any bound-to annotations.
    fn signature(&self) -> &Signature;

    /// Defaults for the signature's optional parameters.
    fn defaults(&self) -> &Defaults;

    /// Values bound by partial application; empty for plain functions.
    fn partial(&self) -> &Partial;

    /// Invokes the underlying function on an already-merged argument list.
    fn call_merged(&self, merged: Vec<Value>) -> RunResult<Value>;
}

/// Checks preconditions, merges, and invokes.
///
/// Binding uses the callable's own partial and defaults; for a plain
/// function both are empty and the sources must cover every required
/// parameter on their own.
pub fn call<C: Callable + ?Sized>(f: &C, args: Vec<CallArg>) -> RunResult<Value> {
    CallArgs::new(args)?.apply(f)
}

/// Like [`call`], with the supplied defaults in place of the callable's own.
pub fn call_with<C: Callable + ?Sized>(
    defaults: &Defaults,
    f: &C,
    args: Vec<CallArg>,
) -> RunResult<Value> {
    let args = CallArgs::new(args)?;
    let merged = Bind::new(f.signature(), defaults, f.partial(), args)?.merge()?;
    f.call_merged(merged)
}

/// A named native function with a declared signature.
#[derive(Clone)]
pub struct DynFn {
    name: String,
    sig: Signature,
    defaults: Defaults,
    partial: Partial,
    body: Rc<NativeFn>,
}

impl DynFn {
    /// Wraps a function whose signature has no optional parameters.
    ///
    /// For signatures with optionals, use
    /// [`with_defaults`](Self::with_defaults); a call that needs a missing
    /// default fails with a missing-parameter error.
    pub fn new(
        name: &str,
        sig: Signature,
        body: impl Fn(Vec<Value>) -> RunResult<Value> + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            sig,
            defaults: Defaults::default(),
            partial: Partial::empty(),
            body: Rc::new(body),
        }
    }

    /// Wraps a function together with the defaults for its optional
    /// parameters, given as a keyword-style argument list.
    pub fn with_defaults(
        name: &str,
        sig: Signature,
        default_args: Vec<CallArg>,
        body: impl Fn(Vec<Value>) -> RunResult<Value> + 'static,
    ) -> RunResult<Self> {
        let defaults = Defaults::new(&sig, default_args)?;
        Ok(Self {
            name: name.to_owned(),
            sig,
            defaults,
            partial: Partial::empty(),
            body: Rc::new(body),
        })
    }

    /// Invokes with full precondition checks. Equivalent to [`call`].
    pub fn call(&self, args: Vec<CallArg>) -> RunResult<Value> {
        call(self, args)
    }
}

impl fmt::Debug for DynFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynFn")
            .field("name", &self.name)
            .field("signature", &self.sig)
            .finish_non_exhaustive()
    }
}

impl Callable for DynFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    fn partial(&self) -> &Partial {
        &self.partial
    }

    fn call_merged(&self, merged: Vec<Value>) -> RunResult<Value> {
        (self.body)(merged)
    }
}

/// A partial-carrying callable produced by [`def`].
///
/// Each [`bind`](Self::bind) produces a new wrapper with an updated
/// signature: the affected annotations carry the bound values, and the
/// original wrapper is untouched, so partials can be shared and extended
/// concurrently along different branches.
#[derive(Clone)]
pub struct Def {
    func: DynFn,
    sig: Signature,
    defaults: Defaults,
    partial: Partial,
}

impl Def {
    /// Binds further arguments, returning the extended wrapper.
    ///
    /// `p.bind(w)` then calling with `rest` is equivalent to calling `p`
    /// with `w` followed by `rest`, whenever both are well-formed.
    pub fn bind(&self, args: Vec<CallArg>) -> RunResult<Self> {
        let (partial, sig) = Partial::bind(&self.sig, &self.partial, args)?;
        Ok(Self {
            func: self.func.clone(),
            sig,
            defaults: self.defaults.clone(),
            partial,
        })
    }

    /// Returns a fresh wrapper with no bindings.
    #[must_use]
    pub fn unbind(&self) -> Self {
        Self {
            func: self.func.clone(),
            sig: self.func.sig.unbound(),
            defaults: self.defaults.clone(),
            partial: Partial::empty(),
        }
    }

    /// Invokes through the accumulated partial.
    pub fn call(&self, args: Vec<CallArg>) -> RunResult<Value> {
        call(self, args)
    }
}

impl fmt::Debug for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Def")
            .field("name", &self.func.name)
            .field("signature", &self.sig)
            .field("partial", &self.partial)
            .finish()
    }
}

impl Callable for Def {
    fn name(&self) -> &str {
        &self.func.name
    }

    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    fn partial(&self) -> &Partial {
        &self.partial
    }

    fn call_merged(&self, merged: Vec<Value>) -> RunResult<Value> {
        self.func.call_merged(merged)
    }
}

/// Builds a partial-carrying wrapper over a function, with nothing bound.
#[must_use]
pub fn def(f: &DynFn) -> Def {
    Def {
        func: f.clone(),
        sig: f.sig.clone(),
        defaults: f.defaults.clone(),
        partial: Partial::empty(),
    }
}

/// Builds a partial-carrying wrapper with the supplied defaults in place of
/// the function's own.
#[must_use]
pub fn def_with(defaults: Defaults, f: &DynFn) -> Def {
    Def {
        func: f.clone(),
        sig: f.sig.clone(),
        defaults,
        partial: Partial::empty(),
    }
}
