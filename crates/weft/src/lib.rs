#![doc = include_str!("../../../README.md")]

mod bind;
mod callargs;
mod chain;
mod comprehension;
mod defaults;
mod error;
mod kind;
mod packs;
mod param;
mod partial;
mod signature;
mod value;

pub mod function;

pub use crate::{
    bind::Bind,
    callargs::{CallArg, CallArgs, kw, pos, star, star_star},
    chain::{Chain, IntoChain},
    comprehension::{Comprehension, comprehend},
    defaults::{DefaultEntry, Defaults},
    error::{Error, ErrorKind, RunResult},
    function::{Callable, Def, DynFn, NativeFn, call, call_with, def, def_with},
    kind::{Kind, MAX_PARAMS},
    packs::{KwPack, PosPack},
    param::{BoundArg, Param},
    partial::{Partial, PartialEntry},
    signature::Signature,
    value::{Value, ValueType},
};
