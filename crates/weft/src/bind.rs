//! The binding plan and the merge.
//!
//! [`Bind::new`] runs the structural predicate battery over a call site's
//! canonical arguments: positional and keyword sources are resolved to their
//! target slots, conflicts and unknown names are rejected, required coverage
//! is proven, and every non-pack source is type checked. Nothing about the
//! target function has run yet; a failed predicate costs nothing.
//!
//! [`Bind::merge`] then walks the target parameter list once, selecting for
//! each slot from the partial tuple, the resolved sources, the packs, or the
//! defaults, and emits the final ordered argument list. Pack-induced
//! failures (exhaustion, collisions, element types) are the only errors that
//! can surface here, and they do so before the target function is invoked.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{
    callargs::CallArgs,
    defaults::Defaults,
    error::{Error, RunResult},
    packs::{KwPack, PosPack},
    partial::Partial,
    signature::Signature,
    value::Value,
};

/// A validated call plan: every structural predicate has passed.
#[derive(Debug)]
pub struct Bind<'a> {
    sig: &'a Signature,
    defaults: &'a Defaults,
    partial: &'a Partial,
    positional: Vec<Value>,
    /// Target slot for each positional source, in order. Strictly
    /// non-decreasing; overflow sources all map to the `*args` index.
    pos_targets: Vec<usize>,
    keywords: Vec<(String, Value)>,
    /// Target slot for each keyword source; `None` routes to `**kwargs`.
    kw_targets: Vec<Option<usize>>,
    star: Option<PosPack>,
    star_star: Option<KwPack>,
}

impl<'a> Bind<'a> {
    /// Builds the plan, running the full predicate battery.
    pub fn new(
        sig: &'a Signature,
        defaults: &'a Defaults,
        partial: &'a Partial,
        args: CallArgs,
    ) -> RunResult<Self> {
        let covered = partial.covered_mask(sig);
        let (positional, keywords, star, star_star) = args.into_parts();

        // resolve positional sources to slots, skipping partial-covered ones
        let mut pos_targets = Vec::with_capacity(positional.len());
        let mut pos_bits = 0u64;
        let mut slot = 0usize;
        for value in &positional {
            while slot < sig.n_pos() && covered & (1 << slot) != 0 {
                slot += 1;
            }
            let index = if slot < sig.n_pos() {
                pos_bits |= 1 << slot;
                slot += 1;
                slot - 1
            } else if let Some(args_idx) = sig.args_idx() {
                args_idx
            } else {
                return Err(Error::excess_positional(positional.len(), sig.n_pos()));
            };
            let param = sig.param(index);
            if !param.ty().accepts(value.type_of()) {
                return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
            }
            pos_targets.push(index);
        }

        // resolve keyword sources by name
        let mut kw_targets = Vec::with_capacity(keywords.len());
        let mut kw_bits = 0u64;
        for (name, value) in &keywords {
            let target = sig
                .index_of(name)
                .filter(|&i| sig.param(i).kind().kw() && !sig.param(i).kind().variadic());
            match target {
                Some(index) => {
                    if covered & (1 << index) != 0 || pos_bits & (1 << index) != 0 {
                        return Err(Error::duplicate_value(name));
                    }
                    let param = sig.param(index);
                    if !param.ty().accepts(value.type_of()) {
                        return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
                    }
                    kw_bits |= 1 << index;
                    kw_targets.push(Some(index));
                }
                None => {
                    let Some(kwargs_idx) = sig.kwargs_idx() else {
                        return Err(Error::unknown_keyword(name));
                    };
                    if partial
                        .entries_at(kwargs_idx)
                        .any(|e| e.name() == Some(name.as_str()))
                    {
                        return Err(Error::duplicate_value(name));
                    }
                    kw_targets.push(None);
                }
            }
        }

        // every required parameter must be covered, or reachable via a pack
        let satisfied = covered | pos_bits | kw_bits;
        for (i, param) in sig.params().iter().enumerate() {
            if sig.required() & (1 << i) == 0 || satisfied & (1 << i) != 0 {
                continue;
            }
            let pack_reachable = (param.kind().pos() && star.is_some())
                || (param.kind().kw() && star_star.is_some());
            if !pack_reachable {
                return Err(missing(sig, i));
            }
        }

        Ok(Self {
            sig,
            defaults,
            partial,
            positional,
            pos_targets,
            keywords,
            kw_targets,
            star,
            star_star,
        })
    }

    /// Walks the target parameter list and emits the merged argument list.
    ///
    /// The result always has exactly `sig.size()` entries, one per declared
    /// parameter; a `*args` slot holds a [`Value::List`], a `**kwargs` slot a
    /// [`Value::Map`], each populated partials first, then sources, then pack
    /// contents.
    pub fn merge(self) -> RunResult<Vec<Value>> {
        let Self {
            sig,
            defaults,
            partial,
            positional,
            pos_targets,
            keywords,
            kw_targets,
            mut star,
            mut star_star,
        } = self;

        let mut positional = positional.into_iter();
        let mut j = 0usize;
        let mut kw_values: SmallVec<[Option<(String, Value)>; 4]> =
            keywords.into_iter().map(Some).collect();

        let mut out = Vec::with_capacity(sig.size());
        for (i, param) in sig.params().iter().enumerate() {
            // *args: consecutive partials, then remaining positional
            // sources, then the drained pack
            if sig.args_idx() == Some(i) {
                let mut list: Vec<Value> =
                    partial.entries_at(i).map(|e| e.value().clone()).collect();
                while j < pos_targets.len() && pos_targets[j] == i {
                    list.push(positional.next().expect("one source per target"));
                    j += 1;
                }
                if let Some(pack) = star.as_mut() {
                    while let Some(value) = pack.value() {
                        if !param.ty().accepts(value.type_of()) {
                            return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
                        }
                        list.push(value);
                    }
                }
                out.push(Value::List(list));
                continue;
            }

            // **kwargs: consecutive partials by recorded name, then
            // unmatched keyword sources, then the drained pack
            if sig.kwargs_idx() == Some(i) {
                let mut map = IndexMap::new();
                for entry in partial.entries_at(i) {
                    let name = entry.name().expect("kwargs-bound entries carry names");
                    map.insert(name.to_owned(), entry.value().clone());
                }
                for (k, target) in kw_targets.iter().enumerate() {
                    if target.is_none()
                        && let Some((name, value)) = kw_values[k].take()
                    {
                        map.insert(name, value);
                    }
                }
                if let Some(pack) = star_star.as_mut() {
                    for (name, value) in pack.drain() {
                        if map.contains_key(&name) {
                            return Err(Error::conflicting_value(&name));
                        }
                        if !param.ty().accepts(value.type_of()) {
                            return Err(Error::type_mismatch(param.name(), param.ty(), value.type_of()));
                        }
                        map.insert(name, value);
                    }
                }
                out.push(Value::Map(map));
                continue;
            }

            let name = param.name();
            let pack_has_name =
                !name.is_empty() && star_star.as_ref().is_some_and(|pack| pack.contains(name));

            // partial binding
            if let Some(entry) = partial.entries_at(i).next() {
                if pack_has_name {
                    return Err(Error::conflicting_value(name));
                }
                out.push(entry.value().clone());
                continue;
            }

            // positional source
            if j < pos_targets.len() && pos_targets[j] == i {
                if pack_has_name {
                    return Err(Error::conflicting_value(name));
                }
                out.push(positional.next().expect("one source per target"));
                j += 1;
                continue;
            }

            // positional pack extraction
            if param.kind().pos() && star.as_ref().is_some_and(PosPack::has_value) {
                if kw_targets.contains(&Some(i)) {
                    return Err(Error::duplicate_value(name));
                }
                if pack_has_name {
                    return Err(Error::conflicting_value(name));
                }
                let value = star.as_mut().and_then(PosPack::value).expect("pack has a value");
                if !param.ty().accepts(value.type_of()) {
                    return Err(Error::type_mismatch(name, param.ty(), value.type_of()));
                }
                out.push(value);
                continue;
            }

            // keyword source
            if param.kind().kw()
                && let Some(k) = kw_targets.iter().position(|t| *t == Some(i))
            {
                let (_, value) = kw_values[k].take().expect("keyword sources are consumed once");
                out.push(value);
                continue;
            }

            // keyword pack extraction
            if param.kind().kw() && pack_has_name {
                let value = star_star
                    .as_mut()
                    .and_then(|pack| pack.extract(name))
                    .expect("pack contains the name");
                if !param.ty().accepts(value.type_of()) {
                    return Err(Error::type_mismatch(name, param.ty(), value.type_of()));
                }
                out.push(value);
                continue;
            }

            // default
            if param.kind().optional()
                && let Some(value) = defaults.find(i)
            {
                out.push(value.clone());
                continue;
            }

            return Err(missing(sig, i));
        }

        if let Some(pack) = &star {
            pack.validate()?;
        }
        if let Some(pack) = &star_star {
            pack.validate()?;
        }
        debug_assert_eq!(out.len(), sig.size());
        Ok(out)
    }
}

fn missing(sig: &Signature, index: usize) -> Error {
    let name = sig.param(index).name();
    if name.is_empty() {
        Error::new(
            crate::error::ErrorKind::MissingParameter,
            format!("missing parameter at index {index}"),
        )
    } else {
        Error::missing_parameter(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        callargs::{CallArg, kw, pos, star, star_star},
        error::ErrorKind,
        param::Param,
        value::ValueType,
    };

    fn bind_and_merge(sig: &Signature, args: Vec<CallArg>) -> RunResult<Vec<Value>> {
        let defaults = Defaults::default();
        let partial = Partial::empty();
        Bind::new(sig, &defaults, &partial, CallArgs::new(args)?)?.merge()
    }

    fn three_pos() -> Signature {
        Signature::new(
            "f",
            vec![
                Param::new("a", ValueType::Int).unwrap(),
                Param::new("b", ValueType::Int).unwrap(),
                Param::new("c", ValueType::Int).unwrap(),
            ],
            ValueType::Int,
        )
        .unwrap()
    }

    #[test]
    fn positional_and_keyword_equivalence() {
        let sig = three_pos();
        let by_pos = bind_and_merge(&sig, vec![pos(1), pos(2), pos(3)]).unwrap();
        let by_name = bind_and_merge(&sig, vec![pos(1), kw("c", 3), kw("b", 2)]).unwrap();
        assert_eq!(by_pos, by_name);
        assert_eq!(by_pos, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn pack_saturation() {
        let sig = three_pos();
        let merged = bind_and_merge(&sig, vec![star([1, 2, 3])]).unwrap();
        assert_eq!(merged, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

        let err = bind_and_merge(&sig, vec![star([1, 2])]).unwrap_err();
        assert_eq!(err.message(), "missing parameter 'c'");

        let err = bind_and_merge(&sig, vec![star([1, 2, 3, 4])]).unwrap_err();
        assert_eq!(err.message(), "too many positional arguments, remaining: [4]");
    }

    #[test]
    fn keyword_pack_collision() {
        let sig = Signature::new(
            "g",
            vec![
                Param::new("x", ValueType::Int).unwrap(),
                Param::new("y", ValueType::Int).unwrap(),
            ],
            ValueType::Int,
        )
        .unwrap();
        let err = bind_and_merge(&sig, vec![pos(1), star_star([("x", 2)])]).unwrap_err();
        assert_eq!(err.message(), "conflicting value for parameter 'x'");

        let merged = bind_and_merge(&sig, vec![pos(1), star_star([("y", 2)])]).unwrap();
        assert_eq!(merged, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn structural_errors_precede_the_merge() {
        let sig = three_pos();
        let err = bind_and_merge(&sig, vec![pos(1), pos(2), pos(3), pos(4)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExcessPositional);

        let err = bind_and_merge(&sig, vec![pos(1), kw("a", 2), kw("c", 3)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateValue);

        let err = bind_and_merge(&sig, vec![pos(1), pos(2), kw("z", 3)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownKeyword);

        let err = bind_and_merge(&sig, vec![pos(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);

        let err = bind_and_merge(&sig, vec![pos(1), pos("two"), pos(3)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn zero_parameter_signature() {
        let sig = Signature::new("z", vec![], ValueType::NoneType).unwrap();
        assert_eq!(bind_and_merge(&sig, vec![]).unwrap(), Vec::<Value>::new());
        assert!(bind_and_merge(&sig, vec![pos(1)]).is_err());
        assert!(bind_and_merge(&sig, vec![kw("a", 1)]).is_err());
        assert!(bind_and_merge(&sig, vec![star([1])]).is_err());
        assert!(bind_and_merge(&sig, vec![star_star([("a", 1)])]).is_err());
    }

    #[test]
    fn positional_only_rejects_keyword_supply() {
        let sig = Signature::new(
            "f",
            vec![Param::new("a", ValueType::Int).unwrap().pos()],
            ValueType::Int,
        )
        .unwrap();
        let err = bind_and_merge(&sig, vec![kw("a", 1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownKeyword);
    }

    #[test]
    fn variadic_absorption_order() {
        let sig = Signature::new(
            "h",
            vec![Param::args("args").unwrap(), Param::kwargs("kwargs").unwrap()],
            ValueType::NoneType,
        )
        .unwrap();
        let merged = bind_and_merge(
            &sig,
            vec![pos(1), pos(2), star([3, 4]), kw("k", 5), star_star([("m", 6)])],
        )
        .unwrap();
        assert_eq!(
            merged[0],
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)])
        );
        let Value::Map(map) = &merged[1] else {
            panic!("kwargs slot is a map")
        };
        let entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(entries, vec![("k", Value::Int(5)), ("m", Value::Int(6))]);
    }

    #[test]
    fn partial_values_come_first_in_variadics() {
        let sig = Signature::new(
            "h",
            vec![Param::args("args").unwrap()],
            ValueType::NoneType,
        )
        .unwrap();
        let (partial, sig) = Partial::bind(&sig, &Partial::empty(), vec![pos(0)]).unwrap();
        let defaults = Defaults::default();
        let merged = Bind::new(
            &sig,
            &defaults,
            &partial,
            CallArgs::new(vec![pos(1), pos(2), star([3, 4])]).unwrap(),
        )
        .unwrap()
        .merge()
        .unwrap();
        assert_eq!(
            merged[0],
            Value::List(vec![
                Value::Int(0),
                Value::Int(1),
                Value::Int(2),
                Value::Int(3),
                Value::Int(4)
            ])
        );
    }

    #[test]
    fn optional_skipped_by_name() {
        let sig = Signature::new(
            "p",
            vec![
                Param::new("a", ValueType::Int).unwrap(),
                Param::new("b", ValueType::Int).unwrap().opt(),
                Param::new("c", ValueType::Int).unwrap().kw().opt(),
            ],
            ValueType::Int,
        )
        .unwrap();
        let defaults = Defaults::new(&sig, vec![kw("b", 2), kw("c", 3)]).unwrap();
        let partial = Partial::empty();
        let merged = Bind::new(
            &sig,
            &defaults,
            &partial,
            CallArgs::new(vec![pos(1), kw("c", 9)]).unwrap(),
        )
        .unwrap()
        .merge()
        .unwrap();
        assert_eq!(merged, vec![Value::Int(1), Value::Int(2), Value::Int(9)]);
    }

    #[test]
    fn keyword_source_conflicts_with_pack_fill() {
        // the pack feeds 'b' positionally while a keyword also names it
        let sig = Signature::new(
            "f",
            vec![
                Param::new("a", ValueType::Int).unwrap(),
                Param::new("b", ValueType::Int).unwrap(),
            ],
            ValueType::Int,
        )
        .unwrap();
        let err = bind_and_merge(&sig, vec![star([1, 2]), kw("b", 3)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateValue);

        // with only one packed value the keyword fills 'b' cleanly
        let merged = bind_and_merge(&sig, vec![star([1]), kw("b", 3)]).unwrap();
        assert_eq!(merged, vec![Value::Int(1), Value::Int(3)]);
    }
}
