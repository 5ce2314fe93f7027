//! Comprehension adaptor.
//!
//! Maps a callable across a sequence of values with Python's comprehension
//! semantics: when a stage returns a list, its elements are flattened one
//! level into the output, so an empty list drops the element entirely and a
//! nested comprehension composes like a filter.

use crate::{
    callargs::CallArg,
    error::RunResult,
    function::{Callable, call},
    value::Value,
};

/// A lazily evaluated mapping of `func` over `values`.
///
/// Yields `RunResult<Value>`: invoking the callable can fail, and the first
/// failure ends the iteration. The adaptor borrows its backing slice, so a
/// fresh run can always be taken with [`restart`](Comprehension::restart).
pub struct Comprehension<'a, C: Callable + ?Sized> {
    values: &'a [Value],
    func: &'a C,
    next: usize,
    pending: std::vec::IntoIter<Value>,
}

/// Applies `func` across `values`, flattening one level of list results.
pub fn comprehend<'a, C: Callable + ?Sized>(values: &'a [Value], func: &'a C) -> Comprehension<'a, C> {
    Comprehension {
        values,
        func,
        next: 0,
        pending: Vec::new().into_iter(),
    }
}

impl<'a, C: Callable + ?Sized> Comprehension<'a, C> {
    /// A fresh iteration over the same backing values.
    #[must_use]
    pub fn restart(&self) -> Comprehension<'a, C> {
        comprehend(self.values, self.func)
    }

    /// Runs the comprehension to completion.
    pub fn collect_values(self) -> RunResult<Vec<Value>> {
        self.collect()
    }
}

impl<C: Callable + ?Sized> Iterator for Comprehension<'_, C> {
    type Item = RunResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.pending.next() {
                return Some(Ok(value));
            }
            let source = self.values.get(self.next)?;
            self.next += 1;
            match call(self.func, vec![CallArg::Pos(source.clone())]) {
                Ok(Value::List(items)) => self.pending = items.into_iter(),
                Ok(value) => return Some(Ok(value)),
                Err(err) => {
                    // poison the iterator so the failure is final
                    self.next = self.values.len();
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        function::DynFn,
        param::Param,
        signature::Signature,
        value::ValueType,
    };

    fn unary(name: &str, body: impl Fn(Vec<Value>) -> RunResult<Value> + 'static) -> DynFn {
        let sig = Signature::new(
            name,
            vec![Param::new("x", ValueType::Int).unwrap()],
            ValueType::Any,
        )
        .unwrap();
        DynFn::new(name, sig, body)
    }

    #[test]
    fn maps_scalars() {
        let double = unary("double", |args| match args[0] {
            Value::Int(x) => Ok(Value::Int(x * 2)),
            _ => unreachable!(),
        });
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let out = comprehend(&values, &double).collect_values().unwrap();
        assert_eq!(out, vec![Value::Int(2), Value::Int(4), Value::Int(6)]);
    }

    #[test]
    fn flattens_one_level_and_filters_empties() {
        // keep evens, once each; odds map to an empty list and vanish
        let evens = unary("evens", |args| match args[0] {
            Value::Int(x) if x % 2 == 0 => Ok(Value::List(vec![Value::Int(x)])),
            Value::Int(_) => Ok(Value::List(vec![])),
            _ => unreachable!(),
        });
        let values: Vec<Value> = (1..=6).map(Value::Int).collect();
        let out = comprehend(&values, &evens).collect_values().unwrap();
        assert_eq!(out, vec![Value::Int(2), Value::Int(4), Value::Int(6)]);

        // only one level is flattened
        let wrap = unary("wrap", |args| {
            Ok(Value::List(vec![Value::List(vec![args[0].clone()])]))
        });
        let values = vec![Value::Int(7)];
        let out = comprehend(&values, &wrap).collect_values().unwrap();
        assert_eq!(out, vec![Value::List(vec![Value::Int(7)])]);
    }

    #[test]
    fn restart_iterates_again() {
        let identity = unary("identity", |mut args| Ok(args.remove(0)));
        let values = vec![Value::Int(1), Value::Int(2)];
        let first = comprehend(&values, &identity);
        let restarted = first.restart();
        assert_eq!(first.collect_values().unwrap(), restarted.collect_values().unwrap());
    }
}
