// ABOUTME: Native set methods: add, remove, discard, pop, clear, copy,
// union, intersection, difference, isdisjoint, issubset, issuperset, update

use super::{check_arity, reject_kwargs};
use crate::error::RuntimeError;
use crate::value::{CallArgs, HashKey, NativeFn, SetStorage, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub const METHODS: &[(&str, NativeFn)] = &[
    ("add", add),
    ("remove", remove),
    ("discard", discard),
    ("pop", pop),
    ("clear", clear),
    ("copy", copy),
    ("union", union),
    ("intersection", intersection),
    ("difference", difference),
    ("isdisjoint", isdisjoint),
    ("issubset", issubset),
    ("issuperset", issuperset),
    ("update", update),
];

fn storage(receiver: &Value) -> &Rc<RefCell<SetStorage>> {
    match receiver {
        Value::Set(items) => items,
        _ => unreachable!("set method bound to non-set receiver"),
    }
}

/// Builds a key set from any iterable argument; elements must be hashable.
fn keys_of(value: &Value) -> Result<SetStorage, RuntimeError> {
    let mut out = SetStorage::default();
    for item in value.iter_elements()? {
        out.insert(HashKey::try_new(item)?);
    }
    Ok(out)
}

fn add(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("add", &args)?;
    check_arity("add", &args, 1, 1)?;
    let key = HashKey::try_new(args.positional[0].clone())?;
    storage(receiver).borrow_mut().insert(key);
    Ok(Value::None)
}

fn remove(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("remove", &args)?;
    check_arity("remove", &args, 1, 1)?;
    let key = HashKey::try_new(args.positional[0].clone())?;
    if storage(receiver).borrow_mut().shift_remove(&key) {
        Ok(Value::None)
    } else {
        Err(RuntimeError::key_error(args.positional[0].repr()))
    }
}

fn discard(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("discard", &args)?;
    check_arity("discard", &args, 1, 1)?;
    let key = HashKey::try_new(args.positional[0].clone())?;
    storage(receiver).borrow_mut().shift_remove(&key);
    Ok(Value::None)
}

fn pop(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("pop", &args)?;
    check_arity("pop", &args, 0, 0)?;
    let popped = storage(receiver).borrow_mut().shift_remove_index(0);
    match popped {
        Some(key) => Ok(key.0),
        None => Err(RuntimeError::key_error("pop from an empty set")),
    }
}

fn clear(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("clear", &args)?;
    check_arity("clear", &args, 0, 0)?;
    storage(receiver).borrow_mut().clear();
    Ok(Value::None)
}

fn copy(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("copy", &args)?;
    check_arity("copy", &args, 0, 0)?;
    Ok(Value::set(storage(receiver).borrow().clone()))
}

fn union(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("union", &args)?;
    let mut result = storage(receiver).borrow().clone();
    for other in &args.positional {
        result.extend(keys_of(other)?);
    }
    Ok(Value::set(result))
}

fn intersection(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("intersection", &args)?;
    let mut result = storage(receiver).borrow().clone();
    for other in &args.positional {
        let keys = keys_of(other)?;
        result.retain(|k| keys.contains(k));
    }
    Ok(Value::set(result))
}

fn difference(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("difference", &args)?;
    let mut result = storage(receiver).borrow().clone();
    for other in &args.positional {
        let keys = keys_of(other)?;
        result.retain(|k| !keys.contains(k));
    }
    Ok(Value::set(result))
}

fn isdisjoint(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("isdisjoint", &args)?;
    check_arity("isdisjoint", &args, 1, 1)?;
    let keys = keys_of(&args.positional[0])?;
    let disjoint = storage(receiver).borrow().iter().all(|k| !keys.contains(k));
    Ok(Value::Bool(disjoint))
}

fn issubset(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("issubset", &args)?;
    check_arity("issubset", &args, 1, 1)?;
    let keys = keys_of(&args.positional[0])?;
    let subset = storage(receiver).borrow().iter().all(|k| keys.contains(k));
    Ok(Value::Bool(subset))
}

fn issuperset(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("issuperset", &args)?;
    check_arity("issuperset", &args, 1, 1)?;
    let keys = keys_of(&args.positional[0])?;
    let this = storage(receiver).borrow();
    Ok(Value::Bool(keys.iter().all(|k| this.contains(k))))
}

fn update(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("update", &args)?;
    for other in &args.positional {
        let keys = keys_of(other)?;
        storage(receiver).borrow_mut().extend(keys);
    }
    Ok(Value::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(values: Vec<Value>) -> Value {
        let mut storage = SetStorage::default();
        for v in values {
            storage.insert(HashKey::try_new(v).unwrap());
        }
        Value::set(storage)
    }

    #[test]
    fn test_add_merges_numeric_groups() {
        let s = set_of(vec![Value::Int(1)]);
        add(&s, CallArgs::positional(vec![Value::Bool(true)])).unwrap();
        add(&s, CallArgs::positional(vec![Value::Float(1.0)])).unwrap();
        assert_eq!(format!("{}", s), "{1}");
    }

    #[test]
    fn test_remove_vs_discard() {
        let s = set_of(vec![Value::Int(1)]);
        discard(&s, CallArgs::positional(vec![Value::Int(9)])).unwrap();
        let err = remove(&s, CallArgs::positional(vec![Value::Int(9)])).unwrap_err();
        assert_eq!(err.describe(), "KeyError: 9");
    }

    #[test]
    fn test_algebra_accepts_any_iterable() {
        let s = set_of(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let other = Value::list(vec![Value::Int(2), Value::Int(4)]);

        let u = union(&s, CallArgs::positional(vec![other.clone()])).unwrap();
        assert_eq!(format!("{}", u), "{1, 2, 3, 4}");

        let i = intersection(&s, CallArgs::positional(vec![other.clone()])).unwrap();
        assert_eq!(format!("{}", i), "{2}");

        let d = difference(&s, CallArgs::positional(vec![other])).unwrap();
        assert_eq!(format!("{}", d), "{1, 3}");
    }

    #[test]
    fn test_subset_superset_disjoint() {
        let s = set_of(vec![Value::Int(1), Value::Int(2)]);
        let big = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(matches!(
            issubset(&s, CallArgs::positional(vec![big.clone()])).unwrap(),
            Value::Bool(true)
        ));
        assert!(matches!(
            issuperset(&s, CallArgs::positional(vec![big])).unwrap(),
            Value::Bool(false)
        ));
        let far = Value::list(vec![Value::Int(9)]);
        assert!(matches!(
            isdisjoint(&s, CallArgs::positional(vec![far])).unwrap(),
            Value::Bool(true)
        ));
    }

    #[test]
    fn test_pop_empty() {
        let s = set_of(vec![]);
        let err = pop(&s, CallArgs::default()).unwrap_err();
        assert_eq!(err.describe(), "KeyError: pop from an empty set");
    }

    #[test]
    fn test_unhashable_element() {
        let s = set_of(vec![]);
        let err = add(&s, CallArgs::positional(vec![Value::list(vec![])])).unwrap_err();
        assert_eq!(err.describe(), "TypeError: unhashable type: 'list'");
    }
}
