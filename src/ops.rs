// ABOUTME: Operator semantics: binary/unary dispatch over value tag pairs,
// membership, indexing, and slicing

use crate::ast::CmpOp;
use crate::error::{RuntimeError, VALUE_ERROR, ZERO_DIVISION_ERROR};
use crate::token::TokenKind;
use crate::value::{compare_values, values_equal, HashKey, Value};
use std::cmp::Ordering;

/// Both operands viewed through the numeric group (bools count as ints),
/// promoted to a common representation.
enum NumPair {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn num_pair(left: &Value, right: &Value) -> Option<NumPair> {
    let as_int = |v: &Value| match v {
        Value::Bool(b) => Some(*b as i64),
        Value::Int(i) => Some(*i),
        _ => None,
    };
    match (as_int(left), as_int(right)) {
        (Some(a), Some(b)) => Some(NumPair::Ints(a, b)),
        _ => {
            let as_float = |v: &Value| match v {
                Value::Bool(b) => Some(*b as i64 as f64),
                Value::Int(i) => Some(*i as f64),
                Value::Float(f) => Some(*f),
                _ => None,
            };
            match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => Some(NumPair::Floats(a, b)),
                _ => None,
            }
        }
    }
}

fn as_int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(*b as i64),
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn unsupported(op: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name()
    ))
}

/// Maps an augmented-assignment token to its base operator.
pub fn augmented_base(kind: TokenKind) -> TokenKind {
    match kind {
        TokenKind::PlusEqual => TokenKind::Plus,
        TokenKind::MinusEqual => TokenKind::Minus,
        TokenKind::StarEqual => TokenKind::Star,
        TokenKind::StarStarEqual => TokenKind::StarStar,
        TokenKind::SlashEqual => TokenKind::Slash,
        TokenKind::SlashSlashEqual => TokenKind::SlashSlash,
        TokenKind::PercentEqual => TokenKind::Percent,
        TokenKind::AmpersandEqual => TokenKind::Ampersand,
        TokenKind::PipeEqual => TokenKind::Pipe,
        TokenKind::CaretEqual => TokenKind::Caret,
        TokenKind::LessLessEqual => TokenKind::LessLess,
        TokenKind::GreaterGreaterEqual => TokenKind::GreaterGreater,
        other => other,
    }
}

// ============================================================================
// Binary operators
// ============================================================================

pub fn binary_op(kind: TokenKind, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match kind {
        TokenKind::Plus => add(left, right),
        TokenKind::Minus => arith("-", left, right, i64::wrapping_sub, |a, b| a - b),
        TokenKind::Star => mul(left, right),
        TokenKind::Slash => div(left, right),
        TokenKind::SlashSlash => floordiv(left, right),
        TokenKind::Percent => modulo(left, right),
        TokenKind::StarStar => power(left, right),
        TokenKind::Ampersand => bitwise("&", left, right, |a, b| a & b),
        TokenKind::Pipe => bitwise("|", left, right, |a, b| a | b),
        TokenKind::Caret => bitwise("^", left, right, |a, b| a ^ b),
        TokenKind::LessLess => shift_left(left, right),
        TokenKind::GreaterGreater => shift_right(left, right),
        _ => Err(RuntimeError::type_error(format!(
            "unsupported binary operator '{:?}'",
            kind
        ))),
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Some(pair) = num_pair(left, right) {
        return Ok(match pair {
            NumPair::Ints(a, b) => Value::Int(a.wrapping_add(b)),
            NumPair::Floats(a, b) => Value::Float(a + b),
        });
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::tuple(items))
        }
        _ => Err(unsupported("+", left, right)),
    }
}

fn arith(
    op: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match num_pair(left, right) {
        Some(NumPair::Ints(a, b)) => Ok(Value::Int(int_op(a, b))),
        Some(NumPair::Floats(a, b)) => Ok(Value::Float(float_op(a, b))),
        None => Err(unsupported(op, left, right)),
    }
}

fn mul(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Some(pair) = num_pair(left, right) {
        return Ok(match pair {
            NumPair::Ints(a, b) => Value::Int(a.wrapping_mul(b)),
            NumPair::Floats(a, b) => Value::Float(a * b),
        });
    }
    let repeat = |count: i64| count.max(0) as usize;
    match (left, right) {
        (Value::Str(s), n) | (n, Value::Str(s)) => match as_int_like(n) {
            Some(count) => Ok(Value::str(s.repeat(repeat(count)))),
            None => Err(unsupported("*", left, right)),
        },
        (Value::List(items), n) | (n, Value::List(items)) => match as_int_like(n) {
            Some(count) => {
                let items = items.borrow();
                let mut out = Vec::with_capacity(items.len() * repeat(count));
                for _ in 0..repeat(count) {
                    out.extend(items.iter().cloned());
                }
                Ok(Value::list(out))
            }
            None => Err(unsupported("*", left, right)),
        },
        (Value::Tuple(items), n) | (n, Value::Tuple(items)) => match as_int_like(n) {
            Some(count) => {
                let mut out = Vec::with_capacity(items.len() * repeat(count));
                for _ in 0..repeat(count) {
                    out.extend(items.iter().cloned());
                }
                Ok(Value::tuple(out))
            }
            None => Err(unsupported("*", left, right)),
        },
        _ => Err(unsupported("*", left, right)),
    }
}

fn div(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match num_pair(left, right) {
        Some(NumPair::Ints(a, b)) => {
            if b == 0 {
                return Err(RuntimeError::new(ZERO_DIVISION_ERROR, "division by zero"));
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        Some(NumPair::Floats(a, b)) => {
            if b == 0.0 {
                return Err(RuntimeError::new(
                    ZERO_DIVISION_ERROR,
                    "float division by zero",
                ));
            }
            Ok(Value::Float(a / b))
        }
        None => Err(unsupported("/", left, right)),
    }
}

fn floordiv(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match num_pair(left, right) {
        Some(NumPair::Ints(a, b)) => {
            if b == 0 {
                return Err(RuntimeError::new(
                    ZERO_DIVISION_ERROR,
                    "integer division or modulo by zero",
                ));
            }
            // Floor toward negative infinity, like Python.
            let q = a.wrapping_div(b);
            let r = a.wrapping_rem(b);
            let q = if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q };
            Ok(Value::Int(q))
        }
        Some(NumPair::Floats(a, b)) => {
            if b == 0.0 {
                return Err(RuntimeError::new(
                    ZERO_DIVISION_ERROR,
                    "float floor division by zero",
                ));
            }
            Ok(Value::Float((a / b).floor()))
        }
        None => Err(unsupported("//", left, right)),
    }
}

fn modulo(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match num_pair(left, right) {
        Some(NumPair::Ints(a, b)) => {
            if b == 0 {
                return Err(RuntimeError::new(
                    ZERO_DIVISION_ERROR,
                    "integer division or modulo by zero",
                ));
            }
            // The result takes the divisor's sign.
            let r = a.wrapping_rem(b);
            let r = if r != 0 && (r < 0) != (b < 0) { r + b } else { r };
            Ok(Value::Int(r))
        }
        Some(NumPair::Floats(a, b)) => {
            if b == 0.0 {
                return Err(RuntimeError::new(ZERO_DIVISION_ERROR, "float modulo"));
            }
            let r = a % b;
            let r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
            Ok(Value::Float(r))
        }
        None => Err(unsupported("%", left, right)),
    }
}

fn power(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match num_pair(left, right) {
        Some(NumPair::Ints(a, b)) => {
            if b < 0 {
                if a == 0 {
                    return Err(RuntimeError::new(
                        ZERO_DIVISION_ERROR,
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Value::Float((a as f64).powi(b.max(i32::MIN as i64) as i32)));
            }
            let exp = u32::try_from(b).unwrap_or(u32::MAX);
            Ok(Value::Int(a.wrapping_pow(exp)))
        }
        Some(NumPair::Floats(a, b)) => {
            if a == 0.0 && b < 0.0 {
                return Err(RuntimeError::new(
                    ZERO_DIVISION_ERROR,
                    "0.0 cannot be raised to a negative power",
                ));
            }
            Ok(Value::Float(a.powf(b)))
        }
        None => Err(unsupported("** or pow()", left, right)),
    }
}

fn bitwise(
    op: &str,
    left: &Value,
    right: &Value,
    f: fn(i64, i64) -> i64,
) -> Result<Value, RuntimeError> {
    match (as_int_like(left), as_int_like(right)) {
        (Some(a), Some(b)) => Ok(Value::Int(f(a, b))),
        _ => Err(unsupported(op, left, right)),
    }
}

fn shift_left(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (as_int_like(left), as_int_like(right)) {
        (Some(a), Some(b)) => {
            if b < 0 {
                return Err(RuntimeError::new(VALUE_ERROR, "negative shift count"));
            }
            Ok(Value::Int(a.checked_shl(b as u32).unwrap_or(0)))
        }
        _ => Err(unsupported("<<", left, right)),
    }
}

fn shift_right(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (as_int_like(left), as_int_like(right)) {
        (Some(a), Some(b)) => {
            if b < 0 {
                return Err(RuntimeError::new(VALUE_ERROR, "negative shift count"));
            }
            if b >= 64 {
                Ok(Value::Int(if a < 0 { -1 } else { 0 }))
            } else {
                Ok(Value::Int(a >> b))
            }
        }
        _ => Err(unsupported(">>", left, right)),
    }
}

// ============================================================================
// Unary operators
// ============================================================================

pub fn unary_op(kind: TokenKind, operand: &Value) -> Result<Value, RuntimeError> {
    match kind {
        TokenKind::Minus => match operand {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Bool(b) => Ok(Value::Int(-(*b as i64))),
            _ => Err(RuntimeError::type_error(format!(
                "bad operand type for unary -: '{}'",
                operand.type_name()
            ))),
        },
        TokenKind::Plus => match operand {
            Value::Int(_) | Value::Float(_) => Ok(operand.clone()),
            Value::Bool(b) => Ok(Value::Int(*b as i64)),
            _ => Err(RuntimeError::type_error(format!(
                "bad operand type for unary +: '{}'",
                operand.type_name()
            ))),
        },
        TokenKind::Tilde => match as_int_like(operand) {
            Some(i) => Ok(Value::Int(!i)),
            None => Err(RuntimeError::type_error(format!(
                "bad operand type for unary ~: '{}'",
                operand.type_name()
            ))),
        },
        TokenKind::Not => Ok(Value::Bool(!crate::value::is_truthy(operand))),
        _ => Err(RuntimeError::type_error(format!(
            "unsupported unary operator '{:?}'",
            kind
        ))),
    }
}

// ============================================================================
// Comparisons and membership
// ============================================================================

pub fn compare_op(op: CmpOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    match op {
        CmpOp::Eq => Ok(values_equal(left, right)),
        CmpOp::Ne => Ok(!values_equal(left, right)),
        CmpOp::In => contains(left, right),
        CmpOp::NotIn => contains(left, right).map(|b| !b),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ord = compare_values(op.symbol(), left, right)?;
            Ok(match (op, ord) {
                (_, None) => false, // NaN compares false everywhere
                (CmpOp::Lt, Some(o)) => o == Ordering::Less,
                (CmpOp::Le, Some(o)) => o != Ordering::Greater,
                (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
                (CmpOp::Ge, Some(o)) => o != Ordering::Less,
                _ => unreachable!(),
            })
        }
    }
}

/// `item in container` for strings (substring), sequences, sets, and dict
/// keys.
pub fn contains(item: &Value, container: &Value) -> Result<bool, RuntimeError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_ref())),
            _ => Err(RuntimeError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                item.type_name()
            ))),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| values_equal(v, item))),
        Value::Tuple(items) => Ok(items.iter().any(|v| values_equal(v, item))),
        Value::Set(items) => {
            let key = HashKey::try_new(item.clone())?;
            Ok(items.borrow().contains(&key))
        }
        Value::Dict(entries) => {
            let key = HashKey::try_new(item.clone())?;
            Ok(entries.borrow().contains_key(&key))
        }
        _ => Err(RuntimeError::type_error(format!(
            "argument of type '{}' is not iterable",
            container.type_name()
        ))),
    }
}

// ============================================================================
// Indexing
// ============================================================================

/// Rebases a possibly-negative index against `len`, without clamping.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

pub fn index_get(object: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match object {
        Value::List(items) => {
            let items = items.borrow();
            let i = require_index(object, index)?;
            resolve_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| RuntimeError::index_error("list index out of range"))
        }
        Value::Tuple(items) => {
            let i = require_index(object, index)?;
            resolve_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| RuntimeError::index_error("tuple index out of range"))
        }
        Value::Str(s) => {
            let i = require_index(object, index)?;
            let chars: Vec<char> = s.chars().collect();
            resolve_index(i, chars.len())
                .map(|i| Value::str(chars[i].to_string()))
                .ok_or_else(|| RuntimeError::index_error("string index out of range"))
        }
        Value::Dict(entries) => {
            let key = HashKey::try_new(index.clone())?;
            entries
                .borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| RuntimeError::key_error(index.repr()))
        }
        _ => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            object.type_name()
        ))),
    }
}

pub fn index_set(object: &Value, index: &Value, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let i = require_index(object, index)?;
            match resolve_index(i, items.len()) {
                Some(i) => {
                    items[i] = value;
                    Ok(())
                }
                None => Err(RuntimeError::index_error(
                    "list assignment index out of range",
                )),
            }
        }
        Value::Dict(entries) => {
            let key = HashKey::try_new(index.clone())?;
            entries.borrow_mut().insert(key, value);
            Ok(())
        }
        _ => Err(RuntimeError::type_error(format!(
            "'{}' object does not support item assignment",
            object.type_name()
        ))),
    }
}

fn require_index(object: &Value, index: &Value) -> Result<i64, RuntimeError> {
    as_int_like(index).ok_or_else(|| {
        RuntimeError::type_error(format!(
            "{} indices must be integers, not {}",
            object.type_name(),
            index.type_name()
        ))
    })
}

// ============================================================================
// Slicing
// ============================================================================

/// `a[start:stop:step]` over lists, tuples, and strings. The result type
/// matches the source.
pub fn slice_sequence(
    object: &Value,
    start: Option<&Value>,
    stop: Option<&Value>,
    step: Option<&Value>,
) -> Result<Value, RuntimeError> {
    let elements: Vec<Value> = match object {
        Value::List(items) => items.borrow().clone(),
        Value::Tuple(items) => items.as_ref().clone(),
        Value::Str(s) => s.chars().map(|c| Value::str(c.to_string())).collect(),
        _ => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                object.type_name()
            )))
        }
    };
    let len = elements.len() as i64;

    let slice_index = |v: Option<&Value>| -> Result<Option<i64>, RuntimeError> {
        match v {
            None => Ok(None),
            Some(v) => as_int_like(v).map(Some).ok_or_else(|| {
                RuntimeError::type_error("slice indices must be integers or None")
            }),
        }
    };

    let step = slice_index(step)?.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeError::value_error("slice step cannot be zero"));
    }

    // Rebase negatives, then clamp to the walkable range for the step's
    // direction.
    let clamp = |index: i64| -> i64 {
        let rebased = if index < 0 { index + len } else { index };
        if step > 0 {
            rebased.clamp(0, len)
        } else {
            rebased.clamp(-1, len - 1)
        }
    };
    let start = match slice_index(start)? {
        Some(i) => clamp(i),
        None if step > 0 => 0,
        None => len - 1,
    };
    let stop = match slice_index(stop)? {
        Some(i) => clamp(i),
        None if step > 0 => len,
        None => -1,
    };

    let mut collected = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        collected.push(elements[i as usize].clone());
        i += step;
    }

    Ok(match object {
        Value::List(_) => Value::list(collected),
        Value::Tuple(_) => Value::tuple(collected),
        Value::Str(_) => {
            let mut s = String::new();
            for v in &collected {
                if let Value::Str(c) = v {
                    s.push_str(c);
                }
            }
            Value::str(s)
        }
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_always_float() {
        let v = binary_op(TokenKind::Slash, &Value::Int(10), &Value::Int(4)).unwrap();
        assert!(matches!(v, Value::Float(f) if f == 2.5));
        let v = binary_op(TokenKind::Slash, &Value::Int(8), &Value::Int(4)).unwrap();
        assert!(matches!(v, Value::Float(f) if f == 2.0));
    }

    #[test]
    fn test_floor_division_and_modulo_signs() {
        let fd = |a: i64, b: i64| match binary_op(TokenKind::SlashSlash, &Value::Int(a), &Value::Int(b)) {
            Ok(Value::Int(i)) => i,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(fd(7, 2), 3);
        assert_eq!(fd(-7, 2), -4);
        assert_eq!(fd(7, -2), -4);

        let md = |a: i64, b: i64| match binary_op(TokenKind::Percent, &Value::Int(a), &Value::Int(b)) {
            Ok(Value::Int(i)) => i,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(md(7, 3), 1);
        assert_eq!(md(-7, 3), 2); // divisor's sign
        assert_eq!(md(7, -3), -2);
    }

    #[test]
    fn test_zero_division_messages() {
        let err = binary_op(TokenKind::Slash, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.describe(), "ZeroDivisionError: division by zero");
        let err =
            binary_op(TokenKind::Slash, &Value::Float(1.0), &Value::Int(0)).unwrap_err();
        assert_eq!(err.describe(), "ZeroDivisionError: float division by zero");
        let err =
            binary_op(TokenKind::SlashSlash, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(
            err.describe(),
            "ZeroDivisionError: integer division or modulo by zero"
        );
    }

    #[test]
    fn test_sequence_concat_and_repeat() {
        let v = binary_op(TokenKind::Plus, &Value::str("ab"), &Value::str("cd")).unwrap();
        assert_eq!(format!("{}", v), "abcd");

        let v = binary_op(
            TokenKind::Plus,
            &Value::list(vec![Value::Int(1)]),
            &Value::list(vec![Value::Int(2)]),
        )
        .unwrap();
        assert_eq!(format!("{}", v), "[1, 2]");

        let v = binary_op(TokenKind::Star, &Value::str("ab"), &Value::Int(3)).unwrap();
        assert_eq!(format!("{}", v), "ababab");
        let v = binary_op(TokenKind::Star, &Value::str("ab"), &Value::Int(-1)).unwrap();
        assert_eq!(format!("{}", v), "");
    }

    #[test]
    fn test_type_error_message() {
        let err = binary_op(TokenKind::Plus, &Value::Int(1), &Value::str("x")).unwrap_err();
        assert_eq!(
            err.describe(),
            "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
        );
    }

    #[test]
    fn test_bool_arithmetic() {
        let v = binary_op(TokenKind::Plus, &Value::Bool(true), &Value::Bool(true)).unwrap();
        assert!(matches!(v, Value::Int(2)));
    }

    #[test]
    fn test_membership() {
        assert!(contains(&Value::str("bc"), &Value::str("abcd")).unwrap());
        assert!(!contains(&Value::str("x"), &Value::str("abcd")).unwrap());
        let err = contains(&Value::Int(1), &Value::str("abc")).unwrap_err();
        assert!(err.describe().contains("requires string as left operand"));

        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert!(contains(&Value::Float(2.0), &list).unwrap());
    }

    #[test]
    fn test_index_get() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(matches!(
            index_get(&list, &Value::Int(-1)).unwrap(),
            Value::Int(3)
        ));
        let err = index_get(&list, &Value::Int(3)).unwrap_err();
        assert_eq!(err.describe(), "IndexError: list index out of range");

        let s = Value::str("abc");
        assert_eq!(format!("{}", index_get(&s, &Value::Int(1)).unwrap()), "b");
    }

    #[test]
    fn test_slice_cases() {
        let s = Value::str("abcdef");
        let sliced = slice_sequence(
            &s,
            Some(&Value::Int(1)),
            Some(&Value::Int(5)),
            Some(&Value::Int(2)),
        )
        .unwrap();
        assert_eq!(format!("{}", sliced), "bd");

        let list = Value::list((1..=5).map(Value::Int).collect());
        let reversed = slice_sequence(&list, None, None, Some(&Value::Int(-1))).unwrap();
        assert_eq!(format!("{}", reversed), "[5, 4, 3, 2, 1]");

        let clamped = slice_sequence(
            &list,
            Some(&Value::Int(-100)),
            Some(&Value::Int(100)),
            None,
        )
        .unwrap();
        assert_eq!(format!("{}", clamped), "[1, 2, 3, 4, 5]");

        let err = slice_sequence(&list, None, None, Some(&Value::Int(0))).unwrap_err();
        assert_eq!(err.describe(), "ValueError: slice step cannot be zero");
    }

    #[test]
    fn test_chained_comparison_ops() {
        assert!(compare_op(CmpOp::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap());
        assert!(compare_op(CmpOp::Ge, &Value::Bool(true), &Value::Int(1)).unwrap());
        assert!(!compare_op(CmpOp::Lt, &Value::Float(f64::NAN), &Value::Int(1)).unwrap());
        assert!(compare_op(CmpOp::Lt, &Value::str("abc"), &Value::str("abd")).unwrap());
    }

    #[test]
    fn test_unary() {
        assert!(matches!(
            unary_op(TokenKind::Minus, &Value::Int(3)).unwrap(),
            Value::Int(-3)
        ));
        assert!(matches!(
            unary_op(TokenKind::Tilde, &Value::Int(0)).unwrap(),
            Value::Int(-1)
        ));
        assert!(matches!(
            unary_op(TokenKind::Not, &Value::str("")).unwrap(),
            Value::Bool(true)
        ));
    }
}
