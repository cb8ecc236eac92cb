//! Numeric builtins: abs, round, min, max, sum, int, float, range
//!
//! Conversions follow Python's coercion rules (bools are numbers, floats
//! truncate toward zero) and `round` uses banker's rounding.

use crate::error::{RuntimeError, VALUE_ERROR};
use crate::interpreter::Interpreter;
use crate::methods::{check_arity, reject_kwargs};
use crate::ops::binary_op;
use crate::token::TokenKind;
use crate::value::{compare_values, CallArgs, Value};
use std::cmp::Ordering;

pub fn builtin_abs(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("abs", &args)?;
    check_arity("abs", &args, 1, 1)?;
    match &args.positional[0] {
        Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        other => Err(RuntimeError::type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// Python-3 rounding: ties go to the nearest even digit. Returns an int
/// when `ndigits` is zero or omitted, a float otherwise.
pub fn builtin_round(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    check_arity("round", &args, 1, 2)?;
    let mut ndigits: Option<&Value> = args.positional.get(1);
    for (key, value) in &args.keyword {
        match key.as_str() {
            "ndigits" if ndigits.is_none() => ndigits = Some(value),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' is an invalid keyword argument for round()",
                    other
                )))
            }
        }
    }
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(Value::Int(i)) => Some(*i),
        Some(Value::Bool(b)) => Some(*b as i64),
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };

    let x = match &args.positional[0] {
        Value::Bool(b) => return Ok(Value::Int(*b as i64)),
        Value::Int(i) => {
            return Ok(match ndigits {
                Some(n) if n < 0 => {
                    let factor = 10f64.powi((-n).min(18) as i32);
                    Value::Int(((*i as f64 / factor).round_ties_even() * factor) as i64)
                }
                _ => Value::Int(*i),
            })
        }
        Value::Float(f) => *f,
        other => {
            return Err(RuntimeError::type_error(format!(
                "type {} doesn't define __round__ method",
                other.type_name()
            )))
        }
    };

    match ndigits {
        // ndigits of zero, given or omitted, yields an int.
        None | Some(0) => {
            if x.is_nan() {
                return Err(RuntimeError::value_error(
                    "cannot convert float NaN to integer",
                ));
            }
            if x.is_infinite() {
                return Err(RuntimeError::value_error(
                    "cannot convert float infinity to integer",
                ));
            }
            Ok(Value::Int(x.round_ties_even() as i64))
        }
        Some(n) => {
            if !x.is_finite() {
                return Ok(Value::Float(x));
            }
            let factor = 10f64.powi(n.clamp(-308, 308) as i32);
            Ok(Value::Float((x * factor).round_ties_even() / factor))
        }
    }
}

fn extreme(name: &str, args: CallArgs, want_max: bool) -> Result<Value, RuntimeError> {
    reject_kwargs(name, &args)?;
    if args.positional.is_empty() {
        return Err(RuntimeError::type_error(format!(
            "{} expected at least 1 argument, got 0",
            name
        )));
    }
    let candidates = if args.positional.len() == 1 {
        let items = args.positional[0].iter_elements()?;
        if items.is_empty() {
            return Err(RuntimeError::value_error(format!(
                "{}() arg is an empty sequence",
                name
            )));
        }
        items
    } else {
        args.positional
    };

    let mut best = candidates[0].clone();
    for candidate in &candidates[1..] {
        let ord = compare_values("<", candidate, &best)?;
        let wins = match ord {
            Some(Ordering::Less) => !want_max,
            Some(Ordering::Greater) => want_max,
            _ => false,
        };
        if wins {
            best = candidate.clone();
        }
    }
    Ok(best)
}

pub fn builtin_min(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    extreme("min", args, false)
}

pub fn builtin_max(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    extreme("max", args, true)
}

pub fn builtin_sum(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    check_arity("sum", &args, 1, 2)?;
    let mut start = args.positional.get(1).cloned();
    for (key, value) in &args.keyword {
        match key.as_str() {
            "start" if start.is_none() => start = Some(value.clone()),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' is an invalid keyword argument for sum()",
                    other
                )))
            }
        }
    }
    let start = start.unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(RuntimeError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    let mut total = start;
    for item in args.positional[0].iter_elements()? {
        total = binary_op(TokenKind::Plus, &total, &item)?;
    }
    Ok(total)
}

/// `int(x=0, base=10)` — truncating numeric conversion, or string parsing
/// with radix prefixes and `base=0` auto-detection.
pub fn builtin_int(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    check_arity("int", &args, 0, 2)?;
    let mut base_arg: Option<&Value> = args.positional.get(1);
    for (key, value) in &args.keyword {
        match key.as_str() {
            "base" if base_arg.is_none() => base_arg = Some(value),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' is an invalid keyword argument for int()",
                    other
                )))
            }
        }
    }
    let base = match base_arg {
        None => None,
        Some(Value::Int(i)) => Some(*i),
        Some(Value::Bool(b)) => Some(*b as i64),
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };
    if let Some(base) = base {
        if base != 0 && !(2..=36).contains(&base) {
            return Err(RuntimeError::value_error(
                "int() base must be >= 2 and <= 36, or 0",
            ));
        }
    }

    let Some(x) = args.positional.first() else {
        return Ok(Value::Int(0));
    };
    match x {
        Value::Str(s) => {
            let base = base.unwrap_or(10);
            parse_int_text(s, base).ok_or_else(|| {
                RuntimeError::new(
                    VALUE_ERROR,
                    format!(
                        "invalid literal for int() with base {}: {}",
                        base,
                        Value::str(s.to_string()).repr()
                    ),
                )
            })
        }
        _ if base.is_some() => Err(RuntimeError::type_error(
            "int() can't convert non-string with explicit base",
        )),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(f) => {
            if f.is_nan() {
                Err(RuntimeError::value_error(
                    "cannot convert float NaN to integer",
                ))
            } else if f.is_infinite() {
                Err(RuntimeError::value_error(
                    "cannot convert float infinity to integer",
                ))
            } else {
                Ok(Value::Int(f.trunc() as i64))
            }
        }
        other => Err(RuntimeError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn parse_int_text(text: &str, base: i64) -> Option<Value> {
    let t = text.trim();
    let (negative, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let lower = t.to_ascii_lowercase();
    let (radix, digits) = if base == 0 {
        if lower.starts_with("0x") {
            (16, &t[2..])
        } else if lower.starts_with("0o") {
            (8, &t[2..])
        } else if lower.starts_with("0b") {
            (2, &t[2..])
        } else {
            (10, t)
        }
    } else {
        let radix = base as u32;
        let prefixed = matches!(
            (radix, lower.get(..2)),
            (16, Some("0x")) | (8, Some("0o")) | (2, Some("0b"))
        );
        (radix, if prefixed { &t[2..] } else { t })
    };
    i64::from_str_radix(digits, radix)
        .ok()
        .map(|v| Value::Int(if negative { -v } else { v }))
}

/// `float(x=0.0)` — accepts numbers, booleans, and string spellings
/// including `inf`, `-inf`, and `nan`.
pub fn builtin_float(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("float", &args)?;
    check_arity("float", &args, 0, 1)?;
    let Some(x) = args.positional.first() else {
        return Ok(Value::Float(0.0));
    };
    match x {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Bool(b) => Ok(Value::Float(*b as i64 as f64)),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::new(
                VALUE_ERROR,
                format!(
                    "could not convert string to float: {}",
                    Value::str(s.to_string()).repr()
                ),
            )
        }),
        other => Err(RuntimeError::type_error(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

/// `range(stop)`, `range(start, stop)`, `range(start, stop, step)` —
/// integer arguments only, materialized as a list.
pub fn builtin_range(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("range", &args)?;
    check_arity("range", &args, 1, 3)?;
    let int_arg = |v: &Value, position: usize| -> Result<i64, RuntimeError> {
        match v {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            other => Err(RuntimeError::type_error(format!(
                "range() arg {} must be an integer, not {}",
                position,
                other.type_name()
            ))),
        }
    };
    let (start, stop, step) = match args.positional.len() {
        1 => (0, int_arg(&args.positional[0], 1)?, 1),
        2 => (
            int_arg(&args.positional[0], 1)?,
            int_arg(&args.positional[1], 2)?,
            1,
        ),
        _ => (
            int_arg(&args.positional[0], 1)?,
            int_arg(&args.positional[1], 2)?,
            int_arg(&args.positional[2], 3)?,
        ),
    };
    if step == 0 {
        return Err(RuntimeError::value_error("range() arg 3 must not be zero"));
    }
    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::Int(i));
        i += step;
    }
    Ok(Value::list(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn call(
        f: fn(&mut Interpreter, CallArgs) -> Result<Value, RuntimeError>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let mut interp = Interpreter::new();
        f(&mut interp, CallArgs::positional(args))
    }

    #[test]
    fn test_round_bankers() {
        assert!(matches!(
            call(builtin_round, vec![Value::Float(2.5)]).unwrap(),
            Value::Int(2)
        ));
        assert!(matches!(
            call(builtin_round, vec![Value::Float(3.5)]).unwrap(),
            Value::Int(4)
        ));
        assert!(matches!(
            call(builtin_round, vec![Value::Float(-2.5)]).unwrap(),
            Value::Int(-2)
        ));
        let v = call(builtin_round, vec![Value::Float(2.675), Value::Int(2)]).unwrap();
        assert!(matches!(v, Value::Float(_)));
    }

    #[test]
    fn test_int_conversions() {
        assert!(matches!(
            call(builtin_int, vec![Value::Float(-2.9)]).unwrap(),
            Value::Int(-2)
        ));
        assert!(matches!(
            call(builtin_int, vec![Value::str("  42 ")]).unwrap(),
            Value::Int(42)
        ));
        assert!(matches!(
            call(builtin_int, vec![Value::str("ff"), Value::Int(16)]).unwrap(),
            Value::Int(255)
        ));
        assert!(matches!(
            call(builtin_int, vec![Value::str("0x1f"), Value::Int(0)]).unwrap(),
            Value::Int(31)
        ));
        assert!(matches!(
            call(builtin_int, vec![Value::str("-0b101"), Value::Int(0)]).unwrap(),
            Value::Int(-5)
        ));

        let err = call(builtin_int, vec![Value::str("12x")]).unwrap_err();
        assert_eq!(
            err.describe(),
            "ValueError: invalid literal for int() with base 10: '12x'"
        );
        let err = call(builtin_int, vec![Value::Int(5), Value::Int(16)]).unwrap_err();
        assert!(err.describe().contains("explicit base"));
        let err = call(builtin_int, vec![Value::str("1"), Value::Int(1)]).unwrap_err();
        assert!(err.describe().contains("base must be"));
    }

    #[test]
    fn test_float_conversions() {
        assert!(matches!(
            call(builtin_float, vec![Value::str("1.5e2")]).unwrap(),
            Value::Float(f) if f == 150.0
        ));
        let v = call(builtin_float, vec![Value::str("inf")]).unwrap();
        assert!(matches!(v, Value::Float(f) if f.is_infinite() && f > 0.0));
        let v = call(builtin_float, vec![Value::str("-inf")]).unwrap();
        assert!(matches!(v, Value::Float(f) if f.is_infinite() && f < 0.0));
        let v = call(builtin_float, vec![Value::str("nan")]).unwrap();
        assert!(matches!(v, Value::Float(f) if f.is_nan()));
        assert!(call(builtin_float, vec![Value::str("abc")]).is_err());
    }

    #[test]
    fn test_range_forms() {
        let v = call(builtin_range, vec![Value::Int(3)]).unwrap();
        assert_eq!(format!("{}", v), "[0, 1, 2]");
        let v = call(builtin_range, vec![Value::Int(1), Value::Int(4)]).unwrap();
        assert_eq!(format!("{}", v), "[1, 2, 3]");
        let v = call(
            builtin_range,
            vec![Value::Int(5), Value::Int(0), Value::Int(-2)],
        )
        .unwrap();
        assert_eq!(format!("{}", v), "[5, 3, 1]");
        let err = call(
            builtin_range,
            vec![Value::Int(0), Value::Int(5), Value::Int(0)],
        )
        .unwrap_err();
        assert_eq!(err.describe(), "ValueError: range() arg 3 must not be zero");
    }

    #[test]
    fn test_min_max_sum() {
        let v = call(builtin_min, vec![Value::Int(3), Value::Int(1), Value::Int(2)]).unwrap();
        assert!(matches!(v, Value::Int(1)));
        let v = call(
            builtin_max,
            vec![Value::list(vec![Value::Int(3), Value::Float(3.5)])],
        )
        .unwrap();
        assert!(matches!(v, Value::Float(f) if f == 3.5));
        let err = call(builtin_min, vec![Value::list(vec![])]).unwrap_err();
        assert_eq!(err.describe(), "ValueError: min() arg is an empty sequence");

        let v = call(
            builtin_sum,
            vec![Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])],
        )
        .unwrap();
        assert!(matches!(v, Value::Int(6)));
        let v = call(
            builtin_sum,
            vec![
                Value::list(vec![Value::Int(1)]),
                Value::Float(0.5),
            ],
        )
        .unwrap();
        assert!(matches!(v, Value::Float(f) if f == 1.5));
    }
}
