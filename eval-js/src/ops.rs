//! ECMAScript abstract operations and operator semantics.
//!
//! Every coercion used by the binary and unary operators lives here, so operators never convert
//! values ad hoc. The full weak-typing rules are implemented for the value kinds this crate
//! models; there are no symbols, BigInts or wrapper objects.

use crate::error::{EvalError, EvalResult};
use crate::function::instance_of;
use crate::num::{number_to_string, string_to_number};
use crate::operator::{BinaryOperator, UnaryOperator};
use crate::property;
use crate::value::{describe, Array, Value};
use std::cmp::Ordering;
use std::rc::Rc;

/// `ToPrimitive`. Only reference kinds convert; the result is always a string since none of the
/// modeled objects override `valueOf`.
pub fn to_primitive(value: &Value) -> EvalResult<Value> {
  Ok(match value {
    Value::Object(_) => Value::string("[object Object]"),
    Value::Array(array) => Value::string(join_array(array, ",")?),
    Value::Function(func) => Value::string(func.source_text()),
    Value::RegExp(re) => Value::string(re.to_string()),
    other => other.clone(),
  })
}

/// `ToBoolean`.
pub fn to_boolean(value: &Value) -> bool {
  match value {
    Value::Undefined | Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => *n != 0.0 && !n.is_nan(),
    Value::String(s) => !s.is_empty(),
    Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::RegExp(_) => true,
  }
}

/// `ToNumber`.
pub fn to_number(value: &Value) -> EvalResult<f64> {
  Ok(match value {
    Value::Undefined => f64::NAN,
    Value::Null => 0.0,
    Value::Bool(b) => {
      if *b {
        1.0
      } else {
        0.0
      }
    }
    Value::Number(n) => *n,
    Value::String(s) => string_to_number(s),
    other => to_number(&to_primitive(other)?)?,
  })
}

/// `ToString`.
pub fn to_string(value: &Value) -> EvalResult<Rc<str>> {
  Ok(match value {
    Value::String(s) => s.clone(),
    Value::Undefined => Rc::from("undefined"),
    Value::Null => Rc::from("null"),
    Value::Bool(true) => Rc::from("true"),
    Value::Bool(false) => Rc::from("false"),
    Value::Number(n) => Rc::from(number_to_string(*n)),
    other => to_string(&to_primitive(other)?)?,
  })
}

/// `ToPropertyKey`.
pub fn to_property_key(value: &Value) -> EvalResult<String> {
  Ok(to_string(value)?.to_string())
}

/// `ToIntegerOrInfinity`.
pub fn to_integer_or_infinity(value: &Value) -> EvalResult<f64> {
  let n = to_number(value)?;
  Ok(if n.is_nan() { 0.0 } else { n.trunc() + 0.0 })
}

/// `ToInt32`.
pub fn to_int32(value: &Value) -> EvalResult<i32> {
  Ok(to_uint32(value)? as i32)
}

/// `ToUint32`.
pub fn to_uint32(value: &Value) -> EvalResult<u32> {
  let n = to_number(value)?;
  if !n.is_finite() || n == 0.0 {
    return Ok(0);
  }
  Ok(n.trunc().rem_euclid(4294967296.0) as u32)
}

/// Array element joining shared by `ToPrimitive` and `Array.prototype.join`. `undefined` and
/// `null` elements render as empty strings; an array nested in itself renders as empty.
pub fn join_array(array: &Array, separator: &str) -> EvalResult<String> {
  thread_local! {
    static JOINING: std::cell::RefCell<Vec<*const ()>> = const { std::cell::RefCell::new(Vec::new()) };
  }
  let ptr = array.as_ptr();
  if JOINING.with(|stack| stack.borrow().contains(&ptr)) {
    return Ok(String::new());
  }
  JOINING.with(|stack| stack.borrow_mut().push(ptr));
  let result = (|| {
    let mut out = String::new();
    for (i, item) in array.to_vec().iter().enumerate() {
      if i > 0 {
        out.push_str(separator);
      }
      if !item.is_nullish() {
        out.push_str(&to_string(item)?);
      }
    }
    Ok(out)
  })();
  JOINING.with(|stack| stack.borrow_mut().pop());
  result
}

/// Strict Equality Comparison (`===`).
pub fn strict_equals(a: &Value, b: &Value) -> bool {
  // `Value`'s `PartialEq` is exactly strict equality.
  a == b
}

/// `SameValueZero`, used by `includes`: like `===` except `NaN` equals `NaN`.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
    _ => strict_equals(a, b),
  }
}

/// Abstract Equality Comparison (`==`).
pub fn loose_equals(a: &Value, b: &Value) -> EvalResult<bool> {
  use Value::*;

  let mut a = a.clone();
  let mut b = b.clone();
  loop {
    match (&a, &b) {
      // `null == undefined`
      (Undefined | Null, Undefined | Null) => return Ok(true),
      (Undefined | Null, _) | (_, Undefined | Null) => return Ok(false),

      // Same-type comparisons use Strict Equality Comparison.
      (Bool(_), Bool(_)) | (Number(_), Number(_)) | (String(_), String(_)) => {
        return Ok(strict_equals(&a, &b))
      }
      (x, y) if x.is_object() && y.is_object() => return Ok(strict_equals(x, y)),

      // Number/string conversions.
      (Number(_), String(_)) => b = Number(to_number(&b)?),
      (String(_), Number(_)) => a = Number(to_number(&a)?),

      // Boolean conversions.
      (Bool(_), _) => a = Number(to_number(&a)?),
      (_, Bool(_)) => b = Number(to_number(&b)?),

      // Object-to-primitive conversions.
      (x, _) if x.is_object() => a = to_primitive(&a)?,
      (_, y) if y.is_object() => b = to_primitive(&b)?,

      _ => return Ok(false),
    }
  }
}

/// Abstract Relational Comparison. `None` means the operands are unordered (a `NaN` was
/// involved), which makes every relational operator false.
pub fn compare(a: &Value, b: &Value) -> EvalResult<Option<Ordering>> {
  let a = to_primitive(a)?;
  let b = to_primitive(b)?;
  if let (Value::String(x), Value::String(y)) = (&a, &b) {
    // Code unit order, not scalar value order.
    return Ok(Some(x.encode_utf16().cmp(y.encode_utf16())));
  }
  let x = to_number(&a)?;
  let y = to_number(&b)?;
  Ok(x.partial_cmp(&y))
}

/// The `+` operator.
pub fn add(a: &Value, b: &Value) -> EvalResult<Value> {
  let a = to_primitive(a)?;
  let b = to_primitive(b)?;
  if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
    let mut s = to_string(&a)?.to_string();
    s.push_str(&to_string(&b)?);
    return Ok(Value::from(s));
  }
  Ok(Value::Number(to_number(&a)? + to_number(&b)?))
}

/// `Number::exponentiate`. Differs from `powf` for a base of ±1 with an infinite exponent and for
/// a `NaN` exponent.
pub fn exponentiate(base: f64, exponent: f64) -> f64 {
  if exponent.is_nan() {
    return f64::NAN;
  }
  if exponent.is_infinite() && base.abs() == 1.0 {
    return f64::NAN;
  }
  base.powf(exponent)
}

/// Evaluates `left <operator> right` on already-evaluated operands.
pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
  use BinaryOperator::*;

  let num = |f: fn(f64, f64) -> f64| -> EvalResult<Value> {
    Ok(Value::Number(f(to_number(left)?, to_number(right)?)))
  };
  let rel = |test: fn(Ordering) -> bool, swap: bool| -> EvalResult<Value> {
    let ord = if swap {
      compare(right, left)?
    } else {
      compare(left, right)?
    };
    Ok(Value::Bool(ord.is_some_and(test)))
  };

  Ok(match operator {
    Equality => Value::Bool(loose_equals(left, right)?),
    Inequality => Value::Bool(!loose_equals(left, right)?),
    StrictEquality => Value::Bool(strict_equals(left, right)),
    StrictInequality => Value::Bool(!strict_equals(left, right)),

    LessThan => rel(|o| o == Ordering::Less, false)?,
    GreaterThan => rel(|o| o == Ordering::Less, true)?,
    LessThanOrEqual => rel(|o| o != Ordering::Greater, false)?,
    GreaterThanOrEqual => rel(|o| o != Ordering::Greater, true)?,

    BitwiseLeftShift => {
      let shift = to_uint32(right)? & 0x1f;
      Value::from(to_int32(left)?.wrapping_shl(shift))
    }
    BitwiseRightShift => {
      let shift = to_uint32(right)? & 0x1f;
      Value::from(to_int32(left)? >> shift)
    }
    BitwiseUnsignedRightShift => {
      let shift = to_uint32(right)? & 0x1f;
      Value::from(to_uint32(left)? >> shift)
    }
    BitwiseOr => Value::from(to_int32(left)? | to_int32(right)?),
    BitwiseXor => Value::from(to_int32(left)? ^ to_int32(right)?),
    BitwiseAnd => Value::from(to_int32(left)? & to_int32(right)?),

    Addition => add(left, right)?,
    Subtraction => num(|a, b| a - b)?,
    Multiplication => num(|a, b| a * b)?,
    Division => num(|a, b| a / b)?,
    // Rust's `%` on floats truncates like ECMAScript's.
    Remainder => num(|a, b| a % b)?,
    Exponentiation => num(exponentiate)?,

    In => {
      if !right.is_object() {
        return Err(EvalError::type_error(format!(
          "Cannot use 'in' operator to search for '{}' in {}",
          to_string(left)?,
          describe(right)
        )));
      }
      Value::Bool(property::has(right, &to_property_key(left)?)?)
    }
    Instanceof => Value::Bool(instance_of(left, right)?),
  })
}

/// Evaluates `<operator> operand` for every unary operator except `delete`, which needs a
/// reference rather than a value.
pub fn unary(operator: UnaryOperator, operand: &Value) -> EvalResult<Value> {
  Ok(match operator {
    UnaryOperator::Negation => Value::Number(-to_number(operand)?),
    UnaryOperator::Plus => Value::Number(to_number(operand)?),
    UnaryOperator::LogicalNot => Value::Bool(!to_boolean(operand)),
    UnaryOperator::BitwiseNot => Value::from(!to_int32(operand)?),
    UnaryOperator::Typeof => Value::string(operand.type_of()),
    UnaryOperator::Void => Value::Undefined,
    UnaryOperator::Delete => {
      return Err(EvalError::unsupported("delete requires a reference operand"))
    }
  })
}

/// The values a spread element contributes: array elements, or the code points of a string.
pub fn spread_values(value: &Value) -> EvalResult<Vec<Value>> {
  match value {
    Value::Array(array) => Ok(array.to_vec()),
    Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
    other => Err(EvalError::type_error(format!(
      "{} is not iterable",
      describe(other)
    ))),
  }
}
