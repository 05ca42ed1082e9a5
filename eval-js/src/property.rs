//! Property access on every value kind.
//!
//! Own data lives in objects and arrays; everything else a property read can produce (string
//! indices, `length`, built-in methods) is synthesized here from the receiver's kind.

use crate::builtins;
use crate::error::{EvalError, EvalResult};
use crate::ops::{to_integer_or_infinity, to_number, to_property_key};
use crate::value::Array;
use crate::value::{describe, Value};

/// Arrays are dense; writes that would grow one past this many elements fail.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Parses a canonical array index (`"0"`, `"17"`, but not `"01"`, `"-1"` or `"1.0"`).
pub fn array_index(key: &str) -> Option<usize> {
  if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
    return None;
  }
  if !key.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let index: u32 = key.parse().ok()?;
  // 2^32 - 1 is not an array index.
  (index != u32::MAX).then_some(index as usize)
}

fn string_unit(s: &str, index: usize) -> Option<Value> {
  let unit = s.encode_utf16().nth(index)?;
  Some(Value::from(String::from_utf16_lossy(&[unit])))
}

/// `obj[key]`.
pub fn get(receiver: &Value, key: &str) -> EvalResult<Value> {
  let own = match receiver {
    Value::Undefined | Value::Null => {
      return Err(EvalError::type_error(format!(
        "Cannot read properties of {} (reading '{key}')",
        describe(receiver)
      )))
    }
    Value::Object(object) => object.get(key),
    Value::Array(array) => match key {
      "length" => Some(Value::from(array.len())),
      _ => array_index(key).map(|i| array.get(i).unwrap_or_default()),
    },
    Value::String(s) => match key {
      "length" => Some(Value::from(s.encode_utf16().count())),
      _ => array_index(key).map(|i| string_unit(s, i).unwrap_or_default()),
    },
    Value::Function(func) => match key {
      "name" => Some(Value::string(func.name())),
      "length" => Some(Value::from(func.length())),
      _ => None,
    },
    Value::RegExp(re) => match key {
      "source" => Some(Value::string(re.source())),
      "flags" => Some(Value::string(re.flags())),
      "global" => Some(Value::Bool(re.global())),
      "ignoreCase" => Some(Value::Bool(re.ignore_case())),
      "multiline" => Some(Value::Bool(re.multiline())),
      "sticky" => Some(Value::Bool(re.sticky())),
      "lastIndex" => Some(Value::from(re.last_index())),
      _ => None,
    },
    Value::Bool(_) | Value::Number(_) => None,
  };
  Ok(match own {
    Some(value) => value,
    None => builtins::method(receiver, key)
      .map(Value::Function)
      .unwrap_or_default(),
  })
}

/// `obj[key]` with an arbitrary key value.
pub fn get_by_value(receiver: &Value, key: &Value) -> EvalResult<Value> {
  // Integral numbers skip the string round trip on the hot path of array indexing.
  if let (Value::Array(array), Value::Number(n)) = (receiver, key) {
    if n.fract() == 0.0 && *n >= 0.0 && *n < u32::MAX as f64 {
      return Ok(array.get(*n as usize).unwrap_or_default());
    }
  }
  get(receiver, &to_property_key(key)?)
}

fn array_length(value: &Value) -> EvalResult<usize> {
  let n = to_number(value)?;
  if n < 0.0 || n.fract() != 0.0 || n >= u32::MAX as f64 + 1.0 || n.is_nan() {
    return Err(EvalError::range_error("Invalid array length"));
  }
  let len = n as usize;
  if len > MAX_ARRAY_LENGTH {
    return Err(EvalError::range_error("Invalid array length"));
  }
  Ok(len)
}

fn set_array(array: &Array, key: &str, value: Value) -> EvalResult<()> {
  if key == "length" {
    array.set_len(array_length(&value)?);
    return Ok(());
  }
  if let Some(index) = array_index(key) {
    if index >= MAX_ARRAY_LENGTH {
      return Err(EvalError::range_error("Invalid array length"));
    }
    array.set(index, value);
  }
  Ok(())
}

/// `obj[key] = value`. Writes that the modeled language silently drops (primitives, read-only
/// built-in properties) are ignored.
pub fn set(receiver: &Value, key: &str, value: Value) -> EvalResult<()> {
  match receiver {
    Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
      "Cannot set properties of {} (setting '{key}')",
      describe(receiver)
    ))),
    Value::Object(object) => {
      object.set(key, value);
      Ok(())
    }
    Value::Array(array) => set_array(array, key, value),
    Value::RegExp(re) if key == "lastIndex" => {
      let index = to_integer_or_infinity(&value)?;
      re.set_last_index(if index > 0.0 { index as usize } else { 0 });
      Ok(())
    }
    _ => Ok(()),
  }
}

/// `delete obj[key]`. Returns `false` only for properties that cannot be removed.
pub fn delete(receiver: &Value, key: &str) -> EvalResult<bool> {
  Ok(match receiver {
    Value::Undefined | Value::Null => {
      return Err(EvalError::type_error(format!(
        "Cannot convert undefined or null to object (deleting '{key}')"
      )))
    }
    Value::Object(object) => {
      object.delete(key);
      true
    }
    Value::Array(array) => match key {
      "length" => false,
      _ => {
        // Holes are not modeled: the slot keeps its position and reads as undefined.
        if let Some(index) = array_index(key).filter(|i| *i < array.len()) {
          array.set(index, Value::Undefined);
        }
        true
      }
    },
    Value::String(s) => match key {
      "length" => false,
      _ => !array_index(key).is_some_and(|i| i < s.encode_utf16().count()),
    },
    Value::Function(_) => !matches!(key, "name" | "length"),
    Value::RegExp(_) => key != "lastIndex",
    Value::Bool(_) | Value::Number(_) => true,
  })
}

/// `key in obj` for an object-like receiver.
pub fn has(receiver: &Value, key: &str) -> EvalResult<bool> {
  let own = match receiver {
    Value::Object(object) => object.contains(key),
    Value::Array(array) => key == "length" || array_index(key).is_some_and(|i| i < array.len()),
    Value::Function(_) => matches!(key, "name" | "length"),
    Value::RegExp(_) => matches!(
      key,
      "source" | "flags" | "global" | "ignoreCase" | "multiline" | "sticky" | "lastIndex"
    ),
    other => {
      return Err(EvalError::type_error(format!(
        "Cannot use 'in' operator to search for '{key}' in {}",
        describe(other)
      )))
    }
  };
  Ok(own || builtins::method(receiver, key).is_some())
}

/// Whether `key` is an own property of `receiver`, as `hasOwnProperty` reports it.
pub fn has_own(receiver: &Value, key: &str) -> bool {
  match receiver {
    Value::Object(object) => object.contains(key),
    Value::Array(array) => key == "length" || array_index(key).is_some_and(|i| i < array.len()),
    Value::String(s) => key == "length" || array_index(key).is_some_and(|i| i < s.encode_utf16().count()),
    Value::Function(_) => matches!(key, "name" | "length"),
    Value::RegExp(_) => key == "lastIndex",
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::value::Object;

  #[test]
  fn canonical_indices_only() {
    assert_eq!(array_index("0"), Some(0));
    assert_eq!(array_index("42"), Some(42));
    assert_eq!(array_index("01"), None);
    assert_eq!(array_index("-1"), None);
    assert_eq!(array_index("1.0"), None);
    assert_eq!(array_index("4294967295"), None);
  }

  #[test]
  fn reads_synthesized_properties() {
    let s = Value::from("héllo");
    assert_eq!(get(&s, "length").unwrap(), Value::from(5));
    assert_eq!(get(&s, "1").unwrap(), Value::from("é"));
    assert_eq!(get(&s, "9").unwrap(), Value::Undefined);
    let arr = Value::array(vec![Value::from(1)]);
    assert_eq!(get(&arr, "length").unwrap(), Value::from(1));
    assert_eq!(get_by_value(&arr, &Value::from(0)).unwrap(), Value::from(1));
    assert!(matches!(get(&arr, "map").unwrap(), Value::Function(_)));
    assert_eq!(get(&arr, "missing").unwrap(), Value::Undefined);
  }

  #[test]
  fn nullish_receivers_are_type_errors() {
    let err = get(&Value::Undefined, "b").unwrap_err();
    assert_eq!(
      err.to_string(),
      "TypeError: Cannot read properties of undefined (reading 'b')"
    );
    assert!(matches!(set(&Value::Null, "b", Value::Null), Err(EvalError::TypeError(_))));
    assert!(matches!(delete(&Value::Null, "b"), Err(EvalError::TypeError(_))));
  }

  #[test]
  fn array_length_writes() {
    let arr = Array::from(vec![Value::from(1), Value::from(2), Value::from(3)]);
    let value = Value::Array(arr.clone());
    set(&value, "length", Value::from(1)).unwrap();
    assert_eq!(arr.to_vec(), vec![Value::from(1)]);
    set(&value, "3", Value::from(4)).unwrap();
    assert_eq!(arr.len(), 4);
    assert_eq!(arr.get(2), Some(Value::Undefined));
    assert!(matches!(
      set(&value, "length", Value::from(-1)),
      Err(EvalError::RangeError(_))
    ));
  }

  #[test]
  fn delete_reports_non_deletable_properties() {
    let object = Object::new();
    object.set("b", 0);
    let value = Value::Object(object.clone());
    assert!(delete(&value, "b").unwrap());
    assert!(!object.contains("b"));
    assert!(delete(&value, "missing").unwrap());
    let arr = Value::array(vec![Value::from(1)]);
    assert!(!delete(&arr, "length").unwrap());
    assert!(delete(&arr, "0").unwrap());
    assert_eq!(get(&arr, "0").unwrap(), Value::Undefined);
    assert!(!delete(&Value::from("ab"), "1").unwrap());
    assert!(delete(&Value::from("ab"), "2").unwrap());
  }
}
