//! Receiver-bound built-in methods.
//!
//! Each value kind has a method table, consulted after own properties; every kind also falls back
//! to the `Object` table. Methods are native functions that read their receiver from `this`, so
//! detaching one (`const f = s.trim`) and calling it plainly fails the way the modeled language
//! does. Tables are built once per thread, which keeps `[].map === [].map`.
//!
//! Strings are indexed in UTF-16 code units throughout.

use crate::error::{EvalError, EvalResult};
use crate::function::Function;
use crate::num::{is_ecma_whitespace, number_to_fixed, number_to_radix_string};
use crate::ops::{
  join_array, same_value_zero, strict_equals, to_boolean, to_integer_or_infinity, to_number,
  to_property_key, to_string, to_uint32,
};
use crate::property::{has_own, MAX_ARRAY_LENGTH};
use crate::regexp::{byte_to_utf16_offset, RegExp, RegExpMatch};
use crate::value::{describe, Array, Object, Value};
use ahash::HashMap;
use std::cmp::Ordering;
use std::rc::Rc;

/// Longest string any built-in will construct, in code units.
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

type Methods = HashMap<&'static str, Function>;
type MethodFn = fn(&Value, &[Value]) -> EvalResult<Value>;

fn table(entries: &[(&'static str, u32, MethodFn)]) -> Methods {
  entries
    .iter()
    .map(|&(name, length, call)| (name, Function::native(name, length, call)))
    .collect()
}

thread_local! {
  static OBJECT: Methods = table(&[
    ("hasOwnProperty", 1, object_has_own_property),
    ("toString", 0, object_to_string),
    ("valueOf", 0, object_value_of),
  ]);
  static BOOLEAN: Methods = table(&[
    ("toString", 0, boolean_to_string),
    ("valueOf", 0, boolean_value_of),
  ]);
  static NUMBER: Methods = table(&[
    ("toString", 1, number_to_string),
    ("toFixed", 1, number_to_fixed_method),
    ("valueOf", 0, number_value_of),
  ]);
  static STRING: Methods = table(&[
    ("at", 1, string_at),
    ("charAt", 1, string_char_at),
    ("charCodeAt", 1, string_char_code_at),
    ("concat", 1, string_concat),
    ("endsWith", 1, string_ends_with),
    ("includes", 1, string_includes),
    ("indexOf", 1, string_index_of),
    ("lastIndexOf", 1, string_last_index_of),
    ("match", 1, string_match),
    ("padEnd", 1, string_pad_end),
    ("padStart", 1, string_pad_start),
    ("repeat", 1, string_repeat),
    ("replace", 2, string_replace),
    ("replaceAll", 2, string_replace_all),
    ("search", 1, string_search),
    ("slice", 2, string_slice),
    ("split", 2, string_split),
    ("startsWith", 1, string_starts_with),
    ("substring", 2, string_substring),
    ("toLowerCase", 0, string_to_lower_case),
    ("toString", 0, string_to_string),
    ("toUpperCase", 0, string_to_upper_case),
    ("trim", 0, string_trim),
    ("trimEnd", 0, string_trim_end),
    ("trimStart", 0, string_trim_start),
    ("valueOf", 0, string_to_string),
  ]);
  static ARRAY: Methods = table(&[
    ("at", 1, array_at),
    ("concat", 1, array_concat),
    ("every", 1, array_every),
    ("filter", 1, array_filter),
    ("find", 1, array_find),
    ("findIndex", 1, array_find_index),
    ("flat", 0, array_flat),
    ("forEach", 1, array_for_each),
    ("includes", 1, array_includes),
    ("indexOf", 1, array_index_of),
    ("join", 1, array_join),
    ("lastIndexOf", 1, array_last_index_of),
    ("map", 1, array_map),
    ("pop", 0, array_pop),
    ("push", 1, array_push),
    ("reduce", 1, array_reduce),
    ("reverse", 0, array_reverse),
    ("shift", 0, array_shift),
    ("slice", 2, array_slice),
    ("some", 1, array_some),
    ("sort", 1, array_sort),
    ("toString", 0, array_to_string),
    ("unshift", 1, array_unshift),
  ]);
  static FUNCTION: Methods = table(&[
    ("apply", 2, function_apply),
    ("call", 1, function_call),
    ("toString", 0, function_to_string),
  ]);
  static REGEXP: Methods = table(&[
    ("exec", 1, regexp_exec),
    ("test", 1, regexp_test),
    ("toString", 0, regexp_to_string),
  ]);
}

/// The built-in method `key` of `receiver`'s kind, if there is one.
pub fn method(receiver: &Value, key: &str) -> Option<Function> {
  let lookup = |methods: &Methods| methods.get(key).cloned();
  let specific = match receiver {
    Value::Undefined | Value::Null => return None,
    Value::Object(_) => None,
    Value::Bool(_) => BOOLEAN.with(lookup),
    Value::Number(_) => NUMBER.with(lookup),
    Value::String(_) => STRING.with(lookup),
    Value::Array(_) => ARRAY.with(lookup),
    Value::Function(_) => FUNCTION.with(lookup),
    Value::RegExp(_) => REGEXP.with(lookup),
  };
  specific.or_else(|| OBJECT.with(lookup))
}

fn arg(args: &[Value], index: usize) -> Value {
  args.get(index).cloned().unwrap_or_default()
}

fn callback(args: &[Value]) -> EvalResult<Function> {
  match args.first() {
    Some(Value::Function(func)) => Ok(func.clone()),
    other => Err(EvalError::type_error(format!(
      "{} is not a function",
      describe(other.unwrap_or(&Value::Undefined))
    ))),
  }
}

/// Resolves a relative position argument (negative counts back from `len`), clamped to
/// `0..=len`.
fn relative_index(value: &Value, len: usize, default: usize) -> EvalResult<usize> {
  if value.is_undefined() {
    return Ok(default);
  }
  let n = to_integer_or_infinity(value)?;
  let len_f = len as f64;
  Ok(if n < 0.0 {
    (len_f + n).max(0.0) as usize
  } else {
    n.min(len_f) as usize
  })
}

/// Clamps an absolute position argument to `0..=len`.
fn clamped_index(value: &Value, len: usize, default: usize) -> EvalResult<usize> {
  if value.is_undefined() {
    return Ok(default);
  }
  Ok(to_integer_or_infinity(value)?.clamp(0.0, len as f64) as usize)
}

// Object.

fn object_has_own_property(this: &Value, args: &[Value]) -> EvalResult<Value> {
  if this.is_nullish() {
    return Err(EvalError::type_error(
      "Cannot convert undefined or null to object",
    ));
  }
  let key = to_property_key(&arg(args, 0))?;
  Ok(Value::Bool(has_own(this, &key)))
}

fn object_to_string(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  let tag = match this {
    Value::Undefined => "Undefined",
    Value::Null => "Null",
    Value::Bool(_) => "Boolean",
    Value::Number(_) => "Number",
    Value::String(_) => "String",
    Value::Object(_) => "Object",
    Value::Array(_) => "Array",
    Value::Function(_) => "Function",
    Value::RegExp(_) => "RegExp",
  };
  Ok(Value::from(format!("[object {tag}]")))
}

fn object_value_of(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  if this.is_nullish() {
    return Err(EvalError::type_error(
      "Cannot convert undefined or null to object",
    ));
  }
  Ok(this.clone())
}

// Boolean.

fn this_boolean(this: &Value, method: &str) -> EvalResult<bool> {
  this.as_bool().ok_or_else(|| {
    EvalError::type_error(format!(
      "Boolean.prototype.{method} requires that 'this' be a Boolean"
    ))
  })
}

fn boolean_to_string(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::string(if this_boolean(this, "toString")? {
    "true"
  } else {
    "false"
  }))
}

fn boolean_value_of(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::Bool(this_boolean(this, "valueOf")?))
}

// Number.

fn this_number(this: &Value, method: &str) -> EvalResult<f64> {
  this.as_number().ok_or_else(|| {
    EvalError::type_error(format!(
      "Number.prototype.{method} requires that 'this' be a Number"
    ))
  })
}

fn number_to_string(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let n = this_number(this, "toString")?;
  let radix = arg(args, 0);
  let radix = if radix.is_undefined() {
    10.0
  } else {
    to_integer_or_infinity(&radix)?
  };
  if !(2.0..=36.0).contains(&radix) {
    return Err(EvalError::range_error(
      "toString() radix must be between 2 and 36",
    ));
  }
  Ok(Value::from(number_to_radix_string(n, radix as u32)))
}

fn number_to_fixed_method(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let n = this_number(this, "toFixed")?;
  let digits = to_integer_or_infinity(&arg(args, 0))?;
  if !(0.0..=100.0).contains(&digits) {
    return Err(EvalError::range_error(
      "toFixed() digits argument must be between 0 and 100",
    ));
  }
  Ok(Value::from(number_to_fixed(n, digits as usize)))
}

fn number_value_of(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::Number(this_number(this, "valueOf")?))
}

// String.

fn this_string(this: &Value, method: &str) -> EvalResult<Rc<str>> {
  if this.is_nullish() {
    return Err(EvalError::type_error(format!(
      "String.prototype.{method} called on null or undefined"
    )));
  }
  to_string(this)
}

fn units(s: &str) -> Vec<u16> {
  s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> Value {
  Value::from(String::from_utf16_lossy(units))
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
  if needle.len() > haystack.len() {
    return None;
  }
  (from..=haystack.len() - needle.len()).find(|&i| haystack[i..].starts_with(needle))
}

fn search_string(value: &Value, method: &str) -> EvalResult<Rc<str>> {
  if matches!(value, Value::RegExp(_)) {
    return Err(EvalError::type_error(format!(
      "First argument to String.prototype.{method} must not be a regular expression"
    )));
  }
  to_string(value)
}

fn string_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "at")?);
  let n = to_integer_or_infinity(&arg(args, 0))?;
  let index = if n < 0.0 { s.len() as f64 + n } else { n };
  if index < 0.0 || index >= s.len() as f64 {
    return Ok(Value::Undefined);
  }
  Ok(from_units(&s[index as usize..index as usize + 1]))
}

fn string_char_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "charAt")?);
  let n = to_integer_or_infinity(&arg(args, 0))?;
  if n < 0.0 || n >= s.len() as f64 {
    return Ok(Value::string(""));
  }
  Ok(from_units(&s[n as usize..n as usize + 1]))
}

fn string_char_code_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "charCodeAt")?);
  let n = to_integer_or_infinity(&arg(args, 0))?;
  if n < 0.0 || n >= s.len() as f64 {
    return Ok(Value::Number(f64::NAN));
  }
  Ok(Value::from(s[n as usize] as u32))
}

fn string_concat(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let mut out = this_string(this, "concat")?.to_string();
  for value in args {
    out.push_str(&to_string(value)?);
  }
  Ok(Value::from(out))
}

fn string_ends_with(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "endsWith")?);
  let search = units(&search_string(&arg(args, 0), "endsWith")?);
  let end = clamped_index(&arg(args, 1), s.len(), s.len())?;
  Ok(Value::Bool(s[..end].ends_with(&search)))
}

fn string_includes(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "includes")?);
  let search = units(&search_string(&arg(args, 0), "includes")?);
  let from = clamped_index(&arg(args, 1), s.len(), 0)?;
  Ok(Value::Bool(find_units(&s, &search, from).is_some()))
}

fn string_index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "indexOf")?);
  let search = units(&to_string(&arg(args, 0))?);
  let from = clamped_index(&arg(args, 1), s.len(), 0)?;
  Ok(match find_units(&s, &search, from) {
    Some(i) => Value::from(i),
    None => Value::from(-1),
  })
}

fn string_last_index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "lastIndexOf")?);
  let search = units(&to_string(&arg(args, 0))?);
  if search.len() > s.len() {
    return Ok(Value::from(-1));
  }
  let position = to_number(&arg(args, 1))?;
  let limit = s.len() - search.len();
  let start = if position.is_nan() {
    limit
  } else {
    position.trunc().clamp(0.0, limit as f64) as usize
  };
  Ok(match (0..=start).rev().find(|&i| s[i..].starts_with(&search)) {
    Some(i) => Value::from(i),
    None => Value::from(-1),
  })
}

fn string_pad(this: &Value, args: &[Value], method: &str, at_start: bool) -> EvalResult<Value> {
  let s = this_string(this, method)?;
  let len = s.encode_utf16().count();
  let max = to_integer_or_infinity(&arg(args, 0))?;
  if max <= len as f64 {
    return Ok(Value::String(s));
  }
  if max > MAX_STRING_LENGTH as f64 {
    return Err(EvalError::range_error("Invalid string length"));
  }
  let fill = match arg(args, 1) {
    Value::Undefined => units(" "),
    value => units(&to_string(&value)?),
  };
  if fill.is_empty() {
    return Ok(Value::String(s));
  }
  let padding: Vec<u16> = fill
    .iter()
    .copied()
    .cycle()
    .take(max as usize - len)
    .collect();
  let mut out = Vec::with_capacity(max as usize);
  if at_start {
    out.extend_from_slice(&padding);
    out.extend(s.encode_utf16());
  } else {
    out.extend(s.encode_utf16());
    out.extend_from_slice(&padding);
  }
  Ok(from_units(&out))
}

fn string_pad_end(this: &Value, args: &[Value]) -> EvalResult<Value> {
  string_pad(this, args, "padEnd", false)
}

fn string_pad_start(this: &Value, args: &[Value]) -> EvalResult<Value> {
  string_pad(this, args, "padStart", true)
}

fn string_repeat(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = this_string(this, "repeat")?;
  let count = to_integer_or_infinity(&arg(args, 0))?;
  if count < 0.0 || count.is_infinite() {
    return Err(EvalError::range_error(format!(
      "Invalid count value: {}",
      crate::num::number_to_string(count)
    )));
  }
  let len = s.encode_utf16().count();
  if len as f64 * count > MAX_STRING_LENGTH as f64 {
    return Err(EvalError::range_error("Invalid string length"));
  }
  Ok(Value::from(s.repeat(count as usize)))
}

fn string_slice(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "slice")?);
  let start = relative_index(&arg(args, 0), s.len(), 0)?;
  let end = relative_index(&arg(args, 1), s.len(), s.len())?;
  if start >= end {
    return Ok(Value::string(""));
  }
  Ok(from_units(&s[start..end]))
}

fn string_substring(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "substring")?);
  let a = clamped_index(&arg(args, 0), s.len(), 0)?;
  let b = clamped_index(&arg(args, 1), s.len(), s.len())?;
  Ok(from_units(&s[a.min(b)..a.max(b)]))
}

fn string_starts_with(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = units(&this_string(this, "startsWith")?);
  let search = units(&search_string(&arg(args, 0), "startsWith")?);
  let start = clamped_index(&arg(args, 1), s.len(), 0)?;
  Ok(Value::Bool(s[start..].starts_with(&search)))
}

fn string_to_lower_case(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::from(this_string(this, "toLowerCase")?.to_lowercase()))
}

fn string_to_upper_case(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::from(this_string(this, "toUpperCase")?.to_uppercase()))
}

fn string_to_string(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  match this {
    Value::String(_) => Ok(this.clone()),
    _ => Err(EvalError::type_error(
      "String.prototype.toString requires that 'this' be a String",
    )),
  }
}

fn string_trim(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::string(
    this_string(this, "trim")?.trim_matches(is_ecma_whitespace),
  ))
}

fn string_trim_end(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::string(
    this_string(this, "trimEnd")?.trim_end_matches(is_ecma_whitespace),
  ))
}

fn string_trim_start(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::string(
    this_string(this, "trimStart")?.trim_start_matches(is_ecma_whitespace),
  ))
}

/// Treats a non-regexp argument of `match`/`search` as a pattern source.
fn coerce_regexp(value: &Value) -> EvalResult<RegExp> {
  match value {
    Value::RegExp(re) => Ok(re.clone()),
    Value::Undefined => RegExp::new("", ""),
    other => RegExp::new(&to_string(other)?, ""),
  }
}

fn match_array(m: RegExpMatch) -> Value {
  let mut items = vec![Value::from(m.matched)];
  items.extend(
    m.groups
      .into_iter()
      .map(|g| g.map(Value::from).unwrap_or_default()),
  );
  Value::array(items)
}

fn string_match(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = this_string(this, "match")?;
  let re = coerce_regexp(&arg(args, 0))?;
  if !re.global() {
    return Ok(re.exec_at_last_index(&s).map(match_array).unwrap_or(Value::Null));
  }
  re.set_last_index(0);
  let matches = re.match_all(&s);
  if matches.is_empty() {
    return Ok(Value::Null);
  }
  Ok(Value::array(
    matches.into_iter().map(|m| Value::from(m.matched)).collect(),
  ))
}

fn string_search(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = this_string(this, "search")?;
  let re = coerce_regexp(&arg(args, 0))?;
  Ok(match re.match_from(&s, 0) {
    Some(m) => Value::from(byte_to_utf16_offset(&s, m.start)),
    None => Value::from(-1),
  })
}

fn string_split(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let s = this_string(this, "split")?;
  let limit = match arg(args, 1) {
    Value::Undefined => u32::MAX as usize,
    value => to_uint32(&value)? as usize,
  };
  if limit == 0 {
    return Ok(Value::array(Vec::new()));
  }
  let parts: Vec<Value> = match arg(args, 0) {
    Value::Undefined => vec![Value::String(s)],
    Value::RegExp(re) => split_regexp(&s, &re, limit),
    separator => {
      let separator = to_string(&separator)?;
      if separator.is_empty() {
        s.encode_utf16()
          .take(limit)
          .map(|unit| from_units(&[unit]))
          .collect()
      } else {
        s.split(&*separator).take(limit).map(Value::from).collect()
      }
    }
  };
  Ok(Value::array(parts))
}

fn split_regexp(s: &str, re: &RegExp, limit: usize) -> Vec<Value> {
  if s.is_empty() {
    return match re.match_from(s, 0) {
      Some(_) => Vec::new(),
      None => vec![Value::string(s)],
    };
  }
  let mut out = Vec::new();
  let mut last = 0;
  let mut position = 0;
  while position < s.len() {
    let Some(m) = re.match_from(s, position) else {
      break;
    };
    if m.start >= s.len() {
      break;
    }
    if m.end == last {
      // An empty match where the previous piece ended separates nothing.
      position = s[m.start..]
        .chars()
        .next()
        .map_or(s.len(), |c| m.start + c.len_utf8());
      continue;
    }
    out.push(Value::string(&s[last..m.start]));
    if out.len() == limit {
      return out;
    }
    for group in m.groups {
      out.push(group.map(Value::from).unwrap_or_default());
      if out.len() == limit {
        return out;
      }
    }
    last = m.end;
    position = last;
  }
  out.push(Value::string(&s[last..]));
  out
}

fn string_matches(s: &str, pattern: &str, all: bool) -> Vec<RegExpMatch> {
  let found = |start: usize| RegExpMatch {
    start,
    end: start + pattern.len(),
    groups: Vec::new(),
    matched: pattern.to_string(),
  };
  if !all {
    return s.find(pattern).map(found).into_iter().collect();
  }
  if pattern.is_empty() {
    // Between every pair of characters, and at both ends.
    return s
      .char_indices()
      .map(|(i, _)| i)
      .chain(std::iter::once(s.len()))
      .map(found)
      .collect();
  }
  s.match_indices(pattern).map(|(i, _)| found(i)).collect()
}

/// Expands `$$`, `$&`, `` $` ``, `$'`, `$n`, `$nn` and `$<name>` in a replacement template.
fn expand_replacement(template: &str, s: &str, m: &RegExpMatch, names: &[Option<String>]) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;
  while let Some(dollar) = rest.find('$') {
    out.push_str(&rest[..dollar]);
    rest = &rest[dollar..];
    let bytes = rest.as_bytes();
    let consumed = match bytes.get(1) {
      Some(b'$') => {
        out.push('$');
        2
      }
      Some(b'&') => {
        out.push_str(&m.matched);
        2
      }
      Some(b'`') => {
        out.push_str(&s[..m.start]);
        2
      }
      Some(b'\'') => {
        out.push_str(&s[m.end..]);
        2
      }
      Some(d) if d.is_ascii_digit() => {
        let one = (d - b'0') as usize;
        let two = bytes
          .get(2)
          .filter(|d2| d2.is_ascii_digit())
          .map(|d2| one * 10 + (d2 - b'0') as usize);
        let (index, width) = match two {
          Some(n) if n >= 1 && n <= m.groups.len() => (n, 3),
          _ => (one, 2),
        };
        if index >= 1 && index <= m.groups.len() {
          if let Some(group) = &m.groups[index - 1] {
            out.push_str(group);
          }
          width
        } else {
          out.push('$');
          1
        }
      }
      Some(b'<') if names.iter().any(Option::is_some) => match rest.find('>') {
        Some(close) => {
          let name = &rest[2..close];
          let group = names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .and_then(|i| m.groups.get(i).cloned().flatten());
          if let Some(group) = group {
            out.push_str(&group);
          }
          close + 1
        }
        None => {
          out.push('$');
          1
        }
      },
      _ => {
        out.push('$');
        1
      }
    };
    rest = &rest[consumed..];
  }
  out.push_str(rest);
  out
}

fn replace(this: &Value, args: &[Value], method: &str, all: bool) -> EvalResult<Value> {
  let s = this_string(this, method)?;
  let pattern = arg(args, 0);
  let (matches, names) = match &pattern {
    Value::RegExp(re) => {
      if all && !re.global() {
        return Err(EvalError::type_error(
          "replaceAll must be called with a global RegExp",
        ));
      }
      let matches = if re.global() {
        re.set_last_index(0);
        re.match_all(&s)
      } else {
        re.exec_at_last_index(&s).into_iter().collect()
      };
      (matches, re.group_names())
    }
    other => (string_matches(&s, &to_string(other)?, all), Vec::new()),
  };

  let replacement = arg(args, 1);
  let template = match &replacement {
    Value::Function(_) => None,
    other => Some(to_string(other)?),
  };

  let mut out = String::with_capacity(s.len());
  let mut last = 0;
  for m in &matches {
    out.push_str(&s[last..m.start]);
    match (&replacement, &template) {
      (Value::Function(func), _) => {
        let mut call_args = vec![Value::from(m.matched.as_str())];
        call_args.extend(
          m.groups
            .iter()
            .map(|g| g.clone().map(Value::from).unwrap_or_default()),
        );
        call_args.push(Value::from(byte_to_utf16_offset(&s, m.start)));
        call_args.push(Value::String(s.clone()));
        if names.iter().any(Option::is_some) {
          let groups = Object::new();
          for (name, group) in names.iter().zip(&m.groups) {
            if let Some(name) = name {
              groups.set(name.as_str(), group.clone().map(Value::from).unwrap_or_default());
            }
          }
          call_args.push(Value::Object(groups));
        }
        let result = func.call(&Value::Undefined, &call_args)?;
        out.push_str(&to_string(&result)?);
      }
      (_, Some(template)) => out.push_str(&expand_replacement(template, &s, m, &names)),
      (_, None) => {}
    }
    last = m.end;
  }
  out.push_str(&s[last..]);
  Ok(Value::from(out))
}

fn string_replace(this: &Value, args: &[Value]) -> EvalResult<Value> {
  replace(this, args, "replace", false)
}

fn string_replace_all(this: &Value, args: &[Value]) -> EvalResult<Value> {
  replace(this, args, "replaceAll", true)
}

// Array.

fn this_array(this: &Value, method: &str) -> EvalResult<Array> {
  match this {
    Value::Array(array) => Ok(array.clone()),
    other => Err(EvalError::type_error(format!(
      "Array.prototype.{method} called on {}",
      describe(other)
    ))),
  }
}

fn check_length(len: usize) -> EvalResult<()> {
  if len > MAX_ARRAY_LENGTH {
    return Err(EvalError::range_error("Invalid array length"));
  }
  Ok(())
}

/// Visits elements up to the length at entry, stopping early if the array shrinks or `f`
/// returns `false`.
fn each_element(
  array: &Array,
  mut f: impl FnMut(usize, Value) -> EvalResult<bool>,
) -> EvalResult<()> {
  for i in 0..array.len() {
    let Some(element) = array.get(i) else {
      break;
    };
    if !f(i, element)? {
      break;
    }
  }
  Ok(())
}

fn call_back(func: &Function, this_arg: &Value, array: &Array, i: usize, element: Value) -> EvalResult<Value> {
  func.call(
    this_arg,
    &[element, Value::from(i), Value::Array(array.clone())],
  )
}

fn array_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "at")?;
  let len = array.len() as f64;
  let n = to_integer_or_infinity(&arg(args, 0))?;
  let index = if n < 0.0 { len + n } else { n };
  if index < 0.0 || index >= len {
    return Ok(Value::Undefined);
  }
  Ok(array.get(index as usize).unwrap_or_default())
}

fn array_concat(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let mut items = this_array(this, "concat")?.to_vec();
  for value in args {
    match value {
      Value::Array(other) => items.extend(other.to_vec()),
      other => items.push(other.clone()),
    }
  }
  check_length(items.len())?;
  Ok(Value::array(items))
}

fn array_every(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "every")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  let mut result = true;
  each_element(&array, |i, element| {
    result = to_boolean(&call_back(&func, &this_arg, &array, i, element)?);
    Ok(result)
  })?;
  Ok(Value::Bool(result))
}

fn array_filter(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "filter")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  let mut kept = Vec::new();
  each_element(&array, |i, element| {
    if to_boolean(&call_back(&func, &this_arg, &array, i, element.clone())?) {
      kept.push(element);
    }
    Ok(true)
  })?;
  Ok(Value::array(kept))
}

fn array_find(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "find")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  let mut found = Value::Undefined;
  each_element(&array, |i, element| {
    if to_boolean(&call_back(&func, &this_arg, &array, i, element.clone())?) {
      found = element;
      return Ok(false);
    }
    Ok(true)
  })?;
  Ok(found)
}

fn array_find_index(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "findIndex")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  let mut found = Value::from(-1);
  each_element(&array, |i, element| {
    if to_boolean(&call_back(&func, &this_arg, &array, i, element)?) {
      found = Value::from(i);
      return Ok(false);
    }
    Ok(true)
  })?;
  Ok(found)
}

fn flatten_into(
  out: &mut Vec<Value>,
  array: &Array,
  depth: f64,
  ancestors: &mut Vec<*const ()>,
) -> EvalResult<()> {
  if ancestors.contains(&array.as_ptr()) {
    return Err(EvalError::range_error("Maximum call stack size exceeded"));
  }
  ancestors.push(array.as_ptr());
  for element in array.to_vec() {
    match element {
      Value::Array(inner) if depth >= 1.0 => flatten_into(out, &inner, depth - 1.0, ancestors)?,
      other => out.push(other),
    }
    check_length(out.len())?;
  }
  ancestors.pop();
  Ok(())
}

fn array_flat(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "flat")?;
  let depth = match arg(args, 0) {
    Value::Undefined => 1.0,
    value => to_integer_or_infinity(&value)?,
  };
  let mut out = Vec::new();
  flatten_into(&mut out, &array, depth, &mut Vec::new())?;
  Ok(Value::array(out))
}

fn array_for_each(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "forEach")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  each_element(&array, |i, element| {
    call_back(&func, &this_arg, &array, i, element)?;
    Ok(true)
  })?;
  Ok(Value::Undefined)
}

fn array_includes(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let items = this_array(this, "includes")?.to_vec();
  let search = arg(args, 0);
  let from = relative_index(&arg(args, 1), items.len(), 0)?;
  Ok(Value::Bool(
    items[from..].iter().any(|item| same_value_zero(item, &search)),
  ))
}

fn array_index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let items = this_array(this, "indexOf")?.to_vec();
  let search = arg(args, 0);
  let from = relative_index(&arg(args, 1), items.len(), 0)?;
  Ok(
    match items[from..].iter().position(|item| strict_equals(item, &search)) {
      Some(i) => Value::from(from + i),
      None => Value::from(-1),
    },
  )
}

fn array_join(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "join")?;
  let separator = match arg(args, 0) {
    Value::Undefined => Rc::from(","),
    value => to_string(&value)?,
  };
  Ok(Value::from(join_array(&array, &separator)?))
}

fn array_last_index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let items = this_array(this, "lastIndexOf")?.to_vec();
  if items.is_empty() {
    return Ok(Value::from(-1));
  }
  let search = arg(args, 0);
  let len = items.len() as f64;
  let start = match args.get(1) {
    None => len - 1.0,
    Some(value) => {
      let n = to_integer_or_infinity(value)?;
      if n < 0.0 {
        len + n
      } else {
        n.min(len - 1.0)
      }
    }
  };
  if start < 0.0 {
    return Ok(Value::from(-1));
  }
  Ok(
    match items[..=start as usize]
      .iter()
      .rposition(|item| strict_equals(item, &search))
    {
      Some(i) => Value::from(i),
      None => Value::from(-1),
    },
  )
}

fn array_map(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "map")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  let mut mapped = vec![Value::Undefined; array.len()];
  each_element(&array, |i, element| {
    mapped[i] = call_back(&func, &this_arg, &array, i, element)?;
    Ok(true)
  })?;
  Ok(Value::array(mapped))
}

fn array_pop(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "pop")?;
  Ok(array.with_mut(|items| items.pop()).unwrap_or_default())
}

fn array_push(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "push")?;
  check_length(array.len() + args.len())?;
  let len = array.with_mut(|items| {
    items.extend_from_slice(args);
    items.len()
  });
  Ok(Value::from(len))
}

fn array_reduce(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "reduce")?;
  let func = callback(args)?;
  let mut start = 0;
  let mut accumulator = match args.get(1) {
    Some(initial) => initial.clone(),
    None => {
      let Some(first) = array.get(0) else {
        return Err(EvalError::type_error(
          "Reduce of empty array with no initial value",
        ));
      };
      start = 1;
      first
    }
  };
  for i in start..array.len() {
    let Some(element) = array.get(i) else {
      break;
    };
    accumulator = func.call(
      &Value::Undefined,
      &[
        accumulator,
        element,
        Value::from(i),
        Value::Array(array.clone()),
      ],
    )?;
  }
  Ok(accumulator)
}

fn array_reverse(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  this_array(this, "reverse")?.with_mut(|items| items.reverse());
  Ok(this.clone())
}

fn array_shift(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "shift")?;
  Ok(
    array
      .with_mut(|items| (!items.is_empty()).then(|| items.remove(0)))
      .unwrap_or_default(),
  )
}

fn array_slice(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let items = this_array(this, "slice")?.to_vec();
  let start = relative_index(&arg(args, 0), items.len(), 0)?;
  let end = relative_index(&arg(args, 1), items.len(), items.len())?;
  if start >= end {
    return Ok(Value::array(Vec::new()));
  }
  Ok(Value::array(items[start..end].to_vec()))
}

fn array_some(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "some")?;
  let func = callback(args)?;
  let this_arg = arg(args, 1);
  let mut result = false;
  each_element(&array, |i, element| {
    result = to_boolean(&call_back(&func, &this_arg, &array, i, element)?);
    Ok(!result)
  })?;
  Ok(Value::Bool(result))
}

/// Stable merge sort with a fallible comparator. `less(a, b)` reports whether `a` sorts strictly
/// before `b`. Unlike `slice::sort_by`, an inconsistent comparator only yields an unspecified
/// order.
fn merge_sort(
  mut items: Vec<Value>,
  less: &mut dyn FnMut(&Value, &Value) -> EvalResult<bool>,
) -> EvalResult<Vec<Value>> {
  if items.len() <= 1 {
    return Ok(items);
  }
  let right = items.split_off(items.len() / 2);
  let left = merge_sort(items, less)?;
  let right = merge_sort(right, less)?;
  let mut merged = Vec::with_capacity(left.len() + right.len());
  let mut left = left.into_iter().peekable();
  let mut right = right.into_iter().peekable();
  while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
    if less(r, l)? {
      merged.extend(right.next());
    } else {
      merged.extend(left.next());
    }
  }
  merged.extend(left);
  merged.extend(right);
  Ok(merged)
}

fn array_sort(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "sort")?;
  let comparator = match arg(args, 0) {
    Value::Undefined => None,
    Value::Function(func) => Some(func),
    _ => {
      return Err(EvalError::type_error(
        "The comparison function must be either a function or undefined",
      ))
    }
  };
  // `undefined` always sorts last and is never passed to the comparator.
  let (defined, undefined): (Vec<Value>, Vec<Value>) =
    array.to_vec().into_iter().partition(|v| !v.is_undefined());
  let mut sorted = match &comparator {
    Some(func) => merge_sort(defined, &mut |a: &Value, b: &Value| {
      let order = to_number(&func.call(&Value::Undefined, &[a.clone(), b.clone()])?)?;
      Ok(order < 0.0)
    })?,
    None => merge_sort(defined, &mut |a: &Value, b: &Value| {
      let (a, b) = (to_string(a)?, to_string(b)?);
      Ok(a.encode_utf16().cmp(b.encode_utf16()) == Ordering::Less)
    })?,
  };
  sorted.extend(undefined);
  array.replace(sorted);
  Ok(this.clone())
}

fn array_to_string(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "toString")?;
  Ok(Value::from(join_array(&array, ",")?))
}

fn array_unshift(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let array = this_array(this, "unshift")?;
  check_length(array.len() + args.len())?;
  let len = array.with_mut(|items| {
    items.splice(0..0, args.iter().cloned());
    items.len()
  });
  Ok(Value::from(len))
}

// Function.

fn this_function(this: &Value, method: &str) -> EvalResult<Function> {
  match this {
    Value::Function(func) => Ok(func.clone()),
    other => Err(EvalError::type_error(format!(
      "Function.prototype.{method} called on {}",
      describe(other)
    ))),
  }
}

fn function_apply(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let func = this_function(this, "apply")?;
  let call_args = match arg(args, 1) {
    Value::Undefined | Value::Null => Vec::new(),
    Value::Array(array) => array.to_vec(),
    _ => {
      return Err(EvalError::type_error(
        "CreateListFromArrayLike called on non-object",
      ))
    }
  };
  func.call(&arg(args, 0), &call_args)
}

fn function_call(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let func = this_function(this, "call")?;
  func.call(&arg(args, 0), args.get(1..).unwrap_or_default())
}

fn function_to_string(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::from(this_function(this, "toString")?.source_text()))
}

// RegExp.

fn this_regexp(this: &Value, method: &str) -> EvalResult<RegExp> {
  match this {
    Value::RegExp(re) => Ok(re.clone()),
    other => Err(EvalError::type_error(format!(
      "RegExp.prototype.{method} called on {}",
      describe(other)
    ))),
  }
}

fn regexp_exec(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let re = this_regexp(this, "exec")?;
  let input = to_string(&arg(args, 0))?;
  Ok(re.exec_at_last_index(&input).map(match_array).unwrap_or(Value::Null))
}

fn regexp_test(this: &Value, args: &[Value]) -> EvalResult<Value> {
  let re = this_regexp(this, "test")?;
  let input = to_string(&arg(args, 0))?;
  Ok(Value::Bool(re.exec_at_last_index(&input).is_some()))
}

fn regexp_to_string(this: &Value, _args: &[Value]) -> EvalResult<Value> {
  Ok(Value::from(this_regexp(this, "toString")?.to_string()))
}
