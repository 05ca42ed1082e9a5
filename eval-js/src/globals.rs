//! Standard global bindings a host may opt into.
//!
//! Nothing here is installed automatically: a bare [`Scope`] resolves only what the host put in
//! it.

use crate::error::EvalError;
use crate::function::{Constructor, Function};
use crate::num::{is_ecma_whitespace, parse_ascii_int_radix};
use crate::ops::{to_boolean, to_int32, to_number, to_string};
use crate::options::EvalOptions;
use crate::property::MAX_ARRAY_LENGTH;
use crate::regexp::RegExp;
use crate::scope::Scope;
use crate::value::{Object, Value};

fn arg(args: &[Value], index: usize) -> Value {
  args.get(index).cloned().unwrap_or_default()
}

/// Binds the standard globals into `scope` with default options.
pub fn install(scope: &Scope) {
  install_with(scope, EvalOptions::default());
}

/// Binds the standard globals into `scope`. `options` governs the `RegExp` constructor.
pub fn install_with(scope: &Scope, options: EvalOptions) {
  scope.set("undefined", Value::Undefined);
  scope.set("NaN", f64::NAN);
  scope.set("Infinity", f64::INFINITY);

  scope.set(
    "isNaN",
    Function::native("isNaN", 1, |_, args| {
      Ok(Value::Bool(to_number(&arg(args, 0))?.is_nan()))
    }),
  );
  scope.set(
    "isFinite",
    Function::native("isFinite", 1, |_, args| {
      Ok(Value::Bool(to_number(&arg(args, 0))?.is_finite()))
    }),
  );
  scope.set(
    "parseInt",
    Function::native("parseInt", 2, |_, args| {
      let input = to_string(&arg(args, 0))?;
      let radix = to_int32(&arg(args, 1))?;
      Ok(Value::Number(parse_int(&input, radix)))
    }),
  );
  scope.set(
    "parseFloat",
    Function::native("parseFloat", 1, |_, args| {
      let input = to_string(&arg(args, 0))?;
      Ok(Value::Number(parse_float(&input)))
    }),
  );

  // Without wrapper objects, `Object(primitive)` hands the primitive back.
  scope.set(
    "Object",
    Function::constructor("Object", 1, Constructor::Object, |_, args| {
      Ok(match arg(args, 0) {
        Value::Undefined | Value::Null => Value::Object(Object::new()),
        other => other,
      })
    }),
  );
  scope.set(
    "Array",
    Function::constructor("Array", 1, Constructor::Array, |_, args| {
      if let [Value::Number(len)] = args {
        let len = *len;
        if len < 0.0 || len.fract() != 0.0 || len > MAX_ARRAY_LENGTH as f64 {
          return Err(EvalError::range_error("Invalid array length"));
        }
        return Ok(Value::array(vec![Value::Undefined; len as usize]));
      }
      Ok(Value::array(args.to_vec()))
    }),
  );
  scope.set(
    "Function",
    Function::constructor("Function", 1, Constructor::Function, |_, _| {
      Err(EvalError::unsupported(
        "the Function constructor requires parsing source text",
      ))
    }),
  );
  scope.set(
    "RegExp",
    Function::constructor("RegExp", 2, Constructor::RegExp, move |_, args| {
      let flags = arg(args, 1);
      let (source, flags) = match (arg(args, 0), flags) {
        (Value::RegExp(re), Value::Undefined) => return Ok(Value::RegExp(re)),
        (Value::RegExp(re), flags) => (re.source().to_string(), to_string(&flags)?),
        (pattern, flags) => (
          match pattern {
            Value::Undefined => String::new(),
            other => to_string(&other)?.to_string(),
          },
          match flags {
            Value::Undefined => "".into(),
            other => to_string(&other)?,
          },
        ),
      };
      let source = if source == "(?:)" { "" } else { source.as_str() };
      Ok(Value::RegExp(RegExp::with_size_limit(
        source,
        &flags,
        options.regex_size_limit,
      )?))
    }),
  );
  scope.set(
    "String",
    Function::constructor("String", 1, Constructor::String, |_, args| {
      Ok(match args.first() {
        None => Value::string(""),
        Some(value) => Value::String(to_string(value)?),
      })
    }),
  );
  scope.set(
    "Number",
    Function::constructor("Number", 1, Constructor::Number, |_, args| {
      Ok(match args.first() {
        None => Value::Number(0.0),
        Some(value) => Value::Number(to_number(value)?),
      })
    }),
  );
  scope.set(
    "Boolean",
    Function::constructor("Boolean", 1, Constructor::Boolean, |_, args| {
      Ok(Value::Bool(to_boolean(&arg(args, 0))))
    }),
  );
}

/// `parseInt(input, radix)` after argument coercion.
pub fn parse_int(input: &str, radix: i32) -> f64 {
  let s = input.trim_start_matches(is_ecma_whitespace);
  let (negative, mut s) = match s.as_bytes().first() {
    Some(b'-') => (true, &s[1..]),
    Some(b'+') => (false, &s[1..]),
    _ => (false, s),
  };
  let mut radix = radix;
  let mut strip_prefix = true;
  if radix == 0 {
    radix = 10;
  } else if !(2..=36).contains(&radix) {
    return f64::NAN;
  } else if radix != 16 {
    strip_prefix = false;
  }
  if strip_prefix {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
      s = rest;
      radix = 16;
    }
  }
  let radix = radix as u32;
  let end = s.find(|c: char| !c.is_digit(radix)).unwrap_or(s.len());
  let digits = &s[..end];
  let value = if radix == 10 {
    digits.parse::<f64>().ok()
  } else {
    parse_ascii_int_radix(digits, radix)
  };
  match value {
    Some(value) if negative => -value,
    Some(value) => value,
    None => f64::NAN,
  }
}

/// `parseFloat(input)` after argument coercion: the longest decimal literal prefix.
pub fn parse_float(input: &str) -> f64 {
  let s = input.trim_start_matches(is_ecma_whitespace);
  let bytes = s.as_bytes();
  let digits_from = |mut i: usize| {
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
      i += 1;
    }
    i
  };

  let mut i = 0;
  if matches!(bytes.first(), Some(b'+' | b'-')) {
    i = 1;
  }
  if s[i..].starts_with("Infinity") {
    return if bytes[0] == b'-' {
      f64::NEG_INFINITY
    } else {
      f64::INFINITY
    };
  }
  let int_end = digits_from(i);
  let mut digits = int_end - i;
  i = int_end;
  if bytes.get(i) == Some(&b'.') {
    let frac_end = digits_from(i + 1);
    digits += frac_end - (i + 1);
    if digits > 0 {
      i = frac_end;
    }
  }
  if digits == 0 {
    return f64::NAN;
  }
  if matches!(bytes.get(i), Some(b'e' | b'E')) {
    let mut j = i + 1;
    if matches!(bytes.get(j), Some(b'+' | b'-')) {
      j += 1;
    }
    let exp_end = digits_from(j);
    if exp_end > j {
      i = exp_end;
    }
  }
  s[..i].parse::<f64>().unwrap_or(f64::NAN)
}
