//! Number-to-text conversions with ECMAScript output rules.

/// ECMAScript `Number::toString(x)` (radix 10).
///
/// Uses the shortest digit string that round-trips (via `ryu`) and then lays it out with the
/// ECMA-262 rules: plain notation for exponents in `[-7, 21)`, exponential notation otherwise.
pub fn number_to_string(value: f64) -> String {
  if value.is_nan() {
    return "NaN".to_string();
  }
  if value == 0.0 {
    // Also covers -0.
    return "0".to_string();
  }
  if value.is_infinite() {
    return if value < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
  }
  if value < 0.0 {
    return format!("-{}", number_to_string(-value));
  }

  let (digits, n) = shortest_digits(value);
  let k = digits.len() as i32;
  let mut out = String::new();
  if k <= n && n <= 21 {
    out.push_str(&digits);
    out.extend(std::iter::repeat('0').take((n - k) as usize));
  } else if 0 < n && n <= 21 {
    out.push_str(&digits[..n as usize]);
    out.push('.');
    out.push_str(&digits[n as usize..]);
  } else if -6 < n && n <= 0 {
    out.push_str("0.");
    out.extend(std::iter::repeat('0').take((-n) as usize));
    out.push_str(&digits);
  } else {
    let exp = n - 1;
    out.push_str(&digits[..1]);
    if k > 1 {
      out.push('.');
      out.push_str(&digits[1..]);
    }
    out.push('e');
    out.push(if exp < 0 { '-' } else { '+' });
    out.push_str(&exp.abs().to_string());
  }
  out
}

/// Decomposes a positive finite `value` into `(digits, n)` such that
/// `value == 0.digits × 10^n`, with no leading or trailing zeros in `digits`.
fn shortest_digits(value: f64) -> (String, i32) {
  let mut buf = ryu::Buffer::new();
  let formatted = buf.format_finite(value);
  let (mantissa, exp) = match formatted.split_once('e') {
    Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
    None => (formatted, 0),
  };
  let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

  let mut point = int_part.len() as i32 + exp;
  let mut digits: String = int_part.chars().chain(frac_part.chars()).collect();
  let leading = digits.len() - digits.trim_start_matches('0').len();
  point -= leading as i32;
  digits.drain(..leading);
  let trimmed_len = digits.trim_end_matches('0').len();
  digits.truncate(trimmed_len);
  (digits, point)
}

/// ECMAScript `Number.prototype.toString(radix)` for radix 2 to 36.
///
/// The fractional part is emitted until it is exhausted or falls below half the distance to the
/// next representable double.
pub fn number_to_radix_string(value: f64, radix: u32) -> String {
  debug_assert!((2..=36).contains(&radix));
  if radix == 10 || !value.is_finite() || value == 0.0 {
    return number_to_string(value);
  }
  let negative = value < 0.0;
  let value = value.abs();
  let radix_f = radix as f64;

  let mut integer = value.trunc();
  let mut fraction = value - integer;

  let mut int_digits = Vec::new();
  if integer == 0.0 {
    int_digits.push(b'0');
  }
  while integer >= 1.0 {
    let digit = (integer % radix_f) as u32;
    int_digits.push(digit_char(digit));
    integer = ((integer - digit as f64) / radix_f).trunc();
  }
  int_digits.reverse();

  let mut out = String::new();
  if negative {
    out.push('-');
  }
  out.push_str(std::str::from_utf8(&int_digits).unwrap_or_default());

  let next = f64::from_bits(value.to_bits() + 1);
  let mut delta = (0.5 * (next - value)).max(f64::from_bits(1));
  if fraction >= delta {
    out.push('.');
    // Bounded by the width of a double's mantissa in the smallest radix, plus headroom for
    // subnormals.
    for _ in 0..1100 {
      fraction *= radix_f;
      delta *= radix_f;
      let digit = fraction.trunc() as u32;
      out.push(digit_char(digit) as char);
      fraction -= digit as f64;
      if fraction < delta {
        break;
      }
    }
  }
  out
}

fn digit_char(digit: u32) -> u8 {
  b"0123456789abcdefghijklmnopqrstuvwxyz"[digit as usize]
}

/// ECMAScript `Number.prototype.toFixed(fraction_digits)` for finite `value` below `1e21`.
///
/// Ties round away from zero, as required by the "larger n" rule.
pub fn number_to_fixed(value: f64, fraction_digits: usize) -> String {
  if !value.is_finite() || value.abs() >= 1e21 {
    return number_to_string(value);
  }
  let negative = value < 0.0;
  // Every finite double has an exact decimal expansion of at most 1074 fractional digits.
  let exact = format!("{:.1074}", value.abs());
  let (int_part, frac_part) = exact.split_once('.').unwrap_or((&exact, ""));

  let mut digits: Vec<u8> = int_part.bytes().collect();
  digits.extend(frac_part.bytes().take(fraction_digits));
  let round_up = frac_part
    .as_bytes()
    .get(fraction_digits)
    .is_some_and(|d| *d >= b'5');
  if round_up {
    let mut i = digits.len();
    loop {
      if i == 0 {
        digits.insert(0, b'1');
        break;
      }
      i -= 1;
      if digits[i] == b'9' {
        digits[i] = b'0';
      } else {
        digits[i] += 1;
        break;
      }
    }
  }

  let int_len = digits.len() - fraction_digits;
  let mut out = String::new();
  // `-0.0001.toFixed(2)` is "-0.00" in ECMAScript; only `-0` itself loses the sign.
  if negative && value != 0.0 {
    out.push('-');
  }
  out.push_str(std::str::from_utf8(&digits[..int_len]).unwrap_or_default());
  if fraction_digits > 0 {
    out.push('.');
    out.push_str(std::str::from_utf8(&digits[int_len..]).unwrap_or_default());
  }
  out
}

/// ECMAScript `StringToNumber`.
pub fn string_to_number(raw: &str) -> f64 {
  let trimmed = raw.trim_matches(is_ecma_whitespace);

  if trimmed.is_empty() {
    return 0.0;
  }

  // Infinity is case-sensitive in ECMAScript string numeric literals.
  match trimmed {
    "Infinity" | "+Infinity" => return f64::INFINITY,
    "-Infinity" => return f64::NEG_INFINITY,
    _ => {}
  }

  if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
    return parse_ascii_int_radix(hex, 16).unwrap_or(f64::NAN);
  }
  if let Some(bin) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
    return parse_ascii_int_radix(bin, 2).unwrap_or(f64::NAN);
  }
  if let Some(oct) = trimmed.strip_prefix("0o").or_else(|| trimmed.strip_prefix("0O")) {
    return parse_ascii_int_radix(oct, 8).unwrap_or(f64::NAN);
  }

  // Rust accepts spellings ECMAScript does not ("inf", "nan", "1_0" is already rejected).
  let valid = trimmed
    .bytes()
    .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
  if !valid {
    return f64::NAN;
  }
  trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses digits in `radix`, returning `None` if any digit is invalid or `s` is empty.
pub fn parse_ascii_int_radix(s: &str, radix: u32) -> Option<f64> {
  if s.is_empty() {
    return None;
  }
  let radix_f = radix as f64;
  let mut value = 0.0f64;
  for b in s.bytes() {
    let digit = (b as char).to_digit(36)?;
    if digit >= radix {
      return None;
    }
    value = value * radix_f + digit as f64;
  }
  Some(value)
}

pub fn is_ecma_whitespace(c: char) -> bool {
  // ECMA-262 WhiteSpace + LineTerminator (used by TrimString / StringToNumber).
  matches!(
    c,
    '\u{0009}' // Tab
    | '\u{000A}' // LF
    | '\u{000B}' // VT
    | '\u{000C}' // FF
    | '\u{000D}' // CR
    | '\u{0020}' // Space
    | '\u{00A0}' // No-break space
    | '\u{1680}' // Ogham space mark
    | '\u{2000}'..='\u{200A}' // En quad..hair space
    | '\u{2028}' // Line separator
    | '\u{2029}' // Paragraph separator
    | '\u{202F}' // Narrow no-break space
    | '\u{205F}' // Medium mathematical space
    | '\u{3000}' // Ideographic space
    | '\u{FEFF}' // BOM
  )
}
