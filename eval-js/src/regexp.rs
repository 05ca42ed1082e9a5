//! Regular expression values.
//!
//! Patterns are compiled with the `regex` crate, which covers the common ECMAScript syntax
//! (classes, quantifiers, groups, named groups, anchors, `\d\w\s\b`). Backreferences and
//! lookaround have no equivalent there and are reported as syntax errors.

use crate::error::{EvalError, EvalResult};
use regex::Regex;
use regex::RegexBuilder;
use std::cell::Cell;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

#[derive(Clone)]
pub struct RegExp(Rc<RegExpData>);

struct RegExpData {
  source: String,
  flags: String,
  regex: Regex,
  global: bool,
  ignore_case: bool,
  multiline: bool,
  sticky: bool,
  /// `lastIndex`, in UTF-16 code units. Only consulted for global or sticky expressions.
  last_index: Cell<usize>,
}

/// One successful match. Offsets are byte offsets into the searched string.
#[derive(Clone, Debug)]
pub struct RegExpMatch {
  pub start: usize,
  pub end: usize,
  /// Capture groups 1..n; `None` for groups that did not participate.
  pub groups: Vec<Option<String>>,
  pub matched: String,
}

impl RegExp {
  pub fn new(source: &str, flags: &str) -> EvalResult<Self> {
    Self::with_size_limit(source, flags, 1024 * 1024)
  }

  pub fn with_size_limit(source: &str, flags: &str, size_limit: usize) -> EvalResult<Self> {
    let mut global = false;
    let mut ignore_case = false;
    let mut multiline = false;
    let mut dot_all = false;
    let mut sticky = false;
    let mut seen = String::new();
    for flag in flags.chars() {
      if seen.contains(flag) {
        return Err(invalid_flags(flags));
      }
      seen.push(flag);
      match flag {
        'g' => global = true,
        'i' => ignore_case = true,
        'm' => multiline = true,
        's' => dot_all = true,
        'y' => sticky = true,
        // Unicode mode and match indices do not change what `regex` matches.
        'u' | 'd' => {}
        _ => return Err(invalid_flags(flags)),
      }
    }

    let pattern = translate_pattern(source);
    let regex = RegexBuilder::new(&pattern)
      .case_insensitive(ignore_case)
      .multi_line(multiline)
      .dot_matches_new_line(dot_all)
      .size_limit(size_limit)
      .build()
      .map_err(|err| {
        EvalError::SyntaxError(format!("Invalid regular expression: /{source}/: {err}"))
      })?;

    Ok(Self(Rc::new(RegExpData {
      source: if source.is_empty() { "(?:)".to_string() } else { source.to_string() },
      flags: canonical_flags(&seen),
      regex,
      global,
      ignore_case,
      multiline,
      sticky,
      last_index: Cell::new(0),
    })))
  }

  pub fn source(&self) -> &str {
    &self.0.source
  }

  pub fn flags(&self) -> &str {
    &self.0.flags
  }

  pub fn global(&self) -> bool {
    self.0.global
  }

  pub fn ignore_case(&self) -> bool {
    self.0.ignore_case
  }

  pub fn multiline(&self) -> bool {
    self.0.multiline
  }

  pub fn sticky(&self) -> bool {
    self.0.sticky
  }

  pub fn last_index(&self) -> usize {
    self.0.last_index.get()
  }

  pub fn set_last_index(&self, index: usize) {
    self.0.last_index.set(index);
  }

  pub fn regex(&self) -> &Regex {
    &self.0.regex
  }

  pub fn ptr_eq(&self, other: &RegExp) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  /// `RegExpBuiltinExec`: matches from `lastIndex` for global/sticky expressions (updating it),
  /// from the start otherwise.
  pub fn exec_at_last_index(&self, input: &str) -> Option<RegExpMatch> {
    let tracks_index = self.global() || self.sticky();
    let start_units = if tracks_index { self.last_index() } else { 0 };
    let Some(start) = utf16_to_byte_offset(input, start_units) else {
      self.set_last_index(0);
      return None;
    };
    let found = self.match_from(input, start);
    let found = match found {
      Some(m) if self.sticky() && m.start != start => None,
      other => other,
    };
    match &found {
      Some(m) if tracks_index => self.set_last_index(byte_to_utf16_offset(input, m.end)),
      None if tracks_index => self.set_last_index(0),
      _ => {}
    }
    found
  }

  /// The first match starting at or after byte offset `start`.
  pub fn match_from(&self, input: &str, start: usize) -> Option<RegExpMatch> {
    let caps = self.0.regex.captures_at(input, start)?;
    let whole = caps.get(0)?;
    Some(RegExpMatch {
      start: whole.start(),
      end: whole.end(),
      groups: caps
        .iter()
        .skip(1)
        .map(|g| g.map(|g| g.as_str().to_string()))
        .collect(),
      matched: whole.as_str().to_string(),
    })
  }

  /// All non-overlapping matches, advancing past empty matches.
  pub fn match_all(&self, input: &str) -> Vec<RegExpMatch> {
    let mut out = Vec::new();
    let mut start = 0;
    while start <= input.len() {
      let Some(m) = self.match_from(input, start) else {
        break;
      };
      start = if m.end == m.start {
        next_char_boundary(input, m.end)
      } else {
        m.end
      };
      out.push(m);
    }
    out
  }

  /// Names of capture groups 1..n, `None` for unnamed groups.
  pub fn group_names(&self) -> Vec<Option<String>> {
    self
      .0
      .regex
      .capture_names()
      .skip(1)
      .map(|name| name.map(str::to_string))
      .collect()
  }
}

impl Display for RegExp {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "/{}/{}", self.source(), self.flags())
  }
}

impl Debug for RegExp {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "RegExp({self})")
  }
}

fn invalid_flags(flags: &str) -> EvalError {
  EvalError::SyntaxError(format!("Invalid flags supplied to RegExp constructor '{flags}'"))
}

// `RegExp.prototype.flags` lists flags in a fixed order.
fn canonical_flags(flags: &str) -> String {
  "dgimsuy".chars().filter(|c| flags.contains(*c)).collect()
}

/// Rewrites the few ECMAScript spellings `regex` does not accept.
fn translate_pattern(source: &str) -> String {
  let mut out = String::with_capacity(source.len());
  let mut chars = source.chars();
  let mut in_class = false;
  while let Some(c) = chars.next() {
    if c != '\\' {
      match c {
        '[' => in_class = true,
        ']' => in_class = false,
        _ => {}
      }
      out.push(c);
      continue;
    }
    match chars.next() {
      // `\/` only exists to escape the literal delimiter.
      Some('/') => out.push('/'),
      // Without the `u` flag, ECMAScript character classes and word boundaries are ASCII-only.
      // The class forms also nest inside `[...]`.
      Some('d') => out.push_str("[0-9]"),
      Some('D') => out.push_str("[^0-9]"),
      Some('w') => out.push_str("[0-9A-Za-z_]"),
      Some('W') => out.push_str("[^0-9A-Za-z_]"),
      Some('b') if in_class => out.push_str("\\x08"),
      Some('b') => out.push_str("(?-u:\\b)"),
      Some('B') => out.push_str("(?-u:\\B)"),
      Some(other) => {
        out.push('\\');
        out.push(other);
      }
      None => out.push('\\'),
    }
  }
  out
}

fn next_char_boundary(s: &str, mut index: usize) -> usize {
  index += 1;
  while index < s.len() && !s.is_char_boundary(index) {
    index += 1;
  }
  index
}

/// Converts a UTF-16 offset into a byte offset, or `None` if it lies beyond the end.
pub fn utf16_to_byte_offset(s: &str, units: usize) -> Option<usize> {
  let mut seen = 0;
  for (byte, c) in s.char_indices() {
    if seen >= units {
      return Some(byte);
    }
    seen += c.len_utf16();
  }
  (seen >= units).then_some(s.len())
}

pub fn byte_to_utf16_offset(s: &str, byte: usize) -> usize {
  s[..byte].encode_utf16().count()
}
