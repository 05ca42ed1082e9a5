/// How reads of identifiers that are bound in no frame of the scope chain behave.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum UnresolvedIdentifiers {
  /// The read yields `undefined`, like a missing property lookup.
  #[default]
  Undefined,
  /// The read fails with [`EvalError::UnresolvedIdentifier`](crate::EvalError).
  Error,
}

/// Evaluator configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EvalOptions {
  pub unresolved_identifiers: UnresolvedIdentifiers,
  /// Upper bound, in bytes, on the compiled size of a single regular expression.
  pub regex_size_limit: usize,
}

impl Default for EvalOptions {
  fn default() -> Self {
    Self {
      unresolved_identifiers: UnresolvedIdentifiers::Undefined,
      regex_size_limit: 1024 * 1024,
    }
  }
}

impl EvalOptions {
  pub fn strict_identifiers(mut self) -> Self {
    self.unresolved_identifiers = UnresolvedIdentifiers::Error;
    self
  }

  pub fn with_regex_size_limit(mut self, limit: usize) -> Self {
    self.regex_size_limit = limit;
    self
  }
}
