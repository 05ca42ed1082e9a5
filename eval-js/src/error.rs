use crate::value::Value;

/// Errors produced while evaluating an expression tree.
///
/// The first three variants report trees outside the supported expression subset. The remaining
/// variants are the runtime failures of the modeled computation itself; they are raised where the
/// modeled language would throw and propagate unmodified.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
  /// The node kind is not part of the supported expression subset.
  #[error("node type \"{0}\" is not supported")]
  UnsupportedNodeKind(String),

  /// A supported node kind used in a disallowed form (async arrow functions, block bodies,
  /// destructuring targets, `super`, …).
  #[error("unsupported construct: {0}")]
  UnsupportedConstruct(String),

  /// An operator token outside the recognized set for its node kind.
  #[error("unexpected {kind} operator \"{operator}\"")]
  InvalidOperator { kind: &'static str, operator: String },

  /// An identifier was not bound in any frame and the evaluator was configured to reject such
  /// reads.
  #[error("{0} is not defined")]
  UnresolvedIdentifier(String),

  #[error("TypeError: {0}")]
  TypeError(String),

  #[error("RangeError: {0}")]
  RangeError(String),

  /// An invalid regular expression pattern or flag set.
  #[error("SyntaxError: {0}")]
  SyntaxError(String),

  /// A value thrown by a host-provided native function.
  #[error("uncaught exception")]
  Throw(Value),
}

impl EvalError {
  pub(crate) fn unsupported(what: impl Into<String>) -> Self {
    EvalError::UnsupportedConstruct(what.into())
  }

  pub(crate) fn type_error(msg: impl Into<String>) -> Self {
    EvalError::TypeError(msg.into())
  }

  pub(crate) fn range_error(msg: impl Into<String>) -> Self {
    EvalError::RangeError(msg.into())
  }

  /// The thrown value, if this error was raised by a host `throw`.
  pub fn thrown_value(&self) -> Option<&Value> {
    match self {
      EvalError::Throw(value) => Some(value),
      _ => None,
    }
  }
}

pub type EvalResult<T> = Result<T, EvalError>;
