use serde::Deserialize;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

/// Operator of a `BinaryExpression`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub enum BinaryOperator {
  #[serde(rename = "==")]
  Equality,
  #[serde(rename = "!=")]
  Inequality,
  #[serde(rename = "===")]
  StrictEquality,
  #[serde(rename = "!==")]
  StrictInequality,
  #[serde(rename = "<")]
  LessThan,
  #[serde(rename = "<=")]
  LessThanOrEqual,
  #[serde(rename = ">")]
  GreaterThan,
  #[serde(rename = ">=")]
  GreaterThanOrEqual,
  #[serde(rename = "<<")]
  BitwiseLeftShift,
  #[serde(rename = ">>")]
  BitwiseRightShift,
  #[serde(rename = ">>>")]
  BitwiseUnsignedRightShift,
  #[serde(rename = "+")]
  Addition,
  #[serde(rename = "-")]
  Subtraction,
  #[serde(rename = "*")]
  Multiplication,
  #[serde(rename = "/")]
  Division,
  #[serde(rename = "%")]
  Remainder,
  #[serde(rename = "**")]
  Exponentiation,
  #[serde(rename = "|")]
  BitwiseOr,
  #[serde(rename = "^")]
  BitwiseXor,
  #[serde(rename = "&")]
  BitwiseAnd,
  #[serde(rename = "in")]
  In,
  #[serde(rename = "instanceof")]
  Instanceof,
}

impl BinaryOperator {
  pub fn as_str(self) -> &'static str {
    match self {
      BinaryOperator::Equality => "==",
      BinaryOperator::Inequality => "!=",
      BinaryOperator::StrictEquality => "===",
      BinaryOperator::StrictInequality => "!==",
      BinaryOperator::LessThan => "<",
      BinaryOperator::LessThanOrEqual => "<=",
      BinaryOperator::GreaterThan => ">",
      BinaryOperator::GreaterThanOrEqual => ">=",
      BinaryOperator::BitwiseLeftShift => "<<",
      BinaryOperator::BitwiseRightShift => ">>",
      BinaryOperator::BitwiseUnsignedRightShift => ">>>",
      BinaryOperator::Addition => "+",
      BinaryOperator::Subtraction => "-",
      BinaryOperator::Multiplication => "*",
      BinaryOperator::Division => "/",
      BinaryOperator::Remainder => "%",
      BinaryOperator::Exponentiation => "**",
      BinaryOperator::BitwiseOr => "|",
      BinaryOperator::BitwiseXor => "^",
      BinaryOperator::BitwiseAnd => "&",
      BinaryOperator::In => "in",
      BinaryOperator::Instanceof => "instanceof",
    }
  }
}

/// Operator of a `LogicalExpression`.
///
/// `??` deserializes so that it can be rejected with a proper error instead of a parse failure.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub enum LogicalOperator {
  #[serde(rename = "||")]
  Or,
  #[serde(rename = "&&")]
  And,
  #[serde(rename = "??")]
  NullishCoalescing,
}

impl LogicalOperator {
  pub fn as_str(self) -> &'static str {
    match self {
      LogicalOperator::Or => "||",
      LogicalOperator::And => "&&",
      LogicalOperator::NullishCoalescing => "??",
    }
  }
}

/// Operator of a `UnaryExpression`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub enum UnaryOperator {
  #[serde(rename = "-")]
  Negation,
  #[serde(rename = "+")]
  Plus,
  #[serde(rename = "!")]
  LogicalNot,
  #[serde(rename = "~")]
  BitwiseNot,
  #[serde(rename = "typeof")]
  Typeof,
  #[serde(rename = "void")]
  Void,
  #[serde(rename = "delete")]
  Delete,
}

impl UnaryOperator {
  pub fn as_str(self) -> &'static str {
    match self {
      UnaryOperator::Negation => "-",
      UnaryOperator::Plus => "+",
      UnaryOperator::LogicalNot => "!",
      UnaryOperator::BitwiseNot => "~",
      UnaryOperator::Typeof => "typeof",
      UnaryOperator::Void => "void",
      UnaryOperator::Delete => "delete",
    }
  }
}

/// Operator of an `AssignmentExpression`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
pub enum AssignmentOperator {
  #[serde(rename = "=")]
  Assignment,
  #[serde(rename = "+=")]
  AdditionAssignment,
  #[serde(rename = "-=")]
  SubtractionAssignment,
  #[serde(rename = "*=")]
  MultiplicationAssignment,
  #[serde(rename = "/=")]
  DivisionAssignment,
  #[serde(rename = "%=")]
  RemainderAssignment,
  #[serde(rename = "**=")]
  ExponentiationAssignment,
  #[serde(rename = "<<=")]
  BitwiseLeftShiftAssignment,
  #[serde(rename = ">>=")]
  BitwiseRightShiftAssignment,
  #[serde(rename = ">>>=")]
  BitwiseUnsignedRightShiftAssignment,
  #[serde(rename = "|=")]
  BitwiseOrAssignment,
  #[serde(rename = "^=")]
  BitwiseXorAssignment,
  #[serde(rename = "&=")]
  BitwiseAndAssignment,
  #[serde(rename = "||=")]
  LogicalOrAssignment,
  #[serde(rename = "&&=")]
  LogicalAndAssignment,
  #[serde(rename = "??=")]
  NullishCoalescingAssignment,
}

impl AssignmentOperator {
  pub fn as_str(self) -> &'static str {
    match self {
      AssignmentOperator::Assignment => "=",
      AssignmentOperator::AdditionAssignment => "+=",
      AssignmentOperator::SubtractionAssignment => "-=",
      AssignmentOperator::MultiplicationAssignment => "*=",
      AssignmentOperator::DivisionAssignment => "/=",
      AssignmentOperator::RemainderAssignment => "%=",
      AssignmentOperator::ExponentiationAssignment => "**=",
      AssignmentOperator::BitwiseLeftShiftAssignment => "<<=",
      AssignmentOperator::BitwiseRightShiftAssignment => ">>=",
      AssignmentOperator::BitwiseUnsignedRightShiftAssignment => ">>>=",
      AssignmentOperator::BitwiseOrAssignment => "|=",
      AssignmentOperator::BitwiseXorAssignment => "^=",
      AssignmentOperator::BitwiseAndAssignment => "&=",
      AssignmentOperator::LogicalOrAssignment => "||=",
      AssignmentOperator::LogicalAndAssignment => "&&=",
      AssignmentOperator::NullishCoalescingAssignment => "??=",
    }
  }

  /// The binary operator a compound assignment applies before storing.
  ///
  /// Returns `None` for plain `=` and for the logical assignment operators, which are not
  /// arithmetic compounds.
  pub fn binary_operator(self) -> Option<BinaryOperator> {
    Some(match self {
      AssignmentOperator::AdditionAssignment => BinaryOperator::Addition,
      AssignmentOperator::SubtractionAssignment => BinaryOperator::Subtraction,
      AssignmentOperator::MultiplicationAssignment => BinaryOperator::Multiplication,
      AssignmentOperator::DivisionAssignment => BinaryOperator::Division,
      AssignmentOperator::RemainderAssignment => BinaryOperator::Remainder,
      AssignmentOperator::ExponentiationAssignment => BinaryOperator::Exponentiation,
      AssignmentOperator::BitwiseLeftShiftAssignment => BinaryOperator::BitwiseLeftShift,
      AssignmentOperator::BitwiseRightShiftAssignment => BinaryOperator::BitwiseRightShift,
      AssignmentOperator::BitwiseUnsignedRightShiftAssignment => {
        BinaryOperator::BitwiseUnsignedRightShift
      }
      AssignmentOperator::BitwiseOrAssignment => BinaryOperator::BitwiseOr,
      AssignmentOperator::BitwiseXorAssignment => BinaryOperator::BitwiseXor,
      AssignmentOperator::BitwiseAndAssignment => BinaryOperator::BitwiseAnd,
      AssignmentOperator::Assignment
      | AssignmentOperator::LogicalOrAssignment
      | AssignmentOperator::LogicalAndAssignment
      | AssignmentOperator::NullishCoalescingAssignment => return None,
    })
  }
}

macro_rules! impl_display {
  ($($ty:ty),*) => {
    $(
      impl Display for $ty {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
          f.write_str(self.as_str())
        }
      }
    )*
  };
}

impl_display!(BinaryOperator, LogicalOperator, UnaryOperator, AssignmentOperator);
