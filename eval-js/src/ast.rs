//! Expression trees accepted by the evaluator.
//!
//! The shape follows ESTree, so the output of any ESTree-compatible parser (acorn, esprima,
//! meriyah, …) serialized to JSON can be deserialized straight into a [`Node`]. Nodes are never
//! mutated by evaluation; a tree can be evaluated any number of times.

use crate::operator::{AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator};
use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use std::rc::Rc;

/// An ESTree expression node, tagged by its `type` field.
///
/// Kinds the evaluator does not interpret still deserialize (so a whole parser output can be
/// loaded), and are reported as [`EvalError::UnsupportedNodeKind`](crate::EvalError) when
/// evaluated.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(remote = "Self", tag = "type")]
pub enum Node {
  ArrayExpression {
    /// `None` is an elision (`[1, , 2]`).
    elements: Vec<Option<Node>>,
  },
  ArrowFunctionExpression(Rc<ArrowFunction>),
  AssignmentExpression {
    operator: AssignmentOperator,
    left: Box<Node>,
    right: Box<Node>,
  },
  BinaryExpression {
    operator: BinaryOperator,
    left: Box<Node>,
    right: Box<Node>,
  },
  CallExpression {
    callee: Box<Node>,
    arguments: Vec<Node>,
  },
  ConditionalExpression {
    test: Box<Node>,
    consequent: Box<Node>,
    alternate: Box<Node>,
  },
  Identifier {
    name: String,
  },
  Literal(Lit),
  LogicalExpression {
    operator: LogicalOperator,
    left: Box<Node>,
    right: Box<Node>,
  },
  MemberExpression {
    object: Box<Node>,
    property: Box<Node>,
    #[serde(default)]
    computed: bool,
  },
  TemplateLiteral {
    quasis: Vec<TemplateElement>,
    expressions: Vec<Node>,
  },
  UnaryExpression {
    operator: UnaryOperator,
    #[serde(default = "default_prefix")]
    prefix: bool,
    argument: Box<Node>,
  },

  // Sub-forms that are only meaningful inside a recognized kind.
  SpreadElement {
    argument: Box<Node>,
  },
  RestElement {
    argument: Box<Node>,
  },
  Super {},
  BlockStatement {},
  AssignmentPattern {},
  ObjectPattern {},
  ArrayPattern {},

  // Deliberately excluded expression kinds.
  ThisExpression {},
  ObjectExpression {},
  FunctionExpression {},
  NewExpression {},
  SequenceExpression {},
  UpdateExpression {},
  TaggedTemplateExpression {},
  ClassExpression {},
  AwaitExpression {},
  YieldExpression {},
  ChainExpression {},
  ImportExpression {},
  MetaProperty {},
  /// Any other `type`, kept by name.
  #[serde(skip_deserializing)]
  Unknown(String),
}

const KINDS: &[&str] = &[
  "ArrayExpression",
  "ArrowFunctionExpression",
  "AssignmentExpression",
  "BinaryExpression",
  "CallExpression",
  "ConditionalExpression",
  "Identifier",
  "Literal",
  "LogicalExpression",
  "MemberExpression",
  "TemplateLiteral",
  "UnaryExpression",
  "SpreadElement",
  "RestElement",
  "Super",
  "BlockStatement",
  "AssignmentPattern",
  "ObjectPattern",
  "ArrayPattern",
  "ThisExpression",
  "ObjectExpression",
  "FunctionExpression",
  "NewExpression",
  "SequenceExpression",
  "UpdateExpression",
  "TaggedTemplateExpression",
  "ClassExpression",
  "AwaitExpression",
  "YieldExpression",
  "ChainExpression",
  "ImportExpression",
  "MetaProperty",
];

// The tag is read first so an unrecognized kind keeps its name, while a recognized kind with a
// malformed body still fails with the derived error.
impl<'de> Deserialize<'de> for Node {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let tree = serde_json::Value::deserialize(deserializer)?;
    let kind = match tree.get("type") {
      Some(serde_json::Value::String(kind)) => kind,
      _ => return Err(de::Error::missing_field("type")),
    };
    if !KINDS.contains(&kind.as_str()) {
      return Ok(Node::Unknown(kind.clone()));
    }
    Node::deserialize(tree).map_err(de::Error::custom)
  }
}

fn default_prefix() -> bool {
  true
}

impl Node {
  /// The ESTree `type` name of this node.
  pub fn kind(&self) -> &str {
    match self {
      Node::ArrayExpression { .. } => "ArrayExpression",
      Node::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
      Node::AssignmentExpression { .. } => "AssignmentExpression",
      Node::BinaryExpression { .. } => "BinaryExpression",
      Node::CallExpression { .. } => "CallExpression",
      Node::ConditionalExpression { .. } => "ConditionalExpression",
      Node::Identifier { .. } => "Identifier",
      Node::Literal(_) => "Literal",
      Node::LogicalExpression { .. } => "LogicalExpression",
      Node::MemberExpression { .. } => "MemberExpression",
      Node::TemplateLiteral { .. } => "TemplateLiteral",
      Node::UnaryExpression { .. } => "UnaryExpression",
      Node::SpreadElement { .. } => "SpreadElement",
      Node::RestElement { .. } => "RestElement",
      Node::Super {} => "Super",
      Node::BlockStatement {} => "BlockStatement",
      Node::AssignmentPattern {} => "AssignmentPattern",
      Node::ObjectPattern {} => "ObjectPattern",
      Node::ArrayPattern {} => "ArrayPattern",
      Node::ThisExpression {} => "ThisExpression",
      Node::ObjectExpression {} => "ObjectExpression",
      Node::FunctionExpression {} => "FunctionExpression",
      Node::NewExpression {} => "NewExpression",
      Node::SequenceExpression {} => "SequenceExpression",
      Node::UpdateExpression {} => "UpdateExpression",
      Node::TaggedTemplateExpression {} => "TaggedTemplateExpression",
      Node::ClassExpression {} => "ClassExpression",
      Node::AwaitExpression {} => "AwaitExpression",
      Node::YieldExpression {} => "YieldExpression",
      Node::ChainExpression {} => "ChainExpression",
      Node::ImportExpression {} => "ImportExpression",
      Node::MetaProperty {} => "MetaProperty",
      Node::Unknown(kind) => kind,
    }
  }

  pub fn is_super(&self) -> bool {
    matches!(self, Node::Super {})
  }
}

/// The function part of an `ArrowFunctionExpression`.
///
/// Shared behind an `Rc` so closures built from it can outlive the evaluation that created them
/// without copying the body.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ArrowFunction {
  pub params: Vec<Node>,
  pub body: Box<Node>,
  #[serde(default, rename = "async")]
  pub is_async: bool,
  #[serde(default)]
  pub generator: bool,
}

/// A literal value.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(try_from = "RawLit")]
pub enum Lit {
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  RegExp(RegexLit),
  /// Decimal digits of a BigInt literal, without the `n` suffix.
  BigInt(String),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RegexLit {
  pub pattern: String,
  #[serde(default)]
  pub flags: String,
}

// ESTree stores literal kinds side by side: `regex` and `bigint` take precedence over `value`,
// which is not JSON-representable for those kinds.
#[derive(Deserialize)]
struct RawLit {
  #[serde(default)]
  value: serde_json::Value,
  #[serde(default)]
  regex: Option<RegexLit>,
  #[serde(default)]
  bigint: Option<String>,
}

impl TryFrom<RawLit> for Lit {
  type Error = String;

  fn try_from(raw: RawLit) -> Result<Self, Self::Error> {
    if let Some(regex) = raw.regex {
      return Ok(Lit::RegExp(regex));
    }
    if let Some(digits) = raw.bigint {
      return Ok(Lit::BigInt(digits));
    }
    match raw.value {
      serde_json::Value::Null => Ok(Lit::Null),
      serde_json::Value::Bool(b) => Ok(Lit::Bool(b)),
      serde_json::Value::Number(n) => n
        .as_f64()
        .map(Lit::Number)
        .ok_or_else(|| format!("literal number {n} is not representable as f64")),
      serde_json::Value::String(s) => Ok(Lit::String(s)),
      other => Err(format!("invalid literal value {other}")),
    }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TemplateElement {
  pub value: TemplateValue,
  #[serde(default)]
  pub tail: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TemplateValue {
  pub raw: String,
  /// Absent only for tagged templates containing invalid escapes.
  #[serde(default)]
  pub cooked: Option<String>,
}

impl TemplateElement {
  /// The cooked text, falling back to the raw text when cooking failed.
  pub fn text(&self) -> &str {
    self.value.cooked.as_deref().unwrap_or(&self.value.raw)
  }
}
