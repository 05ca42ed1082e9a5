//! Embeddable evaluator for JavaScript expression trees.
//!
//! `eval-js` evaluates an already-parsed ESTree expression against a host-supplied [`Scope`] and
//! produces a [`Value`]. It interprets a deliberately small subset of the language: literals,
//! identifiers, array literals with spread, member access, calls, arrow functions with expression
//! bodies, template literals, and the unary, binary, logical, conditional and assignment
//! operators. There are no statements, loops or declarations, and evaluation performs no I/O.
//!
//! Parsing is out of scope. Any ESTree producer works; trees are deserialized with `serde`:
//!
//! ```
//! use eval_js::{evaluate, Node, Scope, Value};
//!
//! // acorn's `parseExpressionAt("a.toString(2)", 0)`, without position fields.
//! let node: Node = serde_json::from_value(serde_json::json!({
//!   "type": "CallExpression",
//!   "callee": {
//!     "type": "MemberExpression",
//!     "object": { "type": "Identifier", "name": "a" },
//!     "property": { "type": "Identifier", "name": "toString" },
//!     "computed": false,
//!   },
//!   "arguments": [{ "type": "Literal", "value": 2 }],
//! }))
//! .unwrap();
//!
//! let scope = Scope::new();
//! scope.set("a", 8);
//! assert_eq!(evaluate(&node, &scope).unwrap(), Value::from("1000"));
//! ```
//!
//! # Semantics
//!
//! Values follow the modeled language's weak typing: `==`, relational comparison, `+` and the
//! arithmetic and bitwise operators apply the standard coercions ([`ops`]). Objects and arrays
//! are shared references, so mutations made during evaluation are visible to the host.
//!
//! Identifiers resolve through the scope chain; writes always land in the frame passed to the
//! evaluation (or the closure invocation frame), never in a parent. Reading an unbound name yields
//! `undefined` unless [`EvalOptions::strict_identifiers`] is set.
//!
//! Trees outside the subset fail with [`EvalError::UnsupportedNodeKind`],
//! [`EvalError::UnsupportedConstruct`] or [`EvalError::InvalidOperator`]. Runtime failures of the
//! computation itself (calling a non-function, reading a property of `undefined`) are reported as
//! [`EvalError::TypeError`] and friends. Every failure aborts the whole evaluation.
//!
//! A scope is not thread safe (`Rc`-based) and evaluation holds no global state besides the
//! per-thread tables of built-in methods.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod exec;
pub mod function;
pub mod globals;
pub mod num;
pub mod operator;
pub mod ops;
pub mod options;
pub mod property;
pub mod regexp;
pub mod scope;
pub mod value;

pub use crate::ast::Node;
pub use crate::error::EvalError;
pub use crate::error::EvalResult;
pub use crate::exec::Evaluator;
pub use crate::function::Closure;
pub use crate::function::Function;
pub use crate::options::EvalOptions;
pub use crate::options::UnresolvedIdentifiers;
pub use crate::regexp::RegExp;
pub use crate::scope::Scope;
pub use crate::value::Array;
pub use crate::value::Object;
pub use crate::value::Value;

/// Evaluates `node` against `scope` with default [`EvalOptions`].
pub fn evaluate(node: &Node, scope: &Scope) -> EvalResult<Value> {
  Evaluator::default().evaluate(node, scope)
}
