//! ESTree builders for integration tests.
//!
//! The helpers produce the same JSON acorn emits for the equivalent source (minus position
//! fields), so each test reads like the expression it evaluates.

#![allow(dead_code)]

use eval_js::{EvalOptions, EvalResult, Evaluator, Node, Scope, Value};
use serde_json::{json, Value as Json};

pub fn id(name: &str) -> Json {
  json!({ "type": "Identifier", "name": name })
}

pub fn num(value: f64) -> Json {
  json!({ "type": "Literal", "value": value })
}

pub fn str(value: &str) -> Json {
  json!({ "type": "Literal", "value": value })
}

pub fn boolean(value: bool) -> Json {
  json!({ "type": "Literal", "value": value })
}

pub fn null() -> Json {
  json!({ "type": "Literal", "value": null, "raw": "null" })
}

pub fn regex(pattern: &str, flags: &str) -> Json {
  json!({
    "type": "Literal",
    "value": {},
    "regex": { "pattern": pattern, "flags": flags },
  })
}

pub fn array(elements: Vec<Json>) -> Json {
  json!({ "type": "ArrayExpression", "elements": elements })
}

pub fn spread(argument: Json) -> Json {
  json!({ "type": "SpreadElement", "argument": argument })
}

pub fn bin(operator: &str, left: Json, right: Json) -> Json {
  json!({ "type": "BinaryExpression", "operator": operator, "left": left, "right": right })
}

pub fn logical(operator: &str, left: Json, right: Json) -> Json {
  json!({ "type": "LogicalExpression", "operator": operator, "left": left, "right": right })
}

pub fn unary(operator: &str, argument: Json) -> Json {
  json!({ "type": "UnaryExpression", "operator": operator, "prefix": true, "argument": argument })
}

pub fn assign(operator: &str, left: Json, right: Json) -> Json {
  json!({ "type": "AssignmentExpression", "operator": operator, "left": left, "right": right })
}

pub fn cond(test: Json, consequent: Json, alternate: Json) -> Json {
  json!({
    "type": "ConditionalExpression",
    "test": test,
    "consequent": consequent,
    "alternate": alternate,
  })
}

/// `object.name`
pub fn member(object: Json, name: &str) -> Json {
  json!({ "type": "MemberExpression", "object": object, "property": id(name), "computed": false })
}

/// `object[property]`
pub fn index(object: Json, property: Json) -> Json {
  json!({ "type": "MemberExpression", "object": object, "property": property, "computed": true })
}

pub fn call(callee: Json, arguments: Vec<Json>) -> Json {
  json!({ "type": "CallExpression", "callee": callee, "arguments": arguments, "optional": false })
}

/// `object.name(arguments…)`
pub fn method(object: Json, name: &str, arguments: Vec<Json>) -> Json {
  call(member(object, name), arguments)
}

pub fn rest(name: &str) -> Json {
  json!({ "type": "RestElement", "argument": id(name) })
}

/// `(params…) => body`, where a parameter spelled `...name` is a rest parameter.
pub fn arrow(params: &[&str], body: Json) -> Json {
  let params: Vec<Json> = params
    .iter()
    .map(|p| match p.strip_prefix("...") {
      Some(name) => rest(name),
      None => id(p),
    })
    .collect();
  arrow_with(params, body, false, false)
}

pub fn arrow_with(params: Vec<Json>, body: Json, is_async: bool, generator: bool) -> Json {
  json!({
    "type": "ArrowFunctionExpression",
    "id": null,
    "expression": true,
    "generator": generator,
    "async": is_async,
    "params": params,
    "body": body,
  })
}

/// A template literal from its text segments and interpolations.
pub fn template(quasis: &[&str], expressions: Vec<Json>) -> Json {
  let last = quasis.len().saturating_sub(1);
  let quasis: Vec<Json> = quasis
    .iter()
    .enumerate()
    .map(|(i, text)| {
      json!({
        "type": "TemplateElement",
        "value": { "raw": text, "cooked": text },
        "tail": i == last,
      })
    })
    .collect();
  json!({ "type": "TemplateLiteral", "quasis": quasis, "expressions": expressions })
}

pub fn node(json: Json) -> Node {
  serde_json::from_value(json).expect("valid ESTree node")
}

pub fn scope(bindings: Json) -> Scope {
  Scope::from_json(bindings).expect("scope bindings must be an object")
}

pub fn eval(json: Json, scope: &Scope) -> EvalResult<Value> {
  eval_js::evaluate(&node(json), scope)
}

pub fn eval_empty(json: Json) -> EvalResult<Value> {
  eval(json, &Scope::new())
}

pub fn eval_with(options: EvalOptions, json: Json, scope: &Scope) -> EvalResult<Value> {
  Evaluator::new(options).evaluate(&node(json), scope)
}

/// Converts a result to JSON for structural comparison.
pub fn to_json(value: Value) -> Json {
  value.to_json().expect("value is JSON-representable")
}
