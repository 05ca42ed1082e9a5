mod common;

use common::*;
use eval_js::{EvalError, Function, Scope, Value};
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

fn truthy(expr: serde_json::Value) -> bool {
  match eval_empty(expr) {
    Ok(Value::Bool(b)) => b,
    other => panic!("expected a boolean, got {other:?}"),
  }
}

#[test]
fn inequality_negates_equality() {
  assert!(!truthy(bin("!=", num(0.0), str("0"))));
  assert!(truthy(bin("!=", num(1.0), str("0"))));
  assert!(!truthy(bin("!=", null(), id("undefined"))));
  assert!(truthy(bin("!==", num(0.0), str("0"))));
}

#[test]
fn loose_equality_coercions() {
  assert!(truthy(bin("==", null(), id("missing"))));
  assert!(!truthy(bin("==", null(), num(0.0))));
  assert!(truthy(bin("==", boolean(true), str("1"))));
  assert!(truthy(bin("==", array(vec![num(1.0), num(2.0)]), str("1,2"))));
  assert!(!truthy(bin("==", array(vec![]), array(vec![]))));
  assert!(truthy(bin("==", str(" \n"), num(0.0))));
}

#[test]
fn relational_operators() {
  assert!(truthy(bin("<", num(1.0), num(2.0))));
  assert!(truthy(bin("<=", num(2.0), num(2.0))));
  assert!(truthy(bin(">", str("b"), str("a"))));
  assert!(truthy(bin(">=", str("10"), num(9.0))));
  assert!(truthy(bin("<", str("10"), str("9"))));
  assert!(!truthy(bin("<", id("missing"), num(1.0))));
  assert!(!truthy(bin(">=", id("missing"), num(1.0))));
}

#[test]
fn arithmetic_operators() -> Result<(), EvalError> {
  assert_eq!(eval_empty(bin("+", num(1.0), num(2.0)))?, Value::from(3));
  assert_eq!(eval_empty(bin("+", str("1"), num(2.0)))?, Value::from("12"));
  assert_eq!(eval_empty(bin("-", str("5"), num(2.0)))?, Value::from(3));
  assert_eq!(eval_empty(bin("*", str("3"), boolean(true)))?, Value::from(3));
  assert_eq!(eval_empty(bin("/", num(1.0), num(4.0)))?, Value::from(0.25));
  assert_eq!(eval_empty(bin("%", num(-7.0), num(2.0)))?, Value::from(-1));
  assert_eq!(eval_empty(bin("**", num(2.0), num(0.5)))?, Value::from(2f64.sqrt()));
  assert_eq!(eval_empty(bin("+", null(), num(1.0)))?, Value::from(1));
  let nan = eval_empty(bin("-", id("missing"), num(1.0)))?;
  assert!(nan.as_number().is_some_and(f64::is_nan));
  Ok(())
}

#[test]
fn bitwise_operators() -> Result<(), EvalError> {
  assert_eq!(eval_empty(bin("|", num(1.5), num(2.0)))?, Value::from(3));
  assert_eq!(eval_empty(bin("&", num(6.0), num(3.0)))?, Value::from(2));
  assert_eq!(eval_empty(bin("^", num(6.0), num(3.0)))?, Value::from(5));
  assert_eq!(eval_empty(bin("<<", num(1.0), num(31.0)))?, Value::from(-2147483648));
  assert_eq!(eval_empty(bin(">>", num(-16.0), num(2.0)))?, Value::from(-4));
  assert_eq!(eval_empty(bin(">>>", num(-16.0), num(28.0)))?, Value::from(15));
  Ok(())
}

#[test]
fn in_and_instanceof() -> Result<(), EvalError> {
  let scope = scope(json!({ "o": { "k": 1 }, "arr": [1, 2] }));
  assert_eq!(eval(bin("in", str("k"), id("o")), &scope)?, Value::Bool(true));
  assert_eq!(eval(bin("in", str("z"), id("o")), &scope)?, Value::Bool(false));
  assert_eq!(eval(bin("in", num(1.0), id("arr")), &scope)?, Value::Bool(true));
  assert_eq!(eval(bin("in", str("map"), id("arr")), &scope)?, Value::Bool(true));

  let err = eval(bin("in", str("k"), str("text")), &scope).unwrap_err();
  assert!(matches!(err, EvalError::TypeError(_)));
  let err = eval(bin("instanceof", id("o"), id("o")), &scope).unwrap_err();
  assert!(matches!(err, EvalError::TypeError(_)));
  let err = eval(bin("instanceof", id("o"), arrow(&[], num(1.0))), &scope).unwrap_err();
  assert!(matches!(err, EvalError::TypeError(_)));
  Ok(())
}

#[test]
fn short_circuit_skips_the_right_operand() -> Result<(), EvalError> {
  let calls = Rc::new(Cell::new(0));
  let scope = Scope::new();
  let counter = calls.clone();
  scope.set(
    "fail",
    Function::native("fail", 0, move |_, _| {
      counter.set(counter.get() + 1);
      Err(EvalError::Throw(Value::from("fail() was evaluated")))
    }),
  );
  let fail = || call(id("fail"), vec![]);

  assert_eq!(eval(logical("||", boolean(true), fail()), &scope)?, Value::Bool(true));
  assert_eq!(eval(logical("&&", boolean(false), fail()), &scope)?, Value::Bool(false));
  assert_eq!(eval(cond(boolean(true), num(1.0), fail()), &scope)?, Value::from(1));
  assert_eq!(calls.get(), 0);

  assert!(eval(logical("||", boolean(false), fail()), &scope).is_err());
  assert_eq!(calls.get(), 1);
  Ok(())
}

#[test]
fn compound_assignment_reads_before_evaluating_the_right_side() -> Result<(), EvalError> {
  // a += (a = 10)  →  1 + 10
  let scope = scope(json!({ "a": 1 }));
  let expr = assign("+=", id("a"), assign("=", id("a"), num(10.0)));
  assert_eq!(eval(expr, &scope)?, Value::from(11));
  assert_eq!(scope.get("a"), Some(Value::from(11)));
  Ok(())
}

#[test]
fn compound_assignment_on_members() -> Result<(), EvalError> {
  let scope = scope(json!({ "o": { "n": 1 }, "arr": [1, 2] }));
  assert_eq!(eval(assign("*=", member(id("o"), "n"), num(5.0)), &scope)?, Value::from(5));
  assert_eq!(
    eval(assign("-=", index(id("arr"), num(1.0)), num(2.0)), &scope)?,
    Value::from(0)
  );
  assert_eq!(to_json(scope.get("arr").unwrap()), json!([1, 0]));
  assert_eq!(to_json(scope.get("o").unwrap()), json!({ "n": 5 }));
  Ok(())
}

#[test]
fn operators_outside_the_recognized_set() {
  let err = eval_empty(logical("??", null(), num(1.0))).unwrap_err();
  assert!(matches!(
    err,
    EvalError::InvalidOperator { kind: "logical", ref operator } if operator == "??"
  ));
  for operator in ["||=", "&&=", "??="] {
    let err = eval_empty(assign(operator, id("a"), num(1.0))).unwrap_err();
    assert!(matches!(err, EvalError::InvalidOperator { kind: "assignment", .. }));
  }
}

#[test]
fn postfix_unary_is_rejected() {
  let expr = json!({
    "type": "UnaryExpression",
    "operator": "-",
    "prefix": false,
    "argument": { "type": "Literal", "value": 1 },
  });
  assert!(matches!(eval_empty(expr), Err(EvalError::UnsupportedConstruct(_))));
}

#[test]
fn delete_results() -> Result<(), EvalError> {
  let scope = scope(json!({ "arr": [1, 2], "s": "ab" }));
  assert_eq!(
    eval(unary("delete", member(id("arr"), "length")), &scope)?,
    Value::Bool(false)
  );
  assert_eq!(
    eval(unary("delete", index(id("arr"), num(0.0))), &scope)?,
    Value::Bool(true)
  );
  assert_eq!(to_json(scope.get("arr").unwrap()), json!([null, 2]));
  assert_eq!(
    eval(unary("delete", index(id("s"), num(0.0))), &scope)?,
    Value::Bool(false)
  );
  assert_eq!(eval(unary("delete", id("nothing")), &scope)?, Value::Bool(true));

  let err = eval(unary("delete", num(1.0)), &scope).unwrap_err();
  assert!(matches!(err, EvalError::UnsupportedConstruct(_)));
  let err = eval(unary("delete", member(id("missing"), "x")), &scope).unwrap_err();
  assert!(matches!(err, EvalError::TypeError(_)));
  Ok(())
}

#[test]
fn delete_only_affects_the_current_frame() -> Result<(), EvalError> {
  let parent = scope(json!({ "a": 1 }));
  let child = Scope::child(&parent);
  assert_eq!(eval(unary("delete", id("a")), &child)?, Value::Bool(true));
  assert_eq!(eval(id("a"), &child)?, Value::from(1));
  Ok(())
}
