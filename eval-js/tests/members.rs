mod common;

use common::*;
use eval_js::{EvalError, Value};
use serde_json::json;

#[test]
fn computed_keys_are_evaluated_in_scope() -> Result<(), EvalError> {
  let scope = scope(json!({ "obj": { "x": "named", "y": "value" }, "key": "y", "arr": [10, 20] }));
  assert_eq!(eval(index(id("obj"), id("key")), &scope)?, Value::from("value"));
  assert_eq!(eval(member(id("obj"), "key"), &scope)?, Value::Undefined);
  assert_eq!(
    eval(index(id("arr"), bin("-", member(id("arr"), "length"), num(1.0))), &scope)?,
    Value::from(20)
  );
  assert_eq!(eval(index(id("arr"), str("1")), &scope)?, Value::from(20));
  assert_eq!(eval(index(id("arr"), num(1.5)), &scope)?, Value::Undefined);
  assert_eq!(eval(index(str("abc"), num(1.0)), &scope)?, Value::from("b"));
  Ok(())
}

#[test]
fn nullish_receivers_fail_with_the_property_name() {
  let scope = scope(json!({ "a": null }));
  let err = eval(member(id("a"), "b"), &scope).unwrap_err();
  assert_eq!(err.to_string(), "TypeError: Cannot read properties of null (reading 'b')");
  let err = eval(member(id("missing"), "b"), &scope).unwrap_err();
  assert_eq!(
    err.to_string(),
    "TypeError: Cannot read properties of undefined (reading 'b')"
  );
  let err = eval(assign("=", member(id("a"), "b"), num(1.0)), &scope).unwrap_err();
  assert!(matches!(err, EvalError::TypeError(_)));
}

#[test]
fn calling_a_non_function_names_the_callee() {
  let scope = scope(json!({ "x": { "y": 1 } }));
  let err = eval(method(id("x"), "y", vec![]), &scope).unwrap_err();
  assert_eq!(err.to_string(), "TypeError: x.y is not a function");
  let err = eval(method(id("x"), "missing", vec![]), &scope).unwrap_err();
  assert_eq!(err.to_string(), "TypeError: x.missing is not a function");
  let err = eval(call(id("x"), vec![]), &scope).unwrap_err();
  assert_eq!(err.to_string(), "TypeError: x is not a function");
}

#[test]
fn member_assignment_mutates_shared_objects() -> Result<(), EvalError> {
  let scope = scope(json!({ "obj": {}, "key": "k" }));
  let Some(Value::Object(obj)) = scope.get("obj") else {
    panic!("expected an object");
  };
  assert_eq!(eval(assign("=", member(id("obj"), "a"), num(1.0)), &scope)?, Value::from(1));
  assert_eq!(eval(assign("=", index(id("obj"), id("key")), str("v")), &scope)?, Value::from("v"));
  assert_eq!(obj.get("a"), Some(Value::from(1)));
  assert_eq!(obj.get("k"), Some(Value::from("v")));
  let mut keys = obj.keys();
  keys.sort();
  assert_eq!(keys, ["a", "k"]);
  Ok(())
}

#[test]
fn array_index_and_length_writes() -> Result<(), EvalError> {
  let scope = scope(json!({ "arr": [1, 2, 3] }));
  eval(assign("=", member(id("arr"), "length"), num(1.0)), &scope)?;
  assert_eq!(to_json(scope.get("arr").unwrap()), json!([1]));

  eval(assign("=", index(id("arr"), num(3.0)), num(4.0)), &scope)?;
  assert_eq!(eval(member(id("arr"), "length"), &scope)?, Value::from(4));
  assert_eq!(eval(index(id("arr"), num(2.0)), &scope)?, Value::Undefined);

  // Named properties on arrays are dropped.
  eval(assign("=", member(id("arr"), "tag"), num(1.0)), &scope)?;
  assert_eq!(eval(member(id("arr"), "tag"), &scope)?, Value::Undefined);

  let err = eval(assign("=", member(id("arr"), "length"), num(-1.0)), &scope).unwrap_err();
  assert!(matches!(err, EvalError::RangeError(_)));
  let err = eval(
    assign("=", index(id("arr"), num(16777216.0)), num(1.0)),
    &scope,
  )
  .unwrap_err();
  assert!(matches!(err, EvalError::RangeError(_)));
  Ok(())
}

#[test]
fn writes_to_primitives_are_ignored() -> Result<(), EvalError> {
  let scope = scope(json!({ "s": "abc" }));
  assert_eq!(eval(assign("=", member(id("s"), "length"), num(1.0)), &scope)?, Value::from(1));
  assert_eq!(eval(member(id("s"), "length"), &scope)?, Value::from(3));
  Ok(())
}

#[test]
fn regexp_last_index_drives_global_exec() -> Result<(), EvalError> {
  let scope = scope(json!({ "s": "a1b22" }));
  eval(assign("=", id("re"), regex(r"\d+", "g")), &scope)?;
  let exec = || method(id("re"), "exec", vec![id("s")]);
  assert_eq!(to_json(eval(exec(), &scope)?), json!(["1"]));
  assert_eq!(eval(member(id("re"), "lastIndex"), &scope)?, Value::from(2));
  assert_eq!(to_json(eval(exec(), &scope)?), json!(["22"]));
  assert_eq!(eval(exec(), &scope)?, Value::Null);
  assert_eq!(eval(member(id("re"), "lastIndex"), &scope)?, Value::from(0));

  eval(assign("=", member(id("re"), "lastIndex"), num(3.0)), &scope)?;
  assert_eq!(to_json(eval(exec(), &scope)?), json!(["22"]));
  Ok(())
}

#[test]
fn builtin_methods_are_shared() -> Result<(), EvalError> {
  let expr = bin(
    "===",
    member(array(vec![]), "map"),
    member(array(vec![num(1.0)]), "map"),
  );
  assert_eq!(eval_empty(expr)?, Value::Bool(true));
  assert_eq!(
    eval_empty(member(member(str(""), "slice"), "name"))?,
    Value::from("slice")
  );
  Ok(())
}

#[test]
fn own_properties_shadow_builtins() -> Result<(), EvalError> {
  let overridden = scope(json!({ "o": { "toString": 1 } }));
  assert_eq!(eval(member(id("o"), "toString"), &overridden)?, Value::from(1));
  let scope = scope(json!({ "o": { "k": 1 } }));
  assert_eq!(
    eval(method(id("o"), "hasOwnProperty", vec![str("k")]), &scope)?,
    Value::Bool(true)
  );
  assert_eq!(
    eval(method(id("o"), "hasOwnProperty", vec![str("toString")]), &scope)?,
    Value::Bool(false)
  );
  Ok(())
}
