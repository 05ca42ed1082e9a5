mod common;

use common::*;
use eval_js::{EvalError, Function, Scope, Value};
use serde_json::json;

#[test]
fn closures_resolve_free_names_in_their_defining_scope() -> Result<(), EvalError> {
  let defining = scope(json!({ "k": 10 }));
  let add_k = eval(arrow(&["x"], bin("+", id("x"), id("k"))), &defining)?;

  // Called from a scope that binds a different `k`.
  let caller = scope(json!({ "k": 1000 }));
  caller.set("f", add_k);
  assert_eq!(eval(call(id("f"), vec![num(1.0)]), &caller)?, Value::from(11));

  // Later changes to the defining frame are observed.
  defining.set("k", 20);
  assert_eq!(eval(call(id("f"), vec![num(1.0)]), &caller)?, Value::from(21));
  Ok(())
}

#[test]
fn missing_arguments_bind_undefined() -> Result<(), EvalError> {
  let expr = call(
    arrow(&["a", "b"], unary("typeof", id("b"))),
    vec![num(1.0)],
  );
  assert_eq!(eval_empty(expr)?, Value::from("undefined"));
  Ok(())
}

#[test]
fn rest_parameter_collects_remaining_arguments() -> Result<(), EvalError> {
  let collect = || arrow(&["first", "...rest"], id("rest"));
  let expr = call(collect(), vec![num(1.0), num(2.0), num(3.0)]);
  assert_eq!(to_json(eval_empty(expr)?), json!([2, 3]));
  let expr = call(collect(), vec![num(1.0)]);
  assert_eq!(to_json(eval_empty(expr)?), json!([]));
  let expr = call(collect(), vec![]);
  assert_eq!(to_json(eval_empty(expr)?), json!([]));
  Ok(())
}

#[test]
fn parameters_shadow_outer_bindings_without_touching_them() -> Result<(), EvalError> {
  let scope = scope(json!({ "x": "outer" }));
  let expr = call(arrow(&["x"], assign("=", id("x"), str("inner"))), vec![num(0.0)]);
  assert_eq!(eval(expr, &scope)?, Value::from("inner"));
  assert_eq!(scope.get("x"), Some(Value::from("outer")));
  Ok(())
}

#[test]
fn assignments_inside_a_closure_stay_in_its_frame() -> Result<(), EvalError> {
  let scope = Scope::new();
  let expr = call(arrow(&[], assign("=", id("y"), num(1.0))), vec![]);
  assert_eq!(eval(expr, &scope)?, Value::from(1));
  assert!(!scope.contains("y"));
  Ok(())
}

#[test]
fn closures_compose() -> Result<(), EvalError> {
  // (f => x => f(f(x)))(y => y + 1)(5)
  let twice = arrow(
    &["f"],
    arrow(&["x"], call(id("f"), vec![call(id("f"), vec![id("x")])])),
  );
  let inc = arrow(&["y"], bin("+", id("y"), num(1.0)));
  let expr = call(call(twice, vec![inc]), vec![num(5.0)]);
  assert_eq!(eval_empty(expr)?, Value::from(7));
  Ok(())
}

#[test]
fn callbacks_receive_index_and_array() -> Result<(), EvalError> {
  // ["a", "b"].map((v, i, arr) => v + i + arr.length)
  let cb = arrow(
    &["v", "i", "arr"],
    bin("+", bin("+", id("v"), id("i")), member(id("arr"), "length")),
  );
  let expr = method(array(vec![str("a"), str("b")]), "map", vec![cb]);
  assert_eq!(to_json(eval_empty(expr)?), json!(["a02", "b12"]));
  Ok(())
}

#[test]
fn function_properties() -> Result<(), EvalError> {
  let scope = Scope::new();
  eval(assign("=", id("f"), arrow(&["a", "b", "...c"], id("a"))), &scope)?;
  assert_eq!(eval(member(id("f"), "length"), &scope)?, Value::from(2));
  assert_eq!(eval(member(id("f"), "name"), &scope)?, Value::from(""));
  assert_eq!(
    eval(method(id("f"), "toString", vec![]), &scope)?,
    Value::from("(a, b, ...c) => { [expression] }")
  );
  assert_eq!(
    eval(method(id("f"), "call", vec![null(), num(4.0)]), &scope)?,
    Value::from(4)
  );
  assert_eq!(
    eval(
      method(id("f"), "apply", vec![null(), array(vec![num(5.0)])]),
      &scope
    )?,
    Value::from(5)
  );
  Ok(())
}

#[test]
fn host_functions_are_callable() -> Result<(), EvalError> {
  let scope = Scope::new();
  scope.set(
    "sum",
    Function::native("sum", 0, |_, args| {
      let mut total = 0.0;
      for arg in args {
        total += arg.as_number().unwrap_or(f64::NAN);
      }
      Ok(Value::from(total))
    }),
  );
  let expr = call(
    id("sum"),
    vec![num(1.0), spread(array(vec![num(2.0), num(3.0)]))],
  );
  assert_eq!(eval(expr, &scope)?, Value::from(6));
  Ok(())
}

#[test]
fn method_calls_pass_the_receiver_to_natives() -> Result<(), EvalError> {
  let scope = scope(json!({ "obj": { "tag": "mine" } }));
  let Some(Value::Object(obj)) = scope.get("obj") else {
    panic!("expected an object");
  };
  obj.set(
    "whoami",
    Function::native("whoami", 0, |this, _| {
      eval_js::property::get(this, "tag")
    }),
  );
  assert_eq!(eval(method(id("obj"), "whoami", vec![]), &scope)?, Value::from("mine"));

  // A plain call of the same function has no receiver.
  scope.set("f", obj.get("whoami").unwrap());
  let plain = call(id("f"), vec![]);
  let err = eval(plain, &scope).unwrap_err();
  assert!(matches!(err, EvalError::TypeError(_)));
  Ok(())
}

#[test]
fn unsupported_function_shapes_are_rejected() {
  let body = num(1.0);
  for (is_async, generator) in [(true, false), (false, true)] {
    let err = eval_empty(arrow_with(vec![], body.clone(), is_async, generator)).unwrap_err();
    assert!(matches!(err, EvalError::UnsupportedConstruct(_)), "{err:?}");
  }

  let block = json!({ "type": "BlockStatement", "body": [] });
  let err = eval_empty(arrow_with(vec![], block, false, false)).unwrap_err();
  assert!(matches!(err, EvalError::UnsupportedConstruct(_)));

  let defaulted = json!({ "type": "AssignmentPattern", "left": id("a"), "right": num(1.0) });
  let err = eval_empty(arrow_with(vec![defaulted], body.clone(), false, false)).unwrap_err();
  assert!(matches!(err, EvalError::UnsupportedConstruct(_)));

  let destructured = json!({ "type": "ObjectPattern", "properties": [] });
  let err = eval_empty(arrow_with(vec![destructured], body.clone(), false, false)).unwrap_err();
  assert!(matches!(err, EvalError::UnsupportedConstruct(_)));

  let early_rest = vec![rest("a"), id("b")];
  let err = eval_empty(arrow_with(early_rest, body, false, false)).unwrap_err();
  assert!(matches!(err, EvalError::UnsupportedConstruct(_)));
}

#[test]
fn rejection_aborts_after_earlier_side_effects() {
  // [f = 1, async () => 1]: the assignment runs, the closure is never built.
  let scope = Scope::new();
  let expr = array(vec![
    assign("=", id("f"), num(1.0)),
    arrow_with(vec![], num(1.0), true, false),
  ]);
  assert!(eval(expr, &scope).is_err());
  assert_eq!(scope.get("f"), Some(Value::from(1)));
}

#[test]
fn errors_inside_closures_propagate_unchanged() {
  let thrower = Function::native("boom", 0, |_, _| Err(EvalError::Throw(Value::from(42))));
  let scope = Scope::new();
  scope.set("boom", thrower);
  let expr = method(
    array(vec![num(1.0)]),
    "map",
    vec![arrow(&["x"], call(id("boom"), vec![]))],
  );
  let err = eval(expr, &scope).unwrap_err();
  assert_eq!(err.thrown_value(), Some(&Value::from(42)));
}
