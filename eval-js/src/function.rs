use crate::ast::{ArrowFunction, Node};
use crate::error::{EvalError, EvalResult};
use crate::exec::Evaluator;
use crate::options::EvalOptions;
use crate::scope::Scope;
use crate::value::Value;
use derive_more::derive::From;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Signature of host-provided and built-in callables: receiver, then arguments.
pub type NativeCallFn = dyn Fn(&Value, &[Value]) -> EvalResult<Value>;

/// A callable value.
///
/// Cloning shares the callable; two `Function`s are equal when they are the same callable.
#[derive(Clone)]
pub struct Function(Rc<Callable>);

#[derive(From)]
enum Callable {
  Closure(Closure),
  Native(NativeFunction),
}

/// The kind of values a constructor function recognizes in `instanceof`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Constructor {
  Object,
  Array,
  Function,
  RegExp,
  // Primitives are never instances; there are no wrapper objects.
  String,
  Number,
  Boolean,
}

impl Constructor {
  pub fn has_instance(self, value: &Value) -> bool {
    match self {
      Constructor::Object => value.is_object(),
      Constructor::Array => matches!(value, Value::Array(_)),
      Constructor::Function => matches!(value, Value::Function(_)),
      Constructor::RegExp => matches!(value, Value::RegExp(_)),
      Constructor::String | Constructor::Number | Constructor::Boolean => false,
    }
  }
}

pub struct NativeFunction {
  name: String,
  length: u32,
  constructor: Option<Constructor>,
  call: Box<NativeCallFn>,
}

/// A function value built from an arrow function node.
///
/// Holds the node (shared, not copied), the frame it was created in, and the options of the
/// evaluation that created it.
pub struct Closure {
  func: Rc<ArrowFunction>,
  params: Vec<String>,
  rest: Option<String>,
  scope: Scope,
  options: EvalOptions,
}

impl Closure {
  /// Validates `func` and captures `scope`. Nothing is constructed if the function uses a form
  /// outside the supported subset.
  pub fn new(func: Rc<ArrowFunction>, scope: Scope, options: EvalOptions) -> EvalResult<Self> {
    if func.is_async {
      return Err(EvalError::unsupported("async functions are not supported"));
    }
    if func.generator {
      return Err(EvalError::unsupported("generator functions are not supported"));
    }
    if matches!(*func.body, Node::BlockStatement {}) {
      return Err(EvalError::unsupported(
        "function body must be a single expression",
      ));
    }

    let mut params = Vec::with_capacity(func.params.len());
    let mut rest = None;
    for (i, param) in func.params.iter().enumerate() {
      match param {
        Node::Identifier { name } => params.push(name.clone()),
        Node::RestElement { argument } if i + 1 == func.params.len() => match &**argument {
          Node::Identifier { name } => rest = Some(name.clone()),
          other => {
            return Err(EvalError::unsupported(format!(
              "\"{}\" rest parameters are not supported",
              other.kind()
            )))
          }
        },
        Node::RestElement { .. } => {
          return Err(EvalError::unsupported(
            "rest parameter must be the last parameter",
          ))
        }
        other => {
          return Err(EvalError::unsupported(format!(
            "\"{}\" parameter expressions are not supported",
            other.kind()
          )))
        }
      }
    }

    Ok(Self {
      func,
      params,
      rest,
      scope,
      options,
    })
  }

  /// Number of plain parameters, as reported by `length`.
  pub fn arity(&self) -> usize {
    self.params.len()
  }

  pub fn scope(&self) -> &Scope {
    &self.scope
  }

  fn invoke(&self, args: &[Value]) -> EvalResult<Value> {
    tracing::trace!(
      params = self.params.len(),
      rest = self.rest.is_some(),
      args = args.len(),
      "invoking closure"
    );
    let frame = Scope::child(&self.scope);
    for (i, name) in self.params.iter().enumerate() {
      frame.set(name.as_str(), args.get(i).cloned().unwrap_or_default());
    }
    if let Some(rest) = &self.rest {
      let remaining = args.get(self.params.len()..).unwrap_or_default().to_vec();
      frame.set(rest.as_str(), Value::array(remaining));
    }
    Evaluator::new(self.options).eval(&self.func.body, &frame)
  }
}

impl Function {
  /// A host callable. `length` is the value reported by the function's `length` property.
  pub fn native(
    name: impl Into<String>,
    length: u32,
    call: impl Fn(&Value, &[Value]) -> EvalResult<Value> + 'static,
  ) -> Self {
    Self(Rc::new(Callable::from(NativeFunction {
      name: name.into(),
      length,
      constructor: None,
      call: Box::new(call),
    })))
  }

  /// A host callable that is also a valid right-hand side of `instanceof`.
  pub fn constructor(
    name: impl Into<String>,
    length: u32,
    kind: Constructor,
    call: impl Fn(&Value, &[Value]) -> EvalResult<Value> + 'static,
  ) -> Self {
    Self(Rc::new(Callable::from(NativeFunction {
      name: name.into(),
      length,
      constructor: Some(kind),
      call: Box::new(call),
    })))
  }

  pub fn closure(closure: Closure) -> Self {
    Self(Rc::new(Callable::from(closure)))
  }

  pub fn name(&self) -> &str {
    match &*self.0 {
      Callable::Closure(_) => "",
      Callable::Native(native) => &native.name,
    }
  }

  pub fn length(&self) -> u32 {
    match &*self.0 {
      Callable::Closure(closure) => closure.arity() as u32,
      Callable::Native(native) => native.length,
    }
  }

  pub fn is_closure(&self) -> bool {
    matches!(&*self.0, Callable::Closure(_))
  }

  pub fn constructor_kind(&self) -> Option<Constructor> {
    match &*self.0 {
      Callable::Closure(_) => None,
      Callable::Native(native) => native.constructor,
    }
  }

  /// Invokes the function with `this_value` as receiver. Closures ignore the receiver, as arrow
  /// functions do.
  pub fn call(&self, this_value: &Value, args: &[Value]) -> EvalResult<Value> {
    match &*self.0 {
      Callable::Closure(closure) => closure.invoke(args),
      Callable::Native(native) => (native.call)(this_value, args),
    }
  }

  /// The `Function.prototype.toString` rendering.
  pub fn source_text(&self) -> String {
    match &*self.0 {
      Callable::Closure(closure) => {
        let mut params = closure.params.clone();
        if let Some(rest) = &closure.rest {
          params.push(format!("...{rest}"));
        }
        format!("({}) => {{ [expression] }}", params.join(", "))
      }
      Callable::Native(native) => format!("function {}() {{ [native code] }}", native.name),
    }
  }
}

impl PartialEq for Function {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl Debug for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match &*self.0 {
      Callable::Closure(closure) => f
        .debug_struct("Closure")
        .field("params", &closure.params)
        .field("rest", &closure.rest)
        .finish(),
      Callable::Native(native) => f
        .debug_struct("NativeFunction")
        .field("name", &native.name)
        .field("length", &native.length)
        .finish(),
    }
  }
}

/// Calls `callee` if it is a function, failing with a `TypeError` naming `description`
/// otherwise.
pub fn call_value(
  callee: &Value,
  description: &str,
  this_value: &Value,
  args: &[Value],
) -> EvalResult<Value> {
  match callee {
    Value::Function(func) => func.call(this_value, args),
    _ => Err(EvalError::type_error(format!("{description} is not a function"))),
  }
}

/// `OrdinaryHasInstance` restricted to the callables this crate models.
pub fn instance_of(value: &Value, target: &Value) -> EvalResult<bool> {
  let Value::Function(func) = target else {
    return Err(EvalError::type_error(
      "Right-hand side of 'instanceof' is not callable",
    ));
  };
  match func.constructor_kind() {
    Some(kind) => Ok(kind.has_instance(value)),
    None => Err(EvalError::type_error(
      "Function has non-object prototype 'undefined' in instanceof check",
    )),
  }
}
