use crate::error::{EvalError, EvalResult};
use crate::function::Function;
use crate::num::number_to_string;
use crate::regexp::RegExp;
use ahash::HashMap;
use ahash::HashMapExt;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// A runtime value.
///
/// Primitives are stored inline. Objects, arrays, functions and regular expressions are shared
/// references: cloning a `Value` clones the reference, and mutations through one clone are visible
/// through all of them. `PartialEq` compares primitives by value and references by identity, which
/// is the modeled language's strict equality except that `NaN` is unequal to itself and `+0`
/// equals `-0` exactly as `f64` does.
#[derive(Clone, Debug, Default)]
pub enum Value {
  #[default]
  Undefined,
  Null,
  Bool(bool),
  /// IEEE-754 double.
  Number(f64),
  String(Rc<str>),
  Object(Object),
  Array(Array),
  Function(Function),
  RegExp(RegExp),
}

impl Value {
  pub fn string(s: impl AsRef<str>) -> Self {
    Value::String(Rc::from(s.as_ref()))
  }

  pub fn array(values: Vec<Value>) -> Self {
    Value::Array(Array::from(values))
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Value::Undefined)
  }

  pub fn is_nullish(&self) -> bool {
    matches!(self, Value::Undefined | Value::Null)
  }

  /// Whether this value is a reference (object-like) rather than a primitive.
  pub fn is_object(&self) -> bool {
    matches!(
      self,
      Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::RegExp(_)
    )
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_function(&self) -> Option<&Function> {
    match self {
      Value::Function(f) => Some(f),
      _ => None,
    }
  }

  /// The `typeof` tag of this value.
  pub fn type_of(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "object",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Function(_) => "function",
      Value::Object(_) | Value::Array(_) | Value::RegExp(_) => "object",
    }
  }

  /// Converts JSON into a value. JSON objects and arrays become fresh, unshared references.
  pub fn from_json(json: serde_json::Value) -> Self {
    match json {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
      serde_json::Value::String(s) => Value::string(s),
      serde_json::Value::Array(items) => {
        Value::array(items.into_iter().map(Value::from_json).collect())
      }
      serde_json::Value::Object(map) => {
        let object = Object::new();
        for (key, value) in map {
          object.set(key, Value::from_json(value));
        }
        Value::Object(object)
      }
    }
  }

  /// Converts this value into JSON the way `JSON.stringify` would: `undefined`, functions and
  /// non-finite numbers become `null` in arrays and are omitted from objects; regular expressions
  /// become `{}`. Cyclic structures fail with a `TypeError`.
  pub fn to_json(&self) -> EvalResult<serde_json::Value> {
    let mut stack = Vec::new();
    Ok(to_json_inner(self, &mut stack)?.unwrap_or(serde_json::Value::Null))
  }
}

fn to_json_inner(
  value: &Value,
  stack: &mut Vec<*const ()>,
) -> EvalResult<Option<serde_json::Value>> {
  Ok(Some(match value {
    Value::Undefined | Value::Function(_) => return Ok(None),
    Value::Null => serde_json::Value::Null,
    Value::Bool(b) => serde_json::Value::Bool(*b),
    Value::Number(n) => {
      if n.fract() == 0.0 && n.abs() < 9007199254740992.0 {
        serde_json::Value::from(*n as i64)
      } else {
        serde_json::Number::from_f64(*n)
          .map(serde_json::Value::Number)
          .unwrap_or(serde_json::Value::Null)
      }
    }
    Value::String(s) => serde_json::Value::String(s.to_string()),
    Value::RegExp(_) => serde_json::Value::Object(serde_json::Map::new()),
    Value::Array(array) => {
      let ptr = array.as_ptr();
      if stack.contains(&ptr) {
        return Err(EvalError::type_error("Converting circular structure to JSON"));
      }
      stack.push(ptr);
      let mut items = Vec::new();
      for item in array.to_vec() {
        items.push(to_json_inner(&item, stack)?.unwrap_or(serde_json::Value::Null));
      }
      stack.pop();
      serde_json::Value::Array(items)
    }
    Value::Object(object) => {
      let ptr = object.as_ptr();
      if stack.contains(&ptr) {
        return Err(EvalError::type_error("Converting circular structure to JSON"));
      }
      stack.push(ptr);
      let mut map = serde_json::Map::new();
      for (key, value) in object.entries() {
        if let Some(json) = to_json_inner(&value, stack)? {
          map.insert(key, json);
        }
      }
      stack.pop();
      serde_json::Value::Object(map)
    }
  }))
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Undefined, Value::Undefined) => true,
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Number(a), Value::Number(b)) => a == b,
      (Value::String(a), Value::String(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
      (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
      (Value::Function(a), Value::Function(b)) => a == b,
      (Value::RegExp(a), Value::RegExp(b)) => a.ptr_eq(b),
      _ => false,
    }
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Number(value)
  }
}

impl From<i32> for Value {
  fn from(value: i32) -> Self {
    Value::Number(value as f64)
  }
}

impl From<u32> for Value {
  fn from(value: u32) -> Self {
    Value::Number(value as f64)
  }
}

impl From<usize> for Value {
  fn from(value: usize) -> Self {
    Value::Number(value as f64)
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::string(value)
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::String(Rc::from(value))
  }
}

impl From<Rc<str>> for Value {
  fn from(value: Rc<str>) -> Self {
    Value::String(value)
  }
}

impl From<Vec<Value>> for Value {
  fn from(value: Vec<Value>) -> Self {
    Value::array(value)
  }
}

impl From<Object> for Value {
  fn from(value: Object) -> Self {
    Value::Object(value)
  }
}

impl From<Array> for Value {
  fn from(value: Array) -> Self {
    Value::Array(value)
  }
}

impl From<Function> for Value {
  fn from(value: Function) -> Self {
    Value::Function(value)
  }
}

impl From<RegExp> for Value {
  fn from(value: RegExp) -> Self {
    Value::RegExp(value)
  }
}

impl From<serde_json::Value> for Value {
  fn from(value: serde_json::Value) -> Self {
    Value::from_json(value)
  }
}

/// A shared, mutable string-keyed property map.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<HashMap<String, Value>>>);

impl Object {
  pub fn new() -> Self {
    Self(Rc::new(RefCell::new(HashMap::new())))
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    self.0.borrow().get(key).cloned()
  }

  pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
    self.0.borrow_mut().insert(key.into(), value.into());
  }

  /// Removes `key`, returning whether it was present.
  pub fn delete(&self, key: &str) -> bool {
    self.0.borrow_mut().remove(key).is_some()
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.borrow().contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.borrow().is_empty()
  }

  pub fn keys(&self) -> Vec<String> {
    self.0.borrow().keys().cloned().collect()
  }

  pub fn entries(&self) -> Vec<(String, Value)> {
    self
      .0
      .borrow()
      .iter()
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect()
  }

  pub fn ptr_eq(&self, other: &Object) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  pub(crate) fn as_ptr(&self) -> *const () {
    Rc::as_ptr(&self.0) as *const ()
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let object = Object::new();
    for (key, value) in iter {
      object.set(key, value);
    }
    object
  }
}

impl Debug for Object {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    // Keys only; values may refer back to this object.
    match self.0.try_borrow() {
      Ok(map) => f.debug_set().entries(map.keys()).finish(),
      Err(_) => f.write_str("{<borrowed>}"),
    }
  }
}

/// A shared, mutable, ordered sequence of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.borrow().is_empty()
  }

  pub fn get(&self, index: usize) -> Option<Value> {
    self.0.borrow().get(index).cloned()
  }

  /// Stores `value` at `index`, padding any gap with `undefined`.
  pub fn set(&self, index: usize, value: Value) {
    let mut items = self.0.borrow_mut();
    if index >= items.len() {
      items.resize(index + 1, Value::Undefined);
    }
    items[index] = value;
  }

  pub fn push(&self, value: Value) {
    self.0.borrow_mut().push(value);
  }

  pub fn set_len(&self, len: usize) {
    self.0.borrow_mut().resize(len, Value::Undefined);
  }

  /// A snapshot of the current elements.
  pub fn to_vec(&self) -> Vec<Value> {
    self.0.borrow().clone()
  }

  pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
    self.0.borrow()
  }

  pub(crate) fn replace(&self, items: Vec<Value>) -> Vec<Value> {
    self.0.replace(items)
  }

  pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
    f(&mut self.0.borrow_mut())
  }

  pub fn ptr_eq(&self, other: &Array) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  pub(crate) fn as_ptr(&self) -> *const () {
    Rc::as_ptr(&self.0) as *const ()
  }
}

impl From<Vec<Value>> for Array {
  fn from(value: Vec<Value>) -> Self {
    Self(Rc::new(RefCell::new(value)))
  }
}

impl FromIterator<Value> for Array {
  fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
    Array::from(iter.into_iter().collect::<Vec<_>>())
  }
}

impl Debug for Array {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self.0.try_borrow() {
      Ok(items) => write!(f, "Array(len = {})", items.len()),
      Err(_) => f.write_str("Array(<borrowed>)"),
    }
  }
}

/// A compact, human-readable rendering used in error messages.
pub(crate) fn describe(value: &Value) -> String {
  match value {
    Value::Undefined => "undefined".to_string(),
    Value::Null => "null".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => number_to_string(*n),
    Value::String(s) => format!("\"{s}\""),
    Value::Object(_) => "#<Object>".to_string(),
    Value::Array(_) => "#<Array>".to_string(),
    Value::Function(f) => format!("function {}", f.name()),
    Value::RegExp(re) => re.to_string(),
  }
}
