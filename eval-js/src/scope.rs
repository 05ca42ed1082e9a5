use crate::value::Value;
use ahash::HashMap;
use std::cell::RefCell;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// A frame of name bindings, optionally chained to a parent frame.
///
/// `Scope` is a cheap handle: clones refer to the same frame. Reads ([`Scope::lookup`]) walk the
/// chain outward; writes and deletions ([`Scope::set`], [`Scope::delete`]) only ever touch this
/// frame, so a child can shadow a parent binding but never modify it.
///
/// The parent link is a shared reference that is only read through. Closures keep their defining
/// frame (and therefore its ancestors) alive for as long as they are reachable.
#[derive(Clone, Default)]
pub struct Scope(Rc<Frame>);

#[derive(Default)]
struct Frame {
  bindings: RefCell<HashMap<String, Value>>,
  parent: Option<Scope>,
}

impl Scope {
  /// A root frame without a parent.
  pub fn new() -> Self {
    Self::default()
  }

  /// A fresh, empty frame whose failed lookups continue in `parent`.
  pub fn child(parent: &Scope) -> Self {
    Self(Rc::new(Frame {
      bindings: RefCell::default(),
      parent: Some(parent.clone()),
    }))
  }

  /// A root frame holding the properties of a JSON object. Returns `None` if `json` is not an
  /// object.
  pub fn from_json(json: serde_json::Value) -> Option<Self> {
    let serde_json::Value::Object(map) = json else {
      return None;
    };
    let scope = Scope::new();
    for (name, value) in map {
      scope.set(name, Value::from_json(value));
    }
    Some(scope)
  }

  pub fn parent(&self) -> Option<&Scope> {
    self.0.parent.as_ref()
  }

  /// Reads a binding of this frame only.
  pub fn get(&self, name: &str) -> Option<Value> {
    self.0.bindings.borrow().get(name).cloned()
  }

  /// Reads a binding from the innermost frame of the chain that defines it.
  pub fn lookup(&self, name: &str) -> Option<Value> {
    let mut frame = Some(self);
    while let Some(scope) = frame {
      if let Some(value) = scope.get(name) {
        return Some(value);
      }
      frame = scope.parent();
    }
    None
  }

  /// Whether this frame itself binds `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.0.bindings.borrow().contains_key(name)
  }

  /// Whether any frame of the chain binds `name`.
  pub fn resolves(&self, name: &str) -> bool {
    self.lookup(name).is_some()
  }

  /// Creates or overwrites a binding in this frame.
  pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
    self
      .0
      .bindings
      .borrow_mut()
      .insert(name.into(), value.into());
  }

  /// Removes a binding from this frame, returning whether it existed. Parent frames are never
  /// touched.
  pub fn delete(&self, name: &str) -> bool {
    self.0.bindings.borrow_mut().remove(name).is_some()
  }

  /// Names bound in this frame.
  pub fn names(&self) -> Vec<String> {
    self.0.bindings.borrow().keys().cloned().collect()
  }

  pub fn ptr_eq(&self, other: &Scope) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }

  fn depth(&self) -> usize {
    let mut depth = 0;
    let mut frame = self.parent();
    while let Some(scope) = frame {
      depth += 1;
      frame = scope.parent();
    }
    depth
  }
}

impl Debug for Scope {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let mut names = self.names();
    names.sort();
    f.debug_struct("Scope")
      .field("names", &names)
      .field("depth", &self.depth())
      .finish()
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let scope = Scope::new();
    for (name, value) in iter {
      scope.set(name, value);
    }
    scope
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_walks_outward_but_get_is_local() {
    let root = Scope::new();
    root.set("a", 1);
    let child = Scope::child(&root);
    assert_eq!(child.lookup("a"), Some(Value::from(1)));
    assert_eq!(child.get("a"), None);
    assert!(child.resolves("a"));
    assert!(!child.contains("a"));
  }

  #[test]
  fn set_shadows_without_touching_parent() {
    let root = Scope::new();
    root.set("a", 1);
    let child = Scope::child(&root);
    child.set("a", 2);
    assert_eq!(child.lookup("a"), Some(Value::from(2)));
    assert_eq!(root.get("a"), Some(Value::from(1)));
  }

  #[test]
  fn delete_only_removes_own_bindings() {
    let root = Scope::new();
    root.set("a", 1);
    let child = Scope::child(&root);
    assert!(!child.delete("a"));
    assert_eq!(child.lookup("a"), Some(Value::from(1)));
    assert!(root.delete("a"));
    assert_eq!(child.lookup("a"), None);
  }

  #[test]
  fn from_json_requires_an_object() {
    let scope = Scope::from_json(serde_json::json!({ "x": 1, "y": "z" })).unwrap();
    assert_eq!(scope.get("y"), Some(Value::from("z")));
    assert!(Scope::from_json(serde_json::json!([1])).is_none());
  }
}
