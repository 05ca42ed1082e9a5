use crate::ast::{Lit, Node, TemplateElement};
use crate::error::{EvalError, EvalResult};
use crate::function::{call_value, Closure, Function};
use crate::ops;
use crate::ops::{spread_values, to_boolean, to_property_key, to_string};
use crate::operator::{AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator};
use crate::options::{EvalOptions, UnresolvedIdentifiers};
use crate::property;
use crate::property::MAX_ARRAY_LENGTH;
use crate::regexp::RegExp;
use crate::scope::Scope;
use crate::value::Value;

/// Tree-walking evaluator for the supported expression subset.
///
/// Evaluation is plain recursive descent: every node is evaluated by a direct recursive call, so
/// the native stack is the only bound on tree depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct Evaluator {
  options: EvalOptions,
}

/// The target of an assignment or `delete`: a binding in the current frame, or a property of an
/// already-evaluated value.
#[derive(Debug)]
enum Reference {
  Binding(String),
  Property { object: Value, key: String },
}

impl Evaluator {
  pub fn new(options: EvalOptions) -> Self {
    Self { options }
  }

  pub fn options(&self) -> EvalOptions {
    self.options
  }

  /// Evaluates `node` against `scope`.
  ///
  /// Bindings created or changed by assignments land in `scope` itself. Any failure aborts the
  /// whole evaluation; side effects that happened before it (assignments, mutations through
  /// native callbacks) are not rolled back.
  pub fn evaluate(&self, node: &Node, scope: &Scope) -> EvalResult<Value> {
    let span = tracing::debug_span!("evaluate", kind = node.kind());
    let _guard = span.enter();
    let result = self.eval(node, scope);
    if let Err(err) = &result {
      tracing::debug!(error = %err, "evaluation failed");
    }
    result
  }

  pub(crate) fn eval(&self, node: &Node, scope: &Scope) -> EvalResult<Value> {
    match node {
      Node::ArrayExpression { elements } => {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
          match element {
            // Elisions are not modeled as holes.
            None => values.push(Value::Undefined),
            Some(element) => self.eval_element(element, scope, &mut values)?,
          }
        }
        if values.len() > MAX_ARRAY_LENGTH {
          return Err(EvalError::range_error("Invalid array length"));
        }
        Ok(Value::array(values))
      }
      Node::ArrowFunctionExpression(func) => {
        let closure = Closure::new(func.clone(), scope.clone(), self.options)?;
        Ok(Value::Function(Function::closure(closure)))
      }
      Node::AssignmentExpression {
        operator,
        left,
        right,
      } => self.eval_assignment(*operator, left, right, scope),
      Node::BinaryExpression {
        operator,
        left,
        right,
      } => {
        let left = self.eval(left, scope)?;
        let right = self.eval(right, scope)?;
        ops::binary(*operator, &left, &right)
      }
      Node::CallExpression { callee, arguments } => self.eval_call(callee, arguments, scope),
      Node::ConditionalExpression {
        test,
        consequent,
        alternate,
      } => {
        if to_boolean(&self.eval(test, scope)?) {
          self.eval(consequent, scope)
        } else {
          self.eval(alternate, scope)
        }
      }
      Node::Identifier { name } => self.eval_identifier(name, scope),
      Node::Literal(lit) => self.eval_literal(lit),
      Node::LogicalExpression {
        operator,
        left,
        right,
      } => self.eval_logical(*operator, left, right, scope),
      Node::MemberExpression {
        object,
        property,
        computed,
      } => {
        reject_super(object, "member access")?;
        let object = self.eval(object, scope)?;
        self.get_member(&object, property, *computed, scope)
      }
      Node::TemplateLiteral {
        quasis,
        expressions,
      } => self.eval_template(quasis, expressions, scope),
      Node::UnaryExpression {
        operator,
        prefix,
        argument,
      } => self.eval_unary(*operator, *prefix, argument, scope),

      Node::SpreadElement { .. }
      | Node::RestElement { .. }
      | Node::Super {}
      | Node::BlockStatement {}
      | Node::AssignmentPattern {}
      | Node::ObjectPattern {}
      | Node::ArrayPattern {}
      | Node::ThisExpression {}
      | Node::ObjectExpression {}
      | Node::FunctionExpression {}
      | Node::NewExpression {}
      | Node::SequenceExpression {}
      | Node::UpdateExpression {}
      | Node::TaggedTemplateExpression {}
      | Node::ClassExpression {}
      | Node::AwaitExpression {}
      | Node::YieldExpression {}
      | Node::ChainExpression {}
      | Node::ImportExpression {}
      | Node::MetaProperty {}
      | Node::Unknown(_) => Err(EvalError::UnsupportedNodeKind(node.kind().to_string())),
    }
  }

  fn eval_identifier(&self, name: &str, scope: &Scope) -> EvalResult<Value> {
    if let Some(value) = scope.lookup(name) {
      return Ok(value);
    }
    match self.options.unresolved_identifiers {
      UnresolvedIdentifiers::Undefined => Ok(Value::Undefined),
      // `undefined` resolves without being installed.
      UnresolvedIdentifiers::Error if name == "undefined" => Ok(Value::Undefined),
      UnresolvedIdentifiers::Error => Err(EvalError::UnresolvedIdentifier(name.to_string())),
    }
  }

  fn eval_literal(&self, lit: &Lit) -> EvalResult<Value> {
    Ok(match lit {
      Lit::Null => Value::Null,
      Lit::Bool(b) => Value::Bool(*b),
      Lit::Number(n) => Value::Number(*n),
      Lit::String(s) => Value::string(s),
      // Each evaluation of a regular expression literal creates a new object.
      Lit::RegExp(re) => Value::RegExp(RegExp::with_size_limit(
        &re.pattern,
        &re.flags,
        self.options.regex_size_limit,
      )?),
      Lit::BigInt(digits) => {
        return Err(EvalError::unsupported(format!(
          "BigInt literal {digits}n"
        )))
      }
    })
  }

  /// Evaluates one array element or call argument into `out`, expanding spreads in place.
  fn eval_element(&self, node: &Node, scope: &Scope, out: &mut Vec<Value>) -> EvalResult<()> {
    match node {
      Node::SpreadElement { argument } => {
        let spread = self.eval(argument, scope)?;
        out.extend(spread_values(&spread)?);
      }
      other => out.push(self.eval(other, scope)?),
    }
    Ok(())
  }

  fn eval_arguments(&self, arguments: &[Node], scope: &Scope) -> EvalResult<Vec<Value>> {
    let mut values = Vec::with_capacity(arguments.len());
    for argument in arguments {
      self.eval_element(argument, scope, &mut values)?;
    }
    Ok(values)
  }

  fn eval_logical(
    &self,
    operator: LogicalOperator,
    left: &Node,
    right: &Node,
    scope: &Scope,
  ) -> EvalResult<Value> {
    let short_circuit_on = match operator {
      LogicalOperator::Or => true,
      LogicalOperator::And => false,
      LogicalOperator::NullishCoalescing => {
        return Err(EvalError::InvalidOperator {
          kind: "logical",
          operator: operator.to_string(),
        })
      }
    };
    let left = self.eval(left, scope)?;
    if to_boolean(&left) == short_circuit_on {
      return Ok(left);
    }
    self.eval(right, scope)
  }

  fn eval_template(
    &self,
    quasis: &[TemplateElement],
    expressions: &[Node],
    scope: &Scope,
  ) -> EvalResult<Value> {
    if quasis.len() != expressions.len() + 1 {
      return Err(EvalError::unsupported(format!(
        "template literal with {} text segments and {} expressions",
        quasis.len(),
        expressions.len()
      )));
    }
    let mut out = String::new();
    for (i, quasi) in quasis.iter().enumerate() {
      out.push_str(quasi.text());
      if let Some(expression) = expressions.get(i) {
        let value = self.eval(expression, scope)?;
        out.push_str(&to_string(&value)?);
      }
    }
    Ok(Value::from(out))
  }

  fn eval_unary(
    &self,
    operator: UnaryOperator,
    prefix: bool,
    argument: &Node,
    scope: &Scope,
  ) -> EvalResult<Value> {
    if !prefix {
      return Err(EvalError::unsupported(format!(
        "non-prefix unary operator \"{operator}\""
      )));
    }
    match operator {
      UnaryOperator::Delete => {
        let target = self.reference(argument, scope, "delete")?;
        Ok(Value::Bool(self.delete_reference(&target, scope)?))
      }
      UnaryOperator::Typeof => {
        // Never fails on an unbound name, whatever the identifier policy.
        if let Node::Identifier { name } = argument {
          if !scope.resolves(name) {
            return Ok(Value::string("undefined"));
          }
        }
        ops::unary(operator, &self.eval(argument, scope)?)
      }
      _ => ops::unary(operator, &self.eval(argument, scope)?),
    }
  }

  fn eval_assignment(
    &self,
    operator: AssignmentOperator,
    left: &Node,
    right: &Node,
    scope: &Scope,
  ) -> EvalResult<Value> {
    let compound: Option<BinaryOperator> = match operator {
      AssignmentOperator::Assignment => None,
      _ => Some(
        operator
          .binary_operator()
          .ok_or_else(|| EvalError::InvalidOperator {
            kind: "assignment",
            operator: operator.to_string(),
          })?,
      ),
    };
    let target = self.reference(left, scope, "assignment")?;
    let value = match compound {
      None => self.eval(right, scope)?,
      Some(binary) => {
        let current = self.get_reference(&target, scope)?;
        let right = self.eval(right, scope)?;
        ops::binary(binary, &current, &right)?
      }
    };
    self.put_reference(&target, scope, value.clone())?;
    Ok(value)
  }

  fn eval_call(&self, callee: &Node, arguments: &[Node], scope: &Scope) -> EvalResult<Value> {
    reject_super(callee, "call")?;
    let (func, this_value) = match callee {
      Node::MemberExpression {
        object,
        property,
        computed,
      } => {
        reject_super(object, "call")?;
        let object = self.eval(object, scope)?;
        let func = self.get_member(&object, property, *computed, scope)?;
        (func, object)
      }
      other => (self.eval(other, scope)?, Value::Undefined),
    };
    let args = self.eval_arguments(arguments, scope)?;
    call_value(&func, &describe_callee(callee), &this_value, &args)
  }

  fn get_member(
    &self,
    object: &Value,
    property: &Node,
    computed: bool,
    scope: &Scope,
  ) -> EvalResult<Value> {
    if computed {
      let key = self.eval(property, scope)?;
      return property::get_by_value(object, &key);
    }
    property::get(object, static_property_name(property)?)
  }

  fn reference(&self, node: &Node, scope: &Scope, usage: &str) -> EvalResult<Reference> {
    match node {
      Node::Identifier { name } => Ok(Reference::Binding(name.clone())),
      Node::MemberExpression {
        object,
        property,
        computed,
      } => {
        reject_super(object, usage)?;
        let object = self.eval(object, scope)?;
        let key = if *computed {
          to_property_key(&self.eval(property, scope)?)?
        } else {
          static_property_name(property)?.to_string()
        };
        Ok(Reference::Property { object, key })
      }
      other => Err(EvalError::unsupported(format!(
        "\"{}\" is not a supported {usage} target",
        other.kind()
      ))),
    }
  }

  fn get_reference(&self, target: &Reference, scope: &Scope) -> EvalResult<Value> {
    match target {
      Reference::Binding(name) => self.eval_identifier(name, scope),
      Reference::Property { object, key } => property::get(object, key),
    }
  }

  fn put_reference(&self, target: &Reference, scope: &Scope, value: Value) -> EvalResult<()> {
    match target {
      Reference::Binding(name) => {
        scope.set(name.as_str(), value);
        Ok(())
      }
      Reference::Property { object, key } => property::set(object, key, value),
    }
  }

  fn delete_reference(&self, target: &Reference, scope: &Scope) -> EvalResult<bool> {
    match target {
      // Removing a binding that is absent, or only visible through a parent, still succeeds.
      Reference::Binding(name) => {
        scope.delete(name);
        Ok(true)
      }
      Reference::Property { object, key } => property::delete(object, key),
    }
  }
}

fn reject_super(node: &Node, usage: &str) -> EvalResult<()> {
  if node.is_super() {
    return Err(EvalError::unsupported(format!("'super' in {usage}")));
  }
  Ok(())
}

fn static_property_name(property: &Node) -> EvalResult<&str> {
  match property {
    Node::Identifier { name } => Ok(name),
    other => Err(EvalError::unsupported(format!(
      "\"{}\" as a property name",
      other.kind()
    ))),
  }
}

/// Source-like rendering of a callee for "is not a function" messages.
fn describe_callee(node: &Node) -> String {
  match node {
    Node::Identifier { name } => name.clone(),
    Node::MemberExpression {
      object,
      property,
      computed: false,
    } => match &**property {
      Node::Identifier { name } => format!("{}.{name}", describe_callee(object)),
      _ => format!("{}[...]", describe_callee(object)),
    },
    Node::MemberExpression { object, .. } => format!("{}[...]", describe_callee(object)),
    Node::Literal(_) => "literal".to_string(),
    other => format!("({})", other.kind()),
  }
}
