//! Free-variable extraction.
//!
//! Walks an expression tree and reports every name it needs from the
//! evaluation environment. Locals introduced by `for` expressions and
//! template `for` directives are not free. Function names are not
//! references; only their arguments are inspected.
//!
//! A traversal rooted at one of the file's import aliases is reported as a
//! single compound name (`alias.attr`). Any other traversal reports its root.

use std::collections::BTreeSet;

use hcl::expr::{Expression, ObjectKey, Operation, TraversalOperator};
use hcl::template::{Directive, Element, Template};

/// Collect the free variables referenced by `expr`, in first-seen order.
pub fn free_variables(expr: &Expression, aliases: &BTreeSet<String>) -> Vec<String> {
  let mut collector = Collector {
    aliases,
    bound: Vec::new(),
    found: Vec::new(),
  };
  collector.expr(expr);
  collector.found
}

struct Collector<'a> {
  aliases: &'a BTreeSet<String>,
  bound: Vec<String>,
  found: Vec<String>,
}

impl Collector<'_> {
  fn record(&mut self, name: String) {
    if !self.found.contains(&name) {
      self.found.push(name);
    }
  }

  fn is_bound(&self, name: &str) -> bool {
    self.bound.iter().any(|bound| bound == name)
  }

  fn root(&mut self, name: &str, first_attr: Option<&str>) {
    if self.is_bound(name) {
      return;
    }
    match first_attr {
      Some(attr) if self.aliases.contains(name) => self.record(format!("{name}.{attr}")),
      _ => self.record(name.to_string()),
    }
  }

  fn with_locals(&mut self, locals: &[&str], f: impl FnOnce(&mut Self)) {
    let depth = self.bound.len();
    self.bound.extend(locals.iter().map(|local| local.to_string()));
    f(self);
    self.bound.truncate(depth);
  }

  fn expr(&mut self, expr: &Expression) {
    match expr {
      Expression::Variable(var) => self.root(var.as_str(), None),
      Expression::Traversal(traversal) => {
        match &traversal.expr {
          Expression::Variable(var) => {
            let first_attr = match traversal.operators.first() {
              Some(TraversalOperator::GetAttr(attr)) => Some(attr.as_str()),
              _ => None,
            };
            self.root(var.as_str(), first_attr);
          }
          other => self.expr(other),
        }
        for operator in &traversal.operators {
          if let TraversalOperator::Index(index) = operator {
            self.expr(index);
          }
        }
      }
      Expression::Array(items) => items.iter().for_each(|item| self.expr(item)),
      Expression::Object(object) => {
        for (key, value) in object.iter() {
          if let ObjectKey::Expression(key) = key {
            self.expr(key);
          }
          self.expr(value);
        }
      }
      Expression::TemplateExpr(template) => {
        // Unparseable templates fail later, during evaluation, with a
        // precise message.
        if let Ok(template) = Template::from_expr(template) {
          self.template(&template);
        }
      }
      Expression::FuncCall(call) => call.args.iter().for_each(|arg| self.expr(arg)),
      Expression::Parenthesis(inner) => self.expr(inner),
      Expression::Conditional(cond) => {
        self.expr(&cond.cond_expr);
        self.expr(&cond.true_expr);
        self.expr(&cond.false_expr);
      }
      Expression::Operation(operation) => match operation.as_ref() {
        Operation::Unary(unary) => self.expr(&unary.expr),
        Operation::Binary(binary) => {
          self.expr(&binary.lhs_expr);
          self.expr(&binary.rhs_expr);
        }
      },
      Expression::ForExpr(for_expr) => {
        self.expr(&for_expr.collection_expr);
        let mut locals = vec![for_expr.value_var.as_str()];
        if let Some(key_var) = &for_expr.key_var {
          locals.push(key_var.as_str());
        }
        self.with_locals(&locals, |this| {
          if let Some(key_expr) = &for_expr.key_expr {
            this.expr(key_expr);
          }
          this.expr(&for_expr.value_expr);
          if let Some(cond_expr) = &for_expr.cond_expr {
            this.expr(cond_expr);
          }
        });
      }
      _ => {}
    }
  }

  fn template(&mut self, template: &Template) {
    for element in template.elements() {
      match element {
        Element::Literal(_) => {}
        Element::Interpolation(interpolation) => self.expr(&interpolation.expr),
        Element::Directive(directive) => self.directive(directive),
      }
    }
  }

  fn directive(&mut self, directive: &Directive) {
    match directive {
      Directive::If(if_directive) => {
        self.expr(&if_directive.cond_expr);
        self.template(&if_directive.true_template);
        if let Some(false_template) = &if_directive.false_template {
          self.template(false_template);
        }
      }
      Directive::For(for_directive) => {
        self.expr(&for_directive.collection_expr);
        let mut locals = vec![for_directive.value_var.as_str()];
        if let Some(key_var) = &for_directive.key_var {
          locals.push(key_var.as_str());
        }
        self.with_locals(&locals, |this| this.template(&for_directive.template));
      }
    }
  }
}
