//! Name resolution over a parsed template.
//!
//! Tera only fails on an unknown name when it prints or filters it. In `if`
//! conditions and `and`/`or` operands an unknown name is falsy. [`unbound`]
//! walks the parsed template and reports the first root name that is neither
//! in the namespace nor bound by the template itself (`for`, `set`, macro
//! arguments). `x is defined` and `x | default(...)` remain explicit opt-ins.

use std::collections::HashSet;

use tera::ast::{Expr, ExprVal, FunctionCall, Node};

use gke_deploy_core::VariableNamespace;

/// Names Tera binds on its own.
const TERA_MAGIC: &[&str] = &["__tera_context"];

/// First name referenced by `ast` that nothing binds, if any.
pub(crate) fn unbound(ast: &[Node], vars: &VariableNamespace) -> Option<String> {
    let mut assigned = HashSet::new();
    collect_assigned(ast, &mut assigned);
    let resolver = Resolver { vars, assigned };
    resolver.nodes(ast, &HashSet::new()).err()
}

/// Root name of an identifier path plus any bare identifiers used as
/// subscripts: `a.b[c].d` yields `a` and `c`.
fn ident_roots(ident: &str) -> Vec<&str> {
    let mut roots = vec![ident.split(['.', '[']).next().unwrap_or(ident)];
    let mut rest = ident;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else { break };
        let inner = after[..close].trim();
        let literal = inner.starts_with(['"', '\'', '`'])
            || inner.starts_with(|c: char| c.is_ascii_digit() || c == '-');
        if !inner.is_empty() && !literal {
            roots.push(inner.split(['.', '[']).next().unwrap_or(inner));
        }
        rest = &after[close + 1..];
    }
    roots
}

fn collect_assigned<'a>(nodes: &'a [Node], out: &mut HashSet<&'a str>) {
    for node in nodes {
        match node {
            Node::Set(_, set) => {
                out.insert(set.key.as_str());
            }
            Node::If(cond, _) => {
                for (_, _, body) in &cond.conditions {
                    collect_assigned(body, out);
                }
                if let Some((_, body)) = &cond.otherwise {
                    collect_assigned(body, out);
                }
            }
            Node::Forloop(_, for_loop, _) => {
                collect_assigned(&for_loop.body, out);
                if let Some(body) = &for_loop.empty_body {
                    collect_assigned(body, out);
                }
            }
            Node::Block(_, block, _) => collect_assigned(&block.body, out),
            Node::FilterSection(_, section, _) => collect_assigned(&section.body, out),
            Node::MacroDefinition(_, def, _) => collect_assigned(&def.body, out),
            _ => {}
        }
    }
}

type Locals<'a> = HashSet<&'a str>;

struct Resolver<'v, 'a> {
    vars: &'v VariableNamespace,
    assigned: HashSet<&'a str>,
}

impl<'v, 'a> Resolver<'v, 'a> {
    fn is_bound(&self, name: &str, locals: &Locals<'a>) -> bool {
        locals.contains(name)
            || self.assigned.contains(name)
            || TERA_MAGIC.contains(&name)
            || self.vars.contains(name)
    }

    fn ident(&self, ident: &str, locals: &Locals<'a>) -> Result<(), String> {
        match ident_roots(ident)
            .into_iter()
            .find(|root| !self.is_bound(root, locals))
        {
            Some(root) => Err(root.to_string()),
            None => Ok(()),
        }
    }

    fn nodes(&self, nodes: &'a [Node], locals: &Locals<'a>) -> Result<(), String> {
        nodes.iter().try_for_each(|node| self.node(node, locals))
    }

    fn node(&self, node: &'a Node, locals: &Locals<'a>) -> Result<(), String> {
        match node {
            Node::VariableBlock(_, expr) => self.expr(expr, locals),
            Node::Set(_, set) => self.expr(&set.value, locals),
            Node::If(cond, _) => {
                for (_, expr, body) in &cond.conditions {
                    self.expr(expr, locals)?;
                    self.nodes(body, locals)?;
                }
                match &cond.otherwise {
                    Some((_, body)) => self.nodes(body, locals),
                    None => Ok(()),
                }
            }
            Node::Forloop(_, for_loop, _) => {
                self.expr(&for_loop.container, locals)?;
                let mut inner = locals.clone();
                inner.insert(for_loop.value.as_str());
                inner.insert("loop");
                if let Some(key) = &for_loop.key {
                    inner.insert(key.as_str());
                }
                self.nodes(&for_loop.body, &inner)?;
                match &for_loop.empty_body {
                    Some(body) => self.nodes(body, locals),
                    None => Ok(()),
                }
            }
            Node::Block(_, block, _) => self.nodes(&block.body, locals),
            Node::FilterSection(_, section, _) => {
                self.call(&section.filter, locals)?;
                self.nodes(&section.body, locals)
            }
            Node::MacroDefinition(_, def, _) => {
                for default in def.args.values().flatten() {
                    self.expr(default, locals)?;
                }
                let mut inner = locals.clone();
                inner.extend(def.args.keys().map(String::as_str));
                self.nodes(&def.body, &inner)
            }
            Node::Super
            | Node::Text(_)
            | Node::Raw(..)
            | Node::Comment(..)
            | Node::Extends(..)
            | Node::Include(..)
            | Node::ImportMacro(..)
            | Node::Break(_)
            | Node::Continue(_) => Ok(()),
        }
    }

    fn expr(&self, expr: &'a Expr, locals: &Locals<'a>) -> Result<(), String> {
        let defaulted = expr.has_default_filter() && matches!(expr.val, ExprVal::Ident(_));
        if !defaulted {
            self.val(&expr.val, locals)?;
        }
        expr.filters
            .iter()
            .try_for_each(|filter| self.call(filter, locals))
    }

    fn call(&self, call: &'a FunctionCall, locals: &Locals<'a>) -> Result<(), String> {
        call.args.values().try_for_each(|arg| self.expr(arg, locals))
    }

    fn val(&self, val: &'a ExprVal, locals: &Locals<'a>) -> Result<(), String> {
        match val {
            ExprVal::String(_) | ExprVal::Int(_) | ExprVal::Float(_) | ExprVal::Bool(_) => Ok(()),
            ExprVal::Ident(ident) => self.ident(ident, locals),
            ExprVal::Math(math) => {
                self.expr(&math.lhs, locals)?;
                self.expr(&math.rhs, locals)
            }
            ExprVal::Logic(logic) => {
                self.expr(&logic.lhs, locals)?;
                self.expr(&logic.rhs, locals)
            }
            ExprVal::In(contains) => {
                self.expr(&contains.lhs, locals)?;
                self.expr(&contains.rhs, locals)
            }
            ExprVal::Test(test) => {
                if !matches!(test.name.as_str(), "defined" | "undefined") {
                    self.ident(&test.ident, locals)?;
                }
                test.args.iter().try_for_each(|arg| self.expr(arg, locals))
            }
            ExprVal::MacroCall(call) => call.args.values().try_for_each(|arg| self.expr(arg, locals)),
            ExprVal::FunctionCall(call) => self.call(call, locals),
            ExprVal::Array(items) => items.iter().try_for_each(|item| self.expr(item, locals)),
            ExprVal::StringConcat(concat) => {
                concat.values.iter().try_for_each(|value| self.val(value, locals))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
