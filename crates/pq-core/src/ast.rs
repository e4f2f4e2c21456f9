//! Typed graph-query expression tree.
//!
//! The compiler builds a `SelectQuery` out of `Pattern`s and `Expr`s with
//! every variable already bound to a unique name, then `render` turns it
//! into text in a single pass. Nothing here knows about the transport.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use regex::RegexBuilder;

use crate::constants::{DATASET_NAME_VAR, DATASET_VAR};
use crate::vocab::{Iri, Namespace};

/// A query variable. Compiler-generated variables carry a counter id so two
/// filter terms never alias the same graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    base: Cow<'static, str>,
    id: Option<u32>,
}

impl Var {
    /// An unnumbered variable shared by every sub-pattern (`?dataset`).
    pub const fn root(base: &'static str) -> Self {
        Self {
            base: Cow::Borrowed(base),
            id: None,
        }
    }

    pub fn dataset() -> Self {
        Self::root(DATASET_VAR)
    }

    pub fn dataset_name() -> Self {
        Self::root(DATASET_NAME_VAR)
    }

    /// Name without the leading `?`, as it appears in result bindings.
    pub fn name(&self) -> String {
        match self.id {
            Some(id) => format!("{}_{id}", self.base),
            None => self.base.to_string(),
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name())
    }
}

/// Hands out fresh variables. One generator per compilation, so output is
/// deterministic for identical input.
#[derive(Debug, Default)]
pub struct VarGen {
    next: u32,
}

impl VarGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, base: &'static str) -> Var {
        self.next += 1;
        Var {
            base: Cow::Borrowed(base),
            id: Some(self.next),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(Var),
    Iri(Iri),
    Number(f64),
    Str(String),
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl From<&Var> for Term {
    fn from(v: &Var) -> Self {
        Term::Var(v.clone())
    }
}

impl From<Iri> for Term {
    fn from(i: Iri) -> Self {
        Term::Iri(i)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Le,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Sub,
    Mul,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
        }
    }
}

/// Filter / bind expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Term(Term),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    In(Box<Expr>, Vec<Term>),
    Lcase(Box<Expr>),
    Contains(Box<Expr>, Box<Expr>),
    Regex {
        text: Box<Expr>,
        pattern: String,
        flags: String,
    },
}

impl Expr {
    pub fn var(v: &Var) -> Self {
        Expr::Term(Term::Var(v.clone()))
    }

    pub fn num(n: f64) -> Self {
        Expr::Term(Term::Number(n))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Term(Term::Str(s.into()))
    }

    pub fn cmp(op: CmpOp, l: Expr, r: Expr) -> Self {
        Expr::Compare(op, Box::new(l), Box::new(r))
    }

    pub fn le(l: Expr, r: Expr) -> Self {
        Self::cmp(CmpOp::Le, l, r)
    }

    pub fn ge(l: Expr, r: Expr) -> Self {
        Self::cmp(CmpOp::Ge, l, r)
    }

    pub fn arith(op: ArithOp, l: Expr, r: Expr) -> Self {
        Expr::Arith(op, Box::new(l), Box::new(r))
    }

    pub fn is_in(e: Expr, terms: impl IntoIterator<Item = Term>) -> Self {
        Expr::In(Box::new(e), terms.into_iter().collect())
    }

    pub fn contains(haystack: Expr, needle: Expr) -> Self {
        Expr::Contains(Box::new(haystack), Box::new(needle))
    }

    pub fn lcase(e: Expr) -> Self {
        Expr::Lcase(Box::new(e))
    }

    pub fn regex(text: Expr, pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Expr::Regex {
            text: Box::new(text),
            pattern: pattern.into(),
            flags: flags.into(),
        }
    }

    /// Flatten a single-element disjunction.
    pub fn any(mut exprs: Vec<Expr>) -> Self {
        if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Or(exprs)
        }
    }

    fn visit_terms<'a>(&'a self, f: &mut impl FnMut(&'a Term)) {
        match self {
            Expr::Term(t) => f(t),
            Expr::Compare(_, l, r) | Expr::Arith(_, l, r) | Expr::Contains(l, r) => {
                l.visit_terms(f);
                r.visit_terms(f);
            }
            Expr::And(es) | Expr::Or(es) => es.iter().for_each(|e| e.visit_terms(f)),
            Expr::In(e, ts) => {
                e.visit_terms(f);
                ts.iter().for_each(|t| f(t));
            }
            Expr::Lcase(e) => e.visit_terms(f),
            Expr::Regex { text, .. } => text.visit_terms(f),
        }
    }
}

/// Graph patterns inside the WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Triple { s: Term, p: Iri, o: Term },
    /// Alternatives; each branch is a group.
    Union(Vec<Vec<Pattern>>),
    Filter(Expr),
    Bind { expr: Expr, var: Var },
    NotExists(Vec<Pattern>),
}

impl Pattern {
    pub fn triple(s: impl Into<Term>, p: Iri, o: impl Into<Term>) -> Self {
        Pattern::Triple {
            s: s.into(),
            p,
            o: o.into(),
        }
    }

    pub fn bind(expr: Expr, var: &Var) -> Self {
        Pattern::Bind {
            expr,
            var: var.clone(),
        }
    }

    /// Depth-first walk over this pattern and every nested pattern.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Pattern)) {
        f(self);
        match self {
            Pattern::NotExists(ps) => ps.iter().for_each(|p| p.walk(f)),
            Pattern::Union(branches) => branches.iter().flatten().for_each(|p| p.walk(f)),
            Pattern::Triple { .. } | Pattern::Filter(_) | Pattern::Bind { .. } => {}
        }
    }

    fn visit_terms<'a>(&'a self, f: &mut impl FnMut(&'a Term)) {
        self.walk(&mut |p| match p {
            Pattern::Triple { s, o, .. } => {
                f(s);
                f(o);
            }
            Pattern::Filter(e) => e.visit_terms(f),
            Pattern::Bind { expr, .. } => expr.visit_terms(f),
            _ => {}
        });
    }
}

/// `SELECT [DISTINCT] ?var WHERE { patterns }`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub distinct: bool,
    pub projection: Var,
    pub patterns: Vec<Pattern>,
}

impl SelectQuery {
    pub fn distinct(projection: Var) -> Self {
        Self {
            distinct: true,
            projection,
            patterns: Vec::new(),
        }
    }

    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    pub fn extend(&mut self, patterns: impl IntoIterator<Item = Pattern>) {
        self.patterns.extend(patterns);
    }

    /// Every pattern in the tree, depth-first.
    pub fn all_patterns(&self) -> Vec<&Pattern> {
        let mut out = Vec::new();
        for p in &self.patterns {
            p.walk(&mut |q| out.push(q));
        }
        out
    }

    /// Namespaces referenced through `prefix:local` terms, in declaration order.
    pub fn namespaces(&self) -> BTreeSet<Namespace> {
        let mut used = BTreeSet::new();
        let mut note = |iri: &Iri| {
            if iri.is_prefixed() {
                used.insert(iri.ns);
            }
        };
        for p in &self.patterns {
            p.walk(&mut |q| {
                if let Pattern::Triple { p, .. } = q {
                    note(p);
                }
            });
            p.visit_terms(&mut |t| {
                if let Term::Iri(iri) = t {
                    note(iri);
                }
            });
        }
        used
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A bound value for expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
    Str(String),
    Iri(Iri),
}

pub type Bindings = HashMap<Var, Value>;

impl Expr {
    /// Evaluate against a set of bindings with SPARQL-like error semantics:
    /// `None` stands for an evaluation error (unbound variable, type
    /// mismatch). `||` is true if any operand is true, `&&` false if any is
    /// false, regardless of errors in the others.
    pub fn evaluate(&self, env: &Bindings) -> Option<Value> {
        match self {
            Expr::Term(t) => term_value(t, env),
            Expr::Compare(op, l, r) => {
                let ordering = match (l.evaluate(env)?, r.evaluate(env)?) {
                    (Value::Num(a), Value::Num(b)) => a.partial_cmp(&b)?,
                    (Value::Str(a), Value::Str(b)) => a.cmp(&b),
                    _ => return None,
                };
                let ok = match op {
                    CmpOp::Le => ordering.is_le(),
                    CmpOp::Ge => ordering.is_ge(),
                };
                Some(Value::Bool(ok))
            }
            Expr::Arith(op, l, r) => match (l.evaluate(env)?, r.evaluate(env)?) {
                (Value::Num(a), Value::Num(b)) => Some(Value::Num(match op {
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                })),
                _ => None,
            },
            Expr::And(es) => {
                let mut errored = false;
                for e in es {
                    match e.evaluate_bool(env) {
                        Some(false) => return Some(Value::Bool(false)),
                        Some(true) => {}
                        None => errored = true,
                    }
                }
                (!errored).then_some(Value::Bool(true))
            }
            Expr::Or(es) => {
                let mut errored = false;
                for e in es {
                    match e.evaluate_bool(env) {
                        Some(true) => return Some(Value::Bool(true)),
                        Some(false) => {}
                        None => errored = true,
                    }
                }
                (!errored).then_some(Value::Bool(false))
            }
            Expr::In(e, terms) => {
                let needle = e.evaluate(env)?;
                let found = terms
                    .iter()
                    .filter_map(|t| term_value(t, env))
                    .any(|v| v == needle);
                Some(Value::Bool(found))
            }
            Expr::Lcase(e) => match e.evaluate(env)? {
                Value::Str(s) => Some(Value::Str(s.to_lowercase())),
                _ => None,
            },
            Expr::Contains(h, n) => match (h.evaluate(env)?, n.evaluate(env)?) {
                (Value::Str(h), Value::Str(n)) => Some(Value::Bool(h.contains(&n))),
                _ => None,
            },
            Expr::Regex {
                text,
                pattern,
                flags,
            } => {
                let Value::Str(s) = text.evaluate(env)? else {
                    return None;
                };
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(flags.contains('i'))
                    .build()
                    .ok()?;
                Some(Value::Bool(re.is_match(&s)))
            }
        }
    }

    /// Effective boolean value; `None` on error.
    pub fn evaluate_bool(&self, env: &Bindings) -> Option<bool> {
        match self.evaluate(env)? {
            Value::Bool(b) => Some(b),
            Value::Num(n) => Some(n != 0.0 && !n.is_nan()),
            Value::Str(s) => Some(!s.is_empty()),
            Value::Iri(_) => None,
        }
    }
}

fn term_value(t: &Term, env: &Bindings) -> Option<Value> {
    match t {
        Term::Var(v) => env.get(v).cloned(),
        Term::Iri(i) => Some(Value::Iri(i.clone())),
        Term::Number(n) => Some(Value::Num(*n)),
        Term::Str(s) => Some(Value::Str(s.clone())),
    }
}
