//! Single-pass text rendering of a `SelectQuery`.

use std::fmt::Write;

use crate::ast::{ArithOp, Expr, Pattern, SelectQuery, Term};

const INDENT: &str = "  ";

/// Render `query` as SPARQL text: PREFIX preamble for the namespaces the
/// query uses, then the SELECT form.
pub fn render(query: &SelectQuery) -> String {
    let mut out = String::new();
    for ns in query.namespaces() {
        let _ = writeln!(out, "PREFIX {}: <{}>", ns.prefix(), ns.iri());
    }
    if !out.is_empty() {
        out.push('\n');
    }

    let distinct = if query.distinct { "DISTINCT " } else { "" };
    let _ = writeln!(out, "SELECT {distinct}{} WHERE {{", query.projection);
    block(&mut out, &query.patterns, 1);
    out.push_str("}\n");
    out
}

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn block(out: &mut String, patterns: &[Pattern], depth: usize) {
    let mut i = 0;
    while i < patterns.len() {
        match &patterns[i] {
            Pattern::Triple { s, .. } => {
                // Consecutive triples on one subject share it with `;`.
                let run: Vec<_> = patterns[i..]
                    .iter()
                    .map_while(|q| match q {
                        Pattern::Triple { s: other, p, o } if other == s => Some((p, o)),
                        _ => None,
                    })
                    .collect();
                pad(out, depth);
                out.push_str(&term(s));
                for (k, (p, o)) in run.iter().enumerate() {
                    if k > 0 {
                        out.push_str(" ;\n");
                        pad(out, depth + 2);
                    } else {
                        out.push(' ');
                    }
                    let _ = write!(out, "{p} {}", term(o));
                }
                out.push_str(" .\n");
                i += run.len();
                continue;
            }
            Pattern::Union(branches) => {
                for (k, branch) in branches.iter().enumerate() {
                    pad(out, depth);
                    if k > 0 {
                        out.push_str("UNION ");
                    }
                    out.push_str("{\n");
                    block(out, branch, depth + 1);
                    pad(out, depth);
                    out.push_str("}\n");
                }
            }
            Pattern::Filter(e) => {
                pad(out, depth);
                let _ = writeln!(out, "FILTER({})", expr(e));
            }
            Pattern::Bind { expr: e, var } => {
                pad(out, depth);
                let _ = writeln!(out, "BIND({} AS {var})", expr(e));
            }
            Pattern::NotExists(ps) => {
                pad(out, depth);
                out.push_str("FILTER NOT EXISTS {\n");
                block(out, ps, depth + 1);
                pad(out, depth);
                out.push_str("}\n");
            }
        }
        i += 1;
    }
}

fn term(t: &Term) -> String {
    match t {
        Term::Var(v) => v.to_string(),
        Term::Iri(i) => i.to_string(),
        Term::Number(n) => number(*n),
        Term::Str(s) => string_literal(s),
    }
}

/// Whole numbers without a fractional part, everything else as Rust prints it.
pub fn number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Or(_) => 1,
        Expr::And(_) => 2,
        Expr::Compare(..) | Expr::In(..) => 3,
        Expr::Arith(ArithOp::Sub, ..) => 4,
        Expr::Arith(ArithOp::Mul, ..) => 5,
        Expr::Term(_) | Expr::Lcase(_) | Expr::Contains(..) | Expr::Regex { .. } => 6,
    }
}

/// Render `e`, parenthesized when it binds looser than `min`.
fn operand(e: &Expr, min: u8) -> String {
    if precedence(e) < min {
        format!("({})", expr(e))
    } else {
        expr(e)
    }
}

fn expr(e: &Expr) -> String {
    let prec = precedence(e);
    match e {
        Expr::Term(t) => term(t),
        Expr::Compare(op, l, r) => {
            format!("{} {} {}", operand(l, prec + 1), op.symbol(), operand(r, prec + 1))
        }
        Expr::Arith(op, l, r) => {
            // Left-associative: the right operand needs a tighter bind.
            format!("{} {} {}", operand(l, prec), op.symbol(), operand(r, prec + 1))
        }
        Expr::And(es) => join(es, " && ", prec),
        Expr::Or(es) => join(es, " || ", prec),
        Expr::In(e, terms) => {
            let list: Vec<String> = terms.iter().map(term).collect();
            format!("{} IN ({})", operand(e, prec + 1), list.join(", "))
        }
        Expr::Lcase(e) => format!("LCASE({})", expr(e)),
        Expr::Contains(h, n) => format!("CONTAINS({}, {})", expr(h), expr(n)),
        Expr::Regex {
            text,
            pattern,
            flags,
        } => {
            if flags.is_empty() {
                format!("REGEX({}, {})", expr(text), string_literal(pattern))
            } else {
                format!(
                    "REGEX({}, {}, {})",
                    expr(text),
                    string_literal(pattern),
                    string_literal(flags)
                )
            }
        }
    }
}

fn join(es: &[Expr], sep: &str, prec: u8) -> String {
    es.iter()
        .map(|e| operand(e, prec + 1))
        .collect::<Vec<_>>()
        .join(sep)
}
