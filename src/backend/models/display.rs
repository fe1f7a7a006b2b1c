//! Canonical text form of terms.
//!
//! Output uses canonical functional notation with list sugar, quoting atoms
//! that would not read back as themselves. Operators are not rendered infix.
//! Variables print as `_G<id>`; bindings are not followed, so resolve a live
//! term first (see [`crate::backend::copy::resolve`]).

use std::fmt::{self, Write};

use itertools::Itertools;

use crate::backend::symbol::Atom;

use super::Term;

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self)
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Term) -> fmt::Result {
    match term {
        Term::Atom(a) => write_atom(f, *a),
        Term::Integer(i) => write!(f, "{}", i),
        Term::BigInteger(b) => write!(f, "{}", b),
        Term::Float(x) => write_float(f, *x),
        Term::Rational(r) => write!(f, "{}r{}", r.numer(), r.denom()),
        Term::Var(v) => write!(f, "_G{}", v.0),
        Term::Object(o) => write!(f, "<{}>", o.type_name()),
        Term::Compound(_) if term.as_cons().is_some() => write_list(f, term),
        Term::Compound(c) => {
            write_atom(f, c.functor())?;
            f.write_char('(')?;
            for (i, arg) in c.args().iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                write_term(f, arg)?;
            }
            f.write_char(')')
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, term: &Term) -> fmt::Result {
    f.write_char('[')?;
    let mut cursor = term;
    let mut first = true;
    while let Some((head, tail)) = cursor.as_cons() {
        if !first {
            f.write_char(',')?;
        }
        first = false;
        write_term(f, head)?;
        cursor = tail;
    }
    if !cursor.is_nil() {
        f.write_char('|')?;
        write_term(f, cursor)?;
    }
    f.write_char(']')
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        write!(f, "{:.1}", x)
    } else {
        write!(f, "{}", x)
    }
}

fn write_atom(f: &mut fmt::Formatter<'_>, atom: Atom) -> fmt::Result {
    let text = atom.as_str();
    if needs_quotes(text) {
        let escaped = text
            .chars()
            .map(|c| match c {
                '\'' => "\\'".to_string(),
                '\\' => "\\\\".to_string(),
                '\n' => "\\n".to_string(),
                '\t' => "\\t".to_string(),
                other => other.to_string(),
            })
            .join("");
        write!(f, "'{}'", escaped)
    } else {
        f.write_str(text)
    }
}

const SYMBOL_CHARS: &str = "+-*/\\^<>=~:.?@#&$";

fn needs_quotes(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if matches!(text, "[]" | "!" | ";" | "{}" | ",") {
        return text == ",";
    }
    if first.is_ascii_lowercase() {
        return !text.chars().all(|c| c.is_alphanumeric() || c == '_');
    }
    !text.chars().all(|c| SYMBOL_CHARS.contains(c))
}
