//! Standard order of terms and structural variance.
//!
//! `Var < Number < Atom < Object < Compound`. Numbers compare by value; when
//! an integer and a float have the same value the float comes first.
//! Compounds compare by arity, then functor name, then arguments left to
//! right. Unbound variables compare by cell age.

use std::cmp::Ordering;
use std::collections::HashMap;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::backend::models::{Term, VarId};
use crate::backend::store::Store;

fn class_rank(term: &Term) -> u8 {
    match term {
        Term::Var(_) => 0,
        Term::Integer(_) | Term::BigInteger(_) | Term::Float(_) | Term::Rational(_) => 1,
        Term::Atom(_) => 3,
        Term::Object(_) => 4,
        Term::Compound(_) => 5,
    }
}

/// Compare two terms in the standard order, following bindings.
pub fn compare(store: &Store, a: &Term, b: &Term) -> Ordering {
    let mut work = vec![(a, b)];
    while let Some((left, right)) = work.pop() {
        let left = store.deref(left);
        let right = store.deref(right);
        let ord = match (left, right) {
            (Term::Var(x), Term::Var(y)) => x.cmp(y),
            (Term::Atom(x), Term::Atom(y)) => x.cmp(y),
            (Term::Object(x), Term::Object(y)) => x.address().cmp(&y.address()),
            (Term::Compound(x), Term::Compound(y)) => {
                let head = x
                    .arity()
                    .cmp(&y.arity())
                    .then_with(|| x.functor().cmp(&y.functor()));
                if head == Ordering::Equal {
                    work.extend(x.args().iter().zip(y.args().iter()).rev());
                    continue;
                }
                head
            }
            _ if left.is_number() && right.is_number() => compare_numbers(left, right),
            _ => class_rank(left).cmp(&class_rank(right)),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Numeric comparison used by the standard order: by exact value, with a
/// float preceding an integer of equal value.
pub fn compare_numbers(a: &Term, b: &Term) -> Ordering {
    let by_value = numeric_value_cmp(a, b);
    if by_value != Ordering::Equal {
        return by_value;
    }
    let is_float = |t: &Term| matches!(t, Term::Float(_));
    match (is_float(a), is_float(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn numeric_value_cmp(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::Integer(x), Term::Integer(y)) => x.cmp(y),
        (Term::Float(x), Term::Float(y)) => x.total_cmp(y),
        (Term::Float(x), other) => float_vs_exact(*x, other),
        (other, Term::Float(y)) => float_vs_exact(*y, other).reverse(),
        _ => match (exact(a), exact(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

fn float_vs_exact(x: f64, other: &Term) -> Ordering {
    if x.is_nan() {
        return Ordering::Less;
    }
    if x.is_infinite() {
        return if x > 0.0 { Ordering::Greater } else { Ordering::Less };
    }
    match (BigRational::from_f64(x), exact(other)) {
        (Some(fx), Some(y)) => fx.cmp(&y),
        _ => Ordering::Equal,
    }
}

fn exact(term: &Term) -> Option<BigRational> {
    match term {
        Term::Integer(i) => Some(BigRational::from_integer(BigInt::from(*i))),
        Term::BigInteger(b) => Some(BigRational::from_integer((**b).clone())),
        Term::Rational(r) => Some((**r).clone()),
        Term::Float(f) => BigRational::from_f64(*f),
        _ => None,
    }
}

/// Approximate a number as f64 (for mixed arithmetic and display).
pub fn to_f64(term: &Term) -> Option<f64> {
    match term {
        Term::Integer(i) => Some(*i as f64),
        Term::BigInteger(b) => b.to_f64(),
        Term::Rational(r) => r.to_f64(),
        Term::Float(f) => Some(*f),
        _ => None,
    }
}

/// Are `a` and `b` equal up to a consistent one-to-one renaming of their
/// unbound variables?
pub fn is_variant(store: &Store, a: &Term, b: &Term) -> bool {
    let mut forward: HashMap<VarId, VarId> = HashMap::new();
    let mut backward: HashMap<VarId, VarId> = HashMap::new();
    let mut work = vec![(a, b)];
    while let Some((left, right)) = work.pop() {
        let left = store.deref(left);
        let right = store.deref(right);
        match (left, right) {
            (Term::Var(x), Term::Var(y)) => {
                let fx = *forward.entry(*x).or_insert(*y);
                let by = *backward.entry(*y).or_insert(*x);
                if fx != *y || by != *x {
                    return false;
                }
            }
            (Term::Compound(x), Term::Compound(y)) => {
                if x.functor() != y.functor() || x.arity() != y.arity() {
                    return false;
                }
                work.extend(x.args().iter().zip(y.args().iter()));
            }
            (Term::Var(_), _) | (_, Term::Var(_)) => return false,
            _ => {
                if !left.atomic_eq(right) {
                    return false;
                }
            }
        }
    }
    true
}
