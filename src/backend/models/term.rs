//! The term universe of the engine.
//!
//! A `Term` is a cheap-to-clone tagged value. Compound terms are shared
//! through `Arc` and never change shape after construction; the only mutable
//! part of the universe is the variable cell, which lives in the
//! execution context's [`Store`](crate::backend::store::Store) and is
//! addressed by a [`VarId`].

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive};
use thiserror::Error;

use crate::backend::symbol::{atoms, intern, Atom};

/// Index of a variable cell in a `Store` arena.
///
/// Inside a [`ClauseTemplate`](super::ClauseTemplate) the same type numbers
/// the clause-local variables `0..var_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Functor/arity identifier of a predicate or compound term (`name/arity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub name: Atom,
    pub arity: u32,
}

impl Tag {
    #[inline]
    pub fn new(name: Atom, arity: u32) -> Self {
        Tag { name, arity }
    }

    /// Convenience constructor interning `name`
    pub fn of(name: &str, arity: u32) -> Self {
        Tag::new(intern(name), arity)
    }

    /// The predicate indicator term `Name/Arity`
    pub fn indicator(&self) -> Term {
        Term::app_atom(
            atoms().slash,
            vec![Term::Atom(self.name), Term::Integer(self.arity as i64)],
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// Errors raised while constructing terms from raw parts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermError {
    #[error("compound term {0} must have at least one argument")]
    ZeroArity(Atom),
}

/// A compound term: functor plus a fixed, non-empty argument sequence
#[derive(Debug, Clone)]
pub struct Compound {
    functor: Atom,
    args: Box<[Term]>,
}

impl Compound {
    /// Build a compound; arity 0 is rejected.
    pub fn new(functor: Atom, args: Vec<Term>) -> Result<Self, TermError> {
        if args.is_empty() {
            return Err(TermError::ZeroArity(functor));
        }
        Ok(Compound {
            functor,
            args: args.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn functor(&self) -> Atom {
        self.functor
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    #[inline]
    pub fn args(&self) -> &[Term] {
        &self.args
    }

    #[inline]
    pub fn arg(&self, index: usize) -> Option<&Term> {
        self.args.get(index)
    }

    #[inline]
    pub fn tag(&self) -> Tag {
        Tag::new(self.functor, self.args.len() as u32)
    }
}

/// Opaque host value carried through the engine by identity.
#[derive(Clone)]
pub struct HostObject {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        HostObject {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Identity comparison: two host objects are equal iff they share the allocation.
    #[inline]
    pub fn same(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.value) as *const () as usize
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({}@{:x})", self.type_name, self.address())
    }
}

/// A value in the engine's universe
#[derive(Debug, Clone)]
pub enum Term {
    /// Interned symbolic constant
    Atom(Atom),
    /// Machine-width integer
    Integer(i64),
    /// Arbitrary precision integer; never holds a value that fits in `Integer`
    BigInteger(Arc<BigInt>),
    /// Double precision float
    Float(f64),
    /// Exact rational; never holds a value with denominator 1
    Rational(Arc<BigRational>),
    /// Reference to a variable cell
    Var(VarId),
    /// Functor + arguments
    Compound(Arc<Compound>),
    /// Opaque host value
    Object(HostObject),
}

impl Term {
    // === Constructors ===

    #[inline]
    pub fn atom(name: &str) -> Term {
        Term::Atom(intern(name))
    }

    #[inline]
    pub fn integer(value: i64) -> Term {
        Term::Integer(value)
    }

    #[inline]
    pub fn float(value: f64) -> Term {
        Term::Float(value)
    }

    /// Build an integer term, demoting to `Integer` when the value fits.
    pub fn big_integer(value: BigInt) -> Term {
        match value.to_i64() {
            Some(small) => Term::Integer(small),
            None => Term::BigInteger(Arc::new(value)),
        }
    }

    /// Build a rational term, demoting to an integer when the denominator is 1.
    pub fn rational(value: BigRational) -> Term {
        if value.denom().is_one() {
            Term::big_integer(value.numer().clone())
        } else {
            Term::Rational(Arc::new(value))
        }
    }

    #[inline]
    pub fn var(id: VarId) -> Term {
        Term::Var(id)
    }

    /// Build a compound term; arity 0 is rejected.
    pub fn compound(functor: Atom, args: Vec<Term>) -> Result<Term, TermError> {
        Compound::new(functor, args).map(|c| Term::Compound(Arc::new(c)))
    }

    /// Build `name(args...)`; with no arguments this yields the atom `name`.
    pub fn app(name: &str, args: Vec<Term>) -> Term {
        Term::app_atom(intern(name), args)
    }

    /// Like [`Term::app`] with an already interned functor.
    pub fn app_atom(functor: Atom, args: Vec<Term>) -> Term {
        if args.is_empty() {
            Term::Atom(functor)
        } else {
            Term::Compound(Arc::new(Compound {
                functor,
                args: args.into_boxed_slice(),
            }))
        }
    }

    pub fn object<T: Any + Send + Sync>(value: T) -> Term {
        Term::Object(HostObject::new(value))
    }

    #[inline]
    pub fn nil() -> Term {
        Term::Atom(atoms().nil)
    }

    #[inline]
    pub fn cons(head: Term, tail: Term) -> Term {
        Term::app_atom(atoms().dot, vec![head, tail])
    }

    /// `Key-Value`
    #[inline]
    pub fn pair(key: Term, value: Term) -> Term {
        Term::app_atom(atoms().minus, vec![key, value])
    }

    // === Inspection ===

    #[inline]
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    #[inline]
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Term::Var(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub fn as_atom(&self) -> Option<Atom> {
        match self {
            Term::Atom(a) => Some(*a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Term::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Term::Compound(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Term::Integer(_) | Term::BigInteger(_) | Term::Float(_) | Term::Rational(_)
        )
    }

    /// Integer in either representation
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, Term::Integer(_) | Term::BigInteger(_))
    }

    #[inline]
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Term::Var(_) | Term::Compound(_))
    }

    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::Compound(_))
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(a) if *a == atoms().nil)
    }

    /// Split a list cell `'.'(H, T)` into head and tail.
    #[inline]
    pub fn as_cons(&self) -> Option<(&Term, &Term)> {
        match self {
            Term::Compound(c) if c.arity() == 2 && c.functor() == atoms().dot => {
                Some((&c.args[0], &c.args[1]))
            }
            _ => None,
        }
    }

    /// `Some(tag)` for callable terms (atoms are `name/0`).
    pub fn callable_tag(&self) -> Option<Tag> {
        match self {
            Term::Atom(a) => Some(Tag::new(*a, 0)),
            Term::Compound(c) => Some(c.tag()),
            _ => None,
        }
    }

    /// Arguments of a compound, or the empty slice.
    #[inline]
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(c) => c.args(),
            _ => &[],
        }
    }

    /// Kind name used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Term::Atom(_) => "atom",
            Term::Integer(_) | Term::BigInteger(_) => "integer",
            Term::Float(_) => "float",
            Term::Rational(_) => "rational",
            Term::Var(_) => "variable",
            Term::Compound(_) => "compound",
            Term::Object(_) => "object",
        }
    }

    /// Identity of the underlying allocation, for trivially-equal checks.
    #[inline]
    pub(crate) fn same_ref(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Var(a), Term::Var(b)) => a == b,
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Compound(a), Term::Compound(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Equality of two atomic terms under type-appropriate comparison.
    /// Integers and floats never compare equal (`1 \= 1.0`).
    pub(crate) fn atomic_eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Integer(a), Term::Integer(b)) => a == b,
            (Term::BigInteger(a), Term::BigInteger(b)) => a == b,
            (Term::Float(a), Term::Float(b)) => a == b,
            (Term::Rational(a), Term::Rational(b)) => a == b,
            (Term::Object(a), Term::Object(b)) => a.same(b),
            _ => false,
        }
    }
}

impl From<Atom> for Term {
    fn from(atom: Atom) -> Self {
        Term::Atom(atom)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Integer(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Float(value)
    }
}

impl From<BigInt> for Term {
    fn from(value: BigInt) -> Self {
        Term::big_integer(value)
    }
}

// Structural identity, used for cache keys and template comparison. Floats
// compare by bit pattern and host objects by allocation. This is not
// unification and does not look through variable bindings.
impl PartialEq for Term {
    fn eq(&self, other: &Term) -> bool {
        let mut work = vec![(self, other)];
        while let Some((a, b)) = work.pop() {
            match (a, b) {
                (Term::Float(x), Term::Float(y)) => {
                    if x.to_bits() != y.to_bits() {
                        return false;
                    }
                }
                (Term::Var(x), Term::Var(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (Term::Compound(x), Term::Compound(y)) => {
                    if Arc::ptr_eq(x, y) {
                        continue;
                    }
                    if x.functor != y.functor || x.args.len() != y.args.len() {
                        return false;
                    }
                    work.extend(x.args.iter().zip(y.args.iter()));
                }
                _ => {
                    if !a.atomic_eq(b) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut work = vec![self];
        while let Some(term) = work.pop() {
            std::mem::discriminant(term).hash(state);
            match term {
                Term::Atom(a) => a.hash(state),
                Term::Integer(i) => i.hash(state),
                Term::BigInteger(b) => b.hash(state),
                Term::Float(f) => f.to_bits().hash(state),
                Term::Rational(r) => r.hash(state),
                Term::Var(v) => v.hash(state),
                Term::Compound(c) => {
                    c.functor.hash(state);
                    c.args.len().hash(state);
                    work.extend(c.args.iter().rev());
                }
                Term::Object(o) => o.address().hash(state),
            }
        }
    }
}

// Long lists are chains of uniquely owned cells; release them with a loop
// instead of recursive drop glue.
impl Drop for Compound {
    fn drop(&mut self) {
        let mut pending: Vec<Arc<Compound>> = Vec::new();
        take_compound_args(&mut self.args, &mut pending);
        while let Some(cell) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(cell) {
                take_compound_args(&mut inner.args, &mut pending);
            }
        }
    }
}

fn take_compound_args(args: &mut Box<[Term]>, pending: &mut Vec<Arc<Compound>>) {
    if !args.iter().any(|a| matches!(a, Term::Compound(_))) {
        return;
    }
    for arg in std::mem::take(args).into_vec() {
        if let Term::Compound(c) = arg {
            pending.push(c);
        }
    }
}
