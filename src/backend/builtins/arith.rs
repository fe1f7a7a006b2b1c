//! Arithmetic evaluation and the arithmetic built-ins.
//!
//! [`eval`] walks an expression with an explicit work stack. Integer results
//! stay machine-width until an operation overflows, then continue as
//! `BigInt`; every result is normalised back to the smallest representation
//! (`Int` before `Big`, an integral rational becomes an integer). Float
//! results are checked: NaN is `evaluation_error(undefined)`, an infinite
//! result from finite operands is `evaluation_error(float_overflow)`.

use std::cmp::Ordering;
use std::sync::Arc;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

use super::integer_arg;
use crate::backend::errors::{EngineError, EngineResult};
use crate::backend::interpreter::Interpreter;
use crate::backend::models::{Tag, Term};
use crate::backend::predicate::{ExecResult, Predicate, PredicateResult};
use crate::backend::registry::PredicateRegistry;
use crate::backend::symbol::Atom;

/// Largest shift distance accepted by `<<` before giving up on memory
const MAX_SHIFT: i64 = 1 << 24;

/// An evaluated number
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Big(BigInt),
    Rational(BigRational),
    Float(f64),
}

impl Number {
    /// Integer value, demoted to `Int` when it fits
    pub fn big(value: BigInt) -> Number {
        match value.to_i64() {
            Some(small) => Number::Int(small),
            None => Number::Big(value),
        }
    }

    /// Rational value, demoted to an integer when the denominator is 1
    pub fn rational(value: BigRational) -> Number {
        if value.denom().is_one() {
            Number::big(value.numer().clone())
        } else {
            Number::Rational(value)
        }
    }

    pub fn from_term(term: &Term) -> Option<Number> {
        match term {
            Term::Integer(i) => Some(Number::Int(*i)),
            Term::BigInteger(b) => Some(Number::Big((**b).clone())),
            Term::Rational(r) => Some(Number::Rational((**r).clone())),
            Term::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    pub fn into_term(self) -> Term {
        match self {
            Number::Int(i) => Term::Integer(i),
            Number::Big(b) => Term::big_integer(b),
            Number::Rational(r) => Term::rational(r),
            Number::Float(f) => Term::Float(f),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Int(_) | Number::Big(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(i) => *i == 0,
            Number::Big(b) => b.is_zero(),
            Number::Rational(r) => r.is_zero(),
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Int(i) => *i < 0,
            Number::Big(b) => b.is_negative(),
            Number::Rational(r) => r.is_negative(),
            Number::Float(f) => *f < 0.0,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Big(b) => b.to_f64().unwrap_or(f64::NAN),
            Number::Rational(r) => r.to_f64().unwrap_or(f64::NAN),
            Number::Float(f) => *f,
        }
    }

    fn into_big(self) -> BigInt {
        match self {
            Number::Int(i) => BigInt::from(i),
            Number::Big(b) => b,
            Number::Rational(r) => r.to_integer(),
            Number::Float(f) => BigInt::from_f64(f).unwrap_or_default(),
        }
    }

    fn into_rational(self) -> BigRational {
        match self {
            Number::Rational(r) => r,
            other => BigRational::from_integer(other.into_big()),
        }
    }
}

/// Two operands brought to a common representation
enum Pair {
    Ints(i64, i64),
    Bigs(BigInt, BigInt),
    Rationals(BigRational, BigRational),
    Floats(f64, f64),
}

fn widen(x: Number, y: Number) -> Pair {
    match (x, y) {
        (Number::Int(a), Number::Int(b)) => Pair::Ints(a, b),
        (Number::Float(a), other) => Pair::Floats(a, other.to_f64()),
        (other, Number::Float(b)) => Pair::Floats(other.to_f64(), b),
        (Number::Rational(a), other) => Pair::Rationals(a, other.into_rational()),
        (other, Number::Rational(b)) => Pair::Rationals(other.into_rational(), b),
        (a, b) => Pair::Bigs(a.into_big(), b.into_big()),
    }
}

/// Both operands must be integers
fn integer_pair(x: Number, y: Number) -> EngineResult<Pair> {
    for n in [&x, &y] {
        if !n.is_integer() {
            return Err(EngineError::type_error("integer", n.clone().into_term()));
        }
    }
    Ok(widen(x, y))
}

fn require_integer(x: &Number) -> EngineResult<()> {
    if x.is_integer() {
        Ok(())
    } else {
        Err(EngineError::type_error("integer", x.clone().into_term()))
    }
}

fn float_result(value: f64, finite_operands: bool) -> EngineResult<Number> {
    if value.is_nan() {
        Err(EngineError::evaluation_error("undefined"))
    } else if value.is_infinite() && finite_operands {
        Err(EngineError::evaluation_error("float_overflow"))
    } else {
        Ok(Number::Float(value))
    }
}

fn zero_divisor() -> EngineError {
    EngineError::evaluation_error("zero_divisor")
}

fn undefined() -> EngineError {
    EngineError::evaluation_error("undefined")
}

/// Numeric comparison by value; `None` when a NaN is involved.
pub fn num_cmp(x: &Number, y: &Number) -> Option<Ordering> {
    match widen(x.clone(), y.clone()) {
        Pair::Ints(a, b) => Some(a.cmp(&b)),
        Pair::Bigs(a, b) => Some(a.cmp(&b)),
        Pair::Rationals(a, b) => Some(a.cmp(&b)),
        Pair::Floats(a, b) => a.partial_cmp(&b),
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

const UNARY: &[&str] = &[
    "-", "+", "abs", "sign", "float", "integer", "float_integer_part",
    "float_fractional_part", "truncate", "floor", "ceiling", "round", "sqrt", "sin", "cos",
    "tan", "asin", "acos", "atan", "exp", "log", "log2", "\\", "msb", "numerator",
    "denominator",
];

const BINARY: &[&str] = &[
    "+", "-", "*", "/", "//", "mod", "rem", "div", "min", "max", "gcd", "**", "^", ">>", "<<",
    "/\\", "\\/", "xor", "atan", "atan2", "copysign", "log", "rdiv",
];

fn is_evaluable(name: &str, arity: usize) -> bool {
    match arity {
        1 => UNARY.contains(&name),
        2 => BINARY.contains(&name),
        _ => false,
    }
}

enum Work<'a> {
    Eval(&'a Term),
    Apply(Atom, usize),
}

/// Evaluate an arithmetic expression under `interp`'s bindings and flags.
pub fn eval(interp: &Interpreter, expr: &Term) -> EngineResult<Number> {
    let store = interp.store();
    let prefer_rationals = interp.flags().prefer_rationals;
    let mut work = vec![Work::Eval(expr)];
    let mut values: Vec<Number> = Vec::new();

    while let Some(item) = work.pop() {
        match item {
            Work::Eval(term) => match store.deref(term) {
                Term::Var(_) => return Err(EngineError::instantiation()),
                Term::Atom(name) => values.push(constant(*name)?),
                Term::Compound(c) => {
                    // "[X]" evaluates X
                    if let Some((head, tail)) = store.deref(term).as_cons() {
                        if store.deref(tail).is_nil() {
                            work.push(Work::Eval(head));
                            continue;
                        }
                    }
                    if !is_evaluable(c.functor().as_str(), c.arity()) {
                        return Err(EngineError::type_error("evaluable", c.tag().indicator()));
                    }
                    work.push(Work::Apply(c.functor(), c.arity()));
                    for arg in c.args().iter().rev() {
                        work.push(Work::Eval(arg));
                    }
                }
                Term::Object(_) => {
                    return Err(EngineError::type_error("evaluable", store.deref(term).clone()))
                }
                number => match Number::from_term(number) {
                    Some(n) => values.push(n),
                    None => return Err(EngineError::type_error("evaluable", number.clone())),
                },
            },
            Work::Apply(name, arity) => {
                let result = if arity == 1 {
                    let x = pop(&mut values)?;
                    unary(name.as_str(), x)?
                } else {
                    let y = pop(&mut values)?;
                    let x = pop(&mut values)?;
                    binary(name.as_str(), x, y, prefer_rationals)?
                };
                values.push(result);
            }
        }
    }
    pop(&mut values)
}

fn pop(values: &mut Vec<Number>) -> EngineResult<Number> {
    values
        .pop()
        .ok_or_else(|| EngineError::system_error("arithmetic operand stack underflow"))
}

fn constant(name: Atom) -> EngineResult<Number> {
    Ok(match name.as_str() {
        "pi" => Number::Float(std::f64::consts::PI),
        "e" => Number::Float(std::f64::consts::E),
        "inf" | "infinite" => Number::Float(f64::INFINITY),
        "nan" => Number::Float(f64::NAN),
        "epsilon" => Number::Float(f64::EPSILON),
        "max_tagged_integer" => Number::Int((1 << 60) - 1),
        "min_tagged_integer" => Number::Int(-(1 << 60)),
        "max_integer" => Number::Int(i64::MAX),
        "min_integer" => Number::Int(i64::MIN),
        _ => return Err(EngineError::type_error("evaluable", Tag::new(name, 0).indicator())),
    })
}

fn unary(name: &str, x: Number) -> EngineResult<Number> {
    let v = x.to_f64();
    let float_fn = |f: fn(f64) -> f64| float_result(f(v), v.is_finite());
    Ok(match name {
        "+" => x,
        "-" => match x {
            Number::Int(i) => i
                .checked_neg()
                .map(Number::Int)
                .unwrap_or_else(|| Number::big(-BigInt::from(i))),
            Number::Big(b) => Number::big(-b),
            Number::Rational(r) => Number::Rational(-r),
            Number::Float(f) => Number::Float(-f),
        },
        "abs" => match x {
            Number::Int(i) => i
                .checked_abs()
                .map(Number::Int)
                .unwrap_or_else(|| Number::big(BigInt::from(i).abs())),
            Number::Big(b) => Number::big(b.abs()),
            Number::Rational(r) => Number::Rational(r.abs()),
            Number::Float(f) => Number::Float(f.abs()),
        },
        "sign" => match x {
            Number::Float(f) if f == 0.0 => Number::Float(0.0),
            Number::Float(f) => Number::Float(f.signum()),
            Number::Int(i) => Number::Int(i.signum()),
            other => Number::Int(if other.is_negative() { -1 } else { 1 }),
        },
        "float" => return float_result(x.to_f64(), true),
        "integer" | "round" => return to_integer(x, f64::round, |r| r.round()),
        "truncate" => return to_integer(x, f64::trunc, |r| r.trunc()),
        "floor" => return to_integer(x, f64::floor, |r| r.floor()),
        "ceiling" => return to_integer(x, f64::ceil, |r| r.ceil()),
        "float_integer_part" => return float_fn(f64::trunc),
        "float_fractional_part" => return float_fn(|v| v - v.trunc()),
        "sqrt" => return float_fn(f64::sqrt),
        "sin" => return float_fn(f64::sin),
        "cos" => return float_fn(f64::cos),
        "tan" => return float_fn(f64::tan),
        "asin" => return float_fn(f64::asin),
        "acos" => return float_fn(f64::acos),
        "atan" => return float_fn(f64::atan),
        "exp" => return float_fn(f64::exp),
        "log" | "log2" => {
            if !x.is_negative() && !x.is_zero() {
                return float_fn(if name == "log" { f64::ln } else { f64::log2 });
            }
            return Err(undefined());
        }
        "\\" => match x {
            Number::Int(i) => Number::Int(!i),
            Number::Big(b) => Number::big(-b - BigInt::one()),
            other => return Err(EngineError::type_error("integer", other.into_term())),
        },
        "msb" => match x {
            Number::Int(i) if i > 0 => Number::Int(63 - i.leading_zeros() as i64),
            Number::Big(b) if b.is_positive() => Number::Int(b.bits() as i64 - 1),
            other => {
                require_integer(&other)?;
                return Err(EngineError::type_error("not_less_than_one", other.into_term()));
            }
        },
        "numerator" | "denominator" => match x {
            Number::Rational(r) if name == "numerator" => Number::big(r.numer().clone()),
            Number::Rational(r) => Number::big(r.denom().clone()),
            n if n.is_integer() => {
                if name == "numerator" {
                    n
                } else {
                    Number::Int(1)
                }
            }
            other => return Err(EngineError::type_error("rational", other.into_term())),
        },
        _ => {
            let tag = Tag::of(name, 1);
            return Err(EngineError::type_error("evaluable", tag.indicator()));
        }
    })
}

/// Integer-valued rounding of any number
fn to_integer(
    x: Number,
    float: fn(f64) -> f64,
    ratio: fn(&BigRational) -> BigRational,
) -> EngineResult<Number> {
    match x {
        Number::Float(f) => {
            let rounded = float(f);
            if !rounded.is_finite() {
                return Err(undefined());
            }
            BigInt::from_f64(rounded).map(Number::big).ok_or_else(undefined)
        }
        Number::Rational(r) => Ok(Number::big(ratio(&r).to_integer())),
        integer => Ok(integer),
    }
}

/// Apply an operation in the common representation of both operands,
/// promoting machine integers to `BigInt` when the checked form overflows.
fn combine(
    x: Number,
    y: Number,
    int: fn(i64, i64) -> Option<i64>,
    big: fn(BigInt, BigInt) -> BigInt,
    ratio: fn(BigRational, BigRational) -> BigRational,
    float: fn(f64, f64) -> f64,
) -> EngineResult<Number> {
    Ok(match widen(x, y) {
        Pair::Ints(a, b) => match int(a, b) {
            Some(v) => Number::Int(v),
            None => Number::big(big(BigInt::from(a), BigInt::from(b))),
        },
        Pair::Bigs(a, b) => Number::big(big(a, b)),
        Pair::Rationals(a, b) => Number::rational(ratio(a, b)),
        Pair::Floats(a, b) => return float_result(float(a, b), a.is_finite() && b.is_finite()),
    })
}

pub fn add(x: Number, y: Number) -> EngineResult<Number> {
    combine(x, y, i64::checked_add, |a, b| a + b, |a, b| a + b, |a, b| a + b)
}

pub fn sub(x: Number, y: Number) -> EngineResult<Number> {
    combine(x, y, i64::checked_sub, |a, b| a - b, |a, b| a - b, |a, b| a - b)
}

pub fn mul(x: Number, y: Number) -> EngineResult<Number> {
    combine(x, y, i64::checked_mul, |a, b| a * b, |a, b| a * b, |a, b| a * b)
}

fn binary(name: &str, x: Number, y: Number, prefer_rationals: bool) -> EngineResult<Number> {
    match name {
        "+" => add(x, y),
        "-" => sub(x, y),
        "*" => mul(x, y),
        "/" => divide(x, y, prefer_rationals),
        "//" => int_divide(x, y),
        "div" => floor_divide(x, y),
        "mod" => modulo(x, y),
        "rem" => remainder(x, y),
        "min" => Ok(if num_cmp(&y, &x) == Some(Ordering::Less) { y } else { x }),
        "max" => Ok(if num_cmp(&y, &x) == Some(Ordering::Greater) { y } else { x }),
        "gcd" => gcd(x, y),
        "**" => power(x, y, false, prefer_rationals),
        "^" => power(x, y, true, prefer_rationals),
        ">>" => shift(x, y, false),
        "<<" => shift(x, y, true),
        "/\\" => bitwise(x, y, |a, b| a & b, |a, b| a & b),
        "\\/" => bitwise(x, y, |a, b| a | b, |a, b| a | b),
        "xor" => bitwise(x, y, |a, b| a ^ b, |a, b| a ^ b),
        "atan" | "atan2" => {
            let (a, b) = (x.to_f64(), y.to_f64());
            if a == 0.0 && b == 0.0 {
                return Err(undefined());
            }
            float_result(a.atan2(b), true)
        }
        "copysign" => float_result(x.to_f64().copysign(y.to_f64()), true),
        "log" => {
            let (base, value) = (x.to_f64(), y.to_f64());
            if base <= 0.0 || value <= 0.0 || base == 1.0 {
                return Err(undefined());
            }
            float_result(value.ln() / base.ln(), true)
        }
        "rdiv" => {
            for n in [&x, &y] {
                if matches!(n, Number::Float(_)) {
                    return Err(EngineError::type_error("rational", n.clone().into_term()));
                }
            }
            if y.is_zero() {
                return Err(zero_divisor());
            }
            Ok(Number::rational(x.into_rational() / y.into_rational()))
        }
        _ => Err(EngineError::type_error("evaluable", Tag::of(name, 2).indicator())),
    }
}

fn divide(x: Number, y: Number, prefer_rationals: bool) -> EngineResult<Number> {
    if y.is_zero() {
        return Err(zero_divisor());
    }
    match widen(x, y) {
        Pair::Ints(a, b) => match (a.checked_rem(b), a.checked_div(b)) {
            (Some(0), Some(q)) => Ok(Number::Int(q)),
            _ => inexact_ratio(BigInt::from(a), BigInt::from(b), prefer_rationals),
        },
        Pair::Bigs(a, b) => inexact_ratio(a, b, prefer_rationals),
        Pair::Rationals(a, b) => Ok(Number::rational(a / b)),
        Pair::Floats(a, b) => float_result(a / b, a.is_finite() && b.is_finite()),
    }
}

fn inexact_ratio(a: BigInt, b: BigInt, prefer_rationals: bool) -> EngineResult<Number> {
    let ratio = BigRational::new(a, b);
    if ratio.denom().is_one() || prefer_rationals {
        Ok(Number::rational(ratio))
    } else {
        float_result(ratio.to_f64().unwrap_or(f64::NAN), true)
    }
}

/// `//`: truncating integer division
fn int_divide(x: Number, y: Number) -> EngineResult<Number> {
    if y.is_zero() && y.is_integer() {
        return Err(zero_divisor());
    }
    Ok(match integer_pair(x, y)? {
        Pair::Ints(a, b) => a
            .checked_div(b)
            .map(Number::Int)
            .unwrap_or_else(|| Number::big(BigInt::from(a) / BigInt::from(b))),
        Pair::Bigs(a, b) => Number::big(a / b),
        _ => return Err(EngineError::system_error("integer operands expected")),
    })
}

/// `div`: flooring integer division
fn floor_divide(x: Number, y: Number) -> EngineResult<Number> {
    let m = modulo(x.clone(), y.clone())?;
    int_divide(sub(x, m)?, y)
}

fn modulo(x: Number, y: Number) -> EngineResult<Number> {
    if y.is_zero() && y.is_integer() {
        return Err(zero_divisor());
    }
    Ok(match integer_pair(x, y)? {
        Pair::Ints(a, b) => {
            let m = a.checked_rem(b).unwrap_or(0);
            if m != 0 && (m < 0) != (b < 0) {
                Number::Int(m + b)
            } else {
                Number::Int(m)
            }
        }
        Pair::Bigs(a, b) => {
            let m = &a % &b;
            if !m.is_zero() && m.is_negative() != b.is_negative() {
                Number::big(m + b)
            } else {
                Number::big(m)
            }
        }
        _ => return Err(EngineError::system_error("integer operands expected")),
    })
}

fn remainder(x: Number, y: Number) -> EngineResult<Number> {
    if y.is_zero() && y.is_integer() {
        return Err(zero_divisor());
    }
    Ok(match integer_pair(x, y)? {
        Pair::Ints(a, b) => Number::Int(a.checked_rem(b).unwrap_or(0)),
        Pair::Bigs(a, b) => Number::big(a % b),
        _ => return Err(EngineError::system_error("integer operands expected")),
    })
}

fn gcd(x: Number, y: Number) -> EngineResult<Number> {
    Ok(match integer_pair(x, y)? {
        Pair::Ints(a, b) => {
            let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
            while b != 0 {
                (a, b) = (b, a % b);
            }
            Number::big(BigInt::from(a))
        }
        Pair::Bigs(a, b) => {
            let (mut a, mut b) = (a.abs(), b.abs());
            while !b.is_zero() {
                let r = &a % &b;
                a = b;
                b = r;
            }
            Number::big(a)
        }
        _ => return Err(EngineError::system_error("integer operands expected")),
    })
}

/// `**` (`caret == false`) and `^`
fn power(x: Number, y: Number, caret: bool, prefer_rationals: bool) -> EngineResult<Number> {
    let float_power = |x: &Number, y: &Number| {
        let (a, b) = (x.to_f64(), y.to_f64());
        if a == 0.0 && b < 0.0 {
            return Err(zero_divisor());
        }
        float_result(a.powf(b), a.is_finite() && b.is_finite())
    };
    if matches!(x, Number::Float(_)) || matches!(y, Number::Float(_)) {
        return float_power(&x, &y);
    }
    let exponent = match &y {
        Number::Int(e) => BigInt::from(*e),
        Number::Big(e) => e.clone(),
        _ if caret => return Err(EngineError::type_error("integer", y.clone().into_term())),
        _ => return float_power(&x, &y),
    };

    // Bases whose powers never grow
    match &x {
        Number::Int(1) => return Ok(Number::Int(1)),
        Number::Int(-1) => {
            let even = (&exponent % BigInt::from(2)).is_zero();
            return Ok(Number::Int(if even { 1 } else { -1 }));
        }
        Number::Int(0) if exponent.is_negative() => return Err(zero_divisor()),
        Number::Int(0) if exponent.is_zero() => return Ok(Number::Int(1)),
        Number::Int(0) => return Ok(Number::Int(0)),
        _ => {}
    }

    let (base, exponent) = if exponent.is_negative() {
        if x.is_integer() && !prefer_rationals {
            if caret {
                return Err(EngineError::type_error("float", x.into_term()));
            }
            return float_power(&x, &y);
        }
        (Number::rational(x.into_rational().recip()), -exponent)
    } else {
        (x, exponent)
    };
    let e = exponent
        .to_u32()
        .ok_or_else(|| EngineError::resource_error("memory"))?;
    Ok(match base {
        Number::Int(b) => b
            .checked_pow(e)
            .map(Number::Int)
            .unwrap_or_else(|| Number::big(BigInt::from(b).pow(e))),
        Number::Big(b) => Number::big(b.pow(e)),
        Number::Rational(r) => {
            Number::rational(BigRational::new(r.numer().pow(e), r.denom().pow(e)))
        }
        Number::Float(f) => return float_result(f.powi(e as i32), f.is_finite()),
    })
}

fn shift(x: Number, y: Number, left: bool) -> EngineResult<Number> {
    let (value, distance) = match integer_pair(x, y)? {
        Pair::Ints(a, b) => (BigInt::from(a), b),
        Pair::Bigs(a, b) => (a, b.to_i64().ok_or_else(|| EngineError::resource_error("memory"))?),
        _ => return Err(EngineError::system_error("integer operands expected")),
    };
    let left = if distance < 0 { !left } else { left };
    let distance = distance.unsigned_abs();
    if left {
        if distance > MAX_SHIFT as u64 && !value.is_zero() {
            return Err(EngineError::resource_error("memory"));
        }
        Ok(Number::big(value << distance as usize))
    } else {
        let distance = usize::try_from(distance).unwrap_or(usize::MAX);
        let shifted = if distance >= value.bits() as usize + 1 {
            if value.is_negative() {
                BigInt::from(-1)
            } else {
                BigInt::zero()
            }
        } else {
            value >> distance
        };
        Ok(Number::big(shifted))
    }
}

fn bitwise(
    x: Number,
    y: Number,
    int: fn(i64, i64) -> i64,
    big: fn(BigInt, BigInt) -> BigInt,
) -> EngineResult<Number> {
    Ok(match integer_pair(x, y)? {
        Pair::Ints(a, b) => Number::Int(int(a, b)),
        Pair::Bigs(a, b) => Number::big(big(a, b)),
        _ => return Err(EngineError::system_error("integer operands expected")),
    })
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

pub(super) fn register(registry: &PredicateRegistry) {
    registry.register_det("is", 2, is);
    registry.register_det("=:=", 2, |i, a| Ok(compare_args(i, a)? == Some(Ordering::Equal)));
    registry.register_det("=\\=", 2, |i, a| Ok(compare_args(i, a)? != Some(Ordering::Equal)));
    registry.register_det("<", 2, |i, a| Ok(compare_args(i, a)? == Some(Ordering::Less)));
    registry.register_det(">", 2, |i, a| Ok(compare_args(i, a)? == Some(Ordering::Greater)));
    registry.register_det("=<", 2, |i, a| {
        Ok(matches!(compare_args(i, a)?, Some(Ordering::Less | Ordering::Equal)))
    });
    registry.register_det(">=", 2, |i, a| {
        Ok(matches!(compare_args(i, a)?, Some(Ordering::Greater | Ordering::Equal)))
    });
    registry.register_det("succ", 2, succ);
    registry.register_det("plus", 3, plus);
    registry.register(Tag::of("between", 3), Arc::new(Between));
}

fn is(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let value = eval(interp, &args[1])?.into_term();
    Ok(interp.unify(&args[0], &value))
}

fn compare_args(interp: &mut Interpreter, args: &[Term]) -> EngineResult<Option<Ordering>> {
    let x = eval(interp, &args[0])?;
    let y = eval(interp, &args[1])?;
    Ok(num_cmp(&x, &y))
}

/// Integer argument, `None` when unbound
fn integer_or_var(interp: &Interpreter, term: &Term) -> EngineResult<Option<Number>> {
    match interp.deref(term) {
        Term::Var(_) => Ok(None),
        t if t.is_integer() => Ok(Number::from_term(&t)),
        other => Err(EngineError::type_error("integer", other)),
    }
}

fn not_negative(n: Number) -> EngineResult<Number> {
    if n.is_negative() {
        Err(EngineError::type_error("not_less_than_zero", n.into_term()))
    } else {
        Ok(n)
    }
}

fn succ(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let x = integer_or_var(interp, &args[0])?.map(not_negative).transpose()?;
    let y = integer_or_var(interp, &args[1])?.map(not_negative).transpose()?;
    match (x, y) {
        (Some(x), _) => {
            let next = add(x, Number::Int(1))?.into_term();
            Ok(interp.unify(&args[1], &next))
        }
        (None, Some(y)) if y.is_zero() => Ok(false),
        (None, Some(y)) => {
            let prev = sub(y, Number::Int(1))?.into_term();
            Ok(interp.unify(&args[0], &prev))
        }
        (None, None) => Err(EngineError::instantiation()),
    }
}

fn plus(interp: &mut Interpreter, args: &[Term]) -> EngineResult<bool> {
    let x = integer_or_var(interp, &args[0])?;
    let y = integer_or_var(interp, &args[1])?;
    let z = integer_or_var(interp, &args[2])?;
    let (slot, value) = match (x, y, z) {
        (Some(x), Some(y), _) => (2, add(x, y)?),
        (Some(x), None, Some(z)) => (1, sub(z, x)?),
        (None, Some(y), Some(z)) => (0, sub(z, y)?),
        _ => return Err(EngineError::instantiation()),
    };
    Ok(interp.unify(&args[slot], &value.into_term()))
}

/// between/3: enumerates `Low..=High` into an unbound third argument.
/// `High` may be `inf` or `infinite`.
#[derive(Debug)]
struct Between;

#[derive(Debug)]
struct BetweenChoice {
    target: Term,
    next: i64,
    high: i64,
}

impl Predicate for Between {
    fn execute(&self, interp: &mut Interpreter, backtrack: bool, args: &[Term]) -> ExecResult {
        if backtrack {
            let choice = interp.pop_choice::<BetweenChoice>()?;
            interp.check_interrupt()?;
            return enumerate_between(interp, choice.target, choice.next, choice.high);
        }
        let low = integer_arg(interp, &args[0])?;
        let high = match interp.deref(&args[1]) {
            Term::Atom(a) if matches!(a.as_str(), "inf" | "infinite") => i64::MAX,
            _ => integer_arg(interp, &args[1])?,
        };
        match interp.deref(&args[2]) {
            target @ Term::Var(_) => enumerate_between(interp, target, low, high),
            Term::Integer(x) => Ok(PredicateResult::from_bool(low <= x && x <= high)),
            Term::BigInteger(b) => Ok(PredicateResult::from_bool(
                high == i64::MAX && b.is_positive(),
            )),
            other => Err(EngineError::type_error("integer", other)),
        }
    }
}

fn enumerate_between(interp: &mut Interpreter, target: Term, low: i64, high: i64) -> ExecResult {
    if low > high {
        return Ok(PredicateResult::Fail);
    }
    let mark = interp.mark();
    if !interp.unify(&target, &Term::Integer(low)) {
        interp.undo_to(mark);
        return Ok(PredicateResult::Fail);
    }
    if low == high {
        return Ok(PredicateResult::SuccessLast);
    }
    interp.push_choice(
        mark,
        BetweenChoice {
            target,
            next: low + 1,
            high,
        },
    );
    Ok(PredicateResult::Success)
}
