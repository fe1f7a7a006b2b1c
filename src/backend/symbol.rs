//! Atom interning for O(1) functor comparison
//!
//! Atoms are interned into a process-wide lasso `ThreadedRodeo`, so an `Atom`
//! is a 4-byte key. Two atoms are equal iff they were interned from the same
//! text, which makes functor/arity checks during unification and dispatch a
//! pair of integer comparisons.
//!
//! # Performance Characteristics
//!
//! - Atom creation: O(1) amortized (hash table lookup/insert)
//! - Atom comparison: O(1) (integer comparison)
//! - Ordering: lexical on the resolved text (used by the standard order of terms)
//! - Thread-safe: execution contexts on different threads share one interner
//!
//! # Example
//! ```
//! use prologtron::backend::symbol::{intern, Atom};
//!
//! let a1 = intern("hello");
//! let a2 = Atom::new("hello");
//! assert_eq!(a1, a2);
//! assert_eq!(a1.as_str(), "hello");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::{LazyLock, OnceLock};

use lasso::{Spur, ThreadedRodeo};

/// Global interner for atoms - lazily initialized, thread-safe
static INTERNER: OnceLock<ThreadedRodeo> = OnceLock::new();

/// Get or initialize the global interner
#[inline]
fn interner() -> &'static ThreadedRodeo {
    INTERNER.get_or_init(ThreadedRodeo::new)
}

/// Interned atom - 4 bytes, O(1) equality
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Atom(Spur);

impl Atom {
    /// Create a new atom from a string (interns if new)
    #[inline]
    pub fn new(s: &str) -> Self {
        Atom(interner().get_or_intern(s))
    }

    /// Create a new atom from an owned string
    #[inline]
    pub fn from_string(s: String) -> Self {
        Atom(interner().get_or_intern(s))
    }

    /// Get the text of this atom
    #[inline]
    pub fn as_str(&self) -> &'static str {
        interner().resolve(&self.0)
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Atom {
    /// Lexical order on the atom text; identity short-circuits.
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.as_str())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Atom {
    #[inline]
    fn from(s: &str) -> Self {
        Atom::new(s)
    }
}

impl From<String> for Atom {
    #[inline]
    fn from(s: String) -> Self {
        Atom::from_string(s)
    }
}

impl AsRef<str> for Atom {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Intern a string and return an Atom
#[inline]
pub fn intern(s: &str) -> Atom {
    Atom::new(s)
}

/// Intern an owned string and return an Atom
#[inline]
pub fn intern_string(s: String) -> Atom {
    Atom::from_string(s)
}

/// Atoms the engine itself refers to, interned once.
pub struct CommonAtoms {
    pub nil: Atom,
    pub dot: Atom,
    pub true_: Atom,
    pub fail: Atom,
    pub false_: Atom,
    pub comma: Atom,
    pub semicolon: Atom,
    pub arrow: Atom,
    pub not_provable: Atom,
    pub cut: Atom,
    pub call: Atom,
    pub clause: Atom,
    pub caret: Atom,
    pub minus: Atom,
    pub slash: Atom,
    pub error: Atom,
    pub witness: Atom,
    pub on: Atom,
    pub off: Atom,
    pub equals: Atom,
    pub less: Atom,
    pub greater: Atom,
}

static COMMON: LazyLock<CommonAtoms> = LazyLock::new(|| CommonAtoms {
    nil: intern("[]"),
    dot: intern("."),
    true_: intern("true"),
    fail: intern("fail"),
    false_: intern("false"),
    comma: intern(","),
    semicolon: intern(";"),
    arrow: intern("->"),
    not_provable: intern("\\+"),
    cut: intern("!"),
    call: intern("call"),
    clause: intern(":-"),
    caret: intern("^"),
    minus: intern("-"),
    slash: intern("/"),
    error: intern("error"),
    witness: intern("$witness"),
    on: intern("on"),
    off: intern("off"),
    equals: intern("="),
    less: intern("<"),
    greater: intern(">"),
});

/// Access the pre-interned engine atoms
#[inline]
pub fn atoms() -> &'static CommonAtoms {
    &COMMON
}
