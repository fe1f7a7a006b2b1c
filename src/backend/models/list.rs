//! List construction and inspection (`'.'/2` cells terminated by `[]`).

use crate::backend::store::Store;

use super::{Term, VarId};

/// Build a proper list from its elements
pub fn list_from_vec(items: Vec<Term>) -> Term {
    list_with_tail(items, Term::nil())
}

/// Build `[items... | tail]`
pub fn list_with_tail(items: Vec<Term>, tail: Term) -> Term {
    items
        .into_iter()
        .rev()
        .fold(tail, |acc, item| Term::cons(item, acc))
}

/// Shape of a term viewed as a list, after dereferencing every cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ListShape {
    /// `[a, b, c]`
    Proper(Vec<Term>),
    /// `[a, b | T]` with `T` unbound
    Partial(Vec<Term>, VarId),
    /// Ends in something other than `[]` or a variable
    NotList,
}

/// Walk a list through the store.
pub fn list_shape(store: &Store, term: &Term) -> ListShape {
    let mut items = Vec::new();
    let mut cursor = store.deref(term);
    loop {
        match cursor {
            Term::Var(id) => return ListShape::Partial(items, *id),
            t if t.is_nil() => return ListShape::Proper(items),
            t => match t.as_cons() {
                Some((head, tail)) => {
                    items.push(store.deref(head).clone());
                    cursor = store.deref(tail);
                }
                None => return ListShape::NotList,
            },
        }
    }
}

/// Elements of a proper list, or `None`.
pub fn proper_list(store: &Store, term: &Term) -> Option<Vec<Term>> {
    match list_shape(store, term) {
        ListShape::Proper(items) => Some(items),
        _ => None,
    }
}
