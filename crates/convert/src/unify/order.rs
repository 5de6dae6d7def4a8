//! Preference order among candidate result types.
//!
//! A type is preferred when more values could convert into it: the
//! dynamic placeholder is never preferred, text is the most general
//! primitive, lists beat sets and tuples, maps beat objects.

use std::cmp::Ordering;

use crate::types::Type;

/// `Less` when `a` is more general than `b`, `Greater` when less general,
/// `Equal` when neither is clearly preferable.
pub(super) fn compare(a: &Type, b: &Type) -> Ordering {
    use Ordering::{Equal, Greater, Less};

    match (a, b) {
        (Type::Dynamic, Type::Dynamic) => Equal,
        (Type::Dynamic, _) => Greater,
        (_, Type::Dynamic) => Less,

        (Type::String, Type::String) => Equal,
        (Type::String, Type::Number | Type::Bool) => Less,
        (Type::Number | Type::Bool, Type::String) => Greater,

        (Type::List(x), Type::List(y))
        | (Type::Set(x), Type::Set(y))
        | (Type::Map(x), Type::Map(y)) => compare(x, y),

        (Type::List(_), Type::Set(_) | Type::Tuple(_)) => Less,
        (Type::Set(_) | Type::Tuple(_), Type::List(_)) => Greater,
        (Type::Set(_), Type::Tuple(_)) => Less,
        (Type::Tuple(_), Type::Set(_)) => Greater,
        (Type::Map(_), Type::Object(_)) => Less,
        (Type::Object(_), Type::Map(_)) => Greater,

        (Type::Tuple(x), Type::Tuple(y)) if x.len() == y.len() => pointwise(x.iter().zip(y)),
        (Type::Object(x), Type::Object(y)) if x.same_attribute_names(y) => {
            pointwise(x.attributes().values().zip(y.attributes().values()))
        }

        _ => Equal,
    }
}

/// Clear preference only if every part agrees (or is indifferent).
fn pointwise<'a>(pairs: impl Iterator<Item = (&'a Type, &'a Type)>) -> Ordering {
    let mut overall = Ordering::Equal;
    for (x, y) in pairs {
        match (overall, compare(x, y)) {
            (_, Ordering::Equal) => {}
            (Ordering::Equal, ord) => overall = ord,
            (current, ord) if current == ord => {}
            _ => return Ordering::Equal,
        }
    }
    overall
}

/// Indices of `types`, most preferred first.
///
/// Topological sort over the "more general than" relation. Ties go to the
/// earlier input; anything left in a cycle is appended in input order.
pub(super) fn preference_order(types: &[&Type]) -> Vec<usize> {
    let n = types.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0_usize; n];
    for (i, a) in types.iter().enumerate() {
        for (j, b) in types.iter().enumerate() {
            if i != j && compare(a, b) == Ordering::Less {
                successors[i].push(j);
                in_degree[j] += 1;
            }
        }
    }

    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    while let Some(next) = (0..n).find(|&i| !placed[i] && in_degree[i] == 0) {
        placed[next] = true;
        order.push(next);
        for &j in &successors[next] {
            in_degree[j] -= 1;
        }
    }
    order.extend((0..n).filter(|&i| !placed[i]));
    order
}
