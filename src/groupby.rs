// src/groupby.rs

//! Order-preserving group-by.
//!
//! Unlike a sort-then-group pass, groups come out in the order their key was
//! first seen, and items inside a group keep their input order. Keys only
//! need structural equality (`Eq + Hash`), not an ordering.

use std::hash::Hash;

use indexmap::IndexMap;

/// Group `items` by `key_fn`, preserving first-seen key order.
///
/// ```
/// use kosmos::groupby::group_by_ordered;
///
/// let groups = group_by_ordered(vec![3, 1, 4, 1, 5, 9, 2, 6], |n| n % 2);
/// assert_eq!(groups, vec![(1, vec![3, 1, 1, 5, 9]), (0, vec![4, 2, 6])]);
/// ```
pub fn group_by_ordered<T, K, I, F>(items: I, mut key_fn: F) -> Vec<(K, Vec<T>)>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut groups: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        let key = key_fn(&item);
        groups.entry(key).or_default().push(item);
    }
    groups.into_iter().collect()
}
