//! Pure derivation rules over the package's relationship tables.
//!
//! Each rule takes sorted, authoritative mappings and returns a freshly
//! allocated result; nothing here holds state between calls, so the rules may
//! run in any order (or in parallel) once their inputs exist.
//!
//! - [`closure`] propagates a disabled-category set through a
//!   category/element mapping in either direction.
//! - [`aggregate_count`] folds per-item counts into per-category totals.
//! - [`invert_phantoms`] turns item → phantom weights into phantom → items.
//! - [`invert`] computes the structural inverse of a membership mapping.

use std::collections::{BTreeMap, BTreeSet};

mod aggregate;
mod closure;
mod phantom;

pub use aggregate::aggregate_count;
pub use closure::{closure, Carrier, InferenceError};
pub use phantom::{invert_phantoms, Weighted};

/// Sorted one-to-many mapping used for every membership relation.
pub type Membership<K, V> = BTreeMap<K, BTreeSet<V>>;

/// Returns the structural inverse of `mapping`.
///
/// `v` appears under `k` in the result exactly when `k` appears under `v` in
/// the input. Keys with empty member sets contribute nothing, so callers that
/// need a key for every known value must insert the empty entries themselves.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeMap, BTreeSet};
/// use tracker_index::inference::invert;
///
/// let item_categories = BTreeMap::from([
///     ("i1", BTreeSet::from(["A"])),
///     ("i2", BTreeSet::from(["A", "B"])),
/// ]);
/// let category_items = invert(&item_categories);
/// assert_eq!(category_items["A"], BTreeSet::from(["i1", "i2"]));
/// assert_eq!(category_items["B"], BTreeSet::from(["i2"]));
/// ```
#[must_use]
pub fn invert<K, V>(mapping: &Membership<K, V>) -> Membership<V, K>
where
    K: Ord + Clone,
    V: Ord + Clone,
{
    let mut inverse: Membership<V, K> = BTreeMap::new();
    for (key, members) in mapping {
        for member in members {
            inverse
                .entry(member.clone())
                .or_default()
                .insert(key.clone());
        }
    }
    inverse
}
