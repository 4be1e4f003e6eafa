//! Phantom item inversion.
//!
//! A package may declare that one unit of an item counts as several units of
//! a phantom item (for example, a coin pouch worth ten coins). The forward
//! table is keyed by the real item; consumers asking "what backs this phantom"
//! need it keyed the other way.

use std::collections::BTreeMap;

/// List of members paired with their weights.
pub type Weighted<T> = Vec<(T, u32)>;

/// Inverts item → phantom weights into phantom → backing item weights.
///
/// Each `(phantom, weight)` under an item appends `(item, weight)` to that
/// phantom's list. Lists keep the iteration order of the input and are not
/// re-sorted; weights are carried over unchanged.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use tracker_index::inference::invert_phantoms;
///
/// let item_phantoms = BTreeMap::from([
///     ("Coin Pouch", vec![("Coins", 10)]),
///     ("Gold Bar", vec![("Coins", 50), ("Treasure", 1)]),
/// ]);
/// let phantom_items = invert_phantoms(&item_phantoms);
/// assert_eq!(phantom_items["Coins"], vec![("Coin Pouch", 10), ("Gold Bar", 50)]);
/// assert_eq!(phantom_items["Treasure"], vec![("Gold Bar", 1)]);
/// ```
#[must_use]
pub fn invert_phantoms<I, P>(item_phantoms: &BTreeMap<I, Weighted<P>>) -> BTreeMap<P, Weighted<I>>
where
    I: Clone,
    P: Ord + Clone,
{
    let mut phantom_items: BTreeMap<P, Weighted<I>> = BTreeMap::new();
    for (item, phantoms) in item_phantoms {
        for (phantom, weight) in phantoms {
            phantom_items
                .entry(phantom.clone())
                .or_default()
                .push((item.clone(), *weight));
        }
    }
    phantom_items
}
