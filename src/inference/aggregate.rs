//! Per-category count aggregation.

use std::collections::BTreeMap;

use super::Membership;

/// Folds `item_count` through `item_categories` into per-category totals.
///
/// Every item with a non-zero count adds its count to each category it
/// belongs to. Totals saturate at `u32::MAX`. Categories no counted item
/// contributes to are absent from the result; absence means zero.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeMap, BTreeSet};
/// use tracker_index::inference::aggregate_count;
///
/// let item_categories = BTreeMap::from([
///     ("i1", BTreeSet::from(["A"])),
///     ("i2", BTreeSet::from(["A", "B"])),
/// ]);
/// let item_count = BTreeMap::from([("i1", 2), ("i2", 3)]);
/// let totals = aggregate_count(&item_categories, &item_count);
/// assert_eq!(totals, BTreeMap::from([("A", 5), ("B", 3)]));
/// ```
#[must_use]
pub fn aggregate_count<I, C>(
    item_categories: &Membership<I, C>,
    item_count: &BTreeMap<I, u32>,
) -> BTreeMap<C, u32>
where
    I: Ord,
    C: Ord + Clone,
{
    let mut totals = BTreeMap::new();
    for (item, &count) in item_count {
        if count == 0 {
            continue;
        }
        let Some(categories) = item_categories.get(item) else {
            continue;
        };
        for category in categories {
            let total = totals.entry(category.clone()).or_insert(0_u32);
            *total = total.saturating_add(count);
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn item_categories() -> Membership<&'static str, &'static str> {
        BTreeMap::from([
            ("i1", BTreeSet::from(["A"])),
            ("i2", BTreeSet::from(["A", "B"])),
            ("i3", BTreeSet::from(["C"])),
            ("loose", BTreeSet::new()),
        ])
    }

    #[rstest]
    fn sums_counts_per_category() {
        let counts = BTreeMap::from([("i1", 2), ("i2", 3)]);
        assert_eq!(
            aggregate_count(&item_categories(), &counts),
            BTreeMap::from([("A", 5), ("B", 3)])
        );
    }

    #[rstest]
    fn zero_counts_do_not_create_entries() {
        let counts = BTreeMap::from([("i1", 0), ("i3", 0)]);
        assert!(aggregate_count(&item_categories(), &counts).is_empty());
    }

    #[rstest]
    #[case("loose")]
    #[case("unknown")]
    fn items_without_categories_contribute_nothing(#[case] item: &'static str) {
        let counts = BTreeMap::from([(item, 4)]);
        assert!(aggregate_count(&item_categories(), &counts).is_empty());
    }

    #[rstest]
    fn total_equals_sum_over_members() {
        let categories = item_categories();
        let counts = BTreeMap::from([("i1", 1), ("i2", 7), ("i3", 2)]);
        let totals = aggregate_count(&categories, &counts);

        for (category, total) in &totals {
            let expected: u32 = counts
                .iter()
                .filter(|(item, _)| {
                    categories
                        .get(*item)
                        .is_some_and(|members| members.contains(category))
                })
                .map(|(_, count)| *count)
                .sum();
            assert_eq!(*total, expected, "total for {category}");
        }
    }

    #[rstest]
    fn totals_saturate_instead_of_wrapping() {
        let counts = BTreeMap::from([("i1", 3_000_000_000), ("i2", 3_000_000_000)]);
        let totals = aggregate_count(&item_categories(), &counts);
        assert_eq!(totals.get("A"), Some(&u32::MAX));
        assert_eq!(totals.get("B"), Some(&3_000_000_000));
    }
}
