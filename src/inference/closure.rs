//! Disabled-set propagation.
//!
//! One primitive serves both propagation directions: a category disables the
//! locations it lists (forward, over category → locations) and the items
//! listing it (reverse, over item → categories).

use std::collections::BTreeSet;
use std::fmt::Display;

use thiserror::Error;

use super::Membership;

/// Mapping a disabled-category set is propagated through.
#[derive(Debug)]
pub enum Carrier<'a, C, E> {
    /// Category → elements, e.g. category → locations.
    Forward(&'a Membership<C, E>),
    /// Element → categories, e.g. item → categories.
    Reverse(&'a Membership<E, C>),
}

/// Contract violations raised by the inference rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// A disabled category has no key in a forward carrier.
    #[error("disabled category `{0}` has no entry in the forward mapping")]
    MissingMapping(String),
}

/// Expands `disabled` categories into the set of elements they disable.
///
/// Forward carriers yield the union of the member sets of every disabled
/// category. Reverse carriers yield every element whose categories intersect
/// `disabled`; elements without categories are never included.
///
/// # Errors
/// Returns [`InferenceError::MissingMapping`] when a forward carrier has no key
/// for one of the disabled categories. Callers are expected to give every
/// known category a key, even an empty one.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeMap, BTreeSet};
/// use tracker_index::inference::{closure, Carrier};
///
/// let disabled = BTreeSet::from(["A"]);
/// let category_locations = BTreeMap::from([
///     ("A", BTreeSet::from(["L1", "L2"])),
///     ("B", BTreeSet::from(["L3"])),
/// ]);
/// let locations = closure(&disabled, Carrier::Forward(&category_locations))?;
/// assert_eq!(locations, BTreeSet::from(["L1", "L2"]));
/// # Ok::<(), tracker_index::inference::InferenceError>(())
/// ```
pub fn closure<C, E>(
    disabled: &BTreeSet<C>,
    carrier: Carrier<'_, C, E>,
) -> Result<BTreeSet<E>, InferenceError>
where
    C: Ord + Display,
    E: Ord + Clone,
{
    match carrier {
        Carrier::Forward(mapping) => {
            let mut result = BTreeSet::new();
            for category in disabled {
                let members = mapping
                    .get(category)
                    .ok_or_else(|| InferenceError::MissingMapping(category.to_string()))?;
                result.extend(members.iter().cloned());
            }
            Ok(result)
        }
        Carrier::Reverse(mapping) => Ok(mapping
            .iter()
            .filter(|(_, categories)| !categories.is_disjoint(disabled))
            .map(|(element, _)| element.clone())
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    type Map = Membership<&'static str, &'static str>;

    fn membership(entries: &[(&'static str, &[&'static str])]) -> Map {
        entries
            .iter()
            .map(|(key, members)| (*key, members.iter().copied().collect()))
            .collect()
    }

    fn set(members: &[&'static str]) -> BTreeSet<&'static str> {
        members.iter().copied().collect()
    }

    #[fixture]
    fn category_locations() -> Map {
        membership(&[("A", &["L1", "L2"]), ("B", &["L3"])])
    }

    #[fixture]
    fn item_categories() -> Map {
        membership(&[("i1", &["A"]), ("i2", &["B"]), ("i3", &["A", "B"]), ("i4", &[])])
    }

    #[rstest]
    fn forward_closure_unions_locations_of_disabled_categories(category_locations: Map) {
        let result = closure(&set(&["A"]), Carrier::Forward(&category_locations))
            .expect("forward closure");
        assert_eq!(result, set(&["L1", "L2"]));
    }

    #[rstest]
    fn forward_closure_over_every_category_covers_all_locations(category_locations: Map) {
        let result = closure(&set(&["A", "B"]), Carrier::Forward(&category_locations))
            .expect("forward closure");
        assert_eq!(result, set(&["L1", "L2", "L3"]));
    }

    #[rstest]
    fn reverse_closure_selects_items_sharing_a_disabled_category(item_categories: Map) {
        let result = closure(&set(&["A"]), Carrier::Reverse(&item_categories))
            .expect("reverse closure");
        assert_eq!(result, set(&["i1", "i3"]));
    }

    #[rstest]
    fn uncategorised_elements_are_never_reverse_disabled(item_categories: Map) {
        let result = closure(&set(&["A", "B"]), Carrier::Reverse(&item_categories))
            .expect("reverse closure");
        assert!(!result.contains("i4"));
    }

    #[rstest]
    fn empty_disabled_set_yields_empty_results(category_locations: Map, item_categories: Map) {
        let none = BTreeSet::new();
        assert!(closure(&none, Carrier::Forward(&category_locations))
            .expect("forward closure")
            .is_empty());
        assert!(closure(&none, Carrier::Reverse(&item_categories))
            .expect("reverse closure")
            .is_empty());
    }

    #[rstest]
    fn forward_closure_rejects_unknown_disabled_category(category_locations: Map) {
        let result = closure(&set(&["Z"]), Carrier::Forward(&category_locations));
        assert_eq!(result, Err(InferenceError::MissingMapping("Z".to_owned())));
    }

    #[rstest]
    fn reverse_closure_ignores_unknown_disabled_category(item_categories: Map) {
        let result = closure(&set(&["Z"]), Carrier::Reverse(&item_categories))
            .expect("reverse closure");
        assert!(result.is_empty());
    }
}
