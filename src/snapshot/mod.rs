//! Immutable, fully cross-indexed view of one package/option combination.
//!
//! A [`Snapshot`] is produced by [`build`] (or [`try_build`]) and never changes
//! afterwards. Every mapping is stored in both directions where consumers need
//! it, in sorted key order, behind read-only accessors. Lookups take `&str`
//! and return a defined "not found" value for unknown keys: `false` for
//! membership tests, `0` for counts, `None` or an empty slice otherwise.
//!
//! [`SnapshotCell`] holds the currently published snapshot and swaps it
//! atomically when a new one is built.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::inference::Weighted;
use crate::names::{CategoryName, ItemName, LocationName, PhantomName, Requirement};
use crate::options::OptionTable;

mod build;
mod cell;
mod error;

pub use build::{build, try_build, BuildRequest, GoalSource};
pub use cell::SnapshotCell;
pub use error::{BuildError, BuildErrorKind, BuildStage};

/// Frozen one-to-many mapping, iterated in key order.
pub type FrozenMembership<K, V> = IndexMap<K, IndexSet<V>>;

/// Everything a requirement evaluator or tracker UI needs to know about a
/// package under a given set of options and holdings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    game: String,
    options: OptionTable,
    clamp_counts: bool,
    category_locations: FrozenMembership<CategoryName, LocationName>,
    location_categories: FrozenMembership<LocationName, CategoryName>,
    category_items: FrozenMembership<CategoryName, ItemName>,
    item_categories: FrozenMembership<ItemName, CategoryName>,
    item_count: IndexMap<ItemName, u32>,
    item_pool_count: IndexMap<ItemName, u32>,
    category_count: IndexMap<CategoryName, u32>,
    category_pool_count: IndexMap<CategoryName, u32>,
    item_phantoms: IndexMap<ItemName, Weighted<PhantomName>>,
    phantom_items: IndexMap<PhantomName, Weighted<ItemName>>,
    requirements: IndexMap<LocationName, Requirement>,
    category_options: FrozenMembership<CategoryName, String>,
    hidden_categories: IndexSet<CategoryName>,
    disabled_categories: IndexSet<CategoryName>,
    disabled_locations: IndexSet<LocationName>,
    disabled_items: IndexSet<ItemName>,
}

fn freeze_set<T: Hash + Eq>(set: BTreeSet<T>) -> IndexSet<T> {
    set.into_iter().collect()
}

fn freeze_map<K: Hash + Eq, V>(map: BTreeMap<K, V>) -> IndexMap<K, V> {
    map.into_iter().collect()
}

fn freeze_membership<K: Hash + Eq, V: Hash + Eq>(
    map: BTreeMap<K, BTreeSet<V>>,
) -> FrozenMembership<K, V> {
    map.into_iter()
        .map(|(key, members)| (key, freeze_set(members)))
        .collect()
}

impl Snapshot {
    /// Game the snapshot was built for.
    #[must_use]
    pub fn game(&self) -> &str {
        &self.game
    }

    /// Merged option table the snapshot was evaluated with.
    #[must_use]
    pub const fn options(&self) -> &OptionTable {
        &self.options
    }

    /// Value of one option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<i64> {
        self.options.get(key)
    }

    /// Whether held counts were clamped to the item pool.
    #[must_use]
    pub const fn clamp_counts(&self) -> bool {
        self.clamp_counts
    }

    /// Every known category, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryName> + '_ {
        self.category_items.keys()
    }

    /// Every item the package declares, sorted.
    pub fn items(&self) -> impl Iterator<Item = &ItemName> + '_ {
        self.item_categories.keys()
    }

    /// Every location the package declares, sorted.
    pub fn locations(&self) -> impl Iterator<Item = &LocationName> + '_ {
        self.requirements.keys()
    }

    /// Locations belonging to `category`.
    #[must_use]
    pub fn locations_in(&self, category: &str) -> Option<&IndexSet<LocationName>> {
        self.category_locations.get(category)
    }

    /// Categories `location` belongs to.
    #[must_use]
    pub fn categories_of_location(&self, location: &str) -> Option<&IndexSet<CategoryName>> {
        self.location_categories.get(location)
    }

    /// Items belonging to `category`.
    #[must_use]
    pub fn items_in(&self, category: &str) -> Option<&IndexSet<ItemName>> {
        self.category_items.get(category)
    }

    /// Categories `item` belongs to.
    #[must_use]
    pub fn categories_of_item(&self, item: &str) -> Option<&IndexSet<CategoryName>> {
        self.item_categories.get(item)
    }

    /// Full category → locations mapping.
    #[must_use]
    pub const fn category_locations(&self) -> &FrozenMembership<CategoryName, LocationName> {
        &self.category_locations
    }

    /// Full location → categories mapping.
    #[must_use]
    pub const fn location_categories(&self) -> &FrozenMembership<LocationName, CategoryName> {
        &self.location_categories
    }

    /// Full category → items mapping.
    #[must_use]
    pub const fn category_items(&self) -> &FrozenMembership<CategoryName, ItemName> {
        &self.category_items
    }

    /// Full item → categories mapping.
    #[must_use]
    pub const fn item_categories(&self) -> &FrozenMembership<ItemName, CategoryName> {
        &self.item_categories
    }

    /// Units of `item` currently held.
    #[must_use]
    pub fn item_count(&self, item: &str) -> u32 {
        self.item_count.get(item).copied().unwrap_or(0)
    }

    /// Units of `item` in the full item pool.
    #[must_use]
    pub fn item_pool_count(&self, item: &str) -> u32 {
        self.item_pool_count.get(item).copied().unwrap_or(0)
    }

    /// Held units of every item in `category`.
    #[must_use]
    pub fn category_count(&self, category: &str) -> u32 {
        self.category_count.get(category).copied().unwrap_or(0)
    }

    /// Pool units of every item in `category`.
    #[must_use]
    pub fn category_pool_count(&self, category: &str) -> u32 {
        self.category_pool_count.get(category).copied().unwrap_or(0)
    }

    /// Held counts of every held item.
    #[must_use]
    pub const fn item_counts(&self) -> &IndexMap<ItemName, u32> {
        &self.item_count
    }

    /// Held totals of every category with at least one held unit.
    #[must_use]
    pub const fn category_counts(&self) -> &IndexMap<CategoryName, u32> {
        &self.category_count
    }

    /// Phantom items `item` counts towards, with weights.
    #[must_use]
    pub fn phantoms_of(&self, item: &str) -> &[(PhantomName, u32)] {
        self.item_phantoms
            .get(item)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Real items backing `phantom`, with weights.
    #[must_use]
    pub fn items_behind(&self, phantom: &str) -> &[(ItemName, u32)] {
        self.phantom_items
            .get(phantom)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Full item → phantoms mapping.
    #[must_use]
    pub const fn item_phantoms(&self) -> &IndexMap<ItemName, Weighted<PhantomName>> {
        &self.item_phantoms
    }

    /// Full phantom → items mapping.
    #[must_use]
    pub const fn phantom_items(&self) -> &IndexMap<PhantomName, Weighted<ItemName>> {
        &self.phantom_items
    }

    /// Requirement expression of `location`, for the external evaluator.
    #[must_use]
    pub fn requirement(&self, location: &str) -> Option<&Requirement> {
        self.requirements.get(location)
    }

    /// Option keys gating `category`.
    #[must_use]
    pub fn category_options(&self, category: &str) -> Option<&IndexSet<String>> {
        self.category_options.get(category)
    }

    /// Whether `category` is disabled by the options.
    #[must_use]
    pub fn is_category_disabled(&self, category: &str) -> bool {
        self.disabled_categories.contains(category)
    }

    /// Whether `location` belongs to a disabled category.
    #[must_use]
    pub fn is_location_disabled(&self, location: &str) -> bool {
        self.disabled_locations.contains(location)
    }

    /// Whether `item` belongs to a disabled category.
    #[must_use]
    pub fn is_item_disabled(&self, item: &str) -> bool {
        self.disabled_items.contains(item)
    }

    /// Whether `category` should be hidden from display.
    #[must_use]
    pub fn is_category_hidden(&self, category: &str) -> bool {
        self.hidden_categories.contains(category)
    }

    /// Disabled categories, sorted.
    #[must_use]
    pub const fn disabled_categories(&self) -> &IndexSet<CategoryName> {
        &self.disabled_categories
    }

    /// Locations disabled through their categories, sorted.
    #[must_use]
    pub const fn disabled_locations(&self) -> &IndexSet<LocationName> {
        &self.disabled_locations
    }

    /// Items disabled through their categories, sorted.
    #[must_use]
    pub const fn disabled_items(&self) -> &IndexSet<ItemName> {
        &self.disabled_items
    }

    /// Hidden categories, sorted.
    #[must_use]
    pub const fn hidden_categories(&self) -> &IndexSet<CategoryName> {
        &self.hidden_categories
    }
}
