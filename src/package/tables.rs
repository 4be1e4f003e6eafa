//! JSON table model of a game-definition package and the reader over it.
//!
//! Tables come either from an unpacked package's `data/` directory or from
//! the extractor document, which bundles the same tables under their file
//! names (`{"items.json": [...], "locations.json": [...], ...}`). List tables
//! may be plain arrays or wrapped as `{"data": [...]}`; keys starting with `$`
//! are schema metadata and skipped.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use hashbrown::HashSet;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{ExtractionError, GoalData, PackageReader, RawCategories, RawItems, RawLocations};
use crate::constants::{
    CATEGORIES_TABLE, DEFAULT_ITEM_COUNT, ITEMS_TABLE, LOCATIONS_TABLE, METADATA_KEY_PREFIX,
    NEGATED_OPTION_PREFIX, OPTIONS_TABLE,
};
use crate::names::{CategoryName, ItemName, LocationName, PhantomName, Requirement};
use crate::options::OptionTable;

/// One entry of the item table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ItemEntry {
    /// Item name.
    pub name: String,
    /// Units in the item pool.
    #[serde(default = "default_item_count")]
    pub count: u32,
    /// Categories the item belongs to.
    #[serde(default)]
    pub category: Vec<String>,
    /// Phantom items one unit counts towards, with weights.
    #[serde(default)]
    pub value: BTreeMap<String, u32>,
}

/// Requirement as written in the location table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RequiresEntry {
    /// Expression text.
    Expression(String),
    /// Legacy form: every listed item is required.
    AllOf(Vec<String>),
}

impl RequiresEntry {
    /// Normalises the entry into an expression.
    #[must_use]
    pub fn to_requirement(&self) -> Requirement {
        match self {
            Self::Expression(text) => Requirement::from(text.as_str()),
            Self::AllOf(items) => Requirement::all_of(items),
        }
    }
}

/// One entry of the location table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LocationEntry {
    /// Location name.
    pub name: String,
    /// Categories the location belongs to.
    #[serde(default)]
    pub category: Vec<String>,
    /// Requirement to check the location.
    #[serde(default)]
    pub requires: Option<RequiresEntry>,
    /// Whether checking the location completes a goal.
    #[serde(default)]
    pub victory: bool,
}

/// One entry of the category table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryEntry {
    /// Whether trackers should hide the category.
    #[serde(default)]
    pub hidden: bool,
    /// Option keys gating the category; `!key` negates.
    #[serde(default)]
    pub yaml_option: Vec<String>,
}

/// One declared option.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OptionEntry {
    /// Declared default value.
    #[serde(default)]
    pub default: Option<Value>,
}

impl OptionEntry {
    /// Integer form of the default: booleans map to 0/1, integers to
    /// themselves; anything else has no integer form.
    #[must_use]
    pub fn default_value(&self) -> Option<i64> {
        match self.default.as_ref()? {
            Value::Bool(flag) => Some(i64::from(*flag)),
            Value::Number(number) => number.as_i64(),
            _ => None,
        }
    }
}

/// The option table, split into built-in and game-specific options.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OptionsDocument {
    /// Options every package of this kind has.
    #[serde(default)]
    pub core: BTreeMap<String, OptionEntry>,
    /// Options added by this package.
    #[serde(default)]
    pub user: BTreeMap<String, OptionEntry>,
}

/// Parsed tables of one package.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManualTables {
    /// Item table.
    pub items: Vec<ItemEntry>,
    /// Location table.
    pub locations: Vec<LocationEntry>,
    /// Category table.
    pub categories: BTreeMap<String, CategoryEntry>,
    /// Option table.
    pub options: OptionsDocument,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableList<T> {
    Plain(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> TableList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(entries) | Self::Wrapped { data: entries } => entries,
        }
    }
}

const fn default_item_count() -> u32 {
    DEFAULT_ITEM_COUNT
}

fn parse_value<T: DeserializeOwned>(table: &str, value: Value) -> Result<T, ExtractionError> {
    serde_json::from_value(value).map_err(|source| ExtractionError::Json {
        table: table.to_owned(),
        source,
    })
}

fn parse_list<T: DeserializeOwned>(table: &str, value: Value) -> Result<Vec<T>, ExtractionError> {
    parse_value::<TableList<T>>(table, value).map(TableList::into_vec)
}

fn parse_categories(value: Value) -> Result<BTreeMap<String, CategoryEntry>, ExtractionError> {
    let raw: BTreeMap<String, Value> = parse_value(CATEGORIES_TABLE, value)?;
    raw.into_iter()
        .filter(|(name, _)| !name.starts_with(METADATA_KEY_PREFIX))
        .map(|(name, entry)| -> Result<(String, CategoryEntry), ExtractionError> {
            Ok((name, parse_value(CATEGORIES_TABLE, entry)?))
        })
        .collect()
}

fn read_table(path: &Path) -> Result<Option<Value>, ExtractionError> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ExtractionError::Json {
                table: path.display().to_string(),
                source,
            }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl ManualTables {
    /// Reads the tables from an unpacked package's data directory.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] when a table cannot be read or parsed, or
    /// when the item or location table is missing.
    pub fn from_dir(data_dir: &Path) -> Result<Self, ExtractionError> {
        Self::from_documents(|name| read_table(&data_dir.join(name)))
    }

    /// Parses the extractor document.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] when the document or a table is malformed,
    /// or when the item or location table is missing.
    pub fn from_extractor_output(output: &str) -> Result<Self, ExtractionError> {
        let mut document: BTreeMap<String, Value> =
            serde_json::from_str(output).map_err(|source| ExtractionError::Json {
                table: "extractor output".to_owned(),
                source,
            })?;
        Self::from_documents(|name| Ok(document.remove(name)))
    }

    fn from_documents(
        mut fetch: impl FnMut(&str) -> Result<Option<Value>, ExtractionError>,
    ) -> Result<Self, ExtractionError> {
        let items = fetch(ITEMS_TABLE)?
            .ok_or_else(|| ExtractionError::MissingTable(ITEMS_TABLE.to_owned()))?;
        let locations = fetch(LOCATIONS_TABLE)?
            .ok_or_else(|| ExtractionError::MissingTable(LOCATIONS_TABLE.to_owned()))?;
        let categories = fetch(CATEGORIES_TABLE)?
            .map(parse_categories)
            .transpose()?
            .unwrap_or_default();
        let options = fetch(OPTIONS_TABLE)?
            .map(|value| parse_value(OPTIONS_TABLE, value))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            items: parse_list(ITEMS_TABLE, items)?,
            locations: parse_list(LOCATIONS_TABLE, locations)?,
            categories,
            options,
        })
    }
}

/// [`PackageReader`] over parsed [`ManualTables`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TablesReader {
    tables: ManualTables,
}

fn category_enabled(entry: &CategoryEntry, options: &OptionTable) -> bool {
    entry.yaml_option.iter().all(|raw| {
        let key = raw.trim();
        match key.strip_prefix(NEGATED_OPTION_PREFIX) {
            Some(negated) => !options.is_enabled(negated.trim()),
            None => options.is_enabled(key),
        }
    })
}

impl TablesReader {
    /// Wraps already parsed tables.
    #[must_use]
    pub const fn new(tables: ManualTables) -> Self {
        Self { tables }
    }

    fn goal_among_victories(&self, requested: Option<GoalData>) -> Option<GoalData> {
        let goal = requested?;
        let known = self
            .tables
            .locations
            .iter()
            .any(|entry| entry.victory && entry.name == goal.location.as_str());
        if known {
            Some(goal)
        } else {
            warn!(
                "goal `{}` is not a victory location; keeping every victory location",
                goal.location
            );
            None
        }
    }
}

impl PackageReader for TablesReader {
    fn options(&self) -> Result<OptionTable, ExtractionError> {
        let declared = &self.tables.options;
        Ok(declared
            .core
            .iter()
            .chain(declared.user.iter())
            .filter_map(|(name, entry)| Some((name.clone(), entry.default_value()?)))
            .collect())
    }

    fn extract_categories(&self, options: &OptionTable) -> Result<RawCategories, ExtractionError> {
        let mut raw = RawCategories::default();
        for (name, entry) in &self.tables.categories {
            let category = CategoryName::from(name.as_str());
            if entry.hidden {
                raw.hidden.insert(category.clone());
            }
            if !category_enabled(entry, options) {
                debug!("category `{name}` disabled by options {:?}", entry.yaml_option);
                raw.disabled.insert(category.clone());
            }
            raw.option_keys
                .insert(category, entry.yaml_option.iter().cloned().collect());
        }
        Ok(raw)
    }

    fn extract_items(&self) -> Result<RawItems, ExtractionError> {
        let mut seen = HashSet::new();
        let mut raw = RawItems::default();
        for entry in &self.tables.items {
            if !seen.insert(entry.name.as_str()) {
                return Err(ExtractionError::DuplicateName {
                    table: "item",
                    name: entry.name.clone(),
                });
            }
            let item = ItemName::from(entry.name.as_str());
            raw.categories.insert(
                item.clone(),
                entry
                    .category
                    .iter()
                    .map(|category| CategoryName::from(category.as_str()))
                    .collect(),
            );
            raw.pool_counts.insert(item.clone(), entry.count);
            if !entry.value.is_empty() {
                raw.phantoms.insert(
                    item,
                    entry
                        .value
                        .iter()
                        .map(|(phantom, weight)| (PhantomName::from(phantom.as_str()), *weight))
                        .collect(),
                );
            }
        }
        Ok(raw)
    }

    fn extract_locations(&self, goal: Option<GoalData>) -> Result<RawLocations, ExtractionError> {
        let active_goal = self.goal_among_victories(goal);
        let mut seen = HashSet::new();
        let mut raw = RawLocations::default();
        for entry in &self.tables.locations {
            if !seen.insert(entry.name.as_str()) {
                return Err(ExtractionError::DuplicateName {
                    table: "location",
                    name: entry.name.clone(),
                });
            }
            if let Some(chosen) = active_goal.as_ref().filter(|_| entry.victory) {
                if chosen.location.as_str() != entry.name {
                    debug!("victory location `{}` is not the goal; skipped", entry.name);
                    continue;
                }
            }
            let location = LocationName::from(entry.name.as_str());
            for category in &entry.category {
                raw.categories
                    .entry(CategoryName::from(category.as_str()))
                    .or_default()
                    .insert(location.clone());
            }
            raw.requirements.insert(
                location,
                entry
                    .requires
                    .as_ref()
                    .map(RequiresEntry::to_requirement)
                    .unwrap_or_default(),
            );
        }
        Ok(raw)
    }
}
