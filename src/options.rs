//! Option tables keyed by option name.
//!
//! Options arrive from two places: the caller (the player's selections) and
//! the package (its declared defaults). [`OptionTable::merge_forward`] copies
//! package values over the caller's so a single table feeds category
//! evaluation and ends up in the snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sorted mapping from option name to integer value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionTable(BTreeMap<String, i64>);

/// Errors raised while parsing `key=value` option assignments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionParseError {
    /// The assignment had no `=` separator.
    #[error("option assignment `{0}` is missing `=`")]
    MissingSeparator(String),
    /// The assignment had nothing before the separator.
    #[error("option assignment `{0}` has an empty name")]
    EmptyKey(String),
    /// The value was neither an integer nor a boolean.
    #[error("option `{key}` has non-integer value `{value}`")]
    InvalidValue {
        /// Option name.
        key: String,
        /// Rejected value text.
        value: String,
    },
}

impl OptionTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Looks up an option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    /// Returns `true` when the option is present and non-zero.
    ///
    /// A missing option counts as disabled.
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| value != 0)
    }

    /// Copies every entry of `other` into `self`, overwriting shared keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker_index::OptionTable;
    ///
    /// let mut caller: OptionTable = [("goal".to_owned(), 2), ("dlc".to_owned(), 1)]
    ///     .into_iter()
    ///     .collect();
    /// let package: OptionTable = [("dlc".to_owned(), 0)].into_iter().collect();
    /// caller.merge_forward(&package);
    /// assert_eq!(caller.get("dlc"), Some(0));
    /// assert_eq!(caller.get("goal"), Some(2));
    /// ```
    pub fn merge_forward(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), *value);
        }
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl FromIterator<(String, i64)> for OptionTable {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses a `key=value` assignment as given on the command line.
///
/// Values may be integers or `true`/`false`.
///
/// # Errors
/// Returns [`OptionParseError`] when the separator, name or value is invalid.
///
/// # Examples
///
/// ```
/// use tracker_index::options::parse_assignment;
///
/// assert_eq!(parse_assignment("goal=3"), Ok(("goal".to_owned(), 3)));
/// assert_eq!(parse_assignment("include_dlc=true"), Ok(("include_dlc".to_owned(), 1)));
/// assert!(parse_assignment("goal").is_err());
/// ```
pub fn parse_assignment(input: &str) -> Result<(String, i64), OptionParseError> {
    let Some((raw_key, raw_value)) = input.split_once('=') else {
        return Err(OptionParseError::MissingSeparator(input.to_owned()));
    };
    let key = raw_key.trim();
    if key.is_empty() {
        return Err(OptionParseError::EmptyKey(input.to_owned()));
    }
    let value = raw_value.trim();
    let parsed = match value {
        "true" => 1,
        "false" => 0,
        other => other
            .parse::<i64>()
            .map_err(|_| OptionParseError::InvalidValue {
                key: key.to_owned(),
                value: other.to_owned(),
            })?,
    };
    Ok((key.to_owned(), parsed))
}
