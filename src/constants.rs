//! Package naming and extractor constants.

/// Environment variable naming the package archive handed to the extractor.
pub const APWORLD_PATH_ENV: &str = "APWORLD_PATH";
/// Environment variable naming the game framework checkout the extractor imports.
pub const ARCHIPELAGO_REPO_ENV: &str = "ARCHIPELAGO_REPO_PATH";
/// Prefix (case-insensitive) of every game this crate can index.
pub const MANUAL_GAME_PREFIX: &str = "manual_";
/// File extension of packaged game definitions.
pub const APWORLD_EXTENSION: &str = "apworld";
/// Directory holding the JSON tables inside an unpacked package.
pub const DATA_DIR: &str = "data";
/// Item table file name.
pub const ITEMS_TABLE: &str = "items.json";
/// Location table file name.
pub const LOCATIONS_TABLE: &str = "locations.json";
/// Category table file name.
pub const CATEGORIES_TABLE: &str = "categories.json";
/// Option table file name.
pub const OPTIONS_TABLE: &str = "options.json";
/// Pool count assumed for items that do not declare one.
pub const DEFAULT_ITEM_COUNT: u32 = 1;
/// Marks a negated option key in a category's option list.
pub const NEGATED_OPTION_PREFIX: char = '!';
/// Table keys starting with this character are schema metadata, not entries.
pub const METADATA_KEY_PREFIX: char = '$';
