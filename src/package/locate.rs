//! Package lookup on disk.

use std::path::PathBuf;

use log::debug;

use super::{
    ExternalInterpreter, ExtractionError, ManualTables, PackageLocation, PackageLocator,
    PackageReader, TablesReader,
};
use crate::constants::{APWORLD_EXTENSION, DATA_DIR, MANUAL_GAME_PREFIX};

/// Resolves packages stored under a package root.
///
/// Lookup order for a game `G` (tried as written, then lowercased):
/// 1. `<root>/G/data/` holding the JSON tables;
/// 2. `<root>/G.apworld`, handed to the external interpreter.
///
/// Games without the manual prefix have no applicable package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualPackageLocator;

enum Found {
    Directory(PathBuf),
    Archive(PathBuf),
}

fn is_supported_game(game: &str) -> bool {
    game.to_lowercase().starts_with(MANUAL_GAME_PREFIX)
}

fn candidate_names(game: &str) -> Vec<String> {
    let lowered = game.to_lowercase();
    if lowered == game {
        vec![lowered]
    } else {
        vec![game.to_owned(), lowered]
    }
}

fn find_package(location: &PackageLocation) -> Option<Found> {
    let names = candidate_names(&location.game);
    let directory = names
        .iter()
        .map(|name| location.root.join(name).join(DATA_DIR))
        .find(|path| path.is_dir());
    if let Some(path) = directory {
        return Some(Found::Directory(path));
    }
    names
        .iter()
        .map(|name| {
            location
                .root
                .join(format!("{name}.{APWORLD_EXTENSION}"))
        })
        .find(|path| path.is_file())
        .map(Found::Archive)
}

impl PackageLocator for ManualPackageLocator {
    fn locate(
        &self,
        location: &PackageLocation,
        interpreter: Option<&dyn ExternalInterpreter>,
    ) -> Result<Option<Box<dyn PackageReader>>, ExtractionError> {
        if !is_supported_game(&location.game) {
            debug!("game `{}` is not a manual game", location.game);
            return Ok(None);
        }
        let Some(found) = find_package(location) else {
            debug!(
                "no package for `{}` under {}",
                location.game,
                location.root.display()
            );
            return Ok(None);
        };
        let tables = match found {
            Found::Directory(path) => {
                debug!("reading package tables from {}", path.display());
                ManualTables::from_dir(&path)?
            }
            Found::Archive(path) => {
                let extractor =
                    interpreter.ok_or_else(|| ExtractionError::InterpreterRequired(path.clone()))?;
                ManualTables::from_extractor_output(&extractor.extract(&path)?)?
            }
        };
        Ok(Some(Box::new(TablesReader::new(tables))))
    }
}
