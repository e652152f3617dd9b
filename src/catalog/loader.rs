use std::{fs, path::Path};

use tracing::{debug, info};

use super::{Catalog, CatalogError, PatternExample};

/// Catalog files compiled into the binary, one per category.
const BUILTIN_SOURCES: [(&str, &str); 3] = [
    (
        "builtin:creational",
        include_str!("../../catalog/creational.json"),
    ),
    (
        "builtin:structural",
        include_str!("../../catalog/structural.json"),
    ),
    (
        "builtin:behavioral",
        include_str!("../../catalog/behavioral.json"),
    ),
];

/// Load the catalog shipped with the binary.
pub fn builtin() -> Result<Catalog, CatalogError> {
    let mut examples = Vec::new();
    for (name, contents) in BUILTIN_SOURCES {
        examples.extend(parse_source(name, contents)?);
    }
    Catalog::new(examples)
}

/// Load every `*.json` file of `dir`, each holding an array of examples.
///
/// Files are read in lexical order so identifiers clash deterministically.
pub fn load_dir(dir: &Path) -> Result<Catalog, CatalogError> {
    let dir_label = dir.display().to_string();
    let entries = fs::read_dir(dir).map_err(|source| CatalogError::Read {
        path: dir_label.clone(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::Read {
            path: dir_label.clone(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut examples = Vec::new();
    for path in paths {
        let name = path.display().to_string();
        let contents = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: name.clone(),
            source,
        })?;
        let parsed = parse_source(&name, &contents)?;
        debug!(path = %name, count = parsed.len(), "parsed catalog file");
        examples.extend(parsed);
    }

    if examples.is_empty() {
        return Err(CatalogError::Empty(dir_label.clone()));
    }

    let catalog = Catalog::new(examples)?;
    info!(path = %dir_label, count = catalog.len(), "loaded examples catalog");
    Ok(catalog)
}

fn parse_source(name: &str, contents: &str) -> Result<Vec<PatternExample>, CatalogError> {
    serde_json::from_str(contents).map_err(|source| CatalogError::Parse {
        path: name.to_string(),
        source,
    })
}
