use crate::model::{new_recipe_id, Recipe};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed document {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed seed document {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
    #[error("duplicate recipe id in seed document: {0}")]
    DuplicateId(String),
}

/// Entry of the seed document. Identifier and publication time are optional.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedRecipe {
    id: Option<String>,
    name: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default)]
    instructions: Vec<String>,
    published_at: Option<DateTime<Utc>>,
}

/// Reads the JSON array of recipes at `path`.
///
/// Identifiers present in the document are kept, missing ones are generated.
/// Entries without a publication time are published now.
pub fn load_seed(path: impl AsRef<Path>) -> Result<Vec<Recipe>, SeedError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let content = fs::read_to_string(path).map_err(|source| SeedError::Read {
        path: display.clone(),
        source,
    })?;

    parse_seed(&content, &display)
}

fn parse_seed(content: &str, path: &str) -> Result<Vec<Recipe>, SeedError> {
    let entries: Vec<SeedRecipe> =
        serde_json::from_str(content).map_err(|source| SeedError::Malformed {
            path: path.to_owned(),
            source,
        })?;

    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut recipes = Vec::with_capacity(entries.len());

    for entry in entries {
        let id = entry.id.filter(|id| !id.is_empty()).unwrap_or_else(new_recipe_id);
        if !seen.insert(id.clone()) {
            return Err(SeedError::DuplicateId(id));
        }

        recipes.push(Recipe {
            id,
            name: entry.name,
            tags: entry.tags,
            ingredients: entry.ingredients,
            instructions: entry.instructions,
            published_at: entry.published_at.unwrap_or(now),
        });
    }

    Ok(recipes)
}
