use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored recipe.
///
/// `id` and `published_at` are assigned once, at creation, and never change.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub published_at: DateTime<Utc>,
}

/// Client payload for creating or updating a recipe.
///
/// Identifier and publication time are not part of the payload; when
/// present in the JSON body they are ignored.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RecipeInput {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Builds a new record with a fresh identifier, published at `published_at`.
    pub fn from_input(input: RecipeInput, published_at: DateTime<Utc>) -> Self {
        Self {
            id: new_recipe_id(),
            name: input.name,
            tags: input.tags,
            ingredients: input.ingredients,
            instructions: input.instructions,
            published_at,
        }
    }

    /// Replaces every mutable field, leaving `id` and `published_at` untouched.
    pub fn apply(&mut self, input: RecipeInput) {
        self.name = input.name;
        self.tags = input.tags;
        self.ingredients = input.ingredients;
        self.instructions = input.instructions;
    }

    /// Whether any tag equals `tag` under Unicode case folding.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| eq_fold(t, tag))
    }
}

/// Compares two strings character by character, treating characters that
/// share an upper or lower case mapping as equal (`ſ`, `s` and `S`).
fn eq_fold(a: &str, b: &str) -> bool {
    let mut a = a.chars();
    let mut b = b.chars();

    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            (Some(x), Some(y)) => {
                let same = x.to_lowercase().eq(y.to_lowercase())
                    || x.to_uppercase().eq(y.to_uppercase());
                if !same {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

pub(crate) fn new_recipe_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
