mod memory;
mod mongo;

pub use memory::InMemoryRecipeStore;
pub use mongo::{MongoRecipeStore, RecipeCollection, RecipeDocument};

use crate::model::{Recipe, RecipeInput};
use async_trait::async_trait;
use database::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("recipe not found")]
    NotFound,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::TargetNotFound => StoreError::NotFound,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Ordered collection of recipes answering CRUD and tag search queries.
///
/// Records keep insertion order. Lookups match identifiers exactly and
/// tag search compares tags case-insensitively.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Stores a new recipe, assigning its identifier and publication time.
    async fn create(&self, input: RecipeInput) -> Result<Recipe, StoreError>;

    async fn list(&self) -> Result<Vec<Recipe>, StoreError>;

    async fn get(&self, id: &str) -> Result<Recipe, StoreError>;

    /// Replaces the mutable fields of an existing recipe. Never inserts.
    async fn update(&self, id: &str, input: RecipeInput) -> Result<Recipe, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Recipes carrying `tag`, in store order. An empty tag is rejected.
    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Recipe>, StoreError>;
}

pub(crate) fn ensure_tag(tag: &str) -> Result<(), StoreError> {
    if tag.is_empty() {
        return Err(StoreError::InvalidArgument(
            "missing tag query parameter".to_owned(),
        ));
    }

    Ok(())
}
