use super::{ensure_tag, RecipeStore, StoreError};
use crate::model::{Recipe, RecipeInput};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use database::{Identifiable, Repository};
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document as BsonDocument},
    Collection, Database,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const RECIPES_COLLECTION: &str = "recipes";

/// Recipe as laid out in the `recipes` collection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDocument {
    #[serde(rename = "_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub published_at: BsonDateTime,
}

impl Identifiable for RecipeDocument {
    fn id(&self) -> Option<String> {
        self.id.clone()
    }
}

impl From<Recipe> for RecipeDocument {
    fn from(value: Recipe) -> Self {
        RecipeDocument {
            id: Some(value.id),
            name: value.name,
            tags: value.tags,
            ingredients: value.ingredients,
            instructions: value.instructions,
            published_at: BsonDateTime::from_millis(value.published_at.timestamp_millis()),
        }
    }
}

impl From<RecipeDocument> for Recipe {
    fn from(value: RecipeDocument) -> Self {
        Recipe {
            id: value.id.unwrap_or_default(),
            name: value.name,
            tags: value.tags,
            ingredients: value.ingredients,
            instructions: value.instructions,
            published_at: DateTime::from_timestamp_millis(value.published_at.timestamp_millis())
                .unwrap_or_default(),
        }
    }
}

/// Handle on the `recipes` collection.
#[derive(Debug, Clone)]
pub struct RecipeCollection {
    collection: Collection<RecipeDocument>,
}

impl RecipeCollection {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(RECIPES_COLLECTION),
        }
    }
}

#[async_trait]
impl Repository<RecipeDocument> for RecipeCollection {
    fn get_collection(&self) -> Arc<RwLock<Collection<RecipeDocument>>> {
        Arc::new(RwLock::new(self.collection.clone()))
    }
}

/// Recipe store backed by a document repository.
#[derive(Clone)]
pub struct MongoRecipeStore {
    repository: Arc<dyn Repository<RecipeDocument>>,
}

impl MongoRecipeStore {
    pub fn new(repository: Arc<dyn Repository<RecipeDocument>>) -> Self {
        Self { repository }
    }

    /// Imports `recipes` unless the collection already holds records.
    ///
    /// Returns the number of imported records.
    pub async fn seed_if_empty(&self, recipes: Vec<Recipe>) -> Result<usize, StoreError> {
        if self.repository.count_by(doc! {}).await? > 0 {
            tracing::info!("recipes collection not empty, skipping seed import");
            return Ok(0);
        }

        let count = recipes.len();
        for recipe in recipes {
            self.repository.store(recipe.into()).await?;
        }

        Ok(count)
    }
}

/// Matches documents having a tag equal to `tag`, ignoring case.
pub(crate) fn tag_filter(tag: &str) -> BsonDocument {
    doc! {
        "tags": {
            "$regex": format!("^{}$", regex::escape(tag)),
            "$options": "i",
        }
    }
}

/// Current time rounded up to the next whole millisecond, the precision
/// of BSON datetimes.
fn publish_time() -> DateTime<Utc> {
    let now = Utc::now();
    let truncated = now.trunc_subsecs(3);

    if truncated < now {
        truncated + TimeDelta::milliseconds(1)
    } else {
        truncated
    }
}

fn mutable_fields(input: RecipeInput) -> BsonDocument {
    doc! {
        "name": input.name,
        "tags": input.tags,
        "ingredients": input.ingredients,
        "instructions": input.instructions,
    }
}

#[async_trait]
impl RecipeStore for MongoRecipeStore {
    async fn create(&self, input: RecipeInput) -> Result<Recipe, StoreError> {
        let recipe = Recipe::from_input(input, publish_time());

        self.repository.store(recipe.clone().into()).await?;
        tracing::debug!("created recipe {}", recipe.id);

        Ok(recipe)
    }

    async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let documents = self.repository.find_all().await?;
        Ok(documents.into_iter().map(Recipe::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Recipe, StoreError> {
        self.repository
            .find_one(id)
            .await?
            .map(Recipe::from)
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: &str, input: RecipeInput) -> Result<Recipe, StoreError> {
        let document = self
            .repository
            .update_fields(id, mutable_fields(input))
            .await?;

        tracing::debug!("updated recipe {id}");
        Ok(document.into())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.repository.delete_one(id).await?;

        tracing::debug!("deleted recipe {id}");
        Ok(())
    }

    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Recipe>, StoreError> {
        ensure_tag(tag)?;

        let documents = self.repository.find_all_by(tag_filter(tag), None).await?;
        Ok(documents.into_iter().map(Recipe::from).collect())
    }
}
