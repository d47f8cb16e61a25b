use super::{ensure_tag, RecipeStore, StoreError};
use crate::model::{Recipe, RecipeInput};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

/// Recipe store holding every record in memory.
///
/// A single lock guards the collection: mutations hold it exclusively, so
/// no reader ever observes a partially applied create, update or delete.
/// Nothing is written back to disk.
#[derive(Debug, Default)]
pub struct InMemoryRecipeStore {
    recipes: RwLock<Vec<Recipe>>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding `recipes` as-is, identifiers and publication
    /// times included. Records must already carry unique identifiers, which
    /// [`crate::seed::load_seed`] guarantees.
    pub fn from_seed(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes: RwLock::new(recipes),
        }
    }

    pub fn len(&self) -> usize {
        self.recipes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.read().is_empty()
    }
}

#[async_trait]
impl RecipeStore for InMemoryRecipeStore {
    async fn create(&self, input: RecipeInput) -> Result<Recipe, StoreError> {
        let mut recipes = self.recipes.write();

        let mut recipe = Recipe::from_input(input, Utc::now());
        while recipes.iter().any(|r| r.id == recipe.id) {
            recipe.id = crate::model::new_recipe_id();
        }

        recipes.push(recipe.clone());
        tracing::debug!("created recipe {}", recipe.id);

        Ok(recipe)
    }

    async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.recipes.read().clone())
    }

    async fn get(&self, id: &str) -> Result<Recipe, StoreError> {
        self.recipes
            .read()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: &str, input: RecipeInput) -> Result<Recipe, StoreError> {
        let mut recipes = self.recipes.write();

        let recipe = recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        recipe.apply(input);

        tracing::debug!("updated recipe {id}");
        Ok(recipe.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut recipes = self.recipes.write();

        let pos = recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        recipes.remove(pos);

        tracing::debug!("deleted recipe {id}");
        Ok(())
    }

    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Recipe>, StoreError> {
        ensure_tag(tag)?;

        Ok(self
            .recipes
            .read()
            .iter()
            .filter(|r| r.has_tag(tag))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc};

    fn input(name: &str, tags: &[&str]) -> RecipeInput {
        RecipeInput {
            name: name.to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ingredients: vec!["flour".to_owned()],
            instructions: vec!["bake".to_owned()],
        }
    }

    #[tokio::test]
    async fn test_create_assigns_identity() {
        let store = InMemoryRecipeStore::new();

        let before = Utc::now();
        let first = store.create(input("Pie", &["Dessert"])).await.unwrap();
        let second = store.create(input("Pie", &["Dessert"])).await.unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert!(first.published_at >= before);
        assert_eq!(first.name, "Pie");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_get_after_create() {
        let store = InMemoryRecipeStore::new();

        let created = store.create(input("Pie", &["Dessert"])).await.unwrap();
        let fetched = store.get(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(store.get("unknown").await.unwrap_err(), StoreError::NotFound);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = InMemoryRecipeStore::new();
        assert!(store.list().await.unwrap().is_empty());

        let a = store.create(input("A", &[])).await.unwrap();
        let b = store.create(input("B", &[])).await.unwrap();
        let c = store.create(input("C", &[])).await.unwrap();

        store.update(&a.id, input("A2", &[])).await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn test_update_changes_mutable_fields_only() {
        let store = InMemoryRecipeStore::new();
        let created = store.create(input("Pie", &["Dessert"])).await.unwrap();

        let updated = store
            .update(&created.id, input("Tart", &["Sweet"]))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.published_at, created.published_at);
        assert_eq!(updated.name, "Tart");
        assert_eq!(updated.tags, vec!["Sweet"]);
        assert_eq!(store.get(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_unknown_id_does_not_insert() {
        let store = InMemoryRecipeStore::new();
        store.create(input("Pie", &["Dessert"])).await.unwrap();
        let snapshot = store.list().await.unwrap();

        let err = store.update("unknown", input("Tart", &[])).await.unwrap_err();

        assert_eq!(err, StoreError::NotFound);
        assert_eq!(store.list().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryRecipeStore::new();
        let a = store.create(input("A", &[])).await.unwrap();
        let b = store.create(input("B", &[])).await.unwrap();
        let c = store.create(input("C", &[])).await.unwrap();

        store.delete(&b.id).await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id.clone(), c.id.clone()]);

        assert_eq!(store.delete(&b.id).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_search_by_tag() {
        let store = InMemoryRecipeStore::new();
        let a = store.create(input("A", &["Dessert"])).await.unwrap();
        store.create(input("B", &["Lunch"])).await.unwrap();
        let c = store.create(input("C", &["sweet", "DESSERT"])).await.unwrap();

        let upper = store.search_by_tag("Dessert").await.unwrap();
        let lower = store.search_by_tag("dessert").await.unwrap();

        assert_eq!(upper, lower);
        assert_eq!(upper, vec![a, c]);
        assert!(store.search_by_tag("dinner").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_empty_tag() {
        let store = InMemoryRecipeStore::new();
        store.create(input("A", &[""])).await.unwrap();

        assert!(matches!(
            store.search_by_tag("").await,
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_seeded_scenario() {
        let seeded = vec![
            Recipe::from_input(input("A", &["Lunch"]), Utc::now()),
            Recipe::from_input(input("B", &["Dessert", "Sweet"]), Utc::now()),
        ];
        let (a, b) = (seeded[0].clone(), seeded[1].clone());
        let store = InMemoryRecipeStore::from_seed(seeded);

        assert_eq!(store.search_by_tag("sweet").await.unwrap(), vec![b.clone()]);

        store.delete(&a.id).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![b.clone()]);

        let update = RecipeInput {
            name: "New".to_owned(),
            tags: vec!["Sweet".to_owned()],
            ingredients: vec![],
            instructions: vec![],
        };
        store.update(&b.id, update).await.unwrap();

        let fetched = store.get(&b.id).await.unwrap();
        assert_eq!(fetched.name, "New");
        assert_eq!(fetched.tags, vec!["Sweet"]);
        assert!(fetched.ingredients.is_empty());
        assert_eq!(fetched.id, b.id);
        assert_eq!(fetched.published_at, b.published_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates() {
        let store = Arc::new(InMemoryRecipeStore::new());

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(input(&format!("R{i}"), &[])).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap().unwrap().id);
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(store.len(), 64);
    }
}
