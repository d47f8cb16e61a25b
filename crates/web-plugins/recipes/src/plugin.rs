use super::{
    seed::load_seed,
    store::{InMemoryRecipeStore, MongoRecipeStore, RecipeCollection, RecipeStore},
    web,
};
use axum::Router;
use plugin_api::{Plugin, PluginError};
use std::{path::Path, sync::Arc};
use tokio::{runtime::Handle, task};

const DEFAULT_SEED_FILE: &str = "recipes.json";

#[derive(Default)]
pub struct Recipes {
    state: Option<RecipesState>,
}

#[derive(Debug, Clone, PartialEq)]
enum Backend {
    Memory,
    MongoDb { uri: String, dbn: String },
}

#[derive(Debug, Clone, PartialEq)]
struct RecipesEnv {
    backend: Backend,
    seed_file: String,
}

#[derive(Clone)]
pub(crate) struct RecipesState {
    pub(crate) store: Arc<dyn RecipeStore>,
}

fn get_env() -> Result<RecipesEnv, PluginError> {
    parse_env(|key| std::env::var(key).ok())
}

fn parse_env(var: impl Fn(&str) -> Option<String>) -> Result<RecipesEnv, PluginError> {
    let seed_file = var("RECIPES_SEED_FILE").unwrap_or_else(|| DEFAULT_SEED_FILE.to_owned());

    let backend = match var("RECIPES_BACKEND").as_deref() {
        None | Some("memory") => Backend::Memory,
        Some("mongodb") => {
            let uri = var("MONGO_URI").ok_or_else(|| {
                PluginError::InitError("MONGO_URI env variable required".to_owned())
            })?;
            let dbn = var("MONGO_DBN").ok_or_else(|| {
                PluginError::InitError("MONGO_DBN env variable required".to_owned())
            })?;
            Backend::MongoDb { uri, dbn }
        }
        Some(other) => {
            return Err(PluginError::InitError(format!(
                "unsupported RECIPES_BACKEND {other:?}, expected \"memory\" or \"mongodb\""
            )))
        }
    };

    Ok(RecipesEnv { backend, seed_file })
}

fn seed_error(err: impl std::fmt::Display) -> PluginError {
    PluginError::InitError(format!("failed to seed recipes: {err}"))
}

fn memory_store(env: &RecipesEnv) -> Result<InMemoryRecipeStore, PluginError> {
    let recipes = load_seed(&env.seed_file).map_err(seed_error)?;
    tracing::info!("loaded {} recipes from {}", recipes.len(), env.seed_file);

    Ok(InMemoryRecipeStore::from_seed(recipes))
}

fn mongo_store(env: &RecipesEnv, uri: &str, dbn: &str) -> Result<MongoRecipeStore, PluginError> {
    // The seed document is optional for a database that may already be populated
    let seed = if Path::new(&env.seed_file).exists() {
        Some(load_seed(&env.seed_file).map_err(seed_error)?)
    } else {
        tracing::debug!("no seed document at {}", env.seed_file);
        None
    };

    let handle = Handle::try_current().map_err(|_| {
        PluginError::InitError("mongodb backend requires a tokio runtime".to_owned())
    })?;

    task::block_in_place(|| {
        handle.block_on(async {
            let db = database::connect(uri, dbn)
                .await
                .map_err(|e| PluginError::InitError(format!("failed to connect to MongoDB: {e}")))?;
            let store = MongoRecipeStore::new(Arc::new(RecipeCollection::new(&db)));

            if let Some(recipes) = seed {
                let count = store.seed_if_empty(recipes).await.map_err(seed_error)?;
                tracing::info!("imported {count} recipes into MongoDB");
            }

            Ok::<_, PluginError>(store)
        })
    })
}

impl Recipes {
    fn mount_with(&mut self, env: RecipesEnv) -> Result<(), PluginError> {
        let store: Arc<dyn RecipeStore> = match &env.backend {
            Backend::Memory => Arc::new(memory_store(&env)?),
            Backend::MongoDb { uri, dbn } => Arc::new(mongo_store(&env, uri, dbn)?),
        };

        self.state = Some(RecipesState { store });

        Ok(())
    }
}

impl Plugin for Recipes {
    fn name(&self) -> &'static str {
        "recipes"
    }

    fn mount(&mut self) -> Result<(), PluginError> {
        let env = get_env()?;
        self.mount_with(env)
    }

    fn unmount(&self) -> Result<(), PluginError> {
        Ok(())
    }

    fn routes(&self) -> Result<Router, PluginError> {
        let state = self.state.as_ref().ok_or(PluginError::Other(
            "missing state, plugin not mounted".to_owned(),
        ))?;
        Ok(web::routes(Arc::new(state.clone())))
    }
}
