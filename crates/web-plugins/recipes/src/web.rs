pub(crate) mod handler;

use crate::{
    plugin::RecipesState,
    web::handler::{
        delete_recipe, get_recipe, list_recipes, new_recipe, search_recipes, update_recipe,
    },
};
use axum::{routing::get, Router};
use std::sync::Arc;

pub(crate) fn routes(state: Arc<RecipesState>) -> Router {
    Router::new() //
        .route("/recipes", get(list_recipes).post(new_recipe))
        .route("/recipes/search", get(search_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .with_state(state)
}
