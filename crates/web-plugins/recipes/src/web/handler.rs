use crate::{
    error::RecipeError,
    model::{Recipe, RecipeInput},
    plugin::RecipesState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    tag: String,
}

fn parse_payload(
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<RecipeInput, RecipeError> {
    payload.map(|Json(input)| input).map_err(|rejection| {
        tracing::warn!("rejected recipe payload: {}", rejection.body_text());
        RecipeError::MalformedPayload(rejection.body_text())
    })
}

fn parse_id(id: Result<Path<String>, PathRejection>) -> Result<String, RecipeError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        tracing::warn!("rejected recipe id: {}", rejection.body_text());
        RecipeError::InvalidArgument(rejection.body_text())
    })
}

pub(crate) async fn new_recipe(
    State(state): State<Arc<RecipesState>>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<Json<Recipe>, RecipeError> {
    let input = parse_payload(payload)?;
    let recipe = state.store.create(input).await?;

    Ok(Json(recipe))
}

pub(crate) async fn list_recipes(
    State(state): State<Arc<RecipesState>>,
) -> Result<Json<Vec<Recipe>>, RecipeError> {
    Ok(Json(state.store.list().await?))
}

pub(crate) async fn get_recipe(
    State(state): State<Arc<RecipesState>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Recipe>, RecipeError> {
    let id = parse_id(id)?;
    Ok(Json(state.store.get(&id).await?))
}

pub(crate) async fn update_recipe(
    State(state): State<Arc<RecipesState>>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<Json<Recipe>, RecipeError> {
    let id = parse_id(id)?;
    let input = parse_payload(payload)?;
    let recipe = state.store.update(&id, input).await?;

    Ok(Json(recipe))
}

pub(crate) async fn delete_recipe(
    State(state): State<Arc<RecipesState>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, RecipeError> {
    let id = parse_id(id)?;
    state.store.delete(&id).await?;

    Ok(Json(json!({"message": "Recipe has been deleted"})))
}

pub(crate) async fn search_recipes(
    State(state): State<Arc<RecipesState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Recipe>>, RecipeError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::warn!("rejected search query: {}", rejection.body_text());
        RecipeError::InvalidArgument(rejection.body_text())
    })?;
    Ok(Json(state.store.search_by_tag(&params.tag).await?))
}
