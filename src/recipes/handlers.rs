use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    api::{ApiJson, ApiPath, MessageResponse},
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

use super::dto::{
    CategoryResponse, OwnerCheckResponse, RecipeCreatedResponse, RecipePatch, RecipeRequest,
    RecipeResponse,
};

// --- public routers ---

/// GET routes. Only `GET /recipes/:recipe_id` is open to anonymous callers.
pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:category_id", get(list_category_recipes))
        .route("/recipes/:recipe_id", get(get_recipe))
        .route("/recipes/:recipe_id/check-owner", get(check_owner))
}

/// Owner-gated mutations.
pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route(
            "/recipes/:recipe_id",
            patch(update_recipe).delete(delete_recipe),
        )
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.recipes.categories(user_id).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn list_category_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(category_id): ApiPath<i32>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = state.recipes.by_category(category_id, user_id).await?;
    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

/// Open to anyone: reads are not owner-scoped.
#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    ApiPath(recipe_id): ApiPath<i64>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = state.recipes.get(recipe_id).await?;
    Ok(Json(recipe.into()))
}

#[instrument(skip(state))]
pub async fn check_owner(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> Result<Json<OwnerCheckResponse>, AppError> {
    let is_owner = state.recipes.is_owner(recipe_id, user_id).await?;
    Ok(Json(OwnerCheckResponse { is_owner }))
}

#[instrument(skip(state, body))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeCreatedResponse>, AppError> {
    let id = state.recipes.create(user_id, body).await?;
    Ok(Json(RecipeCreatedResponse {
        id,
        message: "Recipe added successfully".into(),
    }))
}

#[instrument(skip(state, body))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(recipe_id): ApiPath<i64>,
    ApiJson(body): ApiJson<RecipePatch>,
) -> Result<Json<MessageResponse>, AppError> {
    state.recipes.update(recipe_id, user_id, body).await?;
    Ok(MessageResponse::new("Recipe updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(recipe_id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.recipes.delete(recipe_id, user_id).await?;
    Ok(MessageResponse::new("Recipe deleted successfully"))
}
