use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recipes::repo_types::{CategoryRow, RecipeRow};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub category: i32,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub cooking_steps: Vec<String>,
}

/// PATCH body; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<i32>,
    pub ingredients: Option<Vec<String>>,
    pub cooking_steps: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: i32,
    pub ingredients: Vec<String>,
    pub cooking_steps: Vec<String>,
}

impl From<RecipeRow> for RecipeResponse {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            description: r.description,
            image: r.image,
            category: r.category,
            ingredients: r.ingredients,
            cooking_steps: r.cooking_steps,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
}

impl From<CategoryRow> for CategoryResponse {
    fn from(c: CategoryRow) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerCheckResponse {
    pub is_owner: bool,
}

#[derive(Debug, Serialize)]
pub struct RecipeCreatedResponse {
    pub id: i64,
    pub message: String,
}
