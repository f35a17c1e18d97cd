use sqlx::FromRow;
use uuid::Uuid;

/// Recipe record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: i32,
    pub ingredients: Vec<String>,
    pub cooking_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
}

/// Writable recipe fields, already validated.
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: i32,
    pub ingredients: Vec<String>,
    pub cooking_steps: Vec<String>,
}

/// Partial update: `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<i32>,
    pub ingredients: Option<Vec<String>>,
    pub cooking_steps: Option<Vec<String>>,
}
