use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::recipes::repo_types::{CategoryRow, RecipeChanges, RecipeInput, RecipeRow};

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Categories holding at least one of the user's recipes, each listed once.
    async fn categories_with_recipes(&self, user_id: Uuid) -> Result<Vec<CategoryRow>, AppError>;
    async fn list_by_category(
        &self,
        category_id: i32,
        user_id: Uuid,
    ) -> Result<Vec<RecipeRow>, AppError>;
    async fn get(&self, recipe_id: i64) -> Result<Option<RecipeRow>, AppError>;
    async fn owner_of(&self, recipe_id: i64) -> Result<Option<Uuid>, AppError>;
    async fn insert(&self, user_id: Uuid, input: &RecipeInput) -> Result<i64, AppError>;
    /// Applies only the fields set in `changes`.
    /// `false` when no recipe with this id belongs to `user_id`.
    async fn update(
        &self,
        recipe_id: i64,
        user_id: Uuid,
        changes: &RecipeChanges,
    ) -> Result<bool, AppError>;
    /// `false` when no recipe with this id belongs to `user_id`.
    async fn delete(&self, recipe_id: i64, user_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn categories_with_recipes(&self, user_id: Uuid) -> Result<Vec<CategoryRow>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT DISTINCT c.id, c.name
              FROM category c
              JOIN recipes r ON r.category = c.id
             WHERE r.user_id = $1
             ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_category(
        &self,
        category_id: i32,
        user_id: Uuid,
    ) -> Result<Vec<RecipeRow>, AppError> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, name, description, image, category, ingredients, cooking_steps
              FROM recipes
             WHERE category = $1 AND user_id = $2
             ORDER BY id
            "#,
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, recipe_id: i64) -> Result<Option<RecipeRow>, AppError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, name, description, image, category, ingredients, cooking_steps
              FROM recipes
             WHERE id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn owner_of(&self, recipe_id: i64) -> Result<Option<Uuid>, AppError> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(owner)
    }

    async fn insert(&self, user_id: Uuid, input: &RecipeInput) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO recipes
                (user_id, name, description, image, category, ingredients, cooking_steps)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.category)
        .bind(&input.ingredients)
        .bind(&input.cooking_steps)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn update(
        &self,
        recipe_id: i64,
        user_id: Uuid,
        changes: &RecipeChanges,
    ) -> Result<bool, AppError> {
        let res = sqlx::query(
            r#"
            UPDATE recipes
               SET name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   image = COALESCE($5, image),
                   category = COALESCE($6, category),
                   ingredients = COALESCE($7, ingredients),
                   cooking_steps = COALESCE($8, cooking_steps)
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(recipe_id)
        .bind(user_id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.image)
        .bind(changes.category)
        .bind(&changes.ingredients)
        .bind(&changes.cooking_steps)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, recipe_id: i64, user_id: Uuid) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
