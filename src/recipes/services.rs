use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::recipes::dto::{RecipePatch, RecipeRequest};
use crate::recipes::repo::RecipeStore;
use crate::recipes::repo_types::{CategoryRow, RecipeChanges, RecipeInput, RecipeRow};

fn checked_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Recipe name must not be empty".into()));
    }
    Ok(name.to_string())
}

impl TryFrom<RecipeRequest> for RecipeInput {
    type Error = AppError;

    fn try_from(req: RecipeRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: checked_name(&req.name)?,
            description: req.description,
            image: req.image,
            category: req.category,
            ingredients: req.ingredients,
            cooking_steps: req.cooking_steps,
        })
    }
}

impl TryFrom<RecipePatch> for RecipeChanges {
    type Error = AppError;

    fn try_from(patch: RecipePatch) -> Result<Self, Self::Error> {
        Ok(Self {
            name: patch.name.as_deref().map(checked_name).transpose()?,
            description: patch.description,
            image: patch.image,
            category: patch.category,
            ingredients: patch.ingredients,
            cooking_steps: patch.cooking_steps,
        })
    }
}

/// Recipe reads and owner-gated writes.
pub struct RecipeService {
    store: Arc<dyn RecipeStore>,
}

impl RecipeService {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    pub async fn categories(&self, user_id: Uuid) -> Result<Vec<CategoryRow>, AppError> {
        self.store.categories_with_recipes(user_id).await
    }

    pub async fn by_category(
        &self,
        category_id: i32,
        user_id: Uuid,
    ) -> Result<Vec<RecipeRow>, AppError> {
        self.store.list_by_category(category_id, user_id).await
    }

    pub async fn get(&self, recipe_id: i64) -> Result<RecipeRow, AppError> {
        self.store
            .get(recipe_id)
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    pub async fn is_owner(&self, recipe_id: i64, user_id: Uuid) -> Result<bool, AppError> {
        let owner = self
            .store
            .owner_of(recipe_id)
            .await?
            .ok_or(AppError::NotFound("Recipe"))?;
        Ok(owner == user_id)
    }

    pub async fn create(&self, user_id: Uuid, req: RecipeRequest) -> Result<i64, AppError> {
        let input = RecipeInput::try_from(req)?;
        let id = self.store.insert(user_id, &input).await?;
        info!(%user_id, recipe_id = id, "recipe created");
        Ok(id)
    }

    pub async fn update(
        &self,
        recipe_id: i64,
        user_id: Uuid,
        patch: RecipePatch,
    ) -> Result<(), AppError> {
        let changes = RecipeChanges::try_from(patch)?;
        if !self.store.update(recipe_id, user_id, &changes).await? {
            return Err(self.ownership_failure(recipe_id, user_id).await?);
        }
        info!(%user_id, recipe_id, "recipe updated");
        Ok(())
    }

    pub async fn delete(&self, recipe_id: i64, user_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete(recipe_id, user_id).await? {
            return Err(self.ownership_failure(recipe_id, user_id).await?);
        }
        info!(%user_id, recipe_id, "recipe deleted");
        Ok(())
    }

    /// Why an owner-scoped write touched no row.
    async fn ownership_failure(&self, recipe_id: i64, user_id: Uuid) -> Result<AppError, AppError> {
        match self.store.owner_of(recipe_id).await? {
            None => Ok(AppError::NotFound("Recipe")),
            Some(owner) => {
                warn!(%user_id, %owner, recipe_id, "write to another user's recipe refused");
                Ok(AppError::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn request(name: &str, category: i32) -> RecipeRequest {
        RecipeRequest {
            name: name.into(),
            description: "Description".into(),
            image: "http://example.com/image.jpg".into(),
            category,
            ingredients: vec!["Ingredient 1".into(), "Ingredient 2".into()],
            cooking_steps: vec!["Step 1".into(), "Step 2".into()],
        }
    }

    fn rename(name: &str, category: i32) -> RecipePatch {
        RecipePatch {
            name: Some(name.into()),
            category: Some(category),
            ..RecipePatch::default()
        }
    }

    fn service() -> (RecipeService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(time::Duration::days(14)));
        (RecipeService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn create_and_read_back_in_order() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let id = svc.create(alice, request("  Borscht ", 2)).await.unwrap();

        let recipe = svc.get(id).await.unwrap();
        assert_eq!(recipe.name, "Borscht");
        assert_eq!(recipe.user_id, alice);
        assert_eq!(recipe.ingredients, vec!["Ingredient 1", "Ingredient 2"]);
        assert_eq!(recipe.cooking_steps, vec!["Step 1", "Step 2"]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let err = svc.create(alice, request("   ", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let err = svc.create(alice, request("Soup", 999)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn categories_are_scoped_to_the_user_and_deduplicated() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let bob = store.insert_user("bob@example.com", "x:y");
        svc.create(alice, request("Pancakes", 5)).await.unwrap();
        svc.create(alice, request("Cheesecake", 5)).await.unwrap();

        let categories = svc.categories(alice).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, 5);
        assert!(svc.categories(bob).await.unwrap().is_empty());
        assert_eq!(svc.by_category(5, alice).await.unwrap().len(), 2);
        assert!(svc.by_category(5, bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ownership_check() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let bob = store.insert_user("bob@example.com", "x:y");
        let id = svc.create(alice, request("Pancakes", 1)).await.unwrap();

        assert!(svc.is_owner(id, alice).await.unwrap());
        assert!(!svc.is_owner(id, bob).await.unwrap());
        assert!(matches!(svc.is_owner(id + 100, alice).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let bob = store.insert_user("bob@example.com", "x:y");
        let id = svc.create(alice, request("Pancakes", 1)).await.unwrap();
        let before = svc.get(id).await.unwrap();

        let err = svc.update(id, bob, rename("Hijacked", 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = svc.delete(id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        assert_eq!(svc.get(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn owner_updates_and_deletes() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let id = svc.create(alice, request("Pancakes", 1)).await.unwrap();

        svc.update(id, alice, rename("Updated Recipe", 3)).await.unwrap();
        let updated = svc.get(id).await.unwrap();
        assert_eq!(updated.name, "Updated Recipe");
        assert_eq!(updated.category, 3);

        svc.delete(id, alice).await.unwrap();
        assert!(matches!(svc.get(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete(id, alice).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_fields() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let id = svc.create(alice, request("Pancakes", 1)).await.unwrap();

        let patch = RecipePatch {
            name: Some("Renamed".into()),
            ..RecipePatch::default()
        };
        svc.update(id, alice, patch).await.unwrap();

        let after = svc.get(id).await.unwrap();
        assert_eq!(after.name, "Renamed");
        assert_eq!(after.category, 1);
        assert_eq!(after.description, "Description");
        assert_eq!(after.image, "http://example.com/image.jpg");
        assert_eq!(after.ingredients, vec!["Ingredient 1", "Ingredient 2"]);
        assert_eq!(after.cooking_steps, vec!["Step 1", "Step 2"]);
    }

    #[tokio::test]
    async fn patch_validates_only_what_it_sends() {
        let (svc, store) = service();
        let alice = store.insert_user("alice@example.com", "x:y");
        let id = svc.create(alice, request("Pancakes", 1)).await.unwrap();

        let blank = RecipePatch {
            name: Some("  ".into()),
            ..RecipePatch::default()
        };
        assert!(matches!(svc.update(id, alice, blank).await, Err(AppError::Validation(_))));

        let bad_category = RecipePatch {
            category: Some(999),
            ..RecipePatch::default()
        };
        assert!(matches!(
            svc.update(id, alice, bad_category).await,
            Err(AppError::Validation(_))
        ));

        svc.update(id, alice, RecipePatch::default()).await.unwrap();
        assert_eq!(svc.get(id).await.unwrap().name, "Pancakes");
    }
}
