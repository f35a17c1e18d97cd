//! In-memory stores for unit and router tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::{User, UserCredentials};
use crate::error::AppError;
use crate::recipes::repo::RecipeStore;
use crate::recipes::repo_types::{CategoryRow, RecipeChanges, RecipeInput, RecipeRow};
use crate::sessions::{NewSession, SessionStore};

const SEEDED_CATEGORIES: [&str; 6] = [
    "Breakfast",
    "Soups",
    "Main courses",
    "Salads",
    "Desserts",
    "Drinks",
];

struct StoredUser {
    email: String,
    password_hash: String,
}

struct StoredSession {
    user_id: Uuid,
    expires_at: OffsetDateTime,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, StoredUser>,
    sessions: HashMap<String, StoredSession>,
    recipes: BTreeMap<i64, RecipeRow>,
    categories: BTreeMap<i32, String>,
    next_recipe_id: i64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|(id, u)| u.email == email && Some(*id) != except)
    }

    fn check_refs(&self, user_id: Uuid, category: i32) -> Result<(), AppError> {
        if !self.users.contains_key(&user_id) || !self.categories.contains_key(&category) {
            return Err(AppError::Validation(
                "Referenced resource does not exist".into(),
            ));
        }
        Ok(())
    }
}

/// One lock over every table; each trait call is atomic like a transaction.
pub struct MemoryStore {
    ttl: time::Duration,
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new(ttl: time::Duration) -> Self {
        let tables = Tables {
            categories: SEEDED_CATEGORIES
                .iter()
                .enumerate()
                .map(|(i, name)| (i as i32 + 1, name.to_string()))
                .collect(),
            next_recipe_id: 1,
            ..Tables::default()
        };
        Self {
            ttl,
            tables: Mutex::new(tables),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn insert_user(&self, email: &str, password_hash: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().users.insert(
            id,
            StoredUser {
                email: email.into(),
                password_hash: password_hash.into(),
            },
        );
        id
    }

    pub fn insert_recipe(&self, user_id: Uuid, category: i32, name: &str) -> i64 {
        let mut t = self.lock();
        let id = t.next_recipe_id;
        t.next_recipe_id += 1;
        t.recipes.insert(
            id,
            RecipeRow {
                id,
                user_id,
                name: name.into(),
                description: String::new(),
                image: String::new(),
                category,
                ingredients: Vec::new(),
                cooking_steps: Vec::new(),
            },
        );
        id
    }

    /// Moves the session's expiry into the past without deleting it.
    pub fn expire_session(&self, session_id: &str) {
        if let Some(s) = self.lock().sessions.get_mut(session_id) {
            s.expires_at = OffsetDateTime::now_utc() - time::Duration::seconds(1);
        }
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.lock().sessions.contains_key(session_id)
    }

    pub fn session_count(&self, user_id: Uuid) -> usize {
        self.lock()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    pub fn recipe_count(&self, user_id: Uuid) -> usize {
        self.lock()
            .recipes
            .values()
            .filter(|r| r.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, user_id: Uuid) -> Result<String, AppError> {
        let session = NewSession::issue(self.ttl, OffsetDateTime::now_utc());
        let mut t = self.lock();
        if !t.users.contains_key(&user_id) {
            return Err(AppError::Validation(
                "Referenced resource does not exist".into(),
            ));
        }
        t.sessions.insert(
            session.id.clone(),
            StoredSession {
                user_id,
                expires_at: session.expires_at,
            },
        );
        Ok(session.id)
    }

    async fn resolve_user(&self, session_id: &str) -> Result<Option<Uuid>, AppError> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .lock()
            .sessions
            .get(session_id)
            .filter(|s| s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn revoke(&self, session_id: &str) -> Result<(), AppError> {
        self.lock().sessions.remove(session_id);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64, AppError> {
        let now = OffsetDateTime::now_utc();
        let mut t = self.lock();
        let before = t.sessions.len();
        t.sessions.retain(|_, s| s.expires_at >= now);
        Ok((before - t.sessions.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_with_session(
        &self,
        email: &str,
        password_hash: &str,
        session: &NewSession,
    ) -> Result<Uuid, AppError> {
        let mut t = self.lock();
        if t.email_taken(email, None) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let id = Uuid::new_v4();
        t.users.insert(
            id,
            StoredUser {
                email: email.into(),
                password_hash: password_hash.into(),
            },
        );
        t.sessions.insert(
            session.id.clone(),
            StoredSession {
                user_id: id,
                expires_at: session.expires_at,
            },
        );
        Ok(id)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(_, u)| u.email == email)
            .map(|(id, u)| UserCredentials {
                id: *id,
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&user_id).map(|u| User {
            id: user_id,
            email: u.email.clone(),
        }))
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let mut t = self.lock();
        if !t.users.contains_key(&user_id) {
            return Ok(false);
        }
        if t.email_taken(email, Some(user_id)) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        if let Some(u) = t.users.get_mut(&user_id) {
            u.email = email.into();
            u.password_hash = password_hash.into();
        }
        Ok(true)
    }

    async fn delete_cascade(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        if t.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        t.sessions.retain(|_, s| s.user_id != user_id);
        t.recipes.retain(|_, r| r.user_id != user_id);
        Ok(true)
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn categories_with_recipes(&self, user_id: Uuid) -> Result<Vec<CategoryRow>, AppError> {
        let t = self.lock();
        Ok(t.categories
            .iter()
            .filter(|(id, _)| {
                t.recipes
                    .values()
                    .any(|r| r.user_id == user_id && r.category == **id)
            })
            .map(|(id, name)| CategoryRow {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn list_by_category(
        &self,
        category_id: i32,
        user_id: Uuid,
    ) -> Result<Vec<RecipeRow>, AppError> {
        Ok(self
            .lock()
            .recipes
            .values()
            .filter(|r| r.user_id == user_id && r.category == category_id)
            .cloned()
            .collect())
    }

    async fn get(&self, recipe_id: i64) -> Result<Option<RecipeRow>, AppError> {
        Ok(self.lock().recipes.get(&recipe_id).cloned())
    }

    async fn owner_of(&self, recipe_id: i64) -> Result<Option<Uuid>, AppError> {
        Ok(self.lock().recipes.get(&recipe_id).map(|r| r.user_id))
    }

    async fn insert(&self, user_id: Uuid, input: &RecipeInput) -> Result<i64, AppError> {
        let mut t = self.lock();
        t.check_refs(user_id, input.category)?;
        let id = t.next_recipe_id;
        t.next_recipe_id += 1;
        t.recipes.insert(id, row_from_input(id, user_id, input));
        Ok(id)
    }

    async fn update(
        &self,
        recipe_id: i64,
        user_id: Uuid,
        changes: &RecipeChanges,
    ) -> Result<bool, AppError> {
        let mut t = self.lock();
        let Some(current) = t.recipes.get(&recipe_id).filter(|r| r.user_id == user_id) else {
            return Ok(false);
        };
        let mut row = current.clone();
        if let Some(category) = changes.category {
            t.check_refs(user_id, category)?;
            row.category = category;
        }
        if let Some(name) = &changes.name {
            row.name = name.clone();
        }
        if let Some(description) = &changes.description {
            row.description = description.clone();
        }
        if let Some(image) = &changes.image {
            row.image = image.clone();
        }
        if let Some(ingredients) = &changes.ingredients {
            row.ingredients = ingredients.clone();
        }
        if let Some(cooking_steps) = &changes.cooking_steps {
            row.cooking_steps = cooking_steps.clone();
        }
        t.recipes.insert(recipe_id, row);
        Ok(true)
    }

    async fn delete(&self, recipe_id: i64, user_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        match t.recipes.get(&recipe_id) {
            Some(r) if r.user_id == user_id => {
                t.recipes.remove(&recipe_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn row_from_input(id: i64, user_id: Uuid, input: &RecipeInput) -> RecipeRow {
    RecipeRow {
        id,
        user_id,
        name: input.name.clone(),
        description: input.description.clone(),
        image: input.image.clone(),
        category: input.category,
        ingredients: input.ingredients.clone(),
        cooking_steps: input.cooking_steps.clone(),
    }
}
