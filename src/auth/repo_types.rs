use sqlx::FromRow;
use uuid::Uuid;

/// User record in the database, without credentials.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// What login needs: the id and the stored `salt:derived` record.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: String,
}
