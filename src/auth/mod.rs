use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::{PgUserStore, UserStore};
pub use services::AuthService;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
