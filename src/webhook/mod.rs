use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod events;
pub mod handlers;
pub mod services;
mod signature;

pub use signature::SignatureValidator;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/callback", post(handlers::callback))
        .route("/healthz", get(handlers::healthz))
}
