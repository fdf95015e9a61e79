use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::chat::ChatPartner;
use crate::db;
use crate::handlers::{AppState, error::ApiError, session::Session};
use crate::models::Contact;
use crate::services::contacts::resolve_contacts;

#[derive(Debug, Deserialize)]
pub struct ContactQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// Counterparts the caller has already traded or chatted with.
pub async fn list_contacts(
    State(state): State<AppState>,
    Session(ctx): Session,
    Query(params): Query<ContactQuery>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = resolve_contacts(&state.pool, &ctx.user, params.search.as_deref()).await?;
    Ok(Json(contacts))
}

/// Every user on the other side of the marketplace, for starting a new chat.
pub async fn directory(
    State(state): State<AppState>,
    Session(ctx): Session,
) -> Result<Json<Vec<ChatPartner>>, ApiError> {
    let users = db::users::list_users_by_type(&state.pool, ctx.user.user_type.counterpart()).await?;
    Ok(Json(
        users
            .into_iter()
            .map(|user| ChatPartner::from_user(&ctx.user, user))
            .collect(),
    ))
}
