use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Deserialize;

use crate::chat::{ChatController, ChatView};
use crate::handlers::{AppState, error::ApiError, session::Session};
use crate::services::media::MediaKind;

#[derive(Debug, Deserialize)]
pub struct SelectContactRequest {
    pub contact_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
}

fn controller(state: &AppState) -> ChatController<'_> {
    ChatController::new(&state.pool, &state.translator, &state.media)
}

pub async fn get_chat(
    State(state): State<AppState>,
    Session(ctx): Session,
) -> Result<Json<ChatView>, ApiError> {
    Ok(Json(controller(&state).view(&ctx).await?))
}

pub async fn select_contact(
    State(state): State<AppState>,
    Session(mut ctx): Session,
    Json(req): Json<SelectContactRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let view = controller(&state).select_contact(&mut ctx, req.contact_id).await?;
    Ok(Json(view))
}

pub async fn clear_contact(
    State(state): State<AppState>,
    Session(mut ctx): Session,
) -> Json<ChatView> {
    let view = controller(&state).clear(&mut ctx);
    Json(view)
}

/// Accepts `image` and/or `video` file fields into the current draft.
pub async fn upload_attachment(
    State(state): State<AppState>,
    Session(mut ctx): Session,
    mut multipart: Multipart,
) -> Result<Json<ChatView>, ApiError> {
    let chat = controller(&state);
    let mut view = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?
    {
        let kind = match field.name() {
            Some("image") => MediaKind::Image,
            Some("video") => MediaKind::Video,
            other => {
                return Err(ApiError::BadRequest(format!(
                    "Unexpected upload field: {}",
                    other.unwrap_or("<unnamed>")
                )));
            }
        };
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {}", e)))?;

        // Earlier fields stay in the draft even if a later one fails
        view = Some(chat.attach(&mut ctx, kind, &file_name, &data).await?);
    }

    view.map(Json)
        .ok_or_else(|| ApiError::validation("Attach an image or a video"))
}

pub async fn send_message(
    State(state): State<AppState>,
    Session(mut ctx): Session,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let view = controller(&state).send(&mut ctx, &req.text).await?;
    Ok(Json(view))
}
